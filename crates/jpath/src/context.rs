//! The layered, read-only context a path is resolved against.
use bindery_types::Row;
use chrono::{Local, NaiveDateTime};
use serde_json::Value;
use std::sync::Arc;

/// The current repeater row.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemScope {
    pub item: Arc<Value>,
    pub index: usize,
}

/// A read-only name → value mapping assembled for one render pass.
///
/// Lookups search, in order: synthetic identifiers (`item`, `index`, `user`,
/// `now`, ...), extra layers from innermost to outermost, then page state.
/// Names that match none of these fall through to the table namespace at
/// resolution time.
///
/// Cloning is cheap: every layer is reference counted, so scoping a row for a
/// repeater copies a handful of pointers rather than the data.
#[derive(Debug, Clone)]
pub struct Context {
    layers: Vec<Arc<Row>>,
    state: Arc<Row>,
    user: Option<Arc<Value>>,
    current_user: Option<Arc<Value>>,
    scope: Option<ItemScope>,
    now: NaiveDateTime,
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Context {
    /// An empty context whose clock is pinned to the current local time.
    pub fn new() -> Self {
        Self {
            layers: Vec::new(),
            state: Arc::new(Row::new()),
            user: None,
            current_user: None,
            scope: None,
            now: Local::now().naive_local(),
        }
    }

    pub fn with_state(mut self, state: Row) -> Self {
        self.state = Arc::new(state);
        self
    }

    /// The logged-in user.
    pub fn with_user(mut self, user: Value) -> Self {
        self.user = (!user.is_null()).then(|| Arc::new(user));
        self
    }

    /// A test identity that shadows the logged-in user while previewing.
    pub fn with_current_user(mut self, user: Value) -> Self {
        self.current_user = (!user.is_null()).then(|| Arc::new(user));
        self
    }

    /// Pushes a layer that shadows everything pushed before it and page state.
    pub fn with_layer(mut self, layer: Row) -> Self {
        self.layers.push(Arc::new(layer));
        self
    }

    /// Pins the clock used by `now`, `today`, `tomorrow` and `yesterday`.
    pub fn with_now(mut self, now: NaiveDateTime) -> Self {
        self.now = now;
        self
    }

    /// A child context with `item`/`index` bound to one repeater row.
    /// An enclosing row, if any, is shadowed.
    pub fn scoped_item(&self, item: Value, index: usize) -> Self {
        let mut scoped = self.clone();
        scoped.scope = Some(ItemScope {
            item: Arc::new(item),
            index,
        });
        scoped
    }

    pub fn item(&self) -> Option<&Value> {
        self.scope.as_ref().map(|s| s.item.as_ref())
    }

    pub fn index(&self) -> Option<usize> {
        self.scope.as_ref().map(|s| s.index)
    }

    pub fn in_repeater(&self) -> bool {
        self.scope.is_some()
    }

    /// The active identity: the current test user, else the logged-in user.
    pub fn user(&self) -> Option<&Value> {
        self.current_user.as_deref().or(self.user.as_deref())
    }

    pub fn now(&self) -> NaiveDateTime {
        self.now
    }

    pub fn state(&self) -> &Row {
        &self.state
    }

    /// Reads one page-state key.
    pub fn state_value(&self, key: &str) -> Option<&Value> {
        self.state.get(key)
    }

    /// Looks up a non-synthetic name in the layers, then page state.
    pub fn lookup(&self, name: &str) -> Option<&Value> {
        self.layers
            .iter()
            .rev()
            .find_map(|layer| layer.get(name))
            .or_else(|| self.state.get(name))
    }
}
