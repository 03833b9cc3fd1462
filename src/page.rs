//! A self-contained page document: the component tree plus the data it binds to.
//!
//! ```json
//! {
//!   "state": { "title": "Catalog" },
//!   "user": { "name": "Ada" },
//!   "tables": { "products": [{ "name": "Lamp", "price": 20 }] },
//!   "components": [{ "id": "heading", "kind": "text", "props": { "text": "{{title}}" } }]
//! }
//! ```
use crate::error::BinderyError;
use bindery_jpath::Context;
use bindery_jpath::engine::DATETIME_FORMAT;
use bindery_traits::InMemoryCollectionProvider;
use bindery_types::{ComponentNode, ModelError, Row};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    #[serde(default)]
    pub state: Row,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_user: Option<Value>,
    /// Pins the clock for `now`/`today`, as `YYYY-MM-DDTHH:MM:SS`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub now: Option<String>,
    #[serde(default)]
    pub tables: Map<String, Value>,
    #[serde(default)]
    pub components: Vec<ComponentNode>,
}

impl Page {
    pub fn from_json(source: &str) -> Result<Self, BinderyError> {
        let page: Self = serde_json::from_str(source)?;
        page.validate()?;
        Ok(page)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, BinderyError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| {
            BinderyError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read page from '{}': {}", path.display(), e),
            ))
        })?;
        Self::from_json(&source)
    }

    /// Ids must be unique across the whole page, not only within one root.
    pub fn validate(&self) -> Result<(), BinderyError> {
        let mut seen = HashSet::new();
        for root in &self.components {
            root.validate()?;
            let mut stack = vec![root];
            while let Some(node) = stack.pop() {
                if !seen.insert(node.id.as_str()) {
                    return Err(ModelError::InvalidComponent {
                        id: node.id.to_string(),
                        message: "duplicate id".to_string(),
                    }
                    .into());
                }
                stack.extend(node.children.iter());
            }
        }
        Ok(())
    }

    /// The root evaluation context for this page.
    pub fn context(&self) -> Result<Context, BinderyError> {
        let mut ctx = Context::new().with_state(self.state.clone());
        if let Some(user) = &self.user {
            ctx = ctx.with_user(user.clone());
        }
        if let Some(user) = &self.current_user {
            ctx = ctx.with_current_user(user.clone());
        }
        if let Some(now) = &self.now {
            let now = NaiveDateTime::parse_from_str(now, DATETIME_FORMAT).map_err(|e| {
                BinderyError::Config(format!("invalid 'now' value '{}': {}", now, e))
            })?;
            ctx = ctx.with_now(now);
        }
        Ok(ctx)
    }

    /// An in-memory provider over the page's `tables`.
    pub fn provider(&self) -> Result<InMemoryCollectionProvider, BinderyError> {
        Ok(InMemoryCollectionProvider::from_json(&Value::Object(
            self.tables.clone(),
        ))?)
    }
}
