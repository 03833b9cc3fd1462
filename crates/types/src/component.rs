//! The component tree consumed by the binding engine.
//!
//! The engine never edits an authored tree. Instantiation always builds a
//! fresh tree, so these types only expose constructors and read accessors
//! plus builder-style helpers for assembling trees in code.

use crate::binding::BindingDescriptor;
use crate::error::ModelError;
use crate::ids::ComponentId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};

/// The component kind that renders its children once per row.
pub const REPEATER_KIND: &str = "repeater";

/// The property (binding or prop) that holds a repeater's data source.
pub const REPEATER_DATA_PROP: &str = "data";

/// The prop that caps how many rows a repeater instantiates.
pub const REPEATER_MAX_ITEMS_PROP: &str = "maxItems";

/// An event hook on a component, e.g. `onClick → navigate { page: "{{item.id}}" }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventHandler {
    pub event: String,
    pub action: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub params: Map<String, Value>,
}

impl EventHandler {
    pub fn new(event: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            action: action.into(),
            params: Map::new(),
        }
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

/// A node of an authored (or instantiated) component tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentNode {
    pub id: ComponentId,
    #[serde(alias = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub props: Map<String, Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub bindings: BTreeMap<String, BindingDescriptor>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<EventHandler>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ComponentNode>,
}

impl ComponentNode {
    pub fn new(id: impl Into<ComponentId>, kind: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            props: Map::new(),
            bindings: BTreeMap::new(),
            events: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Shorthand for a repeater whose data source is the given template,
    /// e.g. `{{categories}}` or `{{item.products}}`.
    pub fn repeater(id: impl Into<ComponentId>, data: impl Into<String>) -> Self {
        Self::new(id, REPEATER_KIND)
            .with_binding(REPEATER_DATA_PROP, BindingDescriptor::dynamic(data))
    }

    pub fn with_prop(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.props.insert(key.into(), value.into());
        self
    }

    pub fn with_binding(mut self, property: impl Into<String>, binding: BindingDescriptor) -> Self {
        self.bindings.insert(property.into(), binding);
        self
    }

    pub fn with_event(mut self, handler: EventHandler) -> Self {
        self.events.push(handler);
        self
    }

    pub fn with_child(mut self, child: ComponentNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn is_repeater(&self) -> bool {
        self.kind.eq_ignore_ascii_case(REPEATER_KIND)
    }

    /// The row cap declared on the node itself, if any.
    pub fn max_items(&self) -> Option<usize> {
        self.props
            .get(REPEATER_MAX_ITEMS_PROP)
            .and_then(Value::as_u64)
            .map(|n| n as usize)
    }

    /// Counts this node and all of its descendants.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(ComponentNode::node_count).sum::<usize>()
    }

    /// Finds a node by id anywhere in this subtree.
    pub fn find(&self, id: &str) -> Option<&ComponentNode> {
        if self.id.as_str() == id {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(id))
    }

    /// Decodes a tree from JSON and checks that ids are unique within it.
    pub fn from_json(value: &Value) -> Result<Self, ModelError> {
        let node = Self::deserialize(value)?;
        node.validate()?;
        Ok(node)
    }

    /// Rejects trees with empty or duplicate ids; instantiated ids are derived
    /// from authored ones, so authored ids must already be unique.
    pub fn validate(&self) -> Result<(), ModelError> {
        let mut seen = HashSet::new();
        self.collect_ids(&mut seen)
    }

    fn collect_ids<'a>(&'a self, seen: &mut HashSet<&'a str>) -> Result<(), ModelError> {
        if self.id.as_str().is_empty() {
            return Err(ModelError::InvalidComponent {
                id: String::new(),
                message: format!("a '{}' node has an empty id", self.kind),
            });
        }
        if !seen.insert(self.id.as_str()) {
            return Err(ModelError::InvalidComponent {
                id: self.id.to_string(),
                message: "duplicate id".to_string(),
            });
        }
        for child in &self.children {
            child.collect_ids(seen)?;
        }
        Ok(())
    }
}
