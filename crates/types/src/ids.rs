//! Newtype wrappers for component ids and table handles.
//!
//! These keep a table handle from being passed where a component id is
//! expected (and vice versa) even though both are plain strings on the wire.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

/// The identifier of a component node in an authored or instantiated tree.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentId(Arc<str>);

impl ComponentId {
    /// Creates a new ComponentId from a string
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self(id.into())
    }

    /// Returns the string representation of this component id
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Derives the id of a per-row clone. The same `(id, suffix)` pair always
    /// yields the same id, so a row keeps its identity across re-renders.
    pub fn with_suffix(&self, suffix: &str) -> Self {
        if suffix.is_empty() {
            return self.clone();
        }
        Self(format!("{}{}", self.0, suffix).into())
    }
}

impl From<String> for ComponentId {
    fn from(s: String) -> Self {
        Self(s.into())
    }
}

impl From<&str> for ComponentId {
    fn from(s: &str) -> Self {
        Self(s.into())
    }
}

impl AsRef<str> for ComponentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An opaque handle to an application table: either its name or its id.
/// Only a collection provider knows how to turn it into rows.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TableRef(Arc<str>);

impl TableRef {
    /// Creates a new TableRef from a table name or id
    pub fn new(handle: impl Into<Arc<str>>) -> Self {
        Self(handle.into())
    }

    /// Returns the string representation of this handle
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for TableRef {
    fn from(s: String) -> Self {
        Self(s.into())
    }
}

impl From<&str> for TableRef {
    fn from(s: &str) -> Self {
        Self(s.into())
    }
}

impl AsRef<str> for TableRef {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
