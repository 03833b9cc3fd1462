//! Defines the Abstract Syntax Tree (AST) for binding paths.
use crate::aggregate::AggregateFn;

/// Represents a segment in a binding path.
#[derive(Debug, Clone, PartialEq)]
pub enum PathSegment {
    /// An object key or table name (e.g., `customer`, `First Name`).
    Key(String),
    /// An array index (e.g., `[0]`). At most one follows each key.
    Index(usize),
    /// A trailing aggregation call (e.g., `.sum(price)`).
    Call {
        func: AggregateFn,
        field: Option<String>,
    },
}

/// A parsed path: a non-empty sequence of segments starting with a key.
#[derive(Debug, Clone, PartialEq)]
pub struct PathExpr {
    pub segments: Vec<PathSegment>,
}

impl PathExpr {
    /// The first key, which names a synthetic root, a context variable or a table.
    pub fn root(&self) -> &str {
        match self.segments.first() {
            Some(PathSegment::Key(k)) => k,
            _ => "",
        }
    }

    /// The trailing aggregation, if any, and the segments before it.
    pub fn split_call(&self) -> (&[PathSegment], Option<(AggregateFn, Option<&str>)>) {
        match self.segments.split_last() {
            Some((PathSegment::Call { func, field }, prefix)) => {
                (prefix, Some((*func, field.as_deref())))
            }
            _ => (&self.segments, None),
        }
    }
}
