//! Binding descriptors: where a component property gets its value from.

use crate::error::ModelError;
use crate::ids::TableRef;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Whether a field binding reads one value or the whole column of rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FieldMode {
    #[default]
    Single,
    List,
}

/// A declarative description of a property's value source.
///
/// Resolving a descriptor never mutates data; the same descriptor against the
/// same context and provider snapshot always yields the same value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum BindingDescriptor {
    /// A literal value, returned verbatim.
    Static { value: Value },
    /// A column of a table, read from the current row or the first row.
    Field {
        table: TableRef,
        field: String,
        #[serde(default)]
        mode: FieldMode,
        /// A format spec such as `currency:USD`, applied in single mode.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        format: Option<String>,
    },
    /// A whole table as a row array.
    Table { table: TableRef },
    /// A magic-text template such as `Total: {{orders.sum(amount)|currency}}`.
    Dynamic { expression: String },
    /// Older documents bind straight to one page-state key.
    Legacy { source: String, field: String },
}

impl BindingDescriptor {
    pub fn static_value(value: impl Into<Value>) -> Self {
        Self::Static {
            value: value.into(),
        }
    }

    pub fn dynamic(expression: impl Into<String>) -> Self {
        Self::Dynamic {
            expression: expression.into(),
        }
    }

    pub fn field(table: impl Into<TableRef>, field: impl Into<String>) -> Self {
        Self::Field {
            table: table.into(),
            field: field.into(),
            mode: FieldMode::Single,
            format: None,
        }
    }

    pub fn field_list(table: impl Into<TableRef>, field: impl Into<String>) -> Self {
        Self::Field {
            table: table.into(),
            field: field.into(),
            mode: FieldMode::List,
            format: None,
        }
    }

    pub fn table(table: impl Into<TableRef>) -> Self {
        Self::Table {
            table: table.into(),
        }
    }

    /// Attaches a format spec to a field binding. Other variants are returned unchanged.
    pub fn with_format(self, spec: impl Into<String>) -> Self {
        match self {
            Self::Field {
                table, field, mode, ..
            } => Self::Field {
                table,
                field,
                mode,
                format: Some(spec.into()),
            },
            other => other,
        }
    }

    /// Decodes a descriptor from its JSON form.
    pub fn from_json(value: &Value) -> Result<Self, ModelError> {
        if !value.is_object() {
            return Err(ModelError::InvalidDescriptor(format!(
                "expected an object, got {}",
                value
            )));
        }
        Self::deserialize(value).map_err(|e| ModelError::InvalidDescriptor(e.to_string()))
    }

    /// Returns true for the `Static` variant.
    pub fn is_static(&self) -> bool {
        matches!(self, Self::Static { .. })
    }
}
