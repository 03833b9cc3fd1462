//! CollectionProvider trait for abstracting table access.
//!
//! The engine reads application tables only through this trait, so it never
//! depends on how (or where) the host application stores its rows.

use bindery_types::{FieldSchema, Row};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::{Arc, RwLock};
use thiserror::Error;

/// Error type for collection queries.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    #[error("Collection not found: {0}")]
    NotFound(String),

    #[error("Failed to query collection '{name}': {message}")]
    QueryFailed { name: String, message: String },

    #[error("Invalid table definition for '{name}': {message}")]
    InvalidDefinition { name: String, message: String },
}

/// Shared row data (reference-counted so snapshots are cheap to hand out).
pub type SharedRows = Arc<Vec<Row>>;

/// A source of named row collections.
///
/// A provider is treated as a read-only snapshot for the duration of one
/// evaluation pass. Implementations must be safe for concurrent reads.
///
/// # Implementations
///
/// - `InMemoryCollectionProvider`: tables held in memory, addressable by name or id
/// - `EmptyCollectionProvider`: knows no tables; every query is `NotFound`
/// - `SnapshotProvider`: memoizes another provider for one render pass
pub trait CollectionProvider: Send + Sync + Debug {
    /// Returns every row of the named collection.
    ///
    /// # Arguments
    ///
    /// * `name` - The table name or table id
    fn query(&self, name: &str) -> Result<SharedRows, ProviderError>;

    /// Check if a collection exists.
    fn exists(&self, name: &str) -> bool {
        self.query(name).is_ok()
    }

    /// The declared schema of a collection. Providers without schema
    /// information return an empty list.
    fn schema(&self, _name: &str) -> Result<Vec<FieldSchema>, ProviderError> {
        Ok(Vec::new())
    }

    /// Returns a human-readable name for this provider (for logging/debugging).
    fn name(&self) -> &'static str;
}

impl<P: CollectionProvider + ?Sized> CollectionProvider for Arc<P> {
    fn query(&self, name: &str) -> Result<SharedRows, ProviderError> {
        (**self).query(name)
    }

    fn exists(&self, name: &str) -> bool {
        (**self).exists(name)
    }

    fn schema(&self, name: &str) -> Result<Vec<FieldSchema>, ProviderError> {
        (**self).schema(name)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

/// A provider with no tables.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptyCollectionProvider;

impl CollectionProvider for EmptyCollectionProvider {
    fn query(&self, name: &str) -> Result<SharedRows, ProviderError> {
        Err(ProviderError::NotFound(name.to_string()))
    }

    fn exists(&self, _name: &str) -> bool {
        false
    }

    fn name(&self) -> &'static str {
        "EmptyCollectionProvider"
    }
}

#[derive(Debug, Clone)]
struct TableEntry {
    id: Option<String>,
    schema: Vec<FieldSchema>,
    rows: SharedRows,
}

#[derive(Debug, Default)]
struct TableStore {
    by_name: HashMap<String, TableEntry>,
    /// table id → table name
    ids: HashMap<String, String>,
}

impl TableStore {
    fn get(&self, handle: &str) -> Option<&TableEntry> {
        self.by_name
            .get(handle)
            .or_else(|| self.ids.get(handle).and_then(|name| self.by_name.get(name)))
    }
}

/// An in-memory collection provider.
///
/// Tables are stored in memory and must be populated before use. Each table
/// is addressable by its name and, when one was given, by its id.
#[derive(Debug, Default)]
pub struct InMemoryCollectionProvider {
    tables: RwLock<TableStore>,
}

impl InMemoryCollectionProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a table by name.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::QueryFailed` if the internal lock is poisoned.
    pub fn add_table(&self, name: impl Into<String>, rows: Vec<Row>) -> Result<(), ProviderError> {
        self.insert(name.into(), None, Vec::new(), rows)
    }

    /// Add (or replace) a table with an id and a declared schema.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::QueryFailed` if the internal lock is poisoned.
    pub fn add_table_with_schema(
        &self,
        id: impl Into<String>,
        name: impl Into<String>,
        schema: Vec<FieldSchema>,
        rows: Vec<Row>,
    ) -> Result<(), ProviderError> {
        self.insert(name.into(), Some(id.into()), schema, rows)
    }

    fn insert(
        &self,
        name: String,
        id: Option<String>,
        schema: Vec<FieldSchema>,
        rows: Vec<Row>,
    ) -> Result<(), ProviderError> {
        let mut store = self.tables.write().map_err(|_| ProviderError::QueryFailed {
            name: name.clone(),
            message: "table store lock poisoned".to_string(),
        })?;
        if let Some(previous) = store.by_name.get(&name).and_then(|t| t.id.clone()) {
            store.ids.remove(&previous);
        }
        if let Some(id) = &id {
            store.ids.insert(id.clone(), name.clone());
        }
        store.by_name.insert(
            name,
            TableEntry {
                id,
                schema,
                rows: Arc::new(rows),
            },
        );
        Ok(())
    }

    /// Builds a provider from a JSON object of tables.
    ///
    /// Each entry is either a bare row array (`"products": [{...}, ...]`) or a
    /// table definition (`"products": {"id": "t1", "schema": [...], "rows": [...]}`).
    /// Non-object rows are skipped.
    pub fn from_json(tables: &Value) -> Result<Self, ProviderError> {
        let provider = Self::new();
        let Some(entries) = tables.as_object() else {
            return Err(ProviderError::InvalidDefinition {
                name: "<root>".to_string(),
                message: "expected an object of tables".to_string(),
            });
        };

        for (name, definition) in entries {
            match definition {
                Value::Array(rows) => provider.add_table(name.clone(), collect_rows(name, rows))?,
                Value::Object(table) => {
                    let rows = table
                        .get("rows")
                        .and_then(Value::as_array)
                        .map(|rows| collect_rows(name, rows))
                        .unwrap_or_default();
                    let schema = match table.get("schema") {
                        Some(schema) => serde_json::from_value(schema.clone()).map_err(|e| {
                            ProviderError::InvalidDefinition {
                                name: name.clone(),
                                message: e.to_string(),
                            }
                        })?,
                        None => Vec::new(),
                    };
                    match table.get("id").and_then(Value::as_str) {
                        Some(id) => provider.add_table_with_schema(id, name.clone(), schema, rows)?,
                        None => provider.insert(name.clone(), None, schema, rows)?,
                    }
                }
                other => {
                    return Err(ProviderError::InvalidDefinition {
                        name: name.clone(),
                        message: format!("expected rows or a table object, got {}", other),
                    });
                }
            }
        }
        Ok(provider)
    }

    /// Remove a table from the store.
    ///
    /// Returns `None` if the lock is poisoned or the table doesn't exist.
    pub fn remove(&self, name: &str) -> Option<SharedRows> {
        let mut store = self.tables.write().ok()?;
        let entry = store.by_name.remove(name)?;
        if let Some(id) = &entry.id {
            store.ids.remove(id);
        }
        Some(entry.rows)
    }

    /// Get the number of tables in the store.
    ///
    /// Returns 0 if the lock is poisoned.
    pub fn len(&self) -> usize {
        self.tables.read().map(|t| t.by_name.len()).unwrap_or(0)
    }

    /// Check if the store is empty.
    ///
    /// Returns `true` if the lock is poisoned.
    pub fn is_empty(&self) -> bool {
        self.tables
            .read()
            .map(|t| t.by_name.is_empty())
            .unwrap_or(true)
    }
}

fn collect_rows(table: &str, rows: &[Value]) -> Vec<Row> {
    rows.iter()
        .filter_map(|row| match row {
            Value::Object(map) => Some(map.clone()),
            other => {
                log::debug!("Skipping non-object row {} in table '{}'", other, table);
                None
            }
        })
        .collect()
}

impl CollectionProvider for InMemoryCollectionProvider {
    fn query(&self, name: &str) -> Result<SharedRows, ProviderError> {
        let store = self.tables.read().map_err(|_| ProviderError::QueryFailed {
            name: name.to_string(),
            message: "table store lock poisoned".to_string(),
        })?;
        store
            .get(name)
            .map(|t| Arc::clone(&t.rows))
            .ok_or_else(|| ProviderError::NotFound(name.to_string()))
    }

    fn exists(&self, name: &str) -> bool {
        self.tables
            .read()
            .map(|t| t.get(name).is_some())
            .unwrap_or(false)
    }

    fn schema(&self, name: &str) -> Result<Vec<FieldSchema>, ProviderError> {
        let store = self.tables.read().map_err(|_| ProviderError::QueryFailed {
            name: name.to_string(),
            message: "table store lock poisoned".to_string(),
        })?;
        store
            .get(name)
            .map(|t| t.schema.clone())
            .ok_or_else(|| ProviderError::NotFound(name.to_string()))
    }

    fn name(&self) -> &'static str {
        "InMemoryCollectionProvider"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bindery_types::FieldType;
    use serde_json::json;

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_in_memory_provider_add_and_query() {
        let provider = InMemoryCollectionProvider::new();
        provider
            .add_table("products", vec![row(json!({"name": "A"})), row(json!({"name": "B"}))])
            .unwrap();

        let rows = provider.query("products").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1]["name"], json!("B"));
    }

    #[test]
    fn test_in_memory_provider_not_found() {
        let provider = InMemoryCollectionProvider::new();
        let result = provider.query("missing");
        assert!(matches!(result, Err(ProviderError::NotFound(_))));
        assert!(!provider.exists("missing"));
    }

    #[test]
    fn test_query_by_id_and_schema() {
        let provider = InMemoryCollectionProvider::new();
        provider
            .add_table_with_schema(
                "tbl_1",
                "orders",
                vec![FieldSchema::new("amount", FieldType::Number).required()],
                vec![row(json!({"amount": 5}))],
            )
            .unwrap();

        assert_eq!(provider.query("tbl_1").unwrap().len(), 1);
        assert!(provider.exists("orders"));
        let schema = provider.schema("tbl_1").unwrap();
        assert_eq!(schema[0].name, "amount");
        assert!(schema[0].required);
    }

    #[test]
    fn test_replacing_a_table_drops_its_old_id() {
        let provider = InMemoryCollectionProvider::new();
        provider
            .add_table_with_schema("old", "orders", vec![], vec![])
            .unwrap();
        provider.add_table("orders", vec![row(json!({"x": 1}))]).unwrap();

        assert!(!provider.exists("old"));
        assert_eq!(provider.query("orders").unwrap().len(), 1);
        assert_eq!(provider.len(), 1);
    }

    #[test]
    fn test_from_json_accepts_arrays_and_definitions() {
        let provider = InMemoryCollectionProvider::from_json(&json!({
            "products": [{"name": "A"}, 42, {"name": "B"}],
            "orders": {
                "id": "t_orders",
                "schema": [{"name": "amount", "type": "number", "required": true}],
                "rows": [{"amount": 1}]
            }
        }))
        .unwrap();

        assert_eq!(provider.query("products").unwrap().len(), 2);
        assert_eq!(provider.query("t_orders").unwrap().len(), 1);
        assert_eq!(provider.schema("orders").unwrap()[0].field_type, FieldType::Number);
    }

    #[test]
    fn test_from_json_rejects_scalars() {
        let err = InMemoryCollectionProvider::from_json(&json!({"bad": 3})).unwrap_err();
        assert!(matches!(err, ProviderError::InvalidDefinition { .. }));
        assert!(InMemoryCollectionProvider::from_json(&json!([])).is_err());
    }

    #[test]
    fn test_remove() {
        let provider = InMemoryCollectionProvider::new();
        provider.add_table("a", vec![]).unwrap();
        assert!(provider.remove("a").is_some());
        assert!(provider.remove("a").is_none());
        assert!(provider.is_empty());
    }

    #[test]
    fn test_empty_provider() {
        let provider = EmptyCollectionProvider;
        assert!(matches!(provider.query("x"), Err(ProviderError::NotFound(_))));
        assert_eq!(provider.schema("x").unwrap(), vec![]);
        assert_eq!(provider.name(), "EmptyCollectionProvider");
    }

    #[test]
    fn test_provider_error_display() {
        let err = ProviderError::QueryFailed {
            name: "orders".to_string(),
            message: "timeout".to_string(),
        };
        assert!(err.to_string().contains("orders"));
        assert!(err.to_string().contains("timeout"));
    }
}
