pub mod fixtures;

use bindery::{Context, Engine, EngineConfig, InMemoryCollectionProvider};
use serde_json::{Map, Value};
use std::sync::Arc;

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

/// Installs the test logger once per binary.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Converts a `json!` object literal into a row.
pub fn row(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {}", other),
    }
}

/// A provider holding the given `(name, rows)` tables.
pub fn provider_with(tables: &[(&str, Value)]) -> InMemoryCollectionProvider {
    let provider = InMemoryCollectionProvider::new();
    for (name, rows) in tables {
        let rows = rows
            .as_array()
            .map(|rows| rows.iter().cloned().map(row).collect())
            .unwrap_or_default();
        provider
            .add_table(*name, rows)
            .unwrap_or_else(|e| panic!("failed to add table '{}': {}", name, e));
    }
    provider
}

/// An engine over `provider` with default settings.
pub fn engine_with(provider: InMemoryCollectionProvider) -> Engine {
    Engine::with_config(Arc::new(provider), EngineConfig::default())
}

/// A context with page state from a `json!` object literal.
pub fn state_context(state: Value) -> Context {
    Context::new().with_state(row(state))
}
