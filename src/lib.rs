//! # bindery
//!
//! A data-binding engine for component trees. Component properties carry
//! "magic text" such as `"{{item.name}} - {{item.price|currency:USD}}"` or
//! `"{{formula:round({subtotal} * 1.2, 2)}}"`; the engine resolves them
//! against page state, the current user, the active repeater row and the
//! application's tables, and expands repeaters into one clone per row.
//!
//! The work is split across the workspace crates:
//! - **types**: component trees, binding descriptors, value coercion
//! - **traits**: the `CollectionProvider` seam for table data
//! - **format**: number, currency, percentage and date formatting
//! - **template-core**: the `{{...}}` tokenizer and template cache
//! - **jpath**: dotted paths, synthetic roots and aggregations
//! - **formula**: the `formula:` expression language
//! - **binding**: descriptor resolution and per-row instantiation
//!
//! [`Engine`] ties them together behind one configuration.

// Re-export workspace crates
pub use bindery_binding as binding;
pub use bindery_format as format;
pub use bindery_formula as formula;
pub use bindery_jpath as jpath;
pub use bindery_template_core as template;
pub use bindery_traits as traits;
pub use bindery_types as types;

mod config;
mod engine;
pub mod error;
pub mod page;

pub use config::EngineConfig;
pub use engine::Engine;
pub use error::BinderyError;
pub use page::Page;

// Commonly used types
pub use bindery_binding::{
    Renderer, instantiate_for_row, render_component, render_template_string, resolve_binding,
};
pub use bindery_jpath::Context;
pub use bindery_template_core::{Template, Token, parse_template};
pub use bindery_traits::{CollectionProvider, InMemoryCollectionProvider, ProviderError};
pub use bindery_types::{BindingDescriptor, ComponentNode, EventHandler};

use serde_json::Value;

/// Evaluates a `formula:` expression (prefix optional). Failures come back
/// as a `"#ERROR: ..."` string.
pub fn evaluate_formula(
    formula: &str,
    context: &Context,
    provider: &dyn CollectionProvider,
) -> Value {
    bindery_formula::evaluate_formula(
        formula,
        &bindery_jpath::EvaluationContext::new(context, provider),
    )
}
