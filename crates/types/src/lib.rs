//! Shared data model for the bindery binding engine: component trees,
//! binding descriptors, table handles and value coercion rules.

pub mod binding;
pub mod component;
pub mod error;
pub mod ids;
pub mod schema;
pub mod value;

pub use binding::{BindingDescriptor, FieldMode};
pub use component::{
    ComponentNode, EventHandler, REPEATER_DATA_PROP, REPEATER_KIND, REPEATER_MAX_ITEMS_PROP,
};
pub use error::ModelError;
pub use ids::{ComponentId, TableRef};
pub use schema::{FieldSchema, FieldType};
pub use value::{
    Row, display_value, format_number_plain, is_empty_value, is_truthy, number_value, to_number,
};
