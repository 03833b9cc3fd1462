//! Binding resolution and template instantiation.
//!
//! [`Renderer`] is the stateful entry point; the free functions below are
//! shorthands for one-off calls with default [`RenderOptions`].

mod instantiate;
mod options;
mod resolver;

// --- Public API ---
pub use instantiate::{RENDERED_ITEMS_PROP, TOTAL_ITEMS_PROP};
pub use options::{DEFAULT_MAX_ITEMS, RenderOptions};
pub use resolver::Renderer;

use bindery_jpath::Context;
use bindery_traits::CollectionProvider;
use bindery_types::{BindingDescriptor, ComponentNode};
use serde_json::Value;

/// Resolves one descriptor against `context` and `provider`.
pub fn resolve_binding(
    descriptor: &BindingDescriptor,
    context: &Context,
    provider: &dyn CollectionProvider,
) -> Value {
    Renderer::new(provider).resolve_binding(descriptor, context)
}

/// Renders magic text such as `"Hello {{user.name}}"` into a string.
pub fn render_template_string(
    source: &str,
    context: &Context,
    provider: &dyn CollectionProvider,
) -> String {
    Renderer::new(provider).render_template_string(source, context)
}

/// Builds the clone of `template` for row `index` holding `item`.
pub fn instantiate_for_row(
    template: &ComponentNode,
    item: Value,
    index: usize,
    context: &Context,
    provider: &dyn CollectionProvider,
) -> ComponentNode {
    Renderer::new(provider).instantiate_for_row(template, item, index, context)
}

/// Renders a whole tree, expanding every repeater in it.
pub fn render_component(
    node: &ComponentNode,
    context: &Context,
    provider: &dyn CollectionProvider,
) -> ComponentNode {
    Renderer::new(provider).render_component(node, context)
}
