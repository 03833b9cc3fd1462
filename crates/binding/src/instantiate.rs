//! Per-row instantiation of component subtrees and repeater expansion.
//!
//! Instantiation never edits the authored tree. Each call builds a new tree
//! bottom-up in which every string prop, binding and event parameter has been
//! resolved against the row's context, and every id carries the row position
//! (`card` → `card-0`, and `card-0-1` for row 1 of a nested repeater).
use crate::resolver::Renderer;
use bindery_jpath::Context;
use bindery_types::{BindingDescriptor, ComponentNode, EventHandler, REPEATER_DATA_PROP};
use serde_json::Value;
use std::collections::BTreeMap;

/// Set on an expanded repeater: the number of rows in its data source.
pub const TOTAL_ITEMS_PROP: &str = "totalItems";
/// Set on an expanded repeater: the number of rows actually instantiated.
pub const RENDERED_ITEMS_PROP: &str = "renderedItems";

impl Renderer<'_> {
    /// Clones `template` for one row with `item`/`index` in scope.
    pub fn instantiate_for_row(
        &self,
        template: &ComponentNode,
        item: Value,
        index: usize,
        ctx: &Context,
    ) -> ComponentNode {
        let row_ctx = ctx.scoped_item(item, index);
        self.build_node(template, &row_ctx, &format!("-{}", index))
    }

    /// Renders a tree outside any row: ids are kept, repeaters are expanded.
    pub fn render_component(&self, node: &ComponentNode, ctx: &Context) -> ComponentNode {
        self.build_node(node, ctx, "")
    }

    /// Expands a repeater into one clone of its children per data row.
    pub fn expand_repeater(&self, node: &ComponentNode, ctx: &Context) -> ComponentNode {
        self.build_repeater(node, ctx, "")
    }

    fn build_node(&self, node: &ComponentNode, ctx: &Context, suffix: &str) -> ComponentNode {
        if node.is_repeater() {
            return self.build_repeater(node, ctx, suffix);
        }
        ComponentNode {
            id: node.id.with_suffix(suffix),
            kind: node.kind.clone(),
            props: self.render_map(&node.props, ctx),
            bindings: self.resolve_bindings(&node.bindings, ctx, |_| true),
            events: self.render_events(&node.events, ctx),
            children: node
                .children
                .iter()
                .map(|child| self.build_node(child, ctx, suffix))
                .collect(),
        }
    }

    fn build_repeater(&self, node: &ComponentNode, ctx: &Context, suffix: &str) -> ComponentNode {
        let rows = self.repeater_rows(node, ctx);
        let total = rows.len();
        let cap = node.max_items().unwrap_or(self.options().max_items);
        if total > cap {
            log::debug!(
                "Repeater '{}' shows {} of {} rows",
                node.id.with_suffix(suffix),
                cap,
                total
            );
        }

        let mut children = Vec::with_capacity(total.min(cap) * node.children.len());
        for (index, item) in rows.into_iter().take(cap).enumerate() {
            let row_ctx = ctx.scoped_item(item, index);
            let row_suffix = format!("{}-{}", suffix, index);
            children.extend(
                node.children
                    .iter()
                    .map(|child| self.build_node(child, &row_ctx, &row_suffix)),
            );
        }

        let mut props = self.render_map(&node.props, ctx);
        props.remove(REPEATER_DATA_PROP);
        props.insert(TOTAL_ITEMS_PROP.to_string(), Value::from(total));
        props.insert(RENDERED_ITEMS_PROP.to_string(), Value::from(total.min(cap)));

        ComponentNode {
            id: node.id.with_suffix(suffix),
            kind: node.kind.clone(),
            props,
            bindings: self.resolve_bindings(&node.bindings, ctx, |name| {
                name != REPEATER_DATA_PROP
            }),
            events: self.render_events(&node.events, ctx),
            children,
        }
    }

    /// The repeater's rows: its `data` binding, else its `data` prop, resolved
    /// in the enclosing context. Anything but an array is an empty collection.
    fn repeater_rows(&self, node: &ComponentNode, ctx: &Context) -> Vec<Value> {
        let source = match node.bindings.get(REPEATER_DATA_PROP) {
            Some(binding) => self.resolve_binding(binding, ctx),
            None => node
                .props
                .get(REPEATER_DATA_PROP)
                .map_or(Value::Null, |data| self.render_value(data, ctx)),
        };
        match source {
            Value::Array(rows) => rows,
            Value::Null => Vec::new(),
            other => {
                log::debug!(
                    "Repeater '{}' data is not a collection: {}",
                    node.id,
                    other
                );
                Vec::new()
            }
        }
    }

    /// Resolves bindings into `Static` descriptors holding their values.
    fn resolve_bindings(
        &self,
        bindings: &BTreeMap<String, BindingDescriptor>,
        ctx: &Context,
        keep: impl Fn(&str) -> bool,
    ) -> BTreeMap<String, BindingDescriptor> {
        bindings
            .iter()
            .filter(|(name, _)| keep(name.as_str()))
            .map(|(name, binding)| {
                (
                    name.clone(),
                    BindingDescriptor::static_value(self.resolve_binding(binding, ctx)),
                )
            })
            .collect()
    }

    fn render_events(&self, events: &[EventHandler], ctx: &Context) -> Vec<EventHandler> {
        events
            .iter()
            .map(|handler| EventHandler {
                event: handler.event.clone(),
                action: handler.action.clone(),
                params: self.render_map(&handler.params, ctx),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bindery_traits::{EmptyCollectionProvider, InMemoryCollectionProvider};
    use bindery_types::Row;
    use serde_json::json;

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    fn card() -> ComponentNode {
        ComponentNode::new("card", "text")
            .with_prop("text", "{{item.name}} - {{item.price|currency:USD}}")
            .with_event(EventHandler::new("click", "navigate").param("id", "{{item.name}}"))
    }

    #[test]
    fn test_instantiate_for_row() {
        let renderer = Renderer::new(&EmptyCollectionProvider);
        let ctx = Context::new();
        let template = card();

        let first = renderer.instantiate_for_row(&template, json!({ "name": "A", "price": 10 }), 0, &ctx);
        let second = renderer.instantiate_for_row(&template, json!({ "name": "B", "price": 20 }), 1, &ctx);

        assert_eq!(first.props["text"], json!("A - $10.00"));
        assert_eq!(second.props["text"], json!("B - $20.00"));
        assert_eq!(first.id.as_str(), "card-0");
        assert_eq!(second.id.as_str(), "card-1");
        assert_eq!(first.events[0].params["id"], json!("A"));
        assert_eq!(template.props["text"], json!("{{item.name}} - {{item.price|currency:USD}}"));
    }

    #[test]
    fn test_ids_are_stable_across_renders() {
        let renderer = Renderer::new(&EmptyCollectionProvider);
        let ctx = Context::new();
        let a = renderer.instantiate_for_row(&card(), json!({ "name": "A" }), 3, &ctx);
        let b = renderer.instantiate_for_row(&card(), json!({ "name": "Z" }), 3, &ctx);
        assert_eq!(a.id, b.id);
    }

    #[test]
    fn test_bindings_become_static() {
        let renderer = Renderer::new(&EmptyCollectionProvider);
        let template = ComponentNode::new("t", "text")
            .with_binding("value", BindingDescriptor::dynamic("{{item.qty}}"));
        let clone = renderer.instantiate_for_row(&template, json!({ "qty": 4 }), 0, &Context::new());
        assert_eq!(clone.bindings["value"], BindingDescriptor::static_value(4));
    }

    #[test]
    fn test_nested_repeaters_use_their_own_rows() {
        let _ = env_logger::builder().is_test(true).try_init();
        let provider = InMemoryCollectionProvider::new();
        provider
            .add_table(
                "categories",
                vec![
                    row(json!({ "name": "Lighting", "products": [{ "name": "Lamp" }, { "name": "Bulb" }] })),
                    row(json!({ "name": "Office", "products": [{ "name": "Desk" }] })),
                ],
            )
            .unwrap();
        let renderer = Renderer::new(&provider);

        let page = ComponentNode::repeater("categories", "{{categories}}").with_child(
            ComponentNode::new("section", "container")
                .with_prop("title", "{{item.name}}")
                .with_child(
                    ComponentNode::repeater("products", "{{item.products}}")
                        .with_child(ComponentNode::new("product", "text").with_prop("text", "{{item.name}}")),
                ),
        );

        let rendered = renderer.render_component(&page, &Context::new());
        assert_eq!(rendered.children.len(), 2);
        assert_eq!(rendered.props[TOTAL_ITEMS_PROP], json!(2));
        assert!(!rendered.bindings.contains_key(REPEATER_DATA_PROP));

        let lighting = &rendered.children[0];
        assert_eq!(lighting.id.as_str(), "section-0");
        assert_eq!(lighting.props["title"], json!("Lighting"));
        let lighting_products = &lighting.children[0];
        assert_eq!(lighting_products.id.as_str(), "products-0");
        let names: Vec<_> = lighting_products
            .children
            .iter()
            .map(|c| (c.id.as_str(), c.props["text"].clone()))
            .collect();
        assert_eq!(
            names,
            vec![("product-0-0", json!("Lamp")), ("product-0-1", json!("Bulb"))]
        );

        let office_products = &rendered.children[1].children[0];
        assert_eq!(office_products.children.len(), 1);
        assert_eq!(office_products.children[0].props["text"], json!("Desk"));
        assert_eq!(office_products.children[0].id.as_str(), "product-1-0");
    }

    #[test]
    fn test_max_items_caps_rows() {
        let renderer = Renderer::new(&EmptyCollectionProvider);
        let ctx = Context::new().with_state(row(json!({ "rows": [1, 2, 3, 4, 5] })));
        let repeater = ComponentNode::repeater("list", "{{rows}}")
            .with_prop("maxItems", 2)
            .with_child(ComponentNode::new("cell", "text").with_prop("text", "{{item}}@{{index}}"));

        let expanded = renderer.expand_repeater(&repeater, &ctx);
        assert_eq!(expanded.children.len(), 2);
        assert_eq!(expanded.children[1].props["text"], json!("2@1"));
        assert_eq!(expanded.props[TOTAL_ITEMS_PROP], json!(5));
        assert_eq!(expanded.props[RENDERED_ITEMS_PROP], json!(2));
    }

    #[test]
    fn test_data_prop_and_non_collections() {
        let renderer = Renderer::new(&EmptyCollectionProvider);
        let ctx = Context::new().with_state(row(json!({ "rows": [{ "v": 1 }], "scalar": 5 })));

        let mut by_prop = ComponentNode::new("list", "repeater")
            .with_child(ComponentNode::new("cell", "text").with_prop("text", "{{item.v}}"));
        by_prop.props.insert("data".into(), json!("{{rows}}"));
        let expanded = renderer.expand_repeater(&by_prop, &ctx);
        assert_eq!(expanded.children[0].props["text"], json!(1));
        assert!(!expanded.props.contains_key("data"));

        let scalar = ComponentNode::repeater("list", "{{scalar}}")
            .with_child(ComponentNode::new("cell", "text"));
        assert!(renderer.expand_repeater(&scalar, &ctx).children.is_empty());
    }
}
