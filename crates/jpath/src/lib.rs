//! Dotted path resolution for binding templates.
//!
//! A path such as `products[0].price`, `item.name` or `orders.sum(total)` is
//! parsed with a small `nom` grammar and resolved against a layered
//! [`Context`], falling back to the table namespace of a
//! [`CollectionProvider`](bindery_traits::CollectionProvider). Resolution is
//! total: anything that cannot be found is `null`.

pub mod aggregate;
pub mod ast;
pub mod context;
pub mod engine;
pub mod error;
mod parser;

// --- Public API ---
pub use aggregate::{AggregateFn, aggregate, evaluate_aggregation};
pub use ast::{PathExpr, PathSegment};
pub use context::{Context, ItemScope};
pub use engine::{EvaluationContext, is_synthetic, resolve, resolve_path};
pub use error::JPathError;
pub use parser::parse_path;

#[cfg(test)]
mod tests {
    use super::*;
    use bindery_traits::InMemoryCollectionProvider;
    use serde_json::{Value, json};

    #[test]
    fn test_parse_and_resolve_nested_state() {
        let _ = env_logger::builder().is_test(true).try_init();
        let state = json!({ "page": { "orders": [{ "id": "A" }, { "id": "B" }] } });
        let ctx = Context::new().with_state(state.as_object().cloned().unwrap());
        let provider = InMemoryCollectionProvider::new();
        let e_ctx = EvaluationContext::new(&ctx, &provider);

        let expr = parse_path("page.orders[1].id").unwrap();
        assert_eq!(resolve_path(&expr, &e_ctx), json!("B"));
        assert_eq!(resolve("page.orders.count()", &e_ctx), json!(2));
    }

    #[test]
    fn test_context_shadows_tables() {
        let _ = env_logger::builder().is_test(true).try_init();
        let provider = InMemoryCollectionProvider::new();
        provider
            .add_table(
                "rows",
                vec![json!({ "v": 1 }).as_object().cloned().unwrap()],
            )
            .unwrap();
        let ctx = Context::new().with_layer(
            json!({ "rows": [{ "v": 5 }, { "v": 6 }] })
                .as_object()
                .cloned()
                .unwrap(),
        );
        let e_ctx = EvaluationContext::new(&ctx, &provider);
        assert_eq!(resolve("rows[0].v", &e_ctx), json!(5));
        assert_eq!(resolve("rows.sum(v)", &e_ctx), json!(11));

        let bare = Context::new();
        let e_ctx = e_ctx.with_context(&bare);
        assert_eq!(resolve("rows[0].v", &e_ctx), json!(1));
        assert_eq!(resolve("rows[0].missing", &e_ctx), Value::Null);
    }
}
