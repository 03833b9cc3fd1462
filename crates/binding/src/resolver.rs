//! Resolves binding descriptors and renders magic text.
use crate::options::RenderOptions;
use bindery_format::{FormatSpec, format_value_with_locale};
use bindery_formula::{evaluate_formula, strip_formula_prefix};
use bindery_jpath::{Context, EvaluationContext, resolve};
use bindery_template_core::{Template, TemplateCache, Token, parse_template};
use bindery_traits::{CollectionProvider, ProviderError, SharedRows};
use bindery_types::{BindingDescriptor, FieldMode, TableRef, display_value};
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::sync::Arc;

/// Page-state names accepted as the `source` of a legacy binding.
const LEGACY_STATE_SOURCES: &[&str] = &["state", "page", "pagestate"];

/// Resolves bindings and instantiates component trees against one provider.
///
/// Every method is total: misses resolve to `null` (or an empty string when
/// rendering text) and are logged at debug level.
#[derive(Debug)]
pub struct Renderer<'a> {
    provider: &'a dyn CollectionProvider,
    cache: Option<&'a TemplateCache>,
    options: RenderOptions,
}

impl<'a> Renderer<'a> {
    pub fn new(provider: &'a dyn CollectionProvider) -> Self {
        Self {
            provider,
            cache: None,
            options: RenderOptions::default(),
        }
    }

    pub fn with_options(mut self, options: RenderOptions) -> Self {
        self.options = options;
        self
    }

    /// Shares parsed templates through `cache` instead of parsing on every call.
    pub fn with_cache(mut self, cache: &'a TemplateCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    pub(crate) fn template(&self, source: &str) -> Arc<Template> {
        match self.cache {
            Some(cache) => cache.get_or_parse(source),
            None => Arc::new(parse_template(source)),
        }
    }

    /// Resolves the path part of one expression token: a `formula:` body or a path.
    pub fn resolve_expression(&self, path: &str, ctx: &Context) -> Value {
        let e_ctx = EvaluationContext::new(ctx, self.provider);
        match strip_formula_prefix(path) {
            Some(formula) => evaluate_formula(formula, &e_ctx),
            None => resolve(path, &e_ctx),
        }
    }

    fn format(&self, value: &Value, spec: &FormatSpec) -> String {
        format_value_with_locale(value, spec, &self.options.locale)
    }

    fn render_tokens(&self, template: &Template, ctx: &Context) -> String {
        template
            .tokens()
            .iter()
            .map(|token| match token {
                Token::Literal(text) => Cow::Borrowed(text.as_str()),
                Token::Expression { path, format, .. } => {
                    let value = self.resolve_expression(path, ctx);
                    Cow::Owned(match format {
                        Some(spec) => self.format(&value, spec),
                        None => display_value(&value),
                    })
                }
            })
            .collect()
    }

    /// Parses, resolves and formats a template into text.
    pub fn render_template_string(&self, source: &str, ctx: &Context) -> String {
        let template = self.template(source);
        if template.is_static() {
            return source.to_string();
        }
        self.render_tokens(&template, ctx)
    }

    /// Like [`render_template_string`](Self::render_template_string), except
    /// that a template consisting of exactly one unformatted expression yields
    /// the raw value, so arrays and numbers keep their type.
    pub fn resolve_dynamic(&self, source: &str, ctx: &Context) -> Value {
        let template = self.template(source);
        match template.single_expression() {
            Some((path, None)) => self.resolve_expression(path, ctx),
            _ if template.is_static() => Value::String(source.to_string()),
            _ => Value::String(self.render_tokens(&template, ctx)),
        }
    }

    /// Re-evaluates every string inside a prop value, recursing into arrays
    /// and objects. Strings without `{{` are copied as-is.
    pub fn render_value(&self, value: &Value, ctx: &Context) -> Value {
        match value {
            Value::String(s) if s.contains(bindery_template_core::OPEN) => {
                self.resolve_dynamic(s, ctx)
            }
            Value::Array(items) => {
                Value::Array(items.iter().map(|v| self.render_value(v, ctx)).collect())
            }
            Value::Object(map) => Value::Object(self.render_map(map, ctx)),
            other => other.clone(),
        }
    }

    pub(crate) fn render_map(&self, map: &Map<String, Value>, ctx: &Context) -> Map<String, Value> {
        map.iter()
            .map(|(k, v)| (k.clone(), self.render_value(v, ctx)))
            .collect()
    }

    /// Resolves one binding descriptor to a concrete value.
    pub fn resolve_binding(&self, descriptor: &BindingDescriptor, ctx: &Context) -> Value {
        match descriptor {
            BindingDescriptor::Static { value } => value.clone(),
            BindingDescriptor::Field {
                table,
                field,
                mode: FieldMode::Single,
                format,
            } => self.resolve_field(table, field, format.as_deref(), ctx),
            BindingDescriptor::Field {
                table,
                mode: FieldMode::List,
                ..
            }
            | BindingDescriptor::Table { table } => self
                .query_rows(table)
                .map_or(Value::Null, |rows| rows_to_value(&rows)),
            BindingDescriptor::Dynamic { expression } => self.resolve_dynamic(expression, ctx),
            BindingDescriptor::Legacy { source, field } => {
                if LEGACY_STATE_SOURCES.contains(&source.to_ascii_lowercase().as_str()) {
                    ctx.state_value(field).cloned().unwrap_or(Value::Null)
                } else {
                    log::debug!("Legacy binding source '{}' is not page state", source);
                    Value::Null
                }
            }
        }
    }

    /// Reads `field` from the current repeater row, or else from the first
    /// row of `table`.
    fn resolve_field(
        &self,
        table: &TableRef,
        field: &str,
        format: Option<&str>,
        ctx: &Context,
    ) -> Value {
        let value = match ctx.item() {
            Some(Value::Object(row)) => row.get(field).cloned(),
            _ => self
                .query_rows(table)
                .and_then(|rows| rows.first().and_then(|row| row.get(field).cloned())),
        }
        .unwrap_or(Value::Null);

        match format.and_then(FormatSpec::parse) {
            Some(spec) if !value.is_null() => Value::String(self.format(&value, &spec)),
            _ => value,
        }
    }

    fn query_rows(&self, table: &TableRef) -> Option<SharedRows> {
        match self.provider.query(table.as_str()) {
            Ok(rows) => Some(rows),
            Err(ProviderError::NotFound(_)) => {
                log::debug!("Binding refers to unknown table '{}'", table);
                None
            }
            Err(e) => {
                log::warn!(
                    "Provider '{}' failed for table '{}': {}",
                    self.provider.name(),
                    table,
                    e
                );
                None
            }
        }
    }
}

fn rows_to_value(rows: &SharedRows) -> Value {
    Value::Array(rows.iter().cloned().map(Value::Object).collect())
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

    fn provider() -> InMemoryCollectionProvider {
        let provider = InMemoryCollectionProvider::new();
        provider
            .add_table(
                "products",
                vec![
                    row(json!({ "name": "Lamp", "price": 20 })),
                    row(json!({ "name": "Desk", "price": 150.5 })),
                ],
            )
            .unwrap();
        provider
    }

    #[test]
    fn test_static_and_dynamic() {
        let provider = provider();
        let renderer = Renderer::new(&provider);
        let ctx = Context::new();
        assert_eq!(
            renderer.resolve_binding(&BindingDescriptor::static_value(json!([1, 2])), &ctx),
            json!([1, 2])
        );
        assert_eq!(
            renderer.resolve_binding(
                &BindingDescriptor::dynamic("{{products.count()}} items, {{products.sum(price)|currency:USD}}"),
                &ctx
            ),
            json!("2 items, $170.50")
        );
        assert_eq!(
            renderer
                .resolve_binding(&BindingDescriptor::dynamic("{{products}}"), &ctx)
                .as_array()
                .map(Vec::len),
            Some(2)
        );
    }

    #[test]
    fn test_field_bindings() {
        let provider = provider();
        let renderer = Renderer::new(&provider);
        let ctx = Context::new();

        let single = BindingDescriptor::field("products", "price").with_format("number:1");
        assert_eq!(renderer.resolve_binding(&single, &ctx), json!("20.0"));

        let scoped = ctx.scoped_item(json!({ "price": 7 }), 0);
        assert_eq!(renderer.resolve_binding(&single, &scoped), json!("7.0"));

        let list = BindingDescriptor::field_list("products", "price");
        assert_eq!(
            renderer.resolve_binding(&list, &ctx),
            json!([{ "name": "Lamp", "price": 20 }, { "name": "Desk", "price": 150.5 }])
        );
        assert_eq!(
            renderer.resolve_binding(&BindingDescriptor::table("products"), &ctx),
            renderer.resolve_binding(&list, &ctx)
        );
    }

    #[test]
    fn test_unresolvable_bindings_are_null() {
        let _ = env_logger::builder().is_test(true).try_init();
        let renderer = Renderer::new(&EmptyCollectionProvider);
        let ctx = Context::new();
        assert_eq!(
            renderer.resolve_binding(&BindingDescriptor::field("missing", "x"), &ctx),
            Value::Null
        );
        assert_eq!(
            renderer.resolve_binding(&BindingDescriptor::table("missing"), &ctx),
            Value::Null
        );
        assert_eq!(
            renderer.resolve_binding(&BindingDescriptor::dynamic("{{nope.nothing}}"), &ctx),
            Value::Null
        );
    }

    #[test]
    fn test_legacy_reads_page_state() {
        let renderer = Renderer::new(&EmptyCollectionProvider);
        let ctx = Context::new().with_state(row(json!({ "title": "Home" })));
        let legacy = BindingDescriptor::Legacy {
            source: "state".into(),
            field: "title".into(),
        };
        assert_eq!(renderer.resolve_binding(&legacy, &ctx), json!("Home"));
        let other = BindingDescriptor::Legacy {
            source: "cookies".into(),
            field: "title".into(),
        };
        assert_eq!(renderer.resolve_binding(&other, &ctx), Value::Null);
    }

    #[test]
    fn test_render_template_string() {
        let renderer = Renderer::new(&EmptyCollectionProvider);
        let ctx = Context::new().with_state(row(json!({ "a": 3, "b": 4 })));
        assert_eq!(renderer.render_template_string("plain {{", &ctx), "plain {{");
        assert_eq!(renderer.render_template_string("{{user.name}}", &ctx), "");
        assert_eq!(
            renderer.render_template_string("{{formula:{a} * {b}}} / {{formula:1/0}}", &ctx),
            "12 / #ERROR: Division by zero"
        );
    }

    #[test]
    fn test_render_value_recurses() {
        let renderer = Renderer::new(&EmptyCollectionProvider);
        let ctx = Context::new().scoped_item(json!({ "id": 9, "name": "A" }), 0);
        assert_eq!(
            renderer.render_value(
                &json!({ "label": "#{{item.id}}", "ids": ["{{item.id}}", 1], "raw": "x" }),
                &ctx
            ),
            json!({ "label": "#9", "ids": [9, 1], "raw": "x" })
        );
    }

    #[test]
    fn test_cache_is_used() {
        let cache = TemplateCache::new(8);
        let renderer = Renderer::new(&EmptyCollectionProvider).with_cache(&cache);
        let ctx = Context::new();
        renderer.render_template_string("{{a}} {{b}}", &ctx);
        renderer.render_template_string("{{a}} {{b}}", &ctx);
        assert_eq!(cache.len(), 1);
    }
}
