mod common;

use bindery::{BindingDescriptor, Context, parse_template, render_template_string, resolve_binding};
use bindery_traits::EmptyCollectionProvider;
use common::fixtures::{orders, products};
use common::{TestResult, init_logging, provider_with, state_context};
use serde_json::{Value, json};

#[test]
fn test_delimiter_free_templates_render_to_themselves() {
    let ctx = Context::new();
    for source in [
        "",
        "Hello world",
        "Price: $10 {not a binding}",
        "single { and } braces",
        "trailing {{",
        "}} reversed {{",
        "pipes | and || stay",
    ] {
        assert_eq!(
            render_template_string(source, &ctx, &EmptyCollectionProvider),
            source,
            "template {:?}",
            source
        );
    }
}

#[test]
fn test_parsing_is_idempotent() {
    for source in [
        "{{item.name}} - {{item.price|currency:USD}}",
        "{{formula:if({a} > 1, 'x', 'y')}}",
        "Total {{orders.sum(amount)|number:2}} of {{orders.count()}}",
        "{{ unterminated",
    ] {
        assert_eq!(parse_template(source), parse_template(source));
        assert_eq!(parse_template(source).to_source(), source);
    }
}

#[test]
fn test_resolution_never_panics() {
    init_logging();
    let provider = provider_with(&[("orders", orders())]);
    let ctx = state_context(json!({ "n": 1, "s": "text", "list": [1, 2] }))
        .scoped_item(json!({ "nested": { "deep": [null] } }), 0);

    for source in [
        "{{}}",
        "{{ }}",
        "{{.}}",
        "{{[}}",
        "{{a..b}}",
        "{{orders[99].amount}}",
        "{{orders.sum(}}",
        "{{orders.median(amount)}}",
        "{{item.nested.deep[0].x}}",
        "{{s.length}}",
        "{{n|date:YYYY}}",
        "{{list|currency:ZZZ}}",
        "{{formula:}}",
        "{{formula:(((}}",
        "{{formula:{missing} / {n}}}",
        "{{formula:'unterminated}}",
        "{{|number}}",
        "{{n|}}",
    ] {
        let _ = render_template_string(source, &ctx, &provider);
    }

    for descriptor in [
        json!({ "type": "field", "table": "nope", "field": "x" }),
        json!({ "type": "field", "table": "orders", "field": "missing", "format": "bogus" }),
        json!({ "type": "table", "table": "" }),
        json!({ "type": "dynamic", "expression": "{{" }),
        json!({ "type": "legacy", "source": "api", "field": "x" }),
    ] {
        let descriptor = BindingDescriptor::from_json(&descriptor).unwrap();
        let _ = resolve_binding(&descriptor, &ctx, &provider);
    }
}

#[test]
fn test_missing_user_renders_empty() {
    assert_eq!(
        render_template_string("{{user.name}}", &Context::new(), &EmptyCollectionProvider),
        ""
    );
    assert_eq!(
        render_template_string("Hi {{user.name}}!", &Context::new(), &EmptyCollectionProvider),
        "Hi !"
    );
}

#[test]
fn test_table_aggregations() -> TestResult {
    let provider = provider_with(&[("orders", orders())]);
    let ctx = Context::new();
    let resolve = |expression: &str| {
        resolve_binding(&BindingDescriptor::dynamic(expression), &ctx, &provider)
    };

    assert_eq!(resolve("{{orders.count()}}"), json!(3));
    assert_eq!(resolve("{{orders.sum(amount)}}"), json!(600));
    assert_eq!(resolve("{{orders.avg(amount)}}"), json!(200));
    assert_eq!(resolve("{{orders.min(amount)}}"), json!(100));
    assert_eq!(resolve("{{orders.max(amount)}}"), json!(300));
    assert_eq!(resolve("{{missing.count()}}"), json!(0));
    assert_eq!(resolve("{{missing.max(amount)}}"), Value::Null);
    assert_eq!(
        render_template_string("{{orders.sum(amount)|currency:USD}}", &ctx, &provider),
        "$600.00"
    );
    Ok(())
}

#[test]
fn test_formatting() {
    let ctx = state_context(json!({
        "price": 99.99,
        "ratio": 0.856,
        "big": 1234567.891,
        "when": "2024-03-05T14:07:09"
    }));
    let render = |source: &str| render_template_string(source, &ctx, &EmptyCollectionProvider);

    assert_eq!(render("{{price|currency:USD}}"), "$99.99");
    assert_eq!(render("{{ratio|percentage:1}}"), "85.6%");
    assert_eq!(render("{{big|number:2}}"), "1,234,567.89");
    assert_eq!(render("{{when|date:YYYY-MM-DD}}"), "2024-03-05");
    assert_eq!(render("{{when|time:HH:mm}}"), "14:07");
    assert_eq!(render("{{when|datetime}}"), "03/05/2024 02:07 PM");
    assert_eq!(render("{{missing|currency:USD}}"), "");
}

#[test]
fn test_field_binding_in_and_out_of_rows() {
    let provider = provider_with(&[("products", products())]);
    let descriptor = BindingDescriptor::field("products", "price").with_format("currency:USD");

    let page = Context::new();
    assert_eq!(resolve_binding(&descriptor, &page, &provider), json!("$10.00"));

    let row = page.scoped_item(json!({ "name": "B", "price": 20 }), 1);
    assert_eq!(resolve_binding(&descriptor, &row, &provider), json!("$20.00"));
}

#[test]
fn test_formulas_in_templates() {
    init_logging();
    let ctx = state_context(json!({ "subtotal": 80, "tax": 0.25 }));
    let render = |source: &str| render_template_string(source, &ctx, &EmptyCollectionProvider);

    assert_eq!(render("{{formula:{subtotal} * (1 + {tax})}}"), "100");
    assert_eq!(render("{{formula:round({subtotal} / 3, 2)}}"), "26.67");
    assert_eq!(
        render("{{formula:if({subtotal} > 50, 'free shipping', 'standard')}}"),
        "free shipping"
    );
    assert_eq!(render("{{formula:{subtotal} / 0}}"), "#ERROR: Division by zero");
    assert_eq!(render("{{formula:system('ls')}}"), "#ERROR: Unknown function: system");
}

#[test]
fn test_current_user_shadows_user() {
    let ctx = Context::new()
        .with_user(json!({ "name": "Ada" }))
        .with_current_user(json!({ "name": "Tester" }));
    assert_eq!(
        render_template_string("{{user.name}}", &ctx, &EmptyCollectionProvider),
        "Tester"
    );
}

#[test]
fn test_deeply_nested_formulas_render_errors() {
    init_logging();
    let ctx = Context::new();
    let render = |formula: String| {
        render_template_string(&format!("{{{{formula:{}}}}}", formula), &ctx, &EmptyCollectionProvider)
    };

    assert_eq!(render(format!("{}1{}", "(".repeat(20), ")".repeat(20))), "1");
    for formula in [
        format!("{}1{}", "(".repeat(1000), ")".repeat(1000)),
        format!("{}1", "-".repeat(20_000)),
        format!("{}1{}", "[".repeat(1000), "]".repeat(1000)),
    ] {
        assert_eq!(render(formula), "#ERROR: Expression nested too deeply (limit 32)");
    }
}

#[test]
fn test_braces_inside_formula_strings() {
    let ctx = state_context(json!({ "name": "Ada" }));
    let render = |source: &str| render_template_string(source, &ctx, &EmptyCollectionProvider);

    assert_eq!(render("{{formula:'{' + 'x'}}"), "{x");
    assert_eq!(render("{{formula:'}' + {name}}}"), "}Ada");
    assert_eq!(render("[{{formula:'{' + {name} + '}'}}]"), "[{Ada}]");
}
