//! The `formula:` sub-language.
//!
//! A formula such as `formula:round({item.price} * {item.qty}, 2)` goes through
//! three stages: placeholder substitution, parsing into an [`Expression`] tree,
//! and interpretation against the fixed function library. Evaluation never
//! fails across the public boundary: errors surface as a `"#ERROR: ..."`
//! string value so one broken formula only blanks one value.

pub mod ast;
pub mod engine;
pub mod error;
pub mod functions;
pub mod operators;
mod parser;
mod substitute;

// --- Public API ---
pub use ast::{BinaryOperator, Expression, UnaryOperator};
pub use engine::evaluate;
pub use error::FormulaError;
pub use functions::{FormulaFunction, FunctionRegistry, builtin_functions};
pub use parser::parse_formula;
pub use substitute::substitute_placeholders;

use bindery_jpath::EvaluationContext;
use serde_json::Value;

pub const FORMULA_PREFIX: &str = "formula:";
pub const ERROR_PREFIX: &str = "#ERROR: ";

/// Returns the formula body if `source` starts with the `formula:` prefix.
pub fn strip_formula_prefix(source: &str) -> Option<&str> {
    source.trim_start().strip_prefix(FORMULA_PREFIX)
}

/// Whether a value is the error sentinel produced by [`evaluate_formula`].
pub fn is_error_value(value: &Value) -> bool {
    value.as_str().is_some_and(|s| s.starts_with(ERROR_PREFIX))
}

/// Substitutes, parses and evaluates a formula, with or without its prefix.
pub fn try_evaluate_formula(
    formula: &str,
    e_ctx: &EvaluationContext,
) -> Result<Value, FormulaError> {
    let body = strip_formula_prefix(formula).unwrap_or(formula);
    let substituted = substitute_placeholders(body, e_ctx);
    let expr = parse_formula(&substituted)?;
    evaluate(&expr, e_ctx)
}

/// Evaluates a formula, turning any failure into the `#ERROR: <message>` sentinel.
pub fn evaluate_formula(formula: &str, e_ctx: &EvaluationContext) -> Value {
    match try_evaluate_formula(formula, e_ctx) {
        Ok(value) => value,
        Err(e) => {
            log::debug!("Formula '{}' failed: {}", formula, e);
            Value::String(format!("{}{}", ERROR_PREFIX, e))
        }
    }
}
