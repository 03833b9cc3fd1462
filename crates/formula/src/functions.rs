//! Defines the registry and built-in implementations for formula functions.
//!
//! The library is fixed: formulas can only call what is registered here.
//! `if` is not in the registry because the engine evaluates it lazily.
use crate::error::FormulaError;
use crate::operators::{coerce_number, finite};
use bindery_format::to_datetime;
use bindery_jpath::engine::{DATE_FORMAT, DATETIME_FORMAT};
use bindery_jpath::{AggregateFn, EvaluationContext, aggregate};
use bindery_types::{display_value, is_empty_value};
use chrono::{Datelike, NaiveDateTime};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::LazyLock;

/// The signature for a formula function implementation.
pub type FormulaFunction =
    fn(e_ctx: &EvaluationContext, args: Vec<Value>) -> Result<Value, FormulaError>;

/// A registry to hold all available functions for the interpreter.
pub struct FunctionRegistry {
    functions: HashMap<String, FormulaFunction>,
}

impl FunctionRegistry {
    /// Creates a new, empty function registry.
    pub fn new() -> Self {
        Self {
            functions: HashMap::new(),
        }
    }

    /// Registers a new function.
    pub fn register(&mut self, name: &str, func: FormulaFunction) {
        self.functions.insert(name.to_lowercase(), func);
    }

    /// Finds a function by name (case-insensitive).
    pub fn get(&self, name: &str) -> Option<&FormulaFunction> {
        self.functions.get(&name.to_lowercase())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        let mut registry = Self::new();
        // Math
        registry.register("abs", abs);
        registry.register("round", round);
        registry.register("floor", floor);
        registry.register("ceil", ceil);
        registry.register("min", min);
        registry.register("max", max);
        registry.register("sqrt", sqrt);
        registry.register("pow", pow);
        // Aggregation
        registry.register("sum", sum);
        registry.register("avg", avg);
        registry.register("count", count);
        // String
        registry.register("length", length);
        registry.register("uppercase", uppercase);
        registry.register("lowercase", lowercase);
        registry.register("trim", trim);
        // Date
        registry.register("now", now);
        registry.register("today", today);
        registry.register("year", year);
        registry.register("month", month);
        registry.register("day", day);
        registry.register("daysBetween", days_between);
        // Conditional
        registry.register("isNull", is_null);
        registry.register("isNotNull", is_not_null);
        registry.register("isEmpty", is_empty);
        registry
    }
}

static BUILTINS: LazyLock<FunctionRegistry> = LazyLock::new(FunctionRegistry::default);

/// The shared registry of built-in functions.
pub fn builtin_functions() -> &'static FunctionRegistry {
    &BUILTINS
}

// --- Argument helpers ---

fn expect_args(
    function: &str,
    args: &[Value],
    min: usize,
    max: usize,
) -> Result<(), FormulaError> {
    if args.len() < min || args.len() > max {
        let expected = if min == max {
            min.to_string()
        } else {
            format!("{} to {}", min, max)
        };
        return Err(FormulaError::function(
            function,
            format!("expected {} argument(s), got {}", expected, args.len()),
        ));
    }
    Ok(())
}

fn number_arg(function: &str, args: &[Value], index: usize) -> Result<f64, FormulaError> {
    let value = args.get(index).unwrap_or(&Value::Null);
    coerce_number(value).ok_or_else(|| {
        FormulaError::function(function, format!("expected a number, got {}", value))
    })
}

fn date_arg(function: &str, args: &[Value], index: usize) -> Result<NaiveDateTime, FormulaError> {
    let value = args.get(index).unwrap_or(&Value::Null);
    to_datetime(value)
        .ok_or_else(|| FormulaError::function(function, format!("invalid date {}", value)))
}

/// A single array argument spreads into its elements; otherwise every
/// argument is one value.
fn spread(args: Vec<Value>) -> Vec<Value> {
    match <[Value; 1]>::try_from(args) {
        Ok([Value::Array(items)]) => items,
        Ok([single]) => vec![single],
        Err(args) => args,
    }
}

fn unary_math(function: &str, args: Vec<Value>, f: fn(f64) -> f64) -> Result<Value, FormulaError> {
    expect_args(function, &args, 1, 1)?;
    finite(f(number_arg(function, &args, 0)?))
}

fn string_map(function: &str, args: Vec<Value>, f: fn(&str) -> String) -> Result<Value, FormulaError> {
    expect_args(function, &args, 1, 1)?;
    Ok(Value::String(f(&display_value(&args[0]))))
}

// --- Math ---

fn abs(_e_ctx: &EvaluationContext, args: Vec<Value>) -> Result<Value, FormulaError> {
    unary_math("abs", args, f64::abs)
}

fn floor(_e_ctx: &EvaluationContext, args: Vec<Value>) -> Result<Value, FormulaError> {
    unary_math("floor", args, f64::floor)
}

fn ceil(_e_ctx: &EvaluationContext, args: Vec<Value>) -> Result<Value, FormulaError> {
    unary_math("ceil", args, f64::ceil)
}

fn sqrt(_e_ctx: &EvaluationContext, args: Vec<Value>) -> Result<Value, FormulaError> {
    expect_args("sqrt", &args, 1, 1)?;
    let n = number_arg("sqrt", &args, 0)?;
    if n < 0.0 {
        return Err(FormulaError::function("sqrt", "negative input"));
    }
    finite(n.sqrt())
}

fn pow(_e_ctx: &EvaluationContext, args: Vec<Value>) -> Result<Value, FormulaError> {
    expect_args("pow", &args, 2, 2)?;
    finite(number_arg("pow", &args, 0)?.powf(number_arg("pow", &args, 1)?))
}

/// `round(x)` or `round(x, decimals)`; halves round away from zero.
fn round(_e_ctx: &EvaluationContext, args: Vec<Value>) -> Result<Value, FormulaError> {
    expect_args("round", &args, 1, 2)?;
    let n = number_arg("round", &args, 0)?;
    let decimals = if args.len() > 1 {
        number_arg("round", &args, 1)?.clamp(0.0, 15.0) as i32
    } else {
        0
    };
    let factor = 10f64.powi(decimals);
    finite((n * factor).round() / factor)
}

fn min(_e_ctx: &EvaluationContext, args: Vec<Value>) -> Result<Value, FormulaError> {
    Ok(aggregate(&spread(args), AggregateFn::Min, None))
}

fn max(_e_ctx: &EvaluationContext, args: Vec<Value>) -> Result<Value, FormulaError> {
    Ok(aggregate(&spread(args), AggregateFn::Max, None))
}

// --- Aggregation ---

fn sum(_e_ctx: &EvaluationContext, args: Vec<Value>) -> Result<Value, FormulaError> {
    Ok(aggregate(&spread(args), AggregateFn::Sum, None))
}

fn avg(_e_ctx: &EvaluationContext, args: Vec<Value>) -> Result<Value, FormulaError> {
    Ok(aggregate(&spread(args), AggregateFn::Avg, None))
}

/// `count(array)` is its length; `count(null)` is `0`.
fn count(_e_ctx: &EvaluationContext, args: Vec<Value>) -> Result<Value, FormulaError> {
    let values = match spread(args) {
        single if single.len() == 1 && single[0].is_null() => Vec::new(),
        values => values,
    };
    Ok(aggregate(&values, AggregateFn::Count, None))
}

// --- String ---

fn length(_e_ctx: &EvaluationContext, args: Vec<Value>) -> Result<Value, FormulaError> {
    expect_args("length", &args, 1, 1)?;
    let len = match &args[0] {
        Value::Array(items) => items.len(),
        Value::Object(map) => map.len(),
        other => display_value(other).chars().count(),
    };
    Ok(Value::from(len))
}

fn uppercase(_e_ctx: &EvaluationContext, args: Vec<Value>) -> Result<Value, FormulaError> {
    string_map("uppercase", args, str::to_uppercase)
}

fn lowercase(_e_ctx: &EvaluationContext, args: Vec<Value>) -> Result<Value, FormulaError> {
    string_map("lowercase", args, str::to_lowercase)
}

fn trim(_e_ctx: &EvaluationContext, args: Vec<Value>) -> Result<Value, FormulaError> {
    string_map("trim", args, |s| s.trim().to_string())
}

// --- Date ---

fn now(e_ctx: &EvaluationContext, args: Vec<Value>) -> Result<Value, FormulaError> {
    expect_args("now", &args, 0, 0)?;
    Ok(Value::String(
        e_ctx.context.now().format(DATETIME_FORMAT).to_string(),
    ))
}

fn today(e_ctx: &EvaluationContext, args: Vec<Value>) -> Result<Value, FormulaError> {
    expect_args("today", &args, 0, 0)?;
    Ok(Value::String(
        e_ctx.context.now().format(DATE_FORMAT).to_string(),
    ))
}

fn year(_e_ctx: &EvaluationContext, args: Vec<Value>) -> Result<Value, FormulaError> {
    expect_args("year", &args, 1, 1)?;
    Ok(Value::from(date_arg("year", &args, 0)?.year()))
}

fn month(_e_ctx: &EvaluationContext, args: Vec<Value>) -> Result<Value, FormulaError> {
    expect_args("month", &args, 1, 1)?;
    Ok(Value::from(date_arg("month", &args, 0)?.month()))
}

fn day(_e_ctx: &EvaluationContext, args: Vec<Value>) -> Result<Value, FormulaError> {
    expect_args("day", &args, 1, 1)?;
    Ok(Value::from(date_arg("day", &args, 0)?.day()))
}

/// Whole calendar days from the first date to the second; negative when the
/// second is earlier.
fn days_between(_e_ctx: &EvaluationContext, args: Vec<Value>) -> Result<Value, FormulaError> {
    expect_args("daysBetween", &args, 2, 2)?;
    let start = date_arg("daysBetween", &args, 0)?.date();
    let end = date_arg("daysBetween", &args, 1)?.date();
    Ok(Value::from((end - start).num_days()))
}

// --- Conditional ---

fn is_null(_e_ctx: &EvaluationContext, args: Vec<Value>) -> Result<Value, FormulaError> {
    expect_args("isNull", &args, 1, 1)?;
    Ok(Value::Bool(args[0].is_null()))
}

fn is_not_null(_e_ctx: &EvaluationContext, args: Vec<Value>) -> Result<Value, FormulaError> {
    expect_args("isNotNull", &args, 1, 1)?;
    Ok(Value::Bool(!args[0].is_null()))
}

fn is_empty(_e_ctx: &EvaluationContext, args: Vec<Value>) -> Result<Value, FormulaError> {
    expect_args("isEmpty", &args, 1, 1)?;
    Ok(Value::Bool(is_empty_value(&args[0])))
}
