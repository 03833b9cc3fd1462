//! Coercion helpers over `serde_json::Value`.
//!
//! Author-facing templates treat values loosely: numeric strings add up,
//! missing values print as nothing, and whole numbers never grow a `.0`.
//! Every crate in the workspace funnels its coercions through here so the
//! rules stay identical between paths, formulas and formatting.

use serde_json::{Map, Value};

/// A table row: a plain field → value map.
pub type Row = Map<String, Value>;

/// Coerces a value to a number. Numbers and numeric strings succeed;
/// everything else (including `null`, booleans and blank strings) does not.
pub fn to_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
        }
        _ => None,
    }
}

/// Builds a JSON number, preferring an integer representation for whole
/// values so `600.0` compares and prints as `600`. Non-finite input becomes
/// `null` because JSON cannot carry it.
pub fn number_value(n: f64) -> Value {
    if !n.is_finite() {
        return Value::Null;
    }
    if n.fract() == 0.0 && n.abs() < 9.0e15 {
        return Value::from(n as i64);
    }
    Value::from(n)
}

/// Prints a number the way a template author expects to see it.
pub fn format_number_plain(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 9.0e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// The plain string form of a value, used whenever no format spec applies.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => {
            if n.is_i64() || n.is_u64() {
                n.to_string()
            } else {
                n.as_f64().map(format_number_plain).unwrap_or_default()
            }
        }
        Value::Array(items) => items
            .iter()
            .map(display_value)
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}

/// Truthiness for conditionals: `null`, `false`, `0`, `""` are false.
/// Empty arrays and objects count as true.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// `null`, blank strings, empty arrays and empty objects are empty.
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}
