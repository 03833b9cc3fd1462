//! Operator semantics. Values are loosely typed: numeric strings take part in
//! arithmetic, and `+` concatenates when either side is a string.
use crate::ast::{BinaryOperator, UnaryOperator};
use crate::error::FormulaError;
use bindery_types::{display_value, is_truthy, number_value, to_number};
use serde_json::Value;
use std::cmp::Ordering;

/// Numeric coercion for arithmetic: `null` and blank strings are `0`,
/// booleans are `0`/`1`. Arrays, objects and non-numeric strings fail.
pub fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Null => Some(0.0),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::String(s) if s.trim().is_empty() => Some(0.0),
        other => to_number(other),
    }
}

pub(crate) fn finite(n: f64) -> Result<Value, FormulaError> {
    if n.is_finite() {
        Ok(number_value(n))
    } else {
        Err(FormulaError::TypeError(
            "Result is not a finite number".to_string(),
        ))
    }
}

fn operand(op: BinaryOperator, value: &Value) -> Result<f64, FormulaError> {
    coerce_number(value).ok_or_else(|| {
        FormulaError::TypeError(format!("Cannot apply '{}' to {}", op.symbol(), value))
    })
}

pub fn evaluate_unary(op: UnaryOperator, value: Value) -> Result<Value, FormulaError> {
    match op {
        UnaryOperator::Not => Ok(Value::Bool(!is_truthy(&value))),
        UnaryOperator::Minus | UnaryOperator::Plus => {
            let n = coerce_number(&value).ok_or_else(|| {
                FormulaError::TypeError(format!("Cannot negate {}", value))
            })?;
            finite(if op == UnaryOperator::Minus { -n } else { n })
        }
    }
}

/// Evaluates a non-short-circuiting binary operator.
pub fn evaluate_binary(
    op: BinaryOperator,
    left: Value,
    right: Value,
) -> Result<Value, FormulaError> {
    match op {
        BinaryOperator::Plus if left.is_string() || right.is_string() => Ok(Value::String(
            format!("{}{}", display_value(&left), display_value(&right)),
        )),
        BinaryOperator::Plus => finite(operand(op, &left)? + operand(op, &right)?),
        BinaryOperator::Minus => finite(operand(op, &left)? - operand(op, &right)?),
        BinaryOperator::Multiply => finite(operand(op, &left)? * operand(op, &right)?),
        BinaryOperator::Divide | BinaryOperator::Modulo => {
            let (l, r) = (operand(op, &left)?, operand(op, &right)?);
            if r == 0.0 {
                return Err(FormulaError::DivisionByZero);
            }
            finite(if op == BinaryOperator::Divide { l / r } else { l % r })
        }
        BinaryOperator::Equals => Ok(Value::Bool(loose_equals(&left, &right))),
        BinaryOperator::NotEquals => Ok(Value::Bool(!loose_equals(&left, &right))),
        BinaryOperator::StrictEquals => Ok(Value::Bool(strict_equals(&left, &right))),
        BinaryOperator::StrictNotEquals => Ok(Value::Bool(!strict_equals(&left, &right))),
        BinaryOperator::LessThan => Ok(Value::Bool(compare(&left, &right) == Some(Ordering::Less))),
        BinaryOperator::LessThanOrEqual => Ok(Value::Bool(matches!(
            compare(&left, &right),
            Some(Ordering::Less | Ordering::Equal)
        ))),
        BinaryOperator::GreaterThan => Ok(Value::Bool(
            compare(&left, &right) == Some(Ordering::Greater),
        )),
        BinaryOperator::GreaterThanOrEqual => Ok(Value::Bool(matches!(
            compare(&left, &right),
            Some(Ordering::Greater | Ordering::Equal)
        ))),
        // Short-circuit forms are handled by the engine; these are the eager fallbacks.
        BinaryOperator::And => Ok(if is_truthy(&left) { right } else { left }),
        BinaryOperator::Or => Ok(if is_truthy(&left) { left } else { right }),
    }
}

/// Same type and value; `1` and `1.0` are the same number.
fn strict_equals(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(l), Value::Number(r)) => l.as_f64() == r.as_f64(),
        _ => left == right,
    }
}

/// Equality with numeric coercion when either side is a number or boolean.
/// `null` equals only `null`.
fn loose_equals(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Null, Value::Null) => true,
        (Value::Null, _) | (_, Value::Null) => false,
        (Value::Number(_) | Value::Bool(_), _) | (_, Value::Number(_) | Value::Bool(_)) => {
            match (coerce_number(left), coerce_number(right)) {
                (Some(l), Some(r)) => l == r,
                _ => false,
            }
        }
        _ => strict_equals(left, right),
    }
}

/// Strings compare lexically with each other; everything else numerically.
/// Incomparable operands make every relational operator false.
fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::String(l), Value::String(r)) => Some(l.cmp(r)),
        _ => coerce_number(left)?.partial_cmp(&coerce_number(right)?),
    }
}
