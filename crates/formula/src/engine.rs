//! The tree-walking interpreter for parsed formulas.
use super::ast::{BinaryOperator, Expression};
use super::functions::builtin_functions;
use super::operators::{evaluate_binary, evaluate_unary};
use crate::error::FormulaError;
use bindery_jpath::{EvaluationContext, resolve};
use bindery_types::{is_truthy, to_number};
use serde_json::{Map, Value};

/// Deepest expression tree the interpreter will walk.
pub const MAX_EVAL_DEPTH: usize = 512;

/// Evaluates a compiled formula. Only functions of the built-in library can
/// be called; there is no other way for a formula to reach the host.
pub fn evaluate(expr: &Expression, e_ctx: &EvaluationContext) -> Result<Value, FormulaError> {
    evaluate_at(expr, e_ctx, 0)
}

fn evaluate_at(
    expr: &Expression,
    e_ctx: &EvaluationContext,
    depth: usize,
) -> Result<Value, FormulaError> {
    if depth > MAX_EVAL_DEPTH {
        return Err(FormulaError::TooDeep(MAX_EVAL_DEPTH));
    }
    let eval = |e: &Expression| evaluate_at(e, e_ctx, depth + 1);

    match expr {
        Expression::Literal(val) => Ok(val.clone()),
        Expression::Path(path) => Ok(resolve(path, e_ctx)),
        Expression::Array(items) => items
            .iter()
            .map(eval)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Expression::Object(entries) => {
            let mut map = Map::with_capacity(entries.len());
            for (key, value) in entries {
                map.insert(key.clone(), eval(value)?);
            }
            Ok(Value::Object(map))
        }
        Expression::UnaryOp { op, expr } => evaluate_unary(*op, eval(expr)?),
        Expression::BinaryOp { left, op, right } => {
            let left_val = eval(left)?;
            match op {
                BinaryOperator::And if !is_truthy(&left_val) => Ok(left_val),
                BinaryOperator::Or if is_truthy(&left_val) => Ok(left_val),
                BinaryOperator::And | BinaryOperator::Or => eval(right),
                _ => evaluate_binary(*op, left_val, eval(right)?),
            }
        }
        Expression::Conditional {
            condition,
            then,
            otherwise,
        } => {
            if is_truthy(&eval(condition)?) {
                eval(then)
            } else {
                eval(otherwise)
            }
        }
        Expression::FunctionCall { name, args } if name.eq_ignore_ascii_case("if") => {
            evaluate_if(args, eval)
        }
        Expression::FunctionCall { name, args } => {
            let function = builtin_functions()
                .get(name)
                .ok_or_else(|| FormulaError::UnknownFunction(name.clone()))?;
            let evaluated_args = args.iter().map(eval).collect::<Result<Vec<_>, _>>()?;
            function(e_ctx, evaluated_args)
        }
        Expression::Index { target, index } => {
            let target = eval(target)?;
            let index = eval(index)?;
            Ok(index_value(target, &index))
        }
    }
}

/// `if(condition, then, else?)`. Only the chosen branch is evaluated.
fn evaluate_if(
    args: &[Expression],
    eval: impl Fn(&Expression) -> Result<Value, FormulaError>,
) -> Result<Value, FormulaError> {
    let [condition, then, rest @ ..] = args else {
        return Err(FormulaError::function(
            "if",
            format!("expected 2 to 3 argument(s), got {}", args.len()),
        ));
    };
    if rest.len() > 1 {
        return Err(FormulaError::function(
            "if",
            format!("expected 2 to 3 argument(s), got {}", args.len()),
        ));
    }

    if is_truthy(&eval(condition)?) {
        eval(then)
    } else {
        rest.first().map_or(Ok(Value::Null), eval)
    }
}

/// Indexes arrays and strings by position and objects by key. Misses are `null`.
fn index_value(target: Value, index: &Value) -> Value {
    let position = || {
        to_number(index)
            .filter(|n| *n >= 0.0 && n.fract() == 0.0)
            .map(|n| n as usize)
    };
    match target {
        Value::Array(mut items) => match position() {
            Some(i) if i < items.len() => items.swap_remove(i),
            _ => Value::Null,
        },
        Value::Object(mut map) => {
            let key = match index {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            map.remove(&key).unwrap_or(Value::Null)
        }
        Value::String(s) => position()
            .and_then(|i| s.chars().nth(i))
            .map_or(Value::Null, |c| Value::String(c.to_string())),
        _ => Value::Null,
    }
}
