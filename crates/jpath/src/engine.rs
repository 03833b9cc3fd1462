//! The evaluation engine for resolving a parsed path against a context.
use super::aggregate::{AggregateFn, aggregate, evaluate_aggregation};
use super::ast::{PathExpr, PathSegment};
use super::context::Context;
use super::parser::parse_path;
use bindery_traits::{CollectionProvider, ProviderError};
use serde_json::Value;
use std::borrow::Cow;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M:%S";
pub const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Root names that are computed rather than looked up.
pub const SYNTHETIC_ROOTS: &[&str] = &[
    "item",
    "index",
    "user",
    "now",
    "today",
    "tomorrow",
    "yesterday",
];

pub fn is_synthetic(name: &str) -> bool {
    SYNTHETIC_ROOTS.contains(&name)
}

/// A container for all state needed during path evaluation.
#[derive(Clone, Copy)]
pub struct EvaluationContext<'a> {
    pub context: &'a Context,
    pub provider: &'a dyn CollectionProvider,
}

impl<'a> EvaluationContext<'a> {
    pub fn new(context: &'a Context, provider: &'a dyn CollectionProvider) -> Self {
        Self { context, provider }
    }

    /// The same provider over a different context (e.g., a scoped row).
    pub fn with_context<'b>(&self, context: &'b Context) -> EvaluationContext<'b>
    where
        'a: 'b,
    {
        EvaluationContext {
            context,
            provider: self.provider,
        }
    }
}

/// Resolves a path string. Unparseable paths and misses at any depth yield `null`.
pub fn resolve(path: &str, e_ctx: &EvaluationContext) -> Value {
    match parse_path(path) {
        Ok(expr) => resolve_path(&expr, e_ctx),
        Err(e) => {
            log::debug!("Unresolvable path: {}", e);
            Value::Null
        }
    }
}

/// Resolves a compiled path.
pub fn resolve_path(expr: &PathExpr, e_ctx: &EvaluationContext) -> Value {
    match expr.split_call() {
        (prefix, Some((func, field))) => resolve_aggregation(prefix, func, field, e_ctx),
        (segments, None) => select(segments, e_ctx),
    }
}

fn select(segments: &[PathSegment], e_ctx: &EvaluationContext) -> Value {
    let Some((PathSegment::Key(root), rest)) = segments.split_first() else {
        return Value::Null;
    };
    match resolve_root(root, rest, e_ctx) {
        Some((base, rest)) => walk(&base, rest).cloned().unwrap_or(Value::Null),
        None => Value::Null,
    }
}

fn resolve_aggregation(
    prefix: &[PathSegment],
    func: AggregateFn,
    field: Option<&str>,
    e_ctx: &EvaluationContext,
) -> Value {
    // A bare table name goes straight to the provider so its rows are not
    // copied into a JSON array first.
    if let [PathSegment::Key(name)] = prefix
        && !is_synthetic(name)
        && e_ctx.context.lookup(name).is_none()
    {
        return evaluate_aggregation(name, func, field, e_ctx.provider);
    }

    match select(prefix, e_ctx) {
        Value::Array(rows) => aggregate(&rows, func, field),
        other => {
            if !other.is_null() {
                log::debug!("Cannot aggregate a non-collection value; treating as empty");
            }
            aggregate(&[], func, field)
        }
    }
}

/// Resolves the first segment, returning the base value and the segments
/// still to walk. Synthetic roots such as `now.date` may consume more than one.
fn resolve_root<'a, 's>(
    root: &str,
    rest: &'s [PathSegment],
    e_ctx: &EvaluationContext<'a>,
) -> Option<(Cow<'a, Value>, &'s [PathSegment])> {
    let ctx = e_ctx.context;
    let now = ctx.now();
    let formatted = |fmt: &str, date: chrono::NaiveDateTime| {
        Cow::Owned(Value::String(date.format(fmt).to_string()))
    };

    match root {
        "item" => ctx.item().map(|item| (Cow::Borrowed(item), rest)),
        "index" => ctx.index().map(|i| (Cow::Owned(Value::from(i)), rest)),
        "user" => ctx.user().map(|user| (Cow::Borrowed(user), rest)),
        "now" => match rest.split_first() {
            Some((PathSegment::Key(k), tail)) if k == "date" => {
                Some((formatted(DATE_FORMAT, now), tail))
            }
            Some((PathSegment::Key(k), tail)) if k == "time" => {
                Some((formatted(TIME_FORMAT, now), tail))
            }
            _ => Some((formatted(DATETIME_FORMAT, now), rest)),
        },
        "today" => Some((formatted(DATE_FORMAT, now), rest)),
        "tomorrow" => now
            .date()
            .succ_opt()
            .map(|d| (formatted(DATE_FORMAT, d.and_time(now.time())), rest)),
        "yesterday" => now
            .date()
            .pred_opt()
            .map(|d| (formatted(DATE_FORMAT, d.and_time(now.time())), rest)),
        name => match ctx.lookup(name) {
            Some(value) => Some((Cow::Borrowed(value), rest)),
            None => resolve_table(name, rest, e_ctx),
        },
    }
}

/// Falls back to the table namespace. A directly following index picks a
/// single row without materializing the whole table.
fn resolve_table<'a, 's>(
    name: &str,
    rest: &'s [PathSegment],
    e_ctx: &EvaluationContext<'a>,
) -> Option<(Cow<'a, Value>, &'s [PathSegment])> {
    let rows = match e_ctx.provider.query(name) {
        Ok(rows) => rows,
        Err(ProviderError::NotFound(_)) => {
            log::debug!("'{}' is neither a context variable nor a table", name);
            return None;
        }
        Err(e) => {
            log::warn!(
                "Provider '{}' failed for '{}': {}",
                e_ctx.provider.name(),
                name,
                e
            );
            return None;
        }
    };

    match rest.split_first() {
        Some((PathSegment::Index(i), tail)) => rows
            .get(*i)
            .map(|row| (Cow::Owned(Value::Object(row.clone())), tail)),
        _ => Some((
            Cow::Owned(Value::Array(
                rows.iter().cloned().map(Value::Object).collect(),
            )),
            rest,
        )),
    }
}

fn walk<'v>(mut current: &'v Value, segments: &[PathSegment]) -> Option<&'v Value> {
    for segment in segments {
        current = match segment {
            PathSegment::Key(k) => step(current, k)?,
            PathSegment::Index(i) => current.as_array()?.get(*i)?,
            PathSegment::Call { .. } => return None,
        };
    }
    Some(current)
}

/// One key step. Numeric keys index arrays (`items.0`).
fn step<'v>(value: &'v Value, key: &str) -> Option<&'v Value> {
    match value {
        Value::Object(map) => map.get(key),
        Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    }
}
