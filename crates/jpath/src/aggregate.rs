//! Aggregations over row collections: `count`, `sum`, `avg`, `min`, `max`.
use crate::error::JPathError;
use bindery_traits::{CollectionProvider, ProviderError};
use bindery_types::{number_value, to_number};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateFn {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

impl AggregateFn {
    pub fn as_str(&self) -> &'static str {
        match self {
            AggregateFn::Count => "count",
            AggregateFn::Sum => "sum",
            AggregateFn::Avg => "avg",
            AggregateFn::Min => "min",
            AggregateFn::Max => "max",
        }
    }
}

impl fmt::Display for AggregateFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AggregateFn {
    type Err = JPathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "count" => Ok(AggregateFn::Count),
            "sum" => Ok(AggregateFn::Sum),
            "avg" | "average" => Ok(AggregateFn::Avg),
            "min" => Ok(AggregateFn::Min),
            "max" => Ok(AggregateFn::Max),
            _ => Err(JPathError::UnknownAggregate(s.to_string())),
        }
    }
}

/// Reads `field` from a row; rows that are not objects have no fields.
fn field_number(row: &Value, field: Option<&str>) -> Option<f64> {
    match field {
        Some(name) => row.get(name).and_then(to_number),
        None => to_number(row),
    }
}

/// Aggregates a slice of rows.
///
/// Without a field, `sum`/`avg`/`min`/`max` operate on the rows themselves,
/// which lets plain number arrays be aggregated too. Non-numeric values count
/// as `0` for `sum` and `avg` and are skipped by `min` and `max`. An empty
/// input yields `0`, except `min`/`max` which yield `null`.
pub fn aggregate(rows: &[Value], func: AggregateFn, field: Option<&str>) -> Value {
    match func {
        AggregateFn::Count => Value::from(rows.len()),
        AggregateFn::Sum => number_value(sum(rows, field)),
        AggregateFn::Avg => {
            if rows.is_empty() {
                Value::from(0)
            } else {
                number_value(sum(rows, field) / rows.len() as f64)
            }
        }
        AggregateFn::Min => extreme(rows, field, f64::min),
        AggregateFn::Max => extreme(rows, field, f64::max),
    }
}

fn sum(rows: &[Value], field: Option<&str>) -> f64 {
    rows.iter()
        .map(|row| field_number(row, field).unwrap_or(0.0))
        .sum()
}

fn extreme(rows: &[Value], field: Option<&str>, pick: fn(f64, f64) -> f64) -> Value {
    rows.iter()
        .filter_map(|row| field_number(row, field))
        .reduce(pick)
        .map_or(Value::Null, number_value)
}

/// Fetches `collection` from the provider and aggregates it.
///
/// Provider failures are treated as an empty collection so the result is
/// always a definite value.
pub fn evaluate_aggregation(
    collection: &str,
    func: AggregateFn,
    field: Option<&str>,
    provider: &dyn CollectionProvider,
) -> Value {
    match provider.query(collection) {
        Ok(rows) => {
            let rows: Vec<Value> = rows.iter().cloned().map(Value::Object).collect();
            aggregate(&rows, func, field)
        }
        Err(ProviderError::NotFound(_)) => {
            log::debug!("Aggregating unknown collection '{}' as empty", collection);
            aggregate(&[], func, field)
        }
        Err(e) => {
            log::warn!(
                "Provider '{}' failed for '{}': {}; aggregating as empty",
                provider.name(),
                collection,
                e
            );
            aggregate(&[], func, field)
        }
    }
}
