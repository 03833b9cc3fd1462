//! Locale-aware formatting of resolved template values.
//!
//! A format spec is the segment after the pipe in `{{price|currency:USD}}`.
//! Formatting is total: `null` becomes the empty string, and values that do
//! not fit the requested kind print in their plain form instead of failing.

pub mod date;
pub mod locale;
pub mod number;
pub mod spec;

pub use date::{apply_pattern, format_temporal, parse_datetime_str, to_datetime};
pub use locale::Locale;
pub use spec::{FormatKind, FormatSpec};

use bindery_types::{display_value, to_number};
use serde_json::Value;

pub const DEFAULT_CURRENCY: &str = "USD";
pub const DEFAULT_NUMBER_DECIMALS: usize = 2;
pub const DEFAULT_PERCENT_DECIMALS: usize = 0;

/// Formats a value with the default (`en-US`) locale.
pub fn format_value(value: &Value, spec: &FormatSpec) -> String {
    format_value_with_locale(value, spec, &Locale::default())
}

/// Formats a value. A trailing locale argument in the spec (`number:2:de-DE`)
/// takes precedence over `locale`.
pub fn format_value_with_locale(value: &Value, spec: &FormatSpec, locale: &Locale) -> String {
    if value.is_null() {
        return String::new();
    }
    match spec.kind {
        FormatKind::Date | FormatKind::Time | FormatKind::DateTime => format_temporal(value, spec),
        FormatKind::Number | FormatKind::Currency | FormatKind::Percentage => {
            format_numeric(value, spec, locale)
        }
    }
}

fn format_numeric(value: &Value, spec: &FormatSpec, locale: &Locale) -> String {
    let Some(n) = to_number(value) else {
        log::debug!(
            "Value {} is not numeric; ignoring '{}' format",
            value,
            spec.kind.as_str()
        );
        return display_value(value);
    };

    let override_locale = spec
        .args
        .iter()
        .skip(1)
        .find(|a| Locale::looks_like_tag(a))
        .map(|tag| Locale::parse(tag));
    let locale = override_locale.as_ref().unwrap_or(locale);

    match spec.kind {
        FormatKind::Percentage => {
            let decimals = decimals_arg(spec, DEFAULT_PERCENT_DECIMALS);
            number::format_percentage(n, decimals, locale)
        }
        FormatKind::Currency => {
            let code = spec
                .arg(0)
                .filter(|c| c.len() == 3 && c.chars().all(|ch| ch.is_ascii_alphabetic()))
                .unwrap_or(DEFAULT_CURRENCY);
            number::format_currency(n, code, locale)
        }
        _ => {
            let decimals = decimals_arg(spec, DEFAULT_NUMBER_DECIMALS);
            number::format_fixed(n, decimals, locale)
        }
    }
}

fn decimals_arg(spec: &FormatSpec, default: usize) -> usize {
    spec.arg(0)
        .and_then(|a| a.parse::<usize>().ok())
        .map(|d| d.min(20))
        .unwrap_or(default)
}
