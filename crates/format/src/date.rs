//! Date coercion and the `YYYY-MM-DD`-style mini-format.

use crate::spec::{FormatKind, FormatSpec};
use bindery_types::display_value;
use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike};
use regex::{Captures, Regex};
use serde_json::Value;
use std::sync::LazyLock;

pub const DEFAULT_DATE_PATTERN: &str = "MM/DD/YYYY";
pub const DEFAULT_TIME_PATTERN: &str = "hh:mm A";
pub const DEFAULT_DATETIME_PATTERN: &str = "MM/DD/YYYY hh:mm A";

// Leftmost-first alternation: longer tokens must come before their prefixes.
// `[...]` is literal text and is emitted without the brackets.
static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[[^\]]*\]|YYYY|YY|MM|M|DD|D|HH|H|hh|h|mm|m|ss|s|a|A")
        .expect("BUG: invalid TOKEN_RE regex literal")
});

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"];

const TIME_FORMATS: &[&str] = &["%H:%M:%S%.f", "%H:%M"];

/// Coerces a value to a local date-time.
///
/// Accepts RFC 3339 strings (converted to local time), ISO-like date-times
/// without offset, bare dates (midnight), bare times (on 1970-01-01) and
/// numbers as epoch milliseconds.
pub fn to_datetime(value: &Value) -> Option<NaiveDateTime> {
    match value {
        Value::String(s) => parse_datetime_str(s.trim()),
        Value::Number(n) => {
            let millis = n.as_f64().filter(|m| m.is_finite())?;
            Local
                .timestamp_millis_opt(millis as i64)
                .single()
                .map(|dt| dt.naive_local())
        }
        _ => None,
    }
}

pub fn parse_datetime_str(s: &str) -> Option<NaiveDateTime> {
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Local).naive_local());
    }
    if let Some(dt) = DATETIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
    {
        return Some(dt);
    }
    if let Some(date) = DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(s, f).ok())
    {
        return Some(date.and_time(NaiveTime::MIN));
    }
    TIME_FORMATS
        .iter()
        .find_map(|f| NaiveTime::parse_from_str(s, f).ok())
        .map(|time| NaiveDate::default().and_time(time))
}

/// Substitutes mini-format tokens in `pattern` with parts of `dt`. Letters
/// that must print as-is go in brackets: `[Due] DD.MM` gives `Due 05.03`.
pub fn apply_pattern(dt: &NaiveDateTime, pattern: &str) -> String {
    TOKEN_RE
        .replace_all(pattern, |caps: &Captures| {
            let hour12 = match dt.hour() % 12 {
                0 => 12,
                h => h,
            };
            match &caps[0] {
                "YYYY" => format!("{:04}", dt.year()),
                "YY" => format!("{:02}", dt.year().rem_euclid(100)),
                "MM" => format!("{:02}", dt.month()),
                "M" => dt.month().to_string(),
                "DD" => format!("{:02}", dt.day()),
                "D" => dt.day().to_string(),
                "HH" => format!("{:02}", dt.hour()),
                "H" => dt.hour().to_string(),
                "hh" => format!("{:02}", hour12),
                "h" => hour12.to_string(),
                "mm" => format!("{:02}", dt.minute()),
                "m" => dt.minute().to_string(),
                "ss" => format!("{:02}", dt.second()),
                "s" => dt.second().to_string(),
                "a" => (if dt.hour() < 12 { "am" } else { "pm" }).to_string(),
                "A" => (if dt.hour() < 12 { "AM" } else { "PM" }).to_string(),
                quoted if quoted.starts_with('[') => quoted[1..quoted.len() - 1].to_string(),
                other => other.to_string(),
            }
        })
        .into_owned()
}

/// Formats a value under a `date`, `time` or `datetime` spec. Values that
/// cannot be read as a date print as their plain string form.
pub fn format_temporal(value: &Value, spec: &FormatSpec) -> String {
    let pattern = spec.pattern().unwrap_or_else(|| {
        match spec.kind {
            FormatKind::Time => DEFAULT_TIME_PATTERN,
            FormatKind::DateTime => DEFAULT_DATETIME_PATTERN,
            _ => DEFAULT_DATE_PATTERN,
        }
        .to_string()
    });

    match to_datetime(value) {
        Some(dt) => apply_pattern(&dt, &pattern),
        None => {
            log::debug!("Value {} is not a date; printing it unformatted", value);
            display_value(value)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn dt(s: &str) -> NaiveDateTime {
        parse_datetime_str(s).unwrap()
    }

    #[test]
    fn test_parse_common_shapes() {
        assert_eq!(dt("2024-03-05").to_string(), "2024-03-05 00:00:00");
        assert_eq!(dt("2024-03-05T14:07:09").to_string(), "2024-03-05 14:07:09");
        assert_eq!(dt("2024-03-05 14:07").to_string(), "2024-03-05 14:07:00");
        assert_eq!(dt("03/05/2024").to_string(), "2024-03-05 00:00:00");
        assert_eq!(dt("14:07:09").to_string(), "1970-01-01 14:07:09");
        assert!(parse_datetime_str("not a date").is_none());
        assert!(parse_datetime_str("").is_none());
    }

    #[test]
    fn test_apply_pattern_tokens() {
        let d = dt("2024-03-05T14:07:09");
        assert_eq!(apply_pattern(&d, "YYYY-MM-DD"), "2024-03-05");
        assert_eq!(apply_pattern(&d, "D/M/YY"), "5/3/24");
        assert_eq!(apply_pattern(&d, "HH:mm:ss"), "14:07:09");
        assert_eq!(apply_pattern(&d, "h:m:s a"), "2:7:9 pm");
        assert_eq!(apply_pattern(&d, "hh:mm A"), "02:07 PM");
        assert_eq!(apply_pattern(&dt("2024-03-05T00:30:00"), "h A"), "12 AM");
    }

    #[test]
    fn test_bracketed_text_is_literal() {
        let d = dt("2024-03-05T14:07:09");
        assert_eq!(apply_pattern(&d, "[Date:] DD.MM.YYYY"), "Date: 05.03.2024");
        assert_eq!(apply_pattern(&d, "YYYY[Y]MM"), "2024Y03");
        assert_eq!(apply_pattern(&d, "[]D"), "5");
        assert_eq!(apply_pattern(&d, "[open D"), "[open 5");
    }

    #[test]
    fn test_format_temporal_defaults_and_fallback() {
        let date = FormatSpec::new(FormatKind::Date);
        assert_eq!(format_temporal(&json!("2024-12-25"), &date), "12/25/2024");

        let time = FormatSpec::parse("time:HH:mm").unwrap();
        assert_eq!(format_temporal(&json!("2024-12-25T09:05:00"), &time), "09:05");

        let datetime = FormatSpec::new(FormatKind::DateTime);
        assert_eq!(
            format_temporal(&json!("2024-12-25T18:45:00"), &datetime),
            "12/25/2024 06:45 PM"
        );

        assert_eq!(format_temporal(&json!("soon"), &date), "soon");
        assert_eq!(format_temporal(&json!(true), &date), "true");
    }
}
