//! Fixed-decimal number, currency and percentage rendering.

use crate::locale::{Locale, group_digits};

/// Formats `n` with exactly `decimals` fraction digits and locale grouping.
pub fn format_fixed(n: f64, decimals: usize, locale: &Locale) -> String {
    let rounded = format!("{:.*}", decimals, n.abs());
    let (int_part, frac_part) = match rounded.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (rounded.as_str(), None),
    };

    // `-0.00` prints as `0.00`
    let negative = n < 0.0 && rounded.bytes().any(|b| b.is_ascii_digit() && b != b'0');

    let mut out = String::with_capacity(rounded.len() + 4);
    if negative {
        out.push('-');
    }
    out.push_str(&group_digits(int_part, locale.group_separator));
    if let Some(frac) = frac_part {
        out.push(locale.decimal_separator);
        out.push_str(frac);
    }
    out
}

/// Symbol and default fraction digits for a currency code.
pub fn currency_info(code: &str) -> (Option<&'static str>, usize) {
    match code {
        "USD" => (Some("$"), 2),
        "EUR" => (Some("€"), 2),
        "GBP" => (Some("£"), 2),
        "JPY" => (Some("¥"), 0),
        "CNY" => (Some("CN¥"), 2),
        "INR" => (Some("₹"), 2),
        "KRW" => (Some("₩"), 0),
        "CHF" => (Some("CHF"), 2),
        "CAD" => (Some("CA$"), 2),
        "AUD" => (Some("A$"), 2),
        _ => (None, 2),
    }
}

/// Formats an amount in the given 3-letter currency.
pub fn format_currency(n: f64, code: &str, locale: &Locale) -> String {
    let code = code.trim().to_ascii_uppercase();
    let (symbol, decimals) = currency_info(&code);
    let amount = format_fixed(n.abs(), decimals, locale);
    let negative = n < 0.0 && amount.bytes().any(|b| b.is_ascii_digit() && b != b'0');
    let sign = if negative { "-" } else { "" };

    match (symbol, locale.currency_after) {
        (Some(symbol), false) if symbol.chars().all(|c| !c.is_ascii_alphabetic()) => {
            format!("{}{}{}", sign, symbol, amount)
        }
        (Some(symbol), false) => format!("{}{}\u{a0}{}", sign, symbol, amount),
        (None, false) => format!("{}{}\u{a0}{}", sign, code, amount),
        (symbol, true) => format!("{}{}\u{a0}{}", sign, amount, symbol.unwrap_or(code.as_str())),
    }
}

/// Formats a 0–1 fraction as a percentage: `0.856` with 1 decimal is `85.6%`.
pub fn format_percentage(fraction: f64, decimals: usize, locale: &Locale) -> String {
    let number = format_fixed(fraction * 100.0, decimals, locale);
    match locale.percent_separator {
        Some(sep) => format!("{}{}%", number, sep),
        None => format!("{}%", number),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_fixed() {
        let en = Locale::en_us();
        assert_eq!(format_fixed(1234.5, 2, &en), "1,234.50");
        assert_eq!(format_fixed(-1234567.891, 1, &en), "-1,234,567.9");
        assert_eq!(format_fixed(0.0, 0, &en), "0");
        assert_eq!(format_fixed(-0.001, 2, &en), "0.00");
        assert_eq!(format_fixed(1234.5, 2, &Locale::parse("de-DE")), "1.234,50");
    }

    #[test]
    fn test_format_currency() {
        let en = Locale::en_us();
        assert_eq!(format_currency(99.99, "USD", &en), "$99.99");
        assert_eq!(format_currency(10.0, "usd", &en), "$10.00");
        assert_eq!(format_currency(-5.5, "GBP", &en), "-£5.50");
        assert_eq!(format_currency(1500.4, "JPY", &en), "¥1,500");
        assert_eq!(format_currency(3.0, "XYZ", &en), "XYZ\u{a0}3.00");
        assert_eq!(format_currency(3.0, "CHF", &en), "CHF\u{a0}3.00");
        assert_eq!(
            format_currency(1234.5, "EUR", &Locale::parse("de-DE")),
            "1.234,50\u{a0}€"
        );
    }

    #[test]
    fn test_format_percentage() {
        let en = Locale::en_us();
        assert_eq!(format_percentage(0.856, 1, &en), "85.6%");
        assert_eq!(format_percentage(0.5, 0, &en), "50%");
        assert_eq!(format_percentage(12.0, 0, &en), "1,200%");
        assert_eq!(format_percentage(0.25, 0, &Locale::parse("de-DE")), "25\u{a0}%");
    }
}
