//! Number conventions for the locales the builder offers.

const NBSP: char = '\u{a0}';
const NARROW_NBSP: char = '\u{202f}';

/// Separators and symbol placement for one locale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locale {
    tag: String,
    pub group_separator: char,
    pub decimal_separator: char,
    /// `true` when the currency symbol follows the amount (`9,99 €`).
    pub currency_after: bool,
    /// Character placed between a number and `%`, if any.
    pub percent_separator: Option<char>,
}

impl Locale {
    pub fn en_us() -> Self {
        Self {
            tag: "en-US".to_string(),
            group_separator: ',',
            decimal_separator: '.',
            currency_after: false,
            percent_separator: None,
        }
    }

    /// Resolves a BCP-47 style tag. Unknown tags fall back to `en-US`.
    pub fn parse(tag: &str) -> Self {
        let normalized = tag.trim().replace('_', "-");
        let (group, decimal, after, percent) = match normalized.to_ascii_lowercase().as_str() {
            "en-us" | "en" | "en-gb" | "en-au" | "en-ca" | "ja-jp" | "ja" | "zh-cn" => {
                (',', '.', false, None)
            }
            "de-de" | "de" | "es-es" | "es" | "it-it" | "it" | "pt-br" | "pt" | "nl-nl" => {
                ('.', ',', true, Some(NBSP))
            }
            "fr-fr" | "fr" => (NARROW_NBSP, ',', true, Some(NARROW_NBSP)),
            other => {
                log::debug!("Unknown locale '{}', using en-US conventions", other);
                return Self::en_us();
            }
        };
        Self {
            tag: normalized,
            group_separator: group,
            decimal_separator: decimal,
            currency_after: after,
            percent_separator: percent,
        }
    }

    /// Heuristic used to tell a trailing locale argument (`de-DE`) from a
    /// decimal count or currency code.
    pub fn looks_like_tag(arg: &str) -> bool {
        let mut parts = arg.split(['-', '_']);
        let language = parts.next().unwrap_or_default();
        let region = parts.next();
        language.len() == 2
            && language.chars().all(|c| c.is_ascii_alphabetic())
            && region.is_some_and(|r| r.len() == 2 && r.chars().all(|c| c.is_ascii_alphabetic()))
            && parts.next().is_none()
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }
}

impl Default for Locale {
    fn default() -> Self {
        Self::en_us()
    }
}

/// Inserts a group separator every three digits from the right.
pub(crate) fn group_digits(digits: &str, separator: char) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3 * separator.len_utf8());
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(separator);
        }
        out.push(ch);
    }
    out
}
