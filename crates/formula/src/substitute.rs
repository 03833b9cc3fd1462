//! Placeholder substitution that runs before a formula is parsed.
//!
//! `{{path}}` and `{path}` are replaced by the JSON encoding of the resolved
//! value, so strings arrive quoted and arrays arrive as array literals.
//! Text inside string literals is never touched.
use bindery_jpath::{EvaluationContext, resolve};
use serde_json::Value;

/// Characters that cannot appear in a single-brace placeholder. Their
/// presence means the brace opens an object literal instead.
const NON_PATH_CHARS: &[char] = &['{', '"', '\'', ':', ','];

pub fn substitute_placeholders(formula: &str, e_ctx: &EvaluationContext) -> String {
    let mut out = String::with_capacity(formula.len());
    let mut rest = formula;

    while let Some(c) = rest.chars().next() {
        match c {
            '\'' | '"' => {
                let len = quoted_len(rest, c);
                out.push_str(&rest[..len]);
                rest = &rest[len..];
            }
            '{' => match placeholder(rest) {
                Some((path, consumed)) => {
                    out.push_str(&encode(&resolve(path, e_ctx)));
                    rest = &rest[consumed..];
                }
                None => {
                    out.push('{');
                    rest = &rest[1..];
                }
            },
            _ => {
                out.push(c);
                rest = &rest[c.len_utf8()..];
            }
        }
    }
    out
}

/// Byte length of the string literal at the start of `input`, including both
/// quotes. An unterminated literal runs to the end of the input.
fn quoted_len(input: &str, quote: char) -> usize {
    let mut escaped = false;
    for (i, c) in input.char_indices().skip(1) {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            c if c == quote => return i + c.len_utf8(),
            _ => {}
        }
    }
    input.len()
}

/// Recognizes `{{path}}` or `{path}` at the start of `input`, returning the
/// trimmed path and the number of bytes consumed.
fn placeholder(input: &str) -> Option<(&str, usize)> {
    if let Some(body) = input.strip_prefix("{{")
        && let Some(end) = body.find("}}")
    {
        let path = body[..end].trim();
        return (!path.is_empty()).then_some((path, end + 4));
    }

    let body = &input[1..];
    let end = body.find('}')?;
    let path = body[..end].trim();
    if path.is_empty() || path.contains(NON_PATH_CHARS) {
        return None;
    }
    Some((path, end + 2))
}

fn encode(value: &Value) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "null".to_string())
}
