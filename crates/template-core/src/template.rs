//! Splits magic text such as `"Total: {{orders.sum(total)|currency:USD}}"`
//! into literal and expression tokens.
use bindery_format::FormatSpec;
use std::fmt;

pub const OPEN: &str = "{{";
pub const CLOSE: &str = "}}";
const FORMULA_PREFIX: &str = "formula:";

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Literal(String),
    Expression {
        /// The token exactly as written, delimiters included.
        source: String,
        /// Everything before the format pipe, trimmed, with `\|` unescaped.
        path: String,
        format: Option<FormatSpec>,
    },
}

impl Token {
    /// The text this token was parsed from.
    pub fn source(&self) -> &str {
        match self {
            Token::Literal(text) => text,
            Token::Expression { source, .. } => source,
        }
    }

    pub fn is_expression(&self) -> bool {
        matches!(self, Token::Expression { .. })
    }
}

/// A parsed template. Concatenating the token sources reproduces the input.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    tokens: Vec<Token>,
}

impl Template {
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// True when the template contains no expressions.
    pub fn is_static(&self) -> bool {
        !self.tokens.iter().any(Token::is_expression)
    }

    /// The path and format when the whole template is one expression token.
    pub fn single_expression(&self) -> Option<(&str, Option<&FormatSpec>)> {
        match self.tokens.as_slice() {
            [Token::Expression { path, format, .. }] => Some((path, format.as_ref())),
            _ => None,
        }
    }

    pub fn to_source(&self) -> String {
        self.tokens.iter().map(Token::source).collect()
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.tokens.iter().try_for_each(|t| f.write_str(t.source()))
    }
}

/// Parses a template. Never fails: an unterminated `{{` stays literal text.
pub fn parse_template(source: &str) -> Template {
    let mut tokens = Vec::new();
    let mut literal = String::new();
    let mut rest = source;

    while let Some(start) = rest.find(OPEN) {
        let body = &rest[start + OPEN.len()..];
        let Some(end) = find_close(body) else {
            log::debug!("Unterminated '{{{{' kept as literal text in '{}'", source);
            break;
        };

        literal.push_str(&rest[..start]);
        if !literal.is_empty() {
            tokens.push(Token::Literal(std::mem::take(&mut literal)));
        }

        let token_len = OPEN.len() + end + CLOSE.len();
        tokens.push(expression_token(&rest[start..start + token_len], &body[..end]));
        rest = &rest[start + token_len..];
    }

    literal.push_str(rest);
    if !literal.is_empty() || tokens.is_empty() {
        tokens.push(Token::Literal(literal));
    }
    Template { tokens }
}

/// Finds the closing `}}` for a body that starts just after `{{`. Single
/// braces nest, so `{{formula:{a}*{b}}}` closes at the final `}}`. In a
/// formula, braces inside quoted strings are text; a formula whose quote never
/// closes falls back to plain brace counting.
fn find_close(body: &str) -> Option<usize> {
    if body.trim_start().starts_with(FORMULA_PREFIX)
        && let Some(end) = scan_close(body, true)
    {
        return Some(end);
    }
    scan_close(body, false)
}

fn scan_close(body: &str, skip_strings: bool) -> Option<usize> {
    let bytes = body.as_bytes();
    let mut depth = 0usize;
    let mut quote = None;
    let mut i = 0;
    while i < bytes.len() {
        match (quote, bytes[i]) {
            (Some(_), b'\\') => i += 1,
            (Some(q), b) if b == q => quote = None,
            (Some(_), _) => {}
            (None, b @ (b'\'' | b'"')) if skip_strings => quote = Some(b),
            (None, b'{') => depth += 1,
            (None, b'}') if depth > 0 => depth -= 1,
            (None, b'}') if bytes.get(i + 1) == Some(&b'}') => return Some(i),
            _ => {}
        }
        i += 1;
    }
    None
}

fn expression_token(source: &str, inner: &str) -> Token {
    let (path, format) = match format_pipe(inner) {
        Some(pipe) => (&inner[..pipe], FormatSpec::parse(inner[pipe + 1..].trim())),
        None => (inner, None),
    };
    Token::Expression {
        source: source.to_string(),
        path: path.trim().replace("\\|", "|"),
        format,
    }
}

/// Position of the last pipe that is neither escaped nor part of `||`.
fn format_pipe(inner: &str) -> Option<usize> {
    let bytes = inner.as_bytes();
    (0..bytes.len()).rev().find(|&i| {
        bytes[i] == b'|'
            && bytes.get(i + 1) != Some(&b'|')
            && (i == 0 || (bytes[i - 1] != b'|' && bytes[i - 1] != b'\\'))
    })
}
