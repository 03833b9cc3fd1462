//! A `nom`-based recursive-descent parser for formulas.
//!
//! Precedence, lowest first: `?:`, `||`, `&&`, equality, relational,
//! additive, multiplicative, unary, postfix (`[i]`, `.key`), primary.

use super::ast::*;
use crate::error::FormulaError;
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{is_not, tag, take_while},
    character::complete::{alpha1, anychar, char, multispace0, satisfy},
    combinator::{map, map_res, opt, peek, recognize},
    error::{Error, ErrorKind},
    multi::{many0, separated_list0},
    number::complete::recognize_float,
    sequence::{delimited, pair, preceded, separated_pair},
};
use serde_json::Value;

/// Deepest nesting of parentheses, brackets, calls, conditionals and unary
/// operators a formula may use.
pub const MAX_NESTING: usize = 32;
/// Most binary operators in one unparenthesized chain such as `a + b + c`.
pub const MAX_CHAIN: usize = 256;

// --- Main Public Parser ---

pub fn parse_formula(input: &str) -> Result<Expression, FormulaError> {
    match expression(input.trim(), 0) {
        Ok(("", expr)) => Ok(expr),
        Ok((rem, _)) => Err(FormulaError::Parse(
            input.to_string(),
            format!("Parser did not consume all input. Remainder: '{}'", rem),
        )),
        Err(nom::Err::Failure(e)) if e.code == ErrorKind::TooLarge => {
            Err(FormulaError::TooDeep(MAX_NESTING))
        }
        Err(nom::Err::Failure(e)) if e.code == ErrorKind::Many => Err(FormulaError::Parse(
            input.to_string(),
            format!("more than {} operators in one chain", MAX_CHAIN),
        )),
        Err(e) => Err(FormulaError::Parse(input.to_string(), e.to_string())),
    }
}

// --- Combinators & Helpers ---

fn ws<'a, F, O, E>(inner: F) -> impl Parser<&'a str, Output = O, Error = E>
where
    F: Parser<&'a str, Output = O, Error = E>,
    E: nom::error::ParseError<&'a str>,
{
    delimited(multispace0, inner, multispace0)
}

/// Fails hard once `depth` passes [`MAX_NESTING`], so no alternative is retried.
fn check_depth(input: &str, depth: usize) -> Result<(), nom::Err<Error<&str>>> {
    if depth > MAX_NESTING {
        return Err(nom::Err::Failure(Error::new(input, ErrorKind::TooLarge)));
    }
    Ok(())
}

fn build_binary_expr_parser<'a, F, G>(
    sub_expr_parser: F,
    op_parser: G,
) -> impl FnMut(&'a str) -> IResult<&'a str, Expression>
where
    F: Parser<&'a str, Output = Expression, Error = nom::error::Error<&'a str>> + Clone,
    G: Parser<&'a str, Output = BinaryOperator, Error = nom::error::Error<&'a str>> + Clone,
{
    move |input: &str| {
        let (input, mut left) = sub_expr_parser.clone().parse(input)?;
        let (input, remainder) =
            many0(pair(ws(op_parser.clone()), sub_expr_parser.clone())).parse(input)?;
        if remainder.len() > MAX_CHAIN {
            return Err(nom::Err::Failure(Error::new(input, ErrorKind::Many)));
        }

        for (op, right) in remainder {
            left = Expression::BinaryOp {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }
        Ok((input, left))
    }
}

// --- Expression Parsers (in order of precedence) ---

fn expression(input: &str, depth: usize) -> IResult<&str, Expression> {
    conditional_expr(input, depth)
}

fn conditional_expr(input: &str, depth: usize) -> IResult<&str, Expression> {
    check_depth(input, depth)?;
    let (input, condition) = or_expr(input, depth)?;
    let (input, branches) = opt(pair(
        preceded(ws(char('?')), |i| conditional_expr(i, depth + 1)),
        preceded(ws(char(':')), |i| conditional_expr(i, depth + 1)),
    ))
    .parse(input)?;

    Ok(match branches {
        Some((then, otherwise)) => (
            input,
            Expression::Conditional {
                condition: Box::new(condition),
                then: Box::new(then),
                otherwise: Box::new(otherwise),
            },
        ),
        None => (input, condition),
    })
}

fn or_op(input: &str) -> IResult<&str, BinaryOperator> {
    map(tag("||"), |_| BinaryOperator::Or).parse(input)
}

fn and_op(input: &str) -> IResult<&str, BinaryOperator> {
    map(tag("&&"), |_| BinaryOperator::And).parse(input)
}

fn equality_op(input: &str) -> IResult<&str, BinaryOperator> {
    alt((
        map(tag("==="), |_| BinaryOperator::StrictEquals),
        map(tag("!=="), |_| BinaryOperator::StrictNotEquals),
        map(tag("=="), |_| BinaryOperator::Equals),
        map(tag("!="), |_| BinaryOperator::NotEquals),
    ))
    .parse(input)
}

fn relational_op(input: &str) -> IResult<&str, BinaryOperator> {
    alt((
        map(tag("<="), |_| BinaryOperator::LessThanOrEqual),
        map(tag(">="), |_| BinaryOperator::GreaterThanOrEqual),
        map(char('<'), |_| BinaryOperator::LessThan),
        map(char('>'), |_| BinaryOperator::GreaterThan),
    ))
    .parse(input)
}

fn additive_op(input: &str) -> IResult<&str, BinaryOperator> {
    alt((
        map(char('+'), |_| BinaryOperator::Plus),
        map(char('-'), |_| BinaryOperator::Minus),
    ))
    .parse(input)
}

fn multiplicative_op(input: &str) -> IResult<&str, BinaryOperator> {
    alt((
        map(char('*'), |_| BinaryOperator::Multiply),
        map(char('/'), |_| BinaryOperator::Divide),
        map(char('%'), |_| BinaryOperator::Modulo),
    ))
    .parse(input)
}

fn or_expr(input: &str, depth: usize) -> IResult<&str, Expression> {
    build_binary_expr_parser(move |i| and_expr(i, depth), or_op)(input)
}

fn and_expr(input: &str, depth: usize) -> IResult<&str, Expression> {
    build_binary_expr_parser(move |i| equality_expr(i, depth), and_op)(input)
}

fn equality_expr(input: &str, depth: usize) -> IResult<&str, Expression> {
    build_binary_expr_parser(move |i| relational_expr(i, depth), equality_op)(input)
}

fn relational_expr(input: &str, depth: usize) -> IResult<&str, Expression> {
    build_binary_expr_parser(move |i| additive_expr(i, depth), relational_op)(input)
}

fn additive_expr(input: &str, depth: usize) -> IResult<&str, Expression> {
    build_binary_expr_parser(move |i| multiplicative_expr(i, depth), additive_op)(input)
}

fn multiplicative_expr(input: &str, depth: usize) -> IResult<&str, Expression> {
    build_binary_expr_parser(move |i| unary_expr(i, depth), multiplicative_op)(input)
}

fn unary_op(input: &str) -> IResult<&str, UnaryOperator> {
    alt((
        map(char('-'), |_| UnaryOperator::Minus),
        map(char('+'), |_| UnaryOperator::Plus),
        // `!` but not the start of `!=`
        map(pair(char('!'), peek(satisfy(|c| c != '='))), |_| {
            UnaryOperator::Not
        }),
    ))
    .parse(input)
}

fn unary_expr(input: &str, depth: usize) -> IResult<&str, Expression> {
    check_depth(input, depth)?;
    alt((
        map(
            pair(ws(unary_op), |i| unary_expr(i, depth + 1)),
            |(op, expr)| Expression::UnaryOp {
                op,
                expr: Box::new(expr),
            },
        ),
        |i| postfix_expr(i, depth),
    ))
    .parse(input)
}

/// A primary expression followed by any number of `[index]` or `.key` suffixes.
fn postfix_expr(input: &str, depth: usize) -> IResult<&str, Expression> {
    let (input, start) = primary_expr(input, depth)?;
    let (input, suffixes) = many0(alt((
        delimited(ws(char('[')), |i| expression(i, depth + 1), ws(char(']'))),
        map(preceded(ws(char('.')), identifier), |key| {
            Expression::Literal(Value::String(key.to_string()))
        }),
    )))
    .parse(input)?;

    let expr = suffixes
        .into_iter()
        .fold(start, |target, index| Expression::Index {
            target: Box::new(target),
            index: Box::new(index),
        });
    Ok((input, expr))
}

fn primary_expr(input: &str, depth: usize) -> IResult<&str, Expression> {
    ws(alt((
        map(number, Expression::Literal),
        map(string_literal, |s| Expression::Literal(Value::String(s))),
        |i| array_literal(i, depth + 1),
        |i| object_literal(i, depth + 1),
        |i| name_expr(i, depth + 1),
        delimited(ws(char('(')), |i| expression(i, depth + 1), ws(char(')'))),
    )))
    .parse(input)
}

// --- Literal Parsers ---

fn number(input: &str) -> IResult<&str, Value> {
    // `recognize_float` also accepts a leading sign; signs belong to the unary parser.
    let (_, first) = peek(anychar).parse(input)?;
    if !(first.is_ascii_digit() || first == '.') {
        return Err(nom::Err::Error(Error::new(input, ErrorKind::Digit)));
    }
    map_res(recognize_float, |s: &str| {
        s.parse::<f64>().map(|n| {
            if n.fract() == 0.0 && n.abs() < 9.0e15 {
                Value::from(n as i64)
            } else {
                Value::from(n)
            }
        })
    })
    .parse(input)
}

/// A single- or double-quoted string with backslash escapes. Double-quoted
/// strings accept every JSON escape, so substituted values parse back intact.
fn string_literal(input: &str) -> IResult<&str, String> {
    let mut chars = input.char_indices();
    let quote = match chars.next() {
        Some((_, q @ ('\'' | '"'))) => q,
        _ => return Err(nom::Err::Error(Error::new(input, ErrorKind::Char))),
    };

    let mut out = String::new();
    while let Some((i, c)) = chars.next() {
        match c {
            c if c == quote => return Ok((&input[i + c.len_utf8()..], out)),
            '\\' => {
                let Some((_, escaped)) = chars.next() else {
                    break;
                };
                match escaped {
                    'n' => out.push('\n'),
                    't' => out.push('\t'),
                    'r' => out.push('\r'),
                    'b' => out.push('\u{8}'),
                    'f' => out.push('\u{c}'),
                    'u' => {
                        let hex: String = chars.by_ref().take(4).map(|(_, h)| h).collect();
                        let decoded = u32::from_str_radix(&hex, 16)
                            .ok()
                            .and_then(char::from_u32)
                            .unwrap_or(char::REPLACEMENT_CHARACTER);
                        out.push(decoded);
                    }
                    other => out.push(other),
                }
            }
            c => out.push(c),
        }
    }
    Err(nom::Err::Error(Error::new(input, ErrorKind::Char)))
}

fn array_literal(input: &str, depth: usize) -> IResult<&str, Expression> {
    map(
        delimited(
            ws(char('[')),
            separated_list0(ws(char(',')), |i| expression(i, depth)),
            ws(char(']')),
        ),
        Expression::Array,
    )
    .parse(input)
}

fn object_key(input: &str) -> IResult<&str, String> {
    alt((string_literal, map(identifier, String::from))).parse(input)
}

fn object_literal(input: &str, depth: usize) -> IResult<&str, Expression> {
    map(
        delimited(
            ws(char('{')),
            separated_list0(
                ws(char(',')),
                separated_pair(ws(object_key), char(':'), |i| expression(i, depth)),
            ),
            ws(char('}')),
        ),
        Expression::Object,
    )
    .parse(input)
}

// --- Names, Paths and Calls ---

fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        alt((alpha1, tag("_"))),
        take_while(|c: char| c.is_alphanumeric() || c == '_'),
    ))
    .parse(input)
}

/// `a.b.c`, with no whitespace around the dots.
fn name_chain(input: &str) -> IResult<&str, &str> {
    recognize(pair(identifier, many0(preceded(char('.'), identifier)))).parse(input)
}

/// A name is a keyword literal, a function call, a path aggregation such as
/// `orders.sum(total)`, or a bare path.
fn name_expr(input: &str, depth: usize) -> IResult<&str, Expression> {
    let (rest, name) = name_chain(input)?;
    let (after_paren, paren) = opt(ws(char('('))).parse(rest)?;

    if paren.is_none() {
        let expr = match name {
            "true" => Expression::Literal(Value::Bool(true)),
            "false" => Expression::Literal(Value::Bool(false)),
            "null" | "undefined" => Expression::Literal(Value::Null),
            _ => Expression::Path(name.to_string()),
        };
        return Ok((rest, expr));
    }

    if name.contains('.') {
        let (rest, field) = opt(is_not(")")).parse(after_paren)?;
        let (rest, _) = char(')').parse(rest)?;
        let path = format!("{}({})", name, field.unwrap_or("").trim());
        return Ok((rest, Expression::Path(path)));
    }

    let (rest, args) =
        separated_list0(ws(char(',')), |i| expression(i, depth)).parse(after_paren)?;
    let (rest, _) = ws(char(')')).parse(rest)?;
    Ok((
        rest,
        Expression::FunctionCall {
            name: name.to_string(),
            args,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(n: i64) -> Expression {
        Expression::Literal(Value::from(n))
    }

    fn binary(left: Expression, op: BinaryOperator, right: Expression) -> Expression {
        Expression::BinaryOp {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    #[test]
    fn test_precedence() {
        assert_eq!(
            parse_formula("1 + 2 * 3").unwrap(),
            binary(num(1), BinaryOperator::Plus, binary(num(2), BinaryOperator::Multiply, num(3)))
        );
        assert_eq!(
            parse_formula("(1 + 2) * 3").unwrap(),
            binary(binary(num(1), BinaryOperator::Plus, num(2)), BinaryOperator::Multiply, num(3))
        );
    }

    #[test]
    fn test_left_associativity() {
        assert_eq!(
            parse_formula("10 - 4 - 3").unwrap(),
            binary(binary(num(10), BinaryOperator::Minus, num(4)), BinaryOperator::Minus, num(3))
        );
    }

    #[test]
    fn test_function_calls_and_paths() {
        assert_eq!(
            parse_formula("ROUND(item.price, 2)").unwrap(),
            Expression::FunctionCall {
                name: "ROUND".into(),
                args: vec![Expression::Path("item.price".into()), num(2)],
            }
        );
        assert_eq!(
            parse_formula("orders.sum( total )").unwrap(),
            Expression::Path("orders.sum(total)".into())
        );
        assert_eq!(
            parse_formula("now()").unwrap(),
            Expression::FunctionCall {
                name: "now".into(),
                args: vec![]
            }
        );
    }

    #[test]
    fn test_literals() {
        assert_eq!(
            parse_formula("\"a\\\"b\\u0041\"").unwrap(),
            Expression::Literal(Value::String("a\"bA".into()))
        );
        assert_eq!(
            parse_formula("'it\\'s'").unwrap(),
            Expression::Literal(Value::String("it's".into()))
        );
        assert_eq!(parse_formula("1.5").unwrap(), Expression::Literal(Value::from(1.5)));
        assert_eq!(parse_formula("null").unwrap(), Expression::Literal(Value::Null));
        assert_eq!(
            parse_formula("[1, 2]").unwrap(),
            Expression::Array(vec![num(1), num(2)])
        );
        assert_eq!(
            parse_formula("{\"a\": 1}").unwrap(),
            Expression::Object(vec![("a".into(), num(1))])
        );
    }

    #[test]
    fn test_unary_and_not_equals() {
        assert_eq!(
            parse_formula("-x").unwrap(),
            Expression::UnaryOp {
                op: UnaryOperator::Minus,
                expr: Box::new(Expression::Path("x".into()))
            }
        );
        assert_eq!(
            parse_formula("a != b").unwrap(),
            binary(
                Expression::Path("a".into()),
                BinaryOperator::NotEquals,
                Expression::Path("b".into())
            )
        );
    }

    #[test]
    fn test_conditional_and_postfix() {
        assert!(matches!(
            parse_formula("a > 1 ? 'big' : 'small'").unwrap(),
            Expression::Conditional { .. }
        ));
        assert_eq!(
            parse_formula("[10, 20][1]").unwrap(),
            Expression::Index {
                target: Box::new(Expression::Array(vec![num(10), num(20)])),
                index: Box::new(num(1)),
            }
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_formula("").is_err());
        assert!(parse_formula("1 +").is_err());
        assert!(parse_formula("(1").is_err());
        assert!(parse_formula("'open").is_err());
        assert!(parse_formula("process.exit()").is_ok());
    }

    #[test]
    fn test_nesting_limit() {
        let parens = |depth: usize| format!("{}1{}", "(".repeat(depth), ")".repeat(depth));
        assert_eq!(parse_formula(&parens(MAX_NESTING)).unwrap(), num(1));

        let too_deep = Err(FormulaError::TooDeep(MAX_NESTING));
        assert_eq!(parse_formula(&parens(MAX_NESTING + 1)), too_deep);
        assert_eq!(parse_formula(&parens(1000)), too_deep);
        assert_eq!(parse_formula(&format!("{}1", "-".repeat(20_000))), too_deep);
        assert_eq!(
            parse_formula(&format!("{}1{}", "[".repeat(500), "]".repeat(500))),
            too_deep
        );
        assert_eq!(
            parse_formula(&format!("{}1{}", "abs(".repeat(100), ")".repeat(100))),
            too_deep
        );
    }

    #[test]
    fn test_chain_limit() {
        let chain = |terms: usize| vec!["1"; terms].join(" + ");
        assert!(parse_formula(&chain(MAX_CHAIN + 1)).is_ok());
        assert!(matches!(
            parse_formula(&chain(MAX_CHAIN + 2)),
            Err(FormulaError::Parse(_, message)) if message.contains("operators in one chain")
        ));
    }
}
