//! A `nom`-based parser for binding paths.
//!
//! ```text
//! path    := segment ('.' (call | segment))*
//! segment := key ('[' digits ']')?
//! call    := ident '(' field? ')'
//! ```
//!
//! Keys may contain any character except `.[]()`, so table and column names
//! with spaces survive. Surrounding whitespace on keys is trimmed.
use super::ast::{PathExpr, PathSegment};
use crate::aggregate::AggregateFn;
use crate::error::JPathError;
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{is_not, take_while},
    character::complete::{alpha1, char, multispace0, u64 as nom_u64},
    combinator::{map, map_res, opt, recognize, verify},
    multi::many0,
    sequence::{delimited, pair, preceded},
};

// --- Main Public Parser ---

pub fn parse_path(input: &str) -> Result<PathExpr, JPathError> {
    let trimmed = input.trim();
    let segments = match full_path(trimmed) {
        Ok(("", segments)) => segments,
        Ok((rem, _)) => {
            return Err(JPathError::PathParse(
                input.to_string(),
                format!("Parser did not consume all input. Remainder: '{}'", rem),
            ));
        }
        Err(e) => return Err(JPathError::PathParse(input.to_string(), e.to_string())),
    };

    let last = segments.len().saturating_sub(1);
    if let Some((pos, PathSegment::Call { func, .. })) = segments
        .iter()
        .enumerate()
        .find(|(_, s)| matches!(s, PathSegment::Call { .. }))
        && pos != last
    {
        return Err(JPathError::MisplacedCall(
            func.as_str().to_string(),
            input.to_string(),
        ));
    }

    Ok(PathExpr { segments })
}

// --- Combinators ---

fn full_path(input: &str) -> IResult<&str, Vec<PathSegment>> {
    map(
        pair(
            keyed_segment,
            many0(preceded(char('.'), alt((call_segment, keyed_segment)))),
        ),
        |(first, rest)| first.into_iter().chain(rest.into_iter().flatten()).collect(),
    )
    .parse(input)
}

fn key(input: &str) -> IResult<&str, &str> {
    map(
        verify(is_not(".[]()"), |s: &str| !s.trim().is_empty()),
        str::trim,
    )
    .parse(input)
}

fn index(input: &str) -> IResult<&str, usize> {
    map(delimited(char('['), ws(nom_u64), char(']')), |i| i as usize).parse(input)
}

/// A key with its optional index, flattened into one or two segments.
fn keyed_segment(input: &str) -> IResult<&str, Vec<PathSegment>> {
    map(pair(key, opt(index)), |(k, idx)| {
        let mut segments = vec![PathSegment::Key(k.to_string())];
        if let Some(i) = idx {
            segments.push(PathSegment::Index(i));
        }
        segments
    })
    .parse(input)
}

// --- Aggregation Call Parser ---

fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        alpha1,
        take_while(|c: char| c.is_alphanumeric() || c == '_'),
    ))
    .parse(input)
}

fn call_segment(input: &str) -> IResult<&str, Vec<PathSegment>> {
    let (input, func) = map_res(ws(identifier), str::parse::<AggregateFn>).parse(input)?;
    let (input, field) = delimited(char('('), opt(is_not(")")), char(')')).parse(input)?;
    let (input, _) = multispace0(input)?;

    let field = field.map(str::trim).filter(|f| !f.is_empty()).map(String::from);
    Ok((input, vec![PathSegment::Call { func, field }]))
}

/// A combinator that takes a parser `inner` and produces a parser that consumes surrounding whitespace.
fn ws<'a, F, O, E>(inner: F) -> impl Parser<&'a str, Output = O, Error = E>
where
    F: Parser<&'a str, Output = O, Error = E>,
    E: nom::error::ParseError<&'a str>,
{
    delimited(multispace0, inner, multispace0)
}
