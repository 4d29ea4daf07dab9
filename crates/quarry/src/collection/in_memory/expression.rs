//! Parser for filter expressions, built on `winnow`.
//!
//! Grammar (keywords are case-insensitive):
//!
//! ```text
//! or         := and (("OR" | "||") and)*
//! and        := unary (("AND" | "&&") unary)*
//! unary      := ("NOT" | "!") unary | primary
//! primary    := "(" or? ")" | comparison
//! comparison := field op operand
//! op         := "==" | "=" | "<>" | "!=" | ">" | ">=" | "<" | "<="
//!             | ("BEGINSWITH" | "ENDSWITH" | "CONTAINS") "[c]"?
//! operand    := "$" digits | string | number | "NaN" | "inf" | "-inf"
//!             | "true" | "false" | "null"
//!             | YYYY-MM-DD@HH:MM:SS[:NANOS]
//! ```
//!
//! `()` parses to [`Predicate::Empty`], which matches nothing.

use crate::criteria::{Case, ComparisonOp, MatchOp};
use crate::error::{Error, Result};
use crate::value::QueryValue;
use chrono::{NaiveDateTime, TimeZone, Timelike, Utc};
use winnow::{
    combinator::{alt, cut_err, fail, opt, preceded, terminated},
    error::{ContextError, StrContext, StrContextValue},
    prelude::*,
    token::{any, take_till, take_while},
};

/// Maximum nesting depth of parentheses and `NOT`s.
const MAX_DEPTH: usize = 64;

/// Parsed filter expression.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Predicate {
    /// `()`: matches nothing.
    Empty,
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    Not(Box<Predicate>),
    Compare {
        field: String,
        op: ComparisonOp,
        operand: Operand,
    },
    Match {
        field: String,
        op: MatchOp,
        case: Case,
        operand: Operand,
    },
}

impl Predicate {
    /// Highest placeholder index referenced, if any.
    pub(crate) fn max_placeholder(&self) -> Option<usize> {
        match self {
            Self::Empty => None,
            Self::And(items) | Self::Or(items) => {
                items.iter().filter_map(Self::max_placeholder).max()
            }
            Self::Not(inner) => inner.max_placeholder(),
            Self::Compare { operand, .. } | Self::Match { operand, .. } => match operand {
                Operand::Placeholder(index) => Some(*index),
                _ => None,
            },
        }
    }
}

/// Right-hand side of a comparison.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Operand {
    /// `$i`
    Placeholder(usize),
    /// Inline literal.
    Literal(QueryValue),
    /// `null`
    Null,
}

enum Operator {
    Compare(ComparisonOp),
    Match(MatchOp, Case),
}

/// Parses `input` into a predicate tree.
///
/// Failures carry the byte offset at which parsing stopped.
pub(crate) fn parse(input: &str) -> Result<Predicate> {
    terminated(|i: &mut &str| parse_or(i, 0), whitespace)
        .parse(input)
        .map_err(|e| {
            let message = e.inner().to_string();
            Error::Parse {
                position: e.offset(),
                message: if message.is_empty() {
                    "unexpected input".to_string()
                } else {
                    message
                },
            }
        })
}

/// Fails without backtracking, leaving `input` at `at`.
fn reject<'i, O>(input: &mut &'i str, at: &'i str, context: StrContext) -> PResult<O> {
    *input = at;
    cut_err(fail::<_, O, _>.context(context)).parse_next(input)
}

fn expected(what: &'static str) -> StrContext {
    StrContext::Expected(StrContextValue::Description(what))
}

fn whitespace(input: &mut &str) -> PResult<()> {
    take_while(0.., char::is_whitespace).void().parse_next(input)
}

/// A field name or bare keyword.
fn word<'i>(input: &mut &'i str) -> PResult<&'i str> {
    take_while(1.., |c: char| c.is_alphanumeric() || c == '_' || c == '.')
        .verify(|w: &str| !w.starts_with(|c: char| c.is_ascii_digit()))
        .parse_next(input)
}

fn keyword<'i>(name: &'static str) -> impl Parser<&'i str, &'i str, ContextError> {
    word.verify(move |w: &str| w.eq_ignore_ascii_case(name))
}

fn or_connective(input: &mut &str) -> PResult<()> {
    preceded(whitespace, alt((keyword("OR").void(), "||".void()))).parse_next(input)
}

fn and_connective(input: &mut &str) -> PResult<()> {
    preceded(whitespace, alt((keyword("AND").void(), "&&".void()))).parse_next(input)
}

fn negation(input: &mut &str) -> PResult<()> {
    preceded(whitespace, alt((keyword("NOT").void(), '!'.void()))).parse_next(input)
}

fn parse_or(input: &mut &str, depth: usize) -> PResult<Predicate> {
    let mut items = vec![parse_and(input, depth)?];
    while opt(or_connective).parse_next(input)?.is_some() {
        items.push(parse_and(input, depth)?);
    }
    Ok(if items.len() == 1 {
        items.remove(0)
    } else {
        Predicate::Or(items)
    })
}

fn parse_and(input: &mut &str, depth: usize) -> PResult<Predicate> {
    let mut items = vec![parse_unary(input, depth)?];
    while opt(and_connective).parse_next(input)?.is_some() {
        items.push(parse_unary(input, depth)?);
    }
    Ok(if items.len() == 1 {
        items.remove(0)
    } else {
        Predicate::And(items)
    })
}

fn parse_unary(input: &mut &str, depth: usize) -> PResult<Predicate> {
    let _: () = whitespace.parse_next(input)?;
    if depth > MAX_DEPTH {
        let at = *input;
        return reject(input, at, StrContext::Label("nesting depth"));
    }
    if opt(negation).parse_next(input)?.is_some() {
        let inner = parse_unary(input, depth + 1)?;
        return Ok(Predicate::Not(Box::new(inner)));
    }
    parse_primary(input, depth)
}

fn parse_primary(input: &mut &str, depth: usize) -> PResult<Predicate> {
    let _: () = whitespace.parse_next(input)?;
    if opt('(').parse_next(input)?.is_none() {
        return parse_comparison(input);
    }
    if opt(preceded(whitespace, ')')).parse_next(input)?.is_some() {
        return Ok(Predicate::Empty);
    }
    let inner = parse_or(input, depth + 1)?;
    let _: () = whitespace.parse_next(input)?;
    let _: char = cut_err(')')
        .context(StrContext::Expected(StrContextValue::CharLiteral(')')))
        .parse_next(input)?;
    Ok(inner)
}

fn parse_comparison(input: &mut &str) -> PResult<Predicate> {
    let start = *input;
    let Some(field) = opt(word).parse_next(input)? else {
        return reject(input, start, expected("field"));
    };
    let field = field.to_string();

    let _: () = whitespace.parse_next(input)?;
    let start = *input;
    let Some(op) = opt(operator).parse_next(input)? else {
        return reject(input, start, expected("operator"));
    };

    let operand = parse_operand(input)?;
    Ok(match op {
        Operator::Compare(op) => Predicate::Compare { field, op, operand },
        Operator::Match(op, case) => Predicate::Match {
            field,
            op,
            case,
            operand,
        },
    })
}

fn operator(input: &mut &str) -> PResult<Operator> {
    alt((
        comparison_op.map(Operator::Compare),
        (match_op, opt(preceded(whitespace, alt(("[c]", "[C]"))))).map(|(op, flag)| {
            let case = if flag.is_some() {
                Case::Insensitive
            } else {
                Case::Sensitive
            };
            Operator::Match(op, case)
        }),
    ))
    .parse_next(input)
}

fn comparison_op(input: &mut &str) -> PResult<ComparisonOp> {
    alt((
        "==".value(ComparisonOp::Equal),
        "<>".value(ComparisonOp::NotEqual),
        "!=".value(ComparisonOp::NotEqual),
        ">=".value(ComparisonOp::GreaterThanOrEqual),
        "<=".value(ComparisonOp::LessThanOrEqual),
        '='.value(ComparisonOp::Equal),
        '>'.value(ComparisonOp::GreaterThan),
        '<'.value(ComparisonOp::LessThan),
    ))
    .parse_next(input)
}

fn match_op(input: &mut &str) -> PResult<MatchOp> {
    alt((
        keyword("BEGINSWITH").value(MatchOp::BeginsWith),
        keyword("ENDSWITH").value(MatchOp::EndsWith),
        keyword("CONTAINS").value(MatchOp::Contains),
    ))
    .parse_next(input)
}

fn parse_operand(input: &mut &str) -> PResult<Operand> {
    let _: () = whitespace.parse_next(input)?;
    let start = *input;
    let operand = opt(alt((
        placeholder.map(Operand::Placeholder),
        text.map(|s| Operand::Literal(QueryValue::Text(s))),
        timestamp.map(Operand::Literal),
        number.map(Operand::Literal),
        special_float.map(|x| Operand::Literal(QueryValue::Float(x))),
        keyword("true").value(Operand::Literal(QueryValue::Bool(true))),
        keyword("false").value(Operand::Literal(QueryValue::Bool(false))),
        alt((keyword("null"), keyword("nil"))).value(Operand::Null),
    )))
    .parse_next(input)?;

    match operand {
        Some(operand) => Ok(operand),
        None => reject(input, start, expected("value")),
    }
}

fn placeholder(input: &mut &str) -> PResult<usize> {
    let _: char = '$'.parse_next(input)?;
    cut_err(take_while(1.., |c: char| c.is_ascii_digit()).try_map(str::parse::<usize>))
        .context(StrContext::Label("placeholder index"))
        .parse_next(input)
}

/// Double-quoted string with `\n`, `\r`, `\t`, `\"` and `\\` escapes.
fn text(input: &mut &str) -> PResult<String> {
    let start = *input;
    let _: char = '"'.parse_next(input)?;
    let mut out = String::new();

    loop {
        let chunk: &str = take_till(0.., ['"', '\\']).parse_next(input)?;
        out.push_str(chunk);

        match opt(any).parse_next(input)? {
            Some('"') => return Ok(out),
            Some(_) => {
                let escaped: char = cut_err(alt((
                    'n'.value('\n'),
                    'r'.value('\r'),
                    't'.value('\t'),
                    '"',
                    '\\',
                )))
                .context(StrContext::Label("escape sequence"))
                .parse_next(input)?;
                out.push(escaped);
            }
            None => return reject(input, start, StrContext::Label("string literal")),
        }
    }
}

/// `YYYY-MM-DD@HH:MM:SS` with an optional `:NANOS` suffix, in UTC.
fn timestamp(input: &mut &str) -> PResult<QueryValue> {
    let date: &str =
        terminated(take_while(1.., |c: char| c.is_ascii_digit() || c == '-'), '@').parse_next(input)?;
    cut_err(
        take_while(1.., |c: char| c.is_ascii_digit() || c == ':')
            .verify_map(|time: &str| timestamp_value(date, time)),
    )
    .context(StrContext::Label("timestamp"))
    .parse_next(input)
}

fn timestamp_value(date: &str, time: &str) -> Option<QueryValue> {
    let mut parts = time.splitn(4, ':');
    let hms = [parts.next()?, parts.next()?, parts.next()?].join(":");
    let nanos: u32 = match parts.next() {
        Some(n) => n.parse().ok()?,
        None => 0,
    };
    let naive = NaiveDateTime::parse_from_str(&format!("{date} {hms}"), "%Y-%m-%d %H:%M:%S")
        .ok()?
        .with_nanosecond(nanos)?;
    Some(QueryValue::Date(Utc.from_utc_datetime(&naive)))
}

/// Integer, or float when a `.`, `e` or `E` is present.
fn number(input: &mut &str) -> PResult<QueryValue> {
    let start = *input;
    let digits: &str = take_while(1.., |c: char| {
        c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E')
    })
    .verify(|t: &str| {
        t.strip_prefix('-')
            .unwrap_or(t)
            .starts_with(|c: char| c.is_ascii_digit())
    })
    .parse_next(input)?;

    let value = if digits.contains(['.', 'e', 'E']) {
        digits.parse().ok().map(QueryValue::Float)
    } else {
        digits.parse().ok().map(QueryValue::Int)
    };
    match value {
        Some(value) => Ok(value),
        None => reject(input, start, StrContext::Label("number")),
    }
}

/// `NaN`, `inf` and `-inf`, as floats display them.
fn special_float(input: &mut &str) -> PResult<f64> {
    alt((
        keyword("NaN").value(f64::NAN),
        keyword("inf").value(f64::INFINITY),
        preceded('-', keyword("inf")).value(f64::NEG_INFINITY),
    ))
    .parse_next(input)
}
