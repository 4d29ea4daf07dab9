//! Predicate evaluation against JSON documents.

use super::expression::{Operand, Predicate};
use crate::collection::Document;
use crate::collection::field::resolve;
use crate::criteria::{Case, ComparisonOp, MatchOp};
use crate::error::{Error, Result};
use crate::value::QueryValue;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::cmp::Ordering;

impl Predicate {
    /// Whether `doc` satisfies this predicate with `$i` bound to `values[i]`.
    pub(crate) fn matches(&self, doc: &Document, values: &[QueryValue]) -> Result<bool> {
        match self {
            Self::Empty => Ok(false),
            Self::And(items) => {
                for item in items {
                    if !item.matches(doc, values)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Self::Or(items) => {
                for item in items {
                    if item.matches(doc, values)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Self::Not(inner) => Ok(!inner.matches(doc, values)?),
            Self::Compare { field, op, operand } => {
                let ordering = compare_field(resolve(doc, field), bind(operand, values)?);
                Ok(apply(*op, ordering))
            }
            Self::Match {
                field,
                op,
                case,
                operand,
            } => {
                let (Value::String(haystack), Some(QueryValue::Text(needle))) =
                    (resolve(doc, field), bind(operand, values)?)
                else {
                    return Ok(false);
                };
                Ok(string_match(*op, *case, haystack, needle))
            }
        }
    }
}

fn bind<'a>(operand: &'a Operand, values: &'a [QueryValue]) -> Result<Option<&'a QueryValue>> {
    match operand {
        Operand::Placeholder(index) => {
            values
                .get(*index)
                .map(Some)
                .ok_or(Error::MissingParameter {
                    index: *index,
                    bound: values.len(),
                })
        }
        Operand::Literal(value) => Ok(Some(value)),
        Operand::Null => Ok(None),
    }
}

/// Orders a document field against a bound value; `None` operand is null.
fn compare_field(field: &Value, operand: Option<&QueryValue>) -> Option<Ordering> {
    let Some(operand) = operand else {
        return field.is_null().then_some(Ordering::Equal);
    };
    match (field, operand) {
        (Value::Number(n), QueryValue::Int(_) | QueryValue::Float(_)) => {
            n.as_f64()?.partial_cmp(&operand.as_f64()?)
        }
        (Value::String(s), QueryValue::Text(t)) => Some(s.as_str().cmp(t.as_str())),
        (Value::Bool(a), QueryValue::Bool(b)) => Some(a.cmp(b)),
        (Value::String(s), QueryValue::Date(d)) => {
            let stored: DateTime<Utc> = DateTime::parse_from_rfc3339(s).ok()?.with_timezone(&Utc);
            Some(stored.cmp(d))
        }
        _ => None,
    }
}

/// Incomparable pairs are unequal and fail every ordering test.
fn apply(op: ComparisonOp, ordering: Option<Ordering>) -> bool {
    match op {
        ComparisonOp::Equal => ordering == Some(Ordering::Equal),
        ComparisonOp::NotEqual => ordering != Some(Ordering::Equal),
        ComparisonOp::GreaterThan => ordering == Some(Ordering::Greater),
        ComparisonOp::GreaterThanOrEqual => {
            matches!(ordering, Some(Ordering::Greater | Ordering::Equal))
        }
        ComparisonOp::LessThan => ordering == Some(Ordering::Less),
        ComparisonOp::LessThanOrEqual => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
    }
}

fn string_match(op: MatchOp, case: Case, haystack: &str, needle: &str) -> bool {
    let (haystack, needle) = match case {
        Case::Sensitive => (haystack.to_string(), needle.to_string()),
        Case::Insensitive => (haystack.to_lowercase(), needle.to_lowercase()),
    };
    match op {
        MatchOp::BeginsWith => haystack.starts_with(&needle),
        MatchOp::EndsWith => haystack.ends_with(&needle),
        MatchOp::Contains => haystack.contains(&needle),
    }
}
