//! Criteria entries and their rendering into filter expressions.
//!
//! A query is a list of [`Criteria`]: single entries at top level, or groups
//! of entries that render as one parenthesized clause. Entries capture their
//! field, operator and raw values; text and placeholder numbers are produced
//! only when the whole list is rendered, so numbering is global and follows
//! encounter order.
//!
//! # Rendering rules
//!
//! - Top-level fragments are joined with `" AND "`.
//! - Group members are joined with single spaces and wrapped in `( )`, so
//!   `and()`/`or()` keywords inside a group connect their neighbours.
//! - The NOT marker emits no text. If it occurs anywhere, in a group or at
//!   top level, the entire expression is wrapped once as `NOT(...)`.

use crate::value::QueryValue;
use std::fmt;

/// Comparison operators with a single bound operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    /// `==`
    Equal,
    /// `<>`
    NotEqual,
    /// `>`
    GreaterThan,
    /// `>=`
    GreaterThanOrEqual,
    /// `<`
    LessThan,
    /// `<=`
    LessThanOrEqual,
}

impl ComparisonOp {
    /// The operator's symbol in the filter grammar.
    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Equal => "==",
            Self::NotEqual => "<>",
            Self::GreaterThan => ">",
            Self::GreaterThanOrEqual => ">=",
            Self::LessThan => "<",
            Self::LessThanOrEqual => "<=",
        }
    }
}

impl fmt::Display for ComparisonOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// String matching operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOp {
    /// `BEGINSWITH`
    BeginsWith,
    /// `ENDSWITH`
    EndsWith,
    /// `CONTAINS`
    Contains,
}

impl MatchOp {
    /// The operator's keyword in the filter grammar.
    #[must_use]
    pub fn keyword(self) -> &'static str {
        match self {
            Self::BeginsWith => "BEGINSWITH",
            Self::EndsWith => "ENDSWITH",
            Self::Contains => "CONTAINS",
        }
    }
}

/// Case sensitivity of a string match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Case {
    /// Exact match (plain operator).
    #[default]
    Sensitive,
    /// Case-insensitive match (operator suffixed with `[c]`).
    Insensitive,
}

/// Logical keyword entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    /// `AND`, meaningful between two entries of a group.
    And,
    /// `OR`, meaningful between two entries of a group.
    Or,
    /// Negation marker: wraps the whole expression in `NOT(...)`.
    Not,
}

/// One deferred fragment of a filter expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Criterion {
    /// `field <op> $i`
    Comparison {
        /// Field name, passed through verbatim.
        field: String,
        /// Comparison operator.
        op: ComparisonOp,
        /// Bound operand.
        value: QueryValue,
    },
    /// `field >= $i AND field <= $j`
    Between {
        /// Field name.
        field: String,
        /// Inclusive lower bound.
        from: QueryValue,
        /// Inclusive upper bound.
        to: QueryValue,
    },
    /// `field BEGINSWITH|ENDSWITH|CONTAINS[c]? $i`
    Match {
        /// Field name.
        field: String,
        /// Match operator.
        op: MatchOp,
        /// Text to match.
        value: String,
        /// Case sensitivity.
        case: Case,
    },
    /// `(field == $i OR field == $j ...)`; `()` when empty.
    In {
        /// Field name.
        field: String,
        /// Accepted values.
        values: Vec<QueryValue>,
    },
    /// Literal `AND`/`OR` token, or the NOT marker.
    Keyword(Keyword),
}

impl Criterion {
    /// Renders this entry, binding its values through `binder`.
    ///
    /// Returns `None` for the NOT marker, which contributes no text.
    pub(crate) fn render(&self, binder: &mut impl Binder) -> Option<String> {
        let text = match self {
            Self::Comparison { field, op, value } => {
                format!("{} {} {}", field, op, binder.bind(value))
            }
            Self::Between { field, from, to } => {
                let from = binder.bind(from);
                let to = binder.bind(to);
                format!("{field} >= {from} AND {field} <= {to}")
            }
            Self::Match {
                field,
                op,
                value,
                case,
            } => {
                let suffix = match case {
                    Case::Sensitive => "",
                    Case::Insensitive => "[c]",
                };
                let operand = binder.bind(&QueryValue::Text(value.clone()));
                format!("{} {}{} {}", field, op.keyword(), suffix, operand)
            }
            Self::In { field, values } => {
                let alternatives: Vec<String> = values
                    .iter()
                    .map(|value| format!("{} == {}", field, binder.bind(value)))
                    .collect();
                format!("({})", alternatives.join(" OR "))
            }
            Self::Keyword(Keyword::And) => "AND".to_string(),
            Self::Keyword(Keyword::Or) => "OR".to_string(),
            Self::Keyword(Keyword::Not) => return None,
        };
        Some(text)
    }
}

/// An element of the criteria list.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Criteria {
    /// Top-level entry, AND-joined with its siblings.
    Entry(Criterion),
    /// Parenthesized group of entries.
    Group(Vec<Criterion>),
}

/// Turns bound values into operand text while rendering.
pub(crate) trait Binder {
    fn bind(&mut self, value: &QueryValue) -> String;
}

/// Binds values to `$0, $1, ...` in encounter order, collecting them.
#[derive(Debug, Default)]
pub(crate) struct Placeholders {
    values: Vec<QueryValue>,
}

impl Placeholders {
    pub(crate) fn into_values(self) -> Vec<QueryValue> {
        self.values
    }
}

impl Binder for Placeholders {
    fn bind(&mut self, value: &QueryValue) -> String {
        let index = self.values.len();
        self.values.push(value.clone());
        format!("${index}")
    }
}

/// Inlines values as literals.
#[derive(Debug, Default)]
pub(crate) struct Literals;

impl Binder for Literals {
    fn bind(&mut self, value: &QueryValue) -> String {
        value.to_string()
    }
}

/// Linearizes a criteria list into one expression.
pub(crate) fn render(criteria: &[Criteria], binder: &mut impl Binder) -> String {
    let mut fragments = Vec::with_capacity(criteria.len());
    let mut negated = false;

    for element in criteria {
        match element {
            Criteria::Entry(entry) => match entry.render(binder) {
                Some(fragment) => fragments.push(fragment),
                None => negated = true,
            },
            Criteria::Group(members) => {
                let mut parts = Vec::with_capacity(members.len());
                for member in members {
                    match member.render(binder) {
                        Some(part) => parts.push(part),
                        None => negated = true,
                    }
                }
                fragments.push(format!("({})", parts.join(" ")));
            }
        }
    }

    let joined = fragments.join(" AND ");
    if negated {
        format!("NOT({joined})")
    } else {
        joined
    }
}
