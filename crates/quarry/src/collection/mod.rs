//! Collections that evaluate rendered filter expressions.
//!
//! A [`Query`](crate::Query) never evaluates predicates itself. It renders an
//! expression plus bound values and hands both to a [`Collection`], which
//! filters and sorts its documents. The grammar a collection must accept:
//!
//! - field tokens (dot-separated paths address nested fields)
//! - operators `== <> > >= < <= BEGINSWITH ENDSWITH CONTAINS`, the string
//!   operators optionally suffixed with `[c]` for case-insensitive matching
//! - keywords `AND OR NOT` and grouping parentheses
//! - positional placeholders `$0, $1, ...`, `$i` bound to `values[i]`
//!
//! [`MemoryCollection`] is the bundled implementation.

pub mod field;
pub mod in_memory;

use crate::error::{Error, Result};
use crate::value::QueryValue;
use std::fmt;
use std::str::FromStr;

pub use in_memory::MemoryCollection;

/// A stored object: a JSON document, normally an object.
pub type Document = serde_json::Value;

/// A queryable set of documents.
///
/// Filtering and sorting produce new collections; the receiver is never
/// mutated.
pub trait Collection: Clone {
    /// Returns the documents matching `expression`, with `$i` placeholders
    /// bound to `values[i]`, in their original order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] for expressions outside the grammar and
    /// [`Error::MissingParameter`] for placeholders without a value.
    fn filtered(&self, expression: &str, values: &[QueryValue]) -> Result<Self>;

    /// Returns the same documents ordered by `field`.
    #[must_use]
    fn sorted(&self, field: &str, order: SortOrder) -> Self;

    /// The documents in collection order.
    fn documents(&self) -> &[Document];

    /// Number of documents.
    fn len(&self) -> usize {
        self.documents().len()
    }

    /// Whether the collection holds no documents.
    fn is_empty(&self) -> bool {
        self.documents().is_empty()
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Smallest first.
    #[default]
    Ascending,
    /// Largest first.
    Descending,
}

impl SortOrder {
    /// Whether this order reverses the natural ordering.
    #[must_use]
    pub fn is_reverse(self) -> bool {
        self == Self::Descending
    }
}

impl FromStr for SortOrder {
    type Err = Error;

    /// Parses `ASC`/`DESC` (any case).
    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "ASC" => Ok(Self::Ascending),
            "DESC" => Ok(Self::Descending),
            _ => Err(Error::InvalidSortOrder(s.to_string())),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ascending => f.write_str("ASC"),
            Self::Descending => f.write_str("DESC"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("ASC", SortOrder::Ascending)]
    #[case("asc", SortOrder::Ascending)]
    #[case("DESC", SortOrder::Descending)]
    #[case("Desc", SortOrder::Descending)]
    fn sort_order_parses_case_insensitively(#[case] input: &str, #[case] expected: SortOrder) {
        assert_eq!(input.parse::<SortOrder>().unwrap(), expected);
        assert_eq!(expected.to_string().parse::<SortOrder>().unwrap(), expected);
    }

    #[test]
    fn unknown_sort_order_is_rejected() {
        match "up".parse::<SortOrder>() {
            Err(Error::InvalidSortOrder(order)) => assert_eq!(order, "up"),
            other => panic!("expected InvalidSortOrder, got {other:?}"),
        }
        assert_eq!(
            "Up".parse::<SortOrder>().unwrap_err().to_string(),
            "Invalid sort order 'Up': expected ASC or DESC"
        );
    }
}
