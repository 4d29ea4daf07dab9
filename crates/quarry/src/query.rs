//! Fluent query builder.
//!
//! A [`Query`] accumulates criteria through chained calls and renders them
//! into a filter expression with positional placeholders. Terminal
//! operations hand the expression and its bound values to the source
//! [`Collection`] and interpret the result.
//!
//! # Grouping
//!
//! [`begin_group`](Query::begin_group) opens a group without creating it. The
//! first criterion added afterwards creates a parenthesized group, and every
//! criterion until [`end_group`](Query::end_group) lands in it. A group left
//! open still renders as a parenthesized clause.
//!
//! ```
//! use quarry::Query;
//!
//! let query = Query::new()
//!     .greater_than("age", 30)
//!     .begin_group()
//!     .equal_to("name", "Ada")
//!     .or()
//!     .equal_to("name", "Grace")
//!     .end_group();
//!
//! assert_eq!(
//!     query.to_string(),
//!     "age > $0 AND (name == $1 OR name == $2)"
//! );
//! ```
//!
//! # Negation
//!
//! [`not`](Query::not) negates the whole expression, wherever it is called:
//! the result is wrapped once as `NOT(...)`.

use crate::collection::field::{compare, resolve};
use crate::collection::{Collection, Document, MemoryCollection, SortOrder};
use crate::criteria::{
    self, Case, ComparisonOp, Criteria, Criterion, Keyword, Literals, MatchOp, Placeholders,
};
use crate::error::{Error, Result};
use crate::value::QueryValue;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;

/// A rendered filter: the expression and the values its placeholders bind.
///
/// `$i` in `expression` refers to `values[i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    /// Filter expression with `$0, $1, ...` placeholders.
    pub expression: String,
    /// Bound values in placeholder order.
    pub values: Vec<QueryValue>,
}

/// Field and direction used by [`Query::find_all`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    /// Field to sort by.
    pub field: String,
    /// Sort direction.
    pub order: SortOrder,
}

/// Whether criteria are currently captured by a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum GroupState {
    #[default]
    Closed,
    /// Open; holds the index of the group created in this session, if any.
    Open(Option<usize>),
}

/// A fluent query over a [`Collection`].
///
/// Builder methods consume and return the query, so calls chain. Nothing is
/// evaluated until a terminal operation such as [`find_all`](Self::find_all)
/// or [`count`](Self::count) runs.
#[derive(Debug, Clone)]
pub struct Query<C = MemoryCollection> {
    source: Option<C>,
    criteria: Vec<Criteria>,
    group: GroupState,
    sort: Option<SortKey>,
}

impl<C> Default for Query<C> {
    fn default() -> Self {
        Self {
            source: None,
            criteria: Vec::new(),
            group: GroupState::Closed,
            sort: None,
        }
    }
}

impl Query {
    /// Creates a query without a source collection.
    ///
    /// Useful for building and rendering expressions; terminal operations
    /// fail with [`Error::MissingCollection`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl<C> From<C> for Query<C>
where
    C: Collection,
{
    fn from(source: C) -> Self {
        Self::with_source(source)
    }
}

impl<C> Query<C> {
    /// Creates a query over `source`.
    #[must_use]
    pub fn with_source(source: C) -> Self {
        Self {
            source: Some(source),
            ..Self::default()
        }
    }

    /// The source collection, if any.
    #[must_use]
    pub fn source(&self) -> Option<&C> {
        self.source.as_ref()
    }

    /// The recorded sort, if any.
    #[must_use]
    pub fn sort_key(&self) -> Option<&SortKey> {
        self.sort.as_ref()
    }

    /// Appends a criterion to the open group, or at top level when no group
    /// is open.
    #[must_use]
    pub fn add_criteria(mut self, entry: Criterion) -> Self {
        match self.group {
            GroupState::Closed => self.criteria.push(Criteria::Entry(entry)),
            GroupState::Open(index) => {
                if let Some(Criteria::Group(members)) = index.and_then(|i| self.criteria.get_mut(i))
                {
                    members.push(entry);
                } else {
                    self.group = GroupState::Open(Some(self.criteria.len()));
                    self.criteria.push(Criteria::Group(vec![entry]));
                }
            }
        }
        self
    }

    /// Opens a group. Has no effect while a group is already open.
    #[must_use]
    pub fn begin_group(mut self) -> Self {
        if self.group == GroupState::Closed {
            self.group = GroupState::Open(None);
        }
        self
    }

    /// Closes the open group. Has no effect when no group is open.
    #[must_use]
    pub fn end_group(mut self) -> Self {
        self.group = GroupState::Closed;
        self
    }

    /// `field == value`
    #[must_use]
    pub fn equal_to(self, field: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        self.comparison(field, ComparisonOp::Equal, value)
    }

    /// `field <> value`
    #[must_use]
    pub fn not_equal_to(self, field: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        self.comparison(field, ComparisonOp::NotEqual, value)
    }

    /// `field > value`
    #[must_use]
    pub fn greater_than(self, field: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        self.comparison(field, ComparisonOp::GreaterThan, value)
    }

    /// `field >= value`
    #[must_use]
    pub fn greater_than_or_equal_to(
        self,
        field: impl Into<String>,
        value: impl Into<QueryValue>,
    ) -> Self {
        self.comparison(field, ComparisonOp::GreaterThanOrEqual, value)
    }

    /// `field < value`
    #[must_use]
    pub fn less_than(self, field: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        self.comparison(field, ComparisonOp::LessThan, value)
    }

    /// `field <= value`
    #[must_use]
    pub fn less_than_or_equal_to(
        self,
        field: impl Into<String>,
        value: impl Into<QueryValue>,
    ) -> Self {
        self.comparison(field, ComparisonOp::LessThanOrEqual, value)
    }

    /// `field >= from AND field <= to`, both bounds inclusive.
    #[must_use]
    pub fn between(
        self,
        field: impl Into<String>,
        from: impl Into<QueryValue>,
        to: impl Into<QueryValue>,
    ) -> Self {
        self.add_criteria(Criterion::Between {
            field: field.into(),
            from: from.into(),
            to: to.into(),
        })
    }

    /// `field BEGINSWITH value`, with `[c]` when `case` is insensitive.
    #[must_use]
    pub fn begins_with(self, field: impl Into<String>, value: impl Into<String>, case: Case) -> Self {
        self.string_match(field, MatchOp::BeginsWith, value, case)
    }

    /// `field ENDSWITH value`, with `[c]` when `case` is insensitive.
    #[must_use]
    pub fn ends_with(self, field: impl Into<String>, value: impl Into<String>, case: Case) -> Self {
        self.string_match(field, MatchOp::EndsWith, value, case)
    }

    /// `field CONTAINS value`, with `[c]` when `case` is insensitive.
    #[must_use]
    pub fn contains(self, field: impl Into<String>, value: impl Into<String>, case: Case) -> Self {
        self.string_match(field, MatchOp::Contains, value, case)
    }

    /// `(field == v0 OR field == v1 ...)`.
    ///
    /// An empty list renders `()`, which matches nothing.
    #[must_use]
    pub fn in_values<I, V>(self, field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<QueryValue>,
    {
        self.add_criteria(Criterion::In {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        })
    }

    /// Negates the whole expression.
    ///
    /// The marker emits no text; if it appears anywhere, in a group or not,
    /// the rendered expression is wrapped once as `NOT(...)`.
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        self.add_criteria(Criterion::Keyword(Keyword::Not))
    }

    /// Inserts `AND` between the neighbouring criteria of a group.
    #[must_use]
    pub fn and(self) -> Self {
        self.add_criteria(Criterion::Keyword(Keyword::And))
    }

    /// Inserts `OR` between the neighbouring criteria of a group.
    #[must_use]
    pub fn or(self) -> Self {
        self.add_criteria(Criterion::Keyword(Keyword::Or))
    }

    /// Appends every criterion of `other`, AND-ing it with this query.
    ///
    /// The sort of `other` is ignored. A group open in this query stays open,
    /// but later criteria start a new group after the joined ones.
    #[must_use]
    pub fn join<D>(mut self, other: Query<D>) -> Self {
        self.criteria.extend(other.criteria);
        if let GroupState::Open(Some(_)) = self.group {
            self.group = GroupState::Open(None);
        }
        self
    }

    /// Sorts [`find_all`](Self::find_all) results by `field`, ascending.
    #[must_use]
    pub fn sort(self, field: impl Into<String>) -> Self {
        self.sort_by(field, SortOrder::Ascending)
    }

    /// Sorts [`find_all`](Self::find_all) results by `field`, replacing any
    /// earlier sort.
    #[must_use]
    pub fn sort_by(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.sort = Some(SortKey {
            field: field.into(),
            order,
        });
        self
    }

    /// Not supported.
    ///
    /// # Errors
    ///
    /// Always returns [`Error::Unsupported`].
    pub fn is_empty(&self, _field: &str) -> Result<Self> {
        self.unsupported("is_empty")
    }

    /// Not supported.
    ///
    /// # Errors
    ///
    /// Always returns [`Error::Unsupported`].
    pub fn is_not_empty(&self, _field: &str) -> Result<Self> {
        self.unsupported("is_not_empty")
    }

    /// Not supported.
    ///
    /// # Errors
    ///
    /// Always returns [`Error::Unsupported`].
    pub fn is_null(&self, _field: &str) -> Result<Self> {
        self.unsupported("is_null")
    }

    /// Not supported.
    ///
    /// # Errors
    ///
    /// Always returns [`Error::Unsupported`].
    pub fn is_not_null(&self, _field: &str) -> Result<Self> {
        self.unsupported("is_not_null")
    }

    /// Not supported.
    ///
    /// # Errors
    ///
    /// Always returns [`Error::Unsupported`].
    pub fn like(&self, _field: &str, _pattern: &str) -> Result<Self> {
        self.unsupported("like")
    }

    /// Renders the expression with placeholders and collects bound values.
    ///
    /// Each call renders from scratch, so repeated calls return equal filters.
    #[must_use]
    pub fn to_filter(&self) -> Filter {
        let mut binder = Placeholders::default();
        let expression = criteria::render(&self.criteria, &mut binder);
        Filter {
            expression,
            values: binder.into_values(),
        }
    }

    /// The bound values, in placeholder order.
    #[must_use]
    pub fn values(&self) -> Vec<QueryValue> {
        self.to_filter().values
    }

    /// Renders the expression with values inlined as literals.
    ///
    /// ```
    /// use quarry::{Case, Query};
    ///
    /// let query = Query::new()
    ///     .greater_than("age", 30)
    ///     .begins_with("name", "A", Case::Insensitive);
    /// assert_eq!(
    ///     query.to_literal_string(),
    ///     r#"age > 30 AND name BEGINSWITH[c] "A""#
    /// );
    /// ```
    #[must_use]
    pub fn to_literal_string(&self) -> String {
        criteria::render(&self.criteria, &mut Literals)
    }

    fn comparison(
        self,
        field: impl Into<String>,
        op: ComparisonOp,
        value: impl Into<QueryValue>,
    ) -> Self {
        self.add_criteria(Criterion::Comparison {
            field: field.into(),
            op,
            value: value.into(),
        })
    }

    fn string_match(
        self,
        field: impl Into<String>,
        op: MatchOp,
        value: impl Into<String>,
        case: Case,
    ) -> Self {
        self.add_criteria(Criterion::Match {
            field: field.into(),
            op,
            value: value.into(),
            case,
        })
    }

    fn unsupported(&self, operation: &'static str) -> Result<Self> {
        tracing::debug!(operation, criteria = self.criteria.len(), "rejected unsupported predicate");
        Err(Error::Unsupported { operation })
    }
}

impl<C: Collection> Query<C> {
    /// Returns the matching documents, sorted if a sort was recorded.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingCollection`] without a source, or the
    /// collection's error if it rejects the expression.
    pub fn find_all(&self) -> Result<C> {
        let result = self.filtered()?;
        Ok(match &self.sort {
            Some(SortKey { field, order }) => result.sorted(field, *order),
            None => result,
        })
    }

    /// Returns the first matching document in collection order.
    ///
    /// The recorded sort does not apply.
    ///
    /// # Errors
    ///
    /// See [`find_all`](Self::find_all).
    pub fn find_first(&self) -> Result<Option<Document>> {
        Ok(self.filtered()?.documents().first().cloned())
    }

    /// Counts the matching documents.
    ///
    /// # Errors
    ///
    /// See [`find_all`](Self::find_all).
    pub fn count(&self) -> Result<usize> {
        Ok(self.filtered()?.len())
    }

    /// Returns the matching documents, keeping only the first of each
    /// distinct `field` value. Missing fields count as `null`.
    ///
    /// # Errors
    ///
    /// See [`find_all`](Self::find_all).
    pub fn distinct(&self, field: &str) -> Result<Vec<Document>> {
        let result = self.filtered()?;
        let mut seen = HashSet::new();
        Ok(result
            .documents()
            .iter()
            .filter(|doc| seen.insert(resolve(doc, field).to_string()))
            .cloned()
            .collect())
    }

    /// Sums numeric `field` values; other values are skipped.
    ///
    /// # Errors
    ///
    /// See [`find_all`](Self::find_all).
    pub fn sum(&self, field: &str) -> Result<f64> {
        Ok(numeric_sum(self.filtered()?.documents(), field))
    }

    /// Averages `field` over the matching documents.
    ///
    /// The divisor is the number of matching documents.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyAverage`] when nothing matches, otherwise see
    /// [`find_all`](Self::find_all).
    #[allow(clippy::cast_precision_loss)]
    pub fn average(&self, field: &str) -> Result<f64> {
        let result = self.filtered()?;
        if result.is_empty() {
            return Err(Error::EmptyAverage {
                field: field.to_string(),
            });
        }
        Ok(numeric_sum(result.documents(), field) / result.len() as f64)
    }

    /// The matching document with the largest `field`; the first wins ties.
    ///
    /// # Errors
    ///
    /// See [`find_all`](Self::find_all).
    pub fn max(&self, field: &str) -> Result<Option<Document>> {
        self.extreme(field, Ordering::Greater)
    }

    /// The matching document with the smallest `field`; the first wins ties.
    ///
    /// # Errors
    ///
    /// See [`find_all`](Self::find_all).
    pub fn min(&self, field: &str) -> Result<Option<Document>> {
        self.extreme(field, Ordering::Less)
    }

    fn filtered(&self) -> Result<C> {
        let source = self.source.as_ref().ok_or(Error::MissingCollection)?;
        let Filter { expression, values } = self.to_filter();
        if expression.is_empty() {
            return Ok(source.clone());
        }

        let result = source.filtered(&expression, &values)?;
        tracing::debug!(
            expression = %expression,
            values = values.len(),
            matched = result.len(),
            "filtered collection"
        );
        Ok(result)
    }

    fn extreme(&self, field: &str, wanted: Ordering) -> Result<Option<Document>> {
        let result = self.filtered()?;
        let mut best: Option<&Document> = None;

        for doc in result.documents() {
            let value = resolve(doc, field);
            if value.is_null() || compare(value, value).is_none() {
                continue;
            }
            let replace = match best {
                None => true,
                Some(current) => compare(value, resolve(current, field)) == Some(wanted),
            };
            if replace {
                best = Some(doc);
            }
        }

        Ok(best.cloned())
    }
}

impl<C> fmt::Display for Query<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_filter().expression)
    }
}

fn numeric_sum(documents: &[Document], field: &str) -> f64 {
    documents
        .iter()
        .filter_map(|doc| resolve(doc, field).as_f64())
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn people() -> MemoryCollection {
        [18, 34, 28, 42, 18]
            .into_iter()
            .enumerate()
            .map(|(i, age)| json!({ "id": i + 1, "age": age }))
            .collect()
    }

    #[test]
    fn empty_query_renders_nothing() {
        let filter = Query::new().to_filter();
        assert_eq!(filter.expression, "");
        assert!(filter.values.is_empty());
    }

    #[test]
    fn begin_group_creates_group_lazily() {
        let query = Query::new().begin_group().end_group().equal_to("a", 1);
        assert_eq!(query.to_string(), "a == $0");
    }

    #[test]
    fn unclosed_group_still_renders_parenthesized() {
        let query = Query::new()
            .equal_to("a", 1)
            .begin_group()
            .equal_to("b", 2)
            .or()
            .equal_to("c", 3);
        assert_eq!(query.to_string(), "a == $0 AND (b == $1 OR c == $2)");
    }

    #[test]
    fn each_session_starts_a_new_group() {
        let query = Query::new()
            .begin_group()
            .equal_to("a", 1)
            .end_group()
            .begin_group()
            .equal_to("b", 2)
            .end_group();
        assert_eq!(query.to_string(), "(a == $0) AND (b == $1)");
    }

    #[test]
    fn repeated_begin_group_keeps_current_group() {
        let query = Query::new()
            .begin_group()
            .equal_to("a", 1)
            .begin_group()
            .or()
            .equal_to("b", 2);
        assert_eq!(query.to_string(), "(a == $0 OR b == $1)");
    }

    #[test]
    fn end_group_without_begin_is_ignored() {
        let query = Query::new().end_group().equal_to("a", 1);
        assert_eq!(query.to_string(), "a == $0");
    }

    #[test]
    fn join_inside_open_group_starts_a_new_group() {
        let other = Query::new().equal_to("b", 2);
        let query = Query::new()
            .begin_group()
            .equal_to("a", 1)
            .join(other)
            .equal_to("c", 3);
        assert_eq!(query.to_string(), "(a == $0) AND b == $1 AND (c == $2)");
    }

    #[test]
    fn sort_overwrites_previous_sort() {
        let query = Query::new().sort_by("age", SortOrder::Descending).sort("name");
        assert_eq!(
            query.sort_key(),
            Some(&SortKey {
                field: "name".to_string(),
                order: SortOrder::Ascending,
            })
        );
    }

    #[test]
    fn unsupported_predicates_leave_query_untouched() {
        let query = Query::new().equal_to("a", 1);
        let err = query.is_null("a").unwrap_err();
        assert_eq!(err.to_string(), "Not yet supported \"is_null\"");
        assert_eq!(query.to_string(), "a == $0");
    }

    #[test]
    fn terminal_operations_need_a_source() {
        let err = Query::new().equal_to("a", 1).count().unwrap_err();
        assert!(matches!(err, Error::MissingCollection));
    }

    #[test]
    fn empty_query_returns_whole_source() {
        let query = Query::with_source(people());
        assert_eq!(query.count().unwrap(), 5);
        assert_eq!(query.find_first().unwrap().unwrap()["id"], 1);
    }

    #[test]
    fn max_and_min_prefer_first_on_ties() {
        let query = Query::with_source(people());
        assert_eq!(query.min("age").unwrap().unwrap()["id"], 1);
        assert_eq!(query.max("age").unwrap().unwrap()["id"], 4);
    }

    #[test]
    fn extremes_skip_missing_and_incomparable_fields() {
        let source: MemoryCollection = vec![
            json!({ "id": 1 }),
            json!({ "id": 2, "age": [1, 2] }),
            json!({ "id": 3, "age": 7 }),
        ]
        .into();
        let query = Query::from(source);
        assert_eq!(query.max("age").unwrap().unwrap()["id"], 3);
        assert!(query.greater_than("age", 10).min("age").unwrap().is_none());
    }

    #[test]
    fn sum_skips_non_numeric_values() {
        let source: MemoryCollection =
            vec![json!({ "n": 1 }), json!({ "n": "x" }), json!({ "n": 2.5 })].into();
        let sum = Query::with_source(source).sum("n").unwrap();
        assert!((sum - 3.5).abs() < f64::EPSILON);
    }

    #[test]
    fn average_of_nothing_is_an_error() {
        let err = Query::with_source(people())
            .greater_than("age", 100)
            .average("age")
            .unwrap_err();
        assert!(matches!(err, Error::EmptyAverage { field } if field == "age"));
    }

    #[test]
    fn distinct_treats_missing_as_null() {
        let source: MemoryCollection = vec![
            json!({ "id": 1 }),
            json!({ "id": 2, "tag": null }),
            json!({ "id": 3, "tag": "a" }),
        ]
        .into();
        let ids: Vec<_> = Query::with_source(source)
            .distinct("tag")
            .unwrap()
            .into_iter()
            .map(|doc| doc["id"].clone())
            .collect();
        assert_eq!(ids, vec![json!(1), json!(3)]);
    }
}
