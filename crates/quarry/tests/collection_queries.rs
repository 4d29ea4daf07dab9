//! Integration tests for terminal operations against the in-memory collection.

mod common;

use chrono::{TimeZone, Utc};
use common::{AGES, field_values, people};
use quarry::{Case, Collection, Error, MemoryCollection, Query, SortOrder};
use rstest::{fixture, rstest};
use serde_json::json;

#[fixture]
fn query() -> Query {
    Query::with_source(people())
}

// ========== Filtering Tests ==========

#[rstest]
fn test_greater_than_keeps_matching_records(query: Query) {
    let result = query.greater_than("age", 30).find_all().unwrap();
    assert_eq!(field_values(result.documents(), "age"), vec![json!(34), json!(42)]);
}

#[rstest]
fn test_empty_query_returns_everything(query: Query) {
    let result = query.find_all().unwrap();
    assert_eq!(result.len(), AGES.len());
}

#[rstest]
fn test_date_filter(query: Query) {
    let cutoff = Utc.with_ymd_and_hms(2010, 1, 1, 0, 0, 0).unwrap();
    let result = query.less_than("created_at", cutoff).find_all().unwrap();
    assert_eq!(field_values(result.documents(), "id"), vec![json!(1), json!(3), json!(5)]);
}

#[rstest]
#[case::sensitive(Case::Sensitive, vec![json!(1), json!(4)])]
#[case::insensitive(Case::Insensitive, vec![json!(1), json!(4), json!(5)])]
fn test_begins_with_casing(query: Query, #[case] case: Case, #[case] expected: Vec<serde_json::Value>) {
    let result = query.begins_with("name", "P", case).find_all().unwrap();
    assert_eq!(field_values(result.documents(), "id"), expected);
}

#[rstest]
fn test_group_or_against_collection(query: Query) {
    let count = query
        .greater_than("age", 20)
        .begin_group()
        .equal_to("name", "Ana")
        .or()
        .equal_to("name", "Pedro")
        .end_group()
        .count()
        .unwrap();
    assert_eq!(count, 2);
}

#[rstest]
fn test_not_negates_everything(query: Query) {
    let result = query.not().greater_than("age", 30).find_all().unwrap();
    assert_eq!(
        field_values(result.documents(), "age"),
        vec![json!(18), json!(28), json!(18)]
    );
}

#[rstest]
fn test_in_values_and_empty_in(query: Query) {
    assert_eq!(query.clone().in_values("id", [2, 4, 9]).count().unwrap(), 2);
    assert_eq!(query.in_values("id", Vec::<i64>::new()).count().unwrap(), 0);
}

#[rstest]
fn test_between_is_inclusive(query: Query) {
    assert_eq!(query.between("age", 18, 28).count().unwrap(), 3);
}

#[rstest]
fn test_join_applies_both_filters(query: Query) {
    let names = Query::new().contains("name", "e", Case::Sensitive);
    let result = query.greater_than("age", 30).join(names).find_all().unwrap();
    assert_eq!(field_values(result.documents(), "id"), vec![json!(2), json!(4)]);
}

#[rstest]
fn test_literal_string_filters_like_placeholders(query: Query) {
    let query = query.greater_than("age", 20).ends_with("name", "o", Case::Sensitive);
    let source = query.source().unwrap();
    let by_literal = source.filtered(&query.to_literal_string(), &[]).unwrap();
    assert_eq!(by_literal, query.find_all().unwrap());
    assert_eq!(by_literal.len(), 1);
}

#[rstest]
#[case::huge(Query::new().less_than("age", 1e20), 5)]
#[case::tiny(Query::new().greater_than("age", 1e-7), 5)]
#[case::whole(Query::new().greater_than_or_equal_to("age", 28.0), 3)]
#[case::infinite(Query::new().less_than("age", f64::INFINITY), 5)]
#[case::negative_infinite(Query::new().less_than("age", f64::NEG_INFINITY), 0)]
#[case::nan(Query::new().less_than("age", f64::NAN), 0)]
fn test_float_literals_filter_like_placeholders(#[case] query: Query, #[case] expected: usize) {
    let source = people();
    let by_literal = source.filtered(&query.to_literal_string(), &[]).unwrap();
    let by_placeholder = source.filtered(&query.to_string(), &query.values()).unwrap();
    assert_eq!(by_literal, by_placeholder);
    assert_eq!(by_literal.len(), expected);
}

#[rstest]
fn test_in_values_accepts_unsigned_ids(query: Query) {
    let ids: Vec<usize> = vec![1, 2];
    assert_eq!(query.clone().in_values("id", ids).count().unwrap(), 2);
    assert_eq!(query.in_values("id", [3_u64, 99]).count().unwrap(), 1);
}

// ========== Sorting Tests ==========

#[rstest]
#[case::ascending(SortOrder::Ascending, [18, 18, 28, 34, 42])]
#[case::descending(SortOrder::Descending, [42, 34, 28, 18, 18])]
fn test_sort_by(query: Query, #[case] order: SortOrder, #[case] expected: [i64; 5]) {
    let result = query.sort_by("age", order).find_all().unwrap();
    let expected: Vec<_> = expected.into_iter().map(|age| json!(age)).collect();
    assert_eq!(field_values(result.documents(), "age"), expected);
}

#[rstest]
fn test_sort_defaults_to_ascending_and_is_stable(query: Query) {
    let result = query.sort("age").find_all().unwrap();
    assert_eq!(
        field_values(result.documents(), "id"),
        vec![json!(1), json!(5), json!(3), json!(2), json!(4)]
    );
}

#[rstest]
fn test_sort_order_parsed_from_text(query: Query) {
    let order: SortOrder = "desc".parse().unwrap();
    let first = query.sort_by("age", order).find_all().unwrap();
    assert_eq!(first.documents()[0]["age"], 42);
}

#[rstest]
fn test_find_first_ignores_sort(query: Query) {
    let first = query.sort_by("age", SortOrder::Descending).find_first().unwrap();
    assert_eq!(first.unwrap()["id"], 1);
}

#[rstest]
fn test_find_first_on_empty_result(query: Query) {
    assert!(query.greater_than("age", 99).find_first().unwrap().is_none());
}

// ========== Aggregate Tests ==========

#[rstest]
fn test_average(query: Query) {
    let average = query.average("age").unwrap();
    assert!((average - 28.0).abs() < f64::EPSILON);
}

#[rstest]
fn test_sum(query: Query) {
    let sum = query.clone().sum("age").unwrap();
    assert!((sum - 140.0).abs() < f64::EPSILON);

    let empty = query.greater_than("age", 99).sum("age").unwrap();
    assert!(empty.abs() < f64::EPSILON);
}

#[rstest]
fn test_max_and_min(query: Query) {
    let max = query.max("age").unwrap().unwrap();
    assert_eq!(max["age"], 42);
    assert_eq!(max["name"], "Pedro");

    let min = query.min("age").unwrap().unwrap();
    assert_eq!(min["age"], 18);
    assert_eq!(min["id"], 1);
}

#[rstest]
fn test_max_on_empty_result(query: Query) {
    assert!(query.greater_than("age", 99).max("age").unwrap().is_none());
}

#[rstest]
fn test_distinct_preserves_first_seen(query: Query) {
    let distinct = query.distinct("age").unwrap();
    assert_eq!(
        field_values(&distinct, "age"),
        vec![json!(18), json!(34), json!(28), json!(42)]
    );
}

#[rstest]
fn test_count(query: Query) {
    assert_eq!(query.clone().count().unwrap(), 5);
    assert_eq!(query.equal_to("age", 18).count().unwrap(), 2);
}

// ========== Error Tests ==========

#[rstest]
fn test_average_of_empty_result(query: Query) {
    let result = query.greater_than("age", 99).average("age");
    assert!(matches!(result, Err(Error::EmptyAverage { .. })));
}

#[test]
fn test_terminal_without_source() {
    let query = Query::new().greater_than("age", 30);
    assert!(matches!(query.find_all(), Err(Error::MissingCollection)));
    assert!(matches!(query.count(), Err(Error::MissingCollection)));
    assert!(matches!(query.sum("age"), Err(Error::MissingCollection)));
}

#[test]
fn test_nested_fields() {
    let source: MemoryCollection = vec![
        json!({ "id": 1, "address": { "city": "Lisbon" } }),
        json!({ "id": 2, "address": { "city": "Hanoi" } }),
        json!({ "id": 3 }),
    ]
    .into();
    let result = Query::with_source(source)
        .equal_to("address.city", "Hanoi")
        .find_all()
        .unwrap();
    assert_eq!(field_values(result.documents(), "id"), vec![json!(2)]);
}
