//! Common fixtures shared across integration tests.

#![allow(dead_code)]

use quarry::{Document, MemoryCollection};
use serde_json::json;

/// Ages of the five people in [`people`], in collection order.
pub const AGES: [i64; 5] = [18, 34, 28, 42, 18];

/// Build a person document.
pub fn person(id: u32, name: &str, age: i64, created_at: &str) -> Document {
    json!({
        "id": id,
        "name": name,
        "age": age,
        "created_at": created_at,
    })
}

/// Five people; three of them were created before 2010.
pub fn people() -> MemoryCollection {
    vec![
        person(1, "Phuong", AGES[0], "2006-04-11T09:30:00Z"),
        person(2, "Necati", AGES[1], "2011-09-26T16:42:17Z"),
        person(3, "Ana", AGES[2], "2008-01-02T00:00:00Z"),
        person(4, "Pedro", AGES[3], "2015-06-30T12:00:00Z"),
        person(5, "phil", AGES[4], "2009-12-31T23:59:59Z"),
    ]
    .into()
}

/// The `field` values of `documents`, in order.
pub fn field_values(documents: &[Document], field: &str) -> Vec<serde_json::Value> {
    documents.iter().map(|doc| doc[field].clone()).collect()
}
