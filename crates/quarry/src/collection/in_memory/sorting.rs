//! Field-based ordering of documents.

use crate::collection::field::{resolve, sort_order};
use crate::collection::{Document, SortOrder};

/// Sorts documents by `field` in place.
///
/// The sort is stable in both directions: documents with equal values keep
/// their collection order. Missing and null values sort first when ascending
/// and last when descending; see [`sort_order`] for mixed types.
pub(super) fn sort_by_field(documents: &mut [Document], field: &str, order: SortOrder) {
    documents.sort_by(|a, b| {
        let ordering = sort_order(resolve(a, field), resolve(b, field));
        if order.is_reverse() {
            ordering.reverse()
        } else {
            ordering
        }
    });
}
