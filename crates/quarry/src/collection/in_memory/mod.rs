//! In-memory collection of JSON documents.
//!
//! [`MemoryCollection`] evaluates filter expressions itself: each call to
//! [`filtered`](Collection::filtered) parses the expression, checks that every
//! placeholder has a bound value, and keeps the documents the predicate
//! accepts, in their original order.
//!
//! # Comparison semantics
//!
//! - Numbers compare numerically; integers and floats mix freely
//! - Strings compare lexicographically
//! - Date values compare against RFC 3339 string fields
//! - `null` equals only missing or null fields
//! - Incomparable pairs are unequal (`<>` holds, ordering operators fail)
//! - String operators only match string fields; `[c]` folds case
//!
//! # Persistence
//!
//! Collections load from and save to JSONL files, one document per line.
//! See [`MemoryCollection::load_from_jsonl`].

mod eval;
mod expression;
mod jsonl;
mod sorting;

use super::{Collection, Document, SortOrder};
use crate::error::{Error, Result};
use crate::value::QueryValue;

/// A collection of documents held in memory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryCollection {
    documents: Vec<Document>,
}

impl MemoryCollection {
    /// Creates a collection from documents, keeping their order.
    #[must_use]
    pub fn new(documents: Vec<Document>) -> Self {
        Self { documents }
    }

    /// Appends a document.
    pub fn push(&mut self, document: Document) {
        self.documents.push(document);
    }

    /// Consumes the collection, returning its documents.
    #[must_use]
    pub fn into_documents(self) -> Vec<Document> {
        self.documents
    }
}

impl Collection for MemoryCollection {
    fn filtered(&self, expression: &str, values: &[QueryValue]) -> Result<Self> {
        let predicate = expression::parse(expression)?;
        if let Some(index) = predicate.max_placeholder()
            && index >= values.len()
        {
            return Err(Error::MissingParameter {
                index,
                bound: values.len(),
            });
        }

        let mut documents = Vec::new();
        for document in &self.documents {
            if predicate.matches(document, values)? {
                documents.push(document.clone());
            }
        }
        Ok(Self { documents })
    }

    fn sorted(&self, field: &str, order: SortOrder) -> Self {
        let mut documents = self.documents.clone();
        sorting::sort_by_field(&mut documents, field, order);
        tracing::trace!(field, %order, documents = documents.len(), "sorted collection");
        Self { documents }
    }

    fn documents(&self) -> &[Document] {
        &self.documents
    }
}

impl From<Vec<Document>> for MemoryCollection {
    fn from(documents: Vec<Document>) -> Self {
        Self::new(documents)
    }
}

impl FromIterator<Document> for MemoryCollection {
    fn from_iter<I: IntoIterator<Item = Document>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
