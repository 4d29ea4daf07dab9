//! Quarry - a fluent query builder for document collections.
//!
//! Chained predicate calls are compiled into a single filter expression with
//! positional placeholders plus the ordered values they bind. Evaluation is
//! delegated to a [`Collection`]; [`MemoryCollection`] is the bundled
//! in-memory implementation with JSONL persistence.
//!
//! # Example
//!
//! ```
//! use quarry::{MemoryCollection, Query};
//! use serde_json::json;
//!
//! let people: MemoryCollection = [18, 34, 28, 42, 18]
//!     .into_iter()
//!     .map(|age| json!({ "age": age }))
//!     .collect();
//!
//! let query = Query::with_source(people).greater_than("age", 30);
//! assert_eq!(query.to_string(), "age > $0");
//! assert_eq!(query.count()?, 2);
//! # Ok::<(), quarry::Error>(())
//! ```

#![forbid(unsafe_code)]

pub mod collection;
pub mod config;
pub mod criteria;
pub mod error;
pub mod query;
pub mod value;

pub use collection::{Collection, Document, MemoryCollection, SortOrder};
pub use config::{CollectionConfig, open_collection};
pub use criteria::{Case, ComparisonOp, Criterion, Keyword, MatchOp};
pub use error::{Error, Result};
pub use quarry_jsonl::Warning;
pub use query::{Filter, Query, SortKey};
pub use value::QueryValue;
