//! Error types for quarry operations.

use std::io;
use thiserror::Error;

/// The error type for quarry operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Predicate the builder does not implement.
    #[error("Not yet supported \"{operation}\"")]
    Unsupported {
        /// Name of the rejected builder method.
        operation: &'static str,
    },

    /// A terminal operation ran on a query built without a collection.
    #[error("Query has no source collection")]
    MissingCollection,

    /// The collection rejected the filter expression.
    #[error("Invalid filter expression at offset {position}: {message}")]
    Parse {
        /// Byte offset of the offending token.
        position: usize,
        /// What was expected or found.
        message: String,
    },

    /// A placeholder has no bound value.
    #[error("Placeholder ${index} has no bound value ({bound} bound)")]
    MissingParameter {
        /// Placeholder index.
        index: usize,
        /// Number of values supplied.
        bound: usize,
    },

    /// `average` over an empty result.
    #[error("Cannot average '{field}' over an empty result")]
    EmptyAverage {
        /// Field that was averaged.
        field: String,
    },

    /// IO error occurred.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Collection storage error.
    #[error("Storage error: {0}")]
    Storage(String),

    /// A sort order other than `ASC` or `DESC`.
    #[error("Invalid sort order '{0}': expected ASC or DESC")]
    InvalidSortOrder(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<quarry_jsonl::Error> for Error {
    fn from(err: quarry_jsonl::Error) -> Self {
        match err {
            quarry_jsonl::Error::Io(e) => Self::Io(e),
            quarry_jsonl::Error::Json(e) => Self::Json(e),
            quarry_jsonl::Error::InvalidFormat(msg) => Self::Storage(msg),
        }
    }
}

/// A specialized Result type for quarry operations.
pub type Result<T> = std::result::Result<T, Error>;
