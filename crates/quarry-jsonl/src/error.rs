//! Errors raised while reading or writing JSONL files.

use std::io;
use thiserror::Error;

/// Failure of a JSONL read or write.
#[derive(Debug, Error)]
pub enum Error {
    /// The file could not be opened, read, written or renamed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A value could not be serialized to a line.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A line is not a valid record; the message names the line.
    #[error("Invalid record: {0}")]
    InvalidFormat(String),
}

/// Result alias for JSONL operations.
pub type Result<T> = std::result::Result<T, Error>;
