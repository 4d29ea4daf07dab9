//! JSON Lines persistence for quarry collections.
//!
//! This library provides line-numbered reading, resilient loading that
//! reports malformed lines as warnings, and crash-safe atomic writes of
//! JSONL (JSON Lines) data.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod atomic;
pub mod error;
pub mod reader;
pub mod warning;
pub mod writer;

pub use atomic::write_jsonl_atomic;
pub use error::{Error, Result};
pub use reader::{JsonlReader, read_jsonl_resilient};
pub use warning::Warning;
pub use writer::JsonlWriter;
