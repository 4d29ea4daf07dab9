//! Atomic write operations for JSONL files.
//!
//! Data is first written to a temporary file next to the target, flushed,
//! then renamed over the target. On POSIX systems the rename is atomic, so a
//! crash mid-write leaves the original file intact (the temporary file may be
//! left behind).

use crate::{JsonlWriter, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs::File;

/// Atomically writes a slice of values to a JSONL file.
///
/// # Errors
///
/// Returns an error if the temporary file cannot be created, a value fails
/// to serialize, a write fails, or the final rename fails (for example across
/// filesystems). On failure the original file is left unchanged.
///
/// # Examples
///
/// ```no_run
/// use quarry_jsonl::write_jsonl_atomic;
/// use serde_json::json;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let people = vec![json!({ "name": "clinton" }), json!({ "name": "necati" })];
/// write_jsonl_atomic("people.jsonl", &people).await?;
/// # Ok(())
/// # }
/// ```
pub async fn write_jsonl_atomic<T, P>(path: P, values: &[T]) -> Result<()>
where
    T: Serialize,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let temp_path = make_temp_path(path);

    if let Err(e) = write_to_temp_file(&temp_path, values).await {
        // Best-effort cleanup
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(e);
    }

    tokio::fs::rename(&temp_path, path).await?;
    tracing::debug!(path = %path.display(), records = values.len(), "wrote JSONL file");

    Ok(())
}

/// Temp path for an atomic write: `data.jsonl` becomes `data.jsonl.tmp`.
fn make_temp_path(path: &Path) -> PathBuf {
    let mut temp_path = path.to_path_buf();
    let new_extension = match path.extension() {
        Some(ext) => {
            let mut new_ext = ext.to_os_string();
            new_ext.push(".tmp");
            new_ext
        }
        None => std::ffi::OsString::from("tmp"),
    };
    temp_path.set_extension(new_extension);
    temp_path
}

async fn write_to_temp_file<T: Serialize>(temp_path: &Path, values: &[T]) -> Result<()> {
    let file = File::create(temp_path).await?;
    let mut writer = JsonlWriter::new(file);
    writer.write_all(values).await?;
    writer.flush().await?;
    Ok(())
}
