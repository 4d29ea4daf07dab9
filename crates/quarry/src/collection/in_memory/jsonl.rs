//! JSONL persistence for in-memory collections.
//!
//! Each line of the file holds one document, which must be a JSON object.

use super::MemoryCollection;
use crate::collection::Document;
use crate::error::{Error, Result};
use quarry_jsonl::{JsonlReader, Warning, write_jsonl_atomic};
use std::path::Path;
use tokio::fs::File;

impl MemoryCollection {
    /// Loads a collection from a JSONL file, skipping unusable lines.
    ///
    /// - **Malformed JSON**: the line is skipped and reported as
    ///   [`Warning::MalformedJson`] with its file line number
    /// - **Not an object**: the line is skipped and reported as
    ///   [`Warning::SkippedLine`] with its file line number
    ///
    /// Every warning is also logged at `warn` level.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be opened or read.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use quarry::MemoryCollection;
    /// use std::path::Path;
    ///
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() -> quarry::Result<()> {
    /// let (people, warnings) = MemoryCollection::load_from_jsonl(Path::new("people.jsonl")).await?;
    /// for warning in &warnings {
    ///     eprintln!("{warning}");
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn load_from_jsonl(path: &Path) -> Result<(Self, Vec<Warning>)> {
        let file = File::open(path).await?;
        let mut reader = JsonlReader::new(file);
        let mut documents = Vec::new();
        let mut warnings = Vec::new();

        while let Some(line) = reader.read_raw_line().await? {
            let line_number = reader.line_number();
            let warning = match serde_json::from_str::<Document>(&line) {
                Ok(document) if document.is_object() => {
                    documents.push(document);
                    continue;
                }
                Ok(_) => Warning::SkippedLine {
                    line_number,
                    reason: "expected a JSON object".to_string(),
                },
                Err(e) => Warning::MalformedJson {
                    line_number,
                    error: e.to_string(),
                },
            };
            tracing::warn!(%warning, "skipping JSONL line");
            warnings.push(warning);
        }

        tracing::debug!(
            path = %path.display(),
            documents = documents.len(),
            warnings = warnings.len(),
            "loaded collection"
        );
        Ok((Self::new(documents), warnings))
    }

    /// Loads a collection from a JSONL file, failing on the first bad line.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`] naming the line when a line is not valid
    /// JSON or not an object, and [`Error::Io`] on read failures.
    pub async fn load_from_jsonl_strict(path: &Path) -> Result<Self> {
        let file = File::open(path).await?;
        let mut reader = JsonlReader::new(file);
        let mut documents = Vec::new();

        while let Some(document) = reader.read_line::<Document>().await? {
            if !document.is_object() {
                return Err(Error::Storage(format!(
                    "line {}: expected a JSON object",
                    reader.line_number()
                )));
            }
            documents.push(document);
        }

        tracing::debug!(path = %path.display(), documents = documents.len(), "loaded collection");
        Ok(Self::new(documents))
    }

    /// Saves the collection to a JSONL file with an atomic replace.
    ///
    /// # Errors
    ///
    /// Returns an error if the temporary file cannot be written or renamed.
    pub async fn save_to_jsonl(&self, path: &Path) -> Result<()> {
        write_jsonl_atomic(path, &self.documents).await?;
        Ok(())
    }
}
