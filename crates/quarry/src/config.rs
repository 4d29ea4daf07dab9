//! Collection configuration.
//!
//! A YAML file names the JSONL file backing a collection and how strictly it
//! is loaded:
//!
//! ```yaml
//! data-file: people.jsonl
//! strict: false
//! ```
//!
//! A relative `data-file` is resolved against the directory holding the
//! configuration file.

use crate::collection::MemoryCollection;
use crate::error::{Error, Result};
use quarry_jsonl::Warning;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Default name of the data file.
pub const DEFAULT_DATA_FILE: &str = "documents.jsonl";

/// Configuration for a JSONL-backed collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct CollectionConfig {
    /// Path to the JSONL data file
    pub data_file: PathBuf,

    /// Fail on the first unusable line instead of skipping it
    #[serde(default)]
    pub strict: bool,
}

impl CollectionConfig {
    /// Create a configuration for the given data file
    pub fn new(data_file: impl Into<PathBuf>) -> Self {
        Self {
            data_file: data_file.into(),
            strict: false,
        }
    }

    /// Load configuration from a file
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read and
    /// [`Error::Config`] if it is not valid configuration YAML.
    pub async fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).await?;
        serde_yaml::from_str(&content).map_err(|e| Error::Config(e.to_string()))
    }

    /// Save configuration to a file
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub async fn save(&self, path: &Path) -> Result<()> {
        let content =
            serde_yaml::to_string(self).map_err(|e| Error::Config(format!("YAML error: {e}")))?;
        fs::write(path, content).await?;
        Ok(())
    }

    /// The data file path, resolved against `base_dir` when relative.
    #[must_use]
    pub fn data_path(&self, base_dir: &Path) -> PathBuf {
        if self.data_file.is_absolute() {
            self.data_file.clone()
        } else {
            base_dir.join(&self.data_file)
        }
    }
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self::new(DEFAULT_DATA_FILE)
    }
}

/// Opens the collection described by the configuration file at `config_path`.
///
/// In strict mode the warning list is always empty, since the first unusable
/// line is an error.
///
/// # Errors
///
/// Returns configuration errors from [`CollectionConfig::load`], and load
/// errors from [`MemoryCollection::load_from_jsonl`] or
/// [`MemoryCollection::load_from_jsonl_strict`].
pub async fn open_collection(config_path: &Path) -> Result<(MemoryCollection, Vec<Warning>)> {
    let config = CollectionConfig::load(config_path).await?;
    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));
    let data_path = config.data_path(base_dir);

    tracing::debug!(
        config = %config_path.display(),
        data = %data_path.display(),
        strict = config.strict,
        "opening collection"
    );

    if config.strict {
        let collection = MemoryCollection::load_from_jsonl_strict(&data_path).await?;
        Ok((collection, Vec::new()))
    } else {
        MemoryCollection::load_from_jsonl(&data_path).await
    }
}
