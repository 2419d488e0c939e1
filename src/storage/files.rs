//! Timestamped JSON files.

use std::path::{Path, PathBuf};

use chrono::Local;
use serde::Serialize;

use super::StorageError;

/// Keep letters, digits, `_` and `-`; whitespace becomes `_`.
pub fn sanitize_prefix(prefix: &str) -> String {
    let cleaned: String = prefix
        .trim()
        .chars()
        .filter_map(|c| {
            if c.is_alphanumeric() || c == '_' || c == '-' {
                Some(c)
            } else if c.is_whitespace() {
                Some('_')
            } else {
                None
            }
        })
        .collect();
    if cleaned.is_empty() {
        "package".to_string()
    } else {
        cleaned
    }
}

/// Writes documents as `{prefix}_{YYYYmmdd_HHMMSS}.json` under a directory.
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    dir: PathBuf,
}

impl JsonFileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Save a document and return the path written.
    pub fn save<T: Serialize>(&self, document: &T, prefix: &str) -> Result<PathBuf, StorageError> {
        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let filename = format!("{}_{}.json", sanitize_prefix(prefix), timestamp);
        let path = self.dir.join(filename);
        self.write_to(document, &path)?;
        Ok(path)
    }

    /// Save a document to an explicit path.
    pub fn write_to<T: Serialize>(&self, document: &T, path: &Path) -> Result<(), StorageError> {
        let io_err = |source| StorageError::Io {
            path: path.display().to_string(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let json = serde_json::to_string_pretty(document)?;
        std::fs::write(path, json).map_err(io_err)?;
        tracing::info!(path = %path.display(), "Saved output");
        Ok(())
    }
}
