//! Persistence for finished prompt packages.
//!
//! # Overview
//!
//! - **PackageStore**: create, list and patch stored packages. Packages are
//!   never deleted.
//! - **SqlitePackageStore**: the SQLite implementation (WAL journal).
//! - **JsonFileSink**: timestamped pretty JSON files on disk.
//!
//! # Usage
//!
//! ```rust,ignore
//! use prompt_forge::storage::{PackageStore, SqlitePackageStore, JsonFileSink};
//!
//! let store = SqlitePackageStore::open("prompt_forge.db").await?;
//! let id = store.create(&package).await?;
//!
//! let mut updates = serde_json::Map::new();
//! updates.insert("category".into(), "Photography".into());
//! store.update_fields(id, &updates).await?;
//!
//! let path = JsonFileSink::new("output").save(&package, "prompt_retro_posters")?;
//! ```

pub mod database;
pub mod files;

pub use database::SqlitePackageStore;
pub use files::{sanitize_prefix, JsonFileSink};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

use crate::error::PackageError;
use crate::package::PromptPackage;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Query execution failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Connection to the database failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// No package with this id.
    #[error("Package not found: {0}")]
    NotFound(Uuid),

    /// A stored or patched document is not a valid package.
    #[error("Invalid package: {0}")]
    Package(#[from] PackageError),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// File I/O failed.
    #[error("IO error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// A package as stored, with its record metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredPackage {
    pub id: Uuid,
    pub package: PromptPackage,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Persistence sink for packages.
#[async_trait]
pub trait PackageStore: Send + Sync {
    /// Store a new package and return its id.
    async fn create(&self, package: &PromptPackage) -> Result<Uuid, StorageError>;

    /// All stored packages, newest first.
    async fn list_all(&self) -> Result<Vec<StoredPackage>, StorageError>;

    /// Merge top-level keys into a stored package.
    ///
    /// The merged document must still be a valid package; unknown keys are
    /// rejected and the stored record is left unchanged on error.
    async fn update_fields(
        &self,
        id: Uuid,
        updates: &Map<String, Value>,
    ) -> Result<PromptPackage, StorageError>;
}
