//! SQLite package store.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow, SqliteSynchronous,
};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::{PackageStore, StorageError, StoredPackage};
use crate::package::PromptPackage;

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS prompt_packages (
    id              TEXT    PRIMARY KEY,
    topic           TEXT    NOT NULL,
    content_type    TEXT    NOT NULL,
    platform        TEXT    NOT NULL,
    category        TEXT,

    -- Full package document
    package         TEXT    NOT NULL,

    created_at      TEXT    NOT NULL,
    updated_at      TEXT    NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_prompt_packages_category ON prompt_packages(category);
CREATE INDEX IF NOT EXISTS idx_prompt_packages_created ON prompt_packages(created_at);
"#;

/// Package store on a SQLite database.
#[derive(Clone)]
pub struct SqlitePackageStore {
    pool: SqlitePool,
}

impl std::fmt::Debug for SqlitePackageStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqlitePackageStore").finish_non_exhaustive()
    }
}

impl SqlitePackageStore {
    /// Open (or create) a database file.
    pub async fn open(path: &str) -> Result<Self, StorageError> {
        let opts = SqliteConnectOptions::from_str(&format!("sqlite://{}", path))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(opts)
            .await
            .map_err(|e| StorageError::ConnectionFailed(e.to_string()))?;

        let store = Self::from_pool(pool).await?;
        tracing::info!(path = path, "Package store opened");
        Ok(store)
    }

    /// A private in-memory database.
    pub async fn open_in_memory() -> Result<Self, StorageError> {
        let opts = SqliteConnectOptions::from_str("sqlite::memory:")?;
        // every connection would see its own empty database
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(opts)
            .await
            .map_err(|e| StorageError::ConnectionFailed(e.to_string()))?;
        Self::from_pool(pool).await
    }

    /// Use an existing pool; the schema is created if missing.
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, StorageError> {
        sqlx::query(SCHEMA_SQL).execute(&pool).await?;
        Ok(Self { pool })
    }

    /// Fetch one package by id.
    pub async fn get(&self, id: Uuid) -> Result<Option<StoredPackage>, StorageError> {
        let row = sqlx::query("SELECT * FROM prompt_packages WHERE id = ?1")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(stored_from_row).transpose()
    }

    /// Number of stored packages.
    pub async fn count(&self) -> Result<u64, StorageError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM prompt_packages")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }
}

fn stored_from_row(row: &SqliteRow) -> Result<StoredPackage, StorageError> {
    let id: String = row.try_get("id")?;
    let id = Uuid::parse_str(&id).map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
    let document: String = row.try_get("package")?;
    Ok(StoredPackage {
        id,
        package: PromptPackage::from_json_str(&document)?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
    })
}

#[async_trait]
impl PackageStore for SqlitePackageStore {
    async fn create(&self, package: &PromptPackage) -> Result<Uuid, StorageError> {
        let id = Uuid::new_v4();
        let now = Utc::now();
        let document = serde_json::to_string(&package.to_value()?)?;

        sqlx::query(
            "INSERT INTO prompt_packages (
                id, topic, content_type, platform, category, package, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )
        .bind(id.to_string())
        .bind(&package.topic)
        .bind(package.content_type.as_str())
        .bind(&package.platform)
        .bind(&package.category)
        .bind(document)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        tracing::info!(%id, topic = %package.topic, "Package stored");
        Ok(id)
    }

    async fn list_all(&self) -> Result<Vec<StoredPackage>, StorageError> {
        let rows = sqlx::query("SELECT * FROM prompt_packages ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(stored_from_row).collect()
    }

    async fn update_fields(
        &self,
        id: Uuid,
        updates: &Map<String, Value>,
    ) -> Result<PromptPackage, StorageError> {
        let mut stored = self.get(id).await?.ok_or(StorageError::NotFound(id))?;
        stored.package.apply_updates(updates)?;
        let package = stored.package;
        let document = serde_json::to_string(&package.to_value()?)?;

        sqlx::query(
            "UPDATE prompt_packages SET
                topic = ?2, content_type = ?3, platform = ?4, category = ?5,
                package = ?6, updated_at = ?7
            WHERE id = ?1",
        )
        .bind(id.to_string())
        .bind(&package.topic)
        .bind(package.content_type.as_str())
        .bind(&package.platform)
        .bind(&package.category)
        .bind(document)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        tracing::debug!(%id, fields = updates.len(), "Package updated");
        Ok(package)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PackageError;
    use crate::package::ContentType;
    use serde_json::json;

    fn package(topic: &str) -> PromptPackage {
        PromptPackage::new(topic, ContentType::Image, "Midjourney", "", "", "A [SUBJECT] at [PLACE]")
    }

    #[tokio::test]
    async fn test_create_and_list() {
        let store = SqlitePackageStore::open_in_memory().await.expect("open");
        let first = store.create(&package("Vintage Botanical Prints")).await.expect("create");
        let second = store.create(&package("Neon Street Photography")).await.expect("create");
        assert_ne!(first, second);

        let all = store.list_all().await.expect("list");
        assert_eq!(all.len(), 2);
        assert_eq!(store.count().await.expect("count"), 2);
        let stored = store.get(first).await.expect("get").expect("present");
        assert_eq!(stored.package.topic, "Vintage Botanical Prints");
        assert_eq!(stored.package.variables().len(), 2);
    }

    #[tokio::test]
    async fn test_update_fields_merges() {
        let store = SqlitePackageStore::open_in_memory().await.expect("open");
        let id = store.create(&package("Vintage Botanical Prints")).await.expect("create");

        let updates = json!({"category": "Illustration", "tips": ["Use muted colors"]});
        let updated = store
            .update_fields(id, updates.as_object().expect("object"))
            .await
            .expect("update");
        assert_eq!(updated.category.as_deref(), Some("Illustration"));

        let stored = store.get(id).await.expect("get").expect("present");
        assert_eq!(stored.package.tips, vec!["Use muted colors".to_string()]);
        assert!(stored.updated_at >= stored.created_at);
    }

    #[tokio::test]
    async fn test_update_fields_rejects_unknown_key() {
        let store = SqlitePackageStore::open_in_memory().await.expect("open");
        let id = store.create(&package("Vintage Botanical Prints")).await.expect("create");

        let err = store
            .update_fields(id, json!({"price": 4.99}).as_object().expect("object"))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Package(PackageError::UnknownField(_))));

        let stored = store.get(id).await.expect("get").expect("present");
        assert!(stored.package.category.is_none());
    }

    #[tokio::test]
    async fn test_update_missing_package() {
        let store = SqlitePackageStore::open_in_memory().await.expect("open");
        let err = store
            .update_fields(Uuid::new_v4(), &Map::new())
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_open_file_database() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("packages.db");
        let path = path.to_string_lossy().to_string();
        {
            let store = SqlitePackageStore::open(&path).await.expect("open");
            store.create(&package("Vintage Botanical Prints")).await.expect("create");
        }
        let store = SqlitePackageStore::open(&path).await.expect("reopen");
        assert_eq!(store.list_all().await.expect("list").len(), 1);
    }
}
