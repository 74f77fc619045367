use crate::models::ShortLink;
use crate::storage::{Storage, StorageError, StorageResult};
use anyhow::Result;
use async_trait::async_trait;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::sync::Arc;

pub struct SqliteStorage {
    pool: Arc<SqlitePool>,
}

impl SqliteStorage {
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self {
            pool: Arc::new(pool),
        })
    }
}

#[async_trait]
impl Storage for SqliteStorage {
    async fn init(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS links (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                short_id TEXT NOT NULL UNIQUE,
                original_url TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                clicks INTEGER NOT NULL DEFAULT 0,
                last_accessed INTEGER
            )
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_short_id ON links(short_id)")
            .execute(self.pool.as_ref())
            .await?;

        Ok(())
    }

    async fn insert(&self, short_id: &str, original_url: &str) -> StorageResult<ShortLink> {
        let created_at = chrono::Utc::now().timestamp();

        let result = sqlx::query(
            r#"
            INSERT INTO links (short_id, original_url, created_at)
            VALUES (?, ?, ?)
            ON CONFLICT(short_id) DO NOTHING
            "#,
        )
        .bind(short_id)
        .bind(original_url)
        .bind(created_at)
        .execute(self.pool.as_ref())
        .await
        .map_err(|e| StorageError::Other(e.into()))?;

        if result.rows_affected() == 0 {
            return Err(StorageError::Conflict);
        }

        let link = sqlx::query_as::<_, ShortLink>(
            r#"
            SELECT id, short_id, original_url, created_at, clicks, last_accessed
            FROM links
            WHERE short_id = ?
            "#,
        )
        .bind(short_id)
        .fetch_one(self.pool.as_ref())
        .await
        .map_err(|e| StorageError::Other(e.into()))?;

        Ok(link)
    }

    async fn get(&self, short_id: &str) -> Result<Option<ShortLink>> {
        let link = sqlx::query_as::<_, ShortLink>(
            r#"
            SELECT id, short_id, original_url, created_at, clicks, last_accessed
            FROM links
            WHERE short_id = ?
            "#,
        )
        .bind(short_id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(link)
    }

    async fn record_visit(&self, short_id: &str) -> Result<Option<ShortLink>> {
        let now = chrono::Utc::now().timestamp();

        // Single statement, so concurrent visits never lose an increment.
        let result = sqlx::query(
            r#"
            UPDATE links
            SET clicks = clicks + 1, last_accessed = ?
            WHERE short_id = ?
            "#,
        )
        .bind(now)
        .bind(short_id)
        .execute(self.pool.as_ref())
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.get(short_id).await
    }
}
