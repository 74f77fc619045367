use crate::models::ShortLink;
use crate::storage::{Storage, StorageError, StorageResult};
use anyhow::Result;
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;

pub struct PostgresStorage {
    pool: Arc<PgPool>,
}

impl PostgresStorage {
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self {
            pool: Arc::new(pool),
        })
    }
}

#[async_trait]
impl Storage for PostgresStorage {
    async fn init(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS links (
                id BIGSERIAL PRIMARY KEY,
                short_id TEXT NOT NULL UNIQUE,
                original_url TEXT NOT NULL,
                created_at BIGINT NOT NULL,
                clicks BIGINT NOT NULL DEFAULT 0,
                last_accessed BIGINT
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

        let link = sqlx::query_as::<_, ShortLink>(
            r#"
            INSERT INTO links (short_id, original_url, created_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (short_id) DO NOTHING
            RETURNING id, short_id, original_url, created_at, clicks, last_accessed
            "#,
        )
        .bind(short_id)
        .bind(original_url)
        .bind(created_at)
        .fetch_optional(self.pool.as_ref())
        .await
        .map_err(|e| StorageError::Other(e.into()))?;

        link.ok_or(StorageError::Conflict)
    }

    async fn get(&self, short_id: &str) -> Result<Option<ShortLink>> {
        let link = sqlx::query_as::<_, ShortLink>(
            r#"
            SELECT id, short_id, original_url, created_at, clicks, last_accessed
            FROM links
            WHERE short_id = $1
            "#,
        )
        .bind(short_id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(link)
    }

    async fn record_visit(&self, short_id: &str) -> Result<Option<ShortLink>> {
        let now = chrono::Utc::now().timestamp();

        let link = sqlx::query_as::<_, ShortLink>(
            r#"
            UPDATE links
            SET clicks = clicks + 1, last_accessed = $1
            WHERE short_id = $2
            RETURNING id, short_id, original_url, created_at, clicks, last_accessed
            "#,
        )
        .bind(now)
        .bind(short_id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(link)
    }
}
