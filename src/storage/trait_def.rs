use crate::models::ShortLink;
use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("short identifier already exists")]
    Conflict,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

#[async_trait]
pub trait Storage: Send + Sync {
    /// Initialize the storage (create tables, indexes).
    async fn init(&self) -> Result<()>;

    /// Insert a new mapping. Fails with [`StorageError::Conflict`] when the
    /// short identifier is already taken.
    async fn insert(&self, short_id: &str, original_url: &str) -> StorageResult<ShortLink>;

    /// Exact-key lookup.
    async fn get(&self, short_id: &str) -> Result<Option<ShortLink>>;

    /// Atomically increment the click counter and stamp `last_accessed`.
    ///
    /// The increment must be a single read-modify-write statement on the
    /// database side so concurrent visits to the same identifier never lose
    /// counts. Returns the updated row, `None` for an unknown identifier.
    async fn record_visit(&self, short_id: &str) -> Result<Option<ShortLink>>;
}
