//! Link service: orchestrates identifier allocation, redirects, and
//! analytics reads against the mapping store.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::time::timeout;
use url::Url;

use crate::id;
use crate::models::ShortLink;
use crate::storage::{Storage, StorageError};

/// How many fresh identifiers to try before giving up on a create.
///
/// With ~48 bits of identifier entropy a single collision is already rare;
/// hitting this bound means something is deeply wrong with the generator
/// or the store is effectively full.
const MAX_GENERATE_ATTEMPTS: usize = 5;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    InvalidUrl(String),
    #[error("URL not found")]
    NotFound,
    #[error("could not allocate a unique short identifier")]
    IdSpaceExhausted,
    #[error("storage operation timed out")]
    StoreTimeout,
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

/// Result of a successful shorten call.
#[derive(Debug, Clone)]
pub struct ShortenedLink {
    pub link: ShortLink,
    pub short_url: String,
}

/// Explicitly constructed service handle; owns the store for the process
/// lifetime instead of going through process-global connection state.
pub struct LinkService {
    storage: Arc<dyn Storage>,
    base_url: String,
    store_timeout: Duration,
}

impl LinkService {
    pub fn new(storage: Arc<dyn Storage>, base_url: String, store_timeout: Duration) -> Self {
        Self {
            storage,
            base_url,
            store_timeout,
        }
    }

    /// Validate and store a URL under a freshly generated identifier.
    ///
    /// Duplicate-key collisions are retried with a new identifier up to
    /// [`MAX_GENERATE_ATTEMPTS`] times and are invisible to the caller.
    pub async fn shorten(&self, original_url: &str) -> Result<ShortenedLink, ServiceError> {
        validate_url(original_url)?;

        for _ in 0..MAX_GENERATE_ATTEMPTS {
            let short_id = id::generate();

            match timeout(
                self.store_timeout,
                self.storage.insert(&short_id, original_url),
            )
            .await
            {
                Err(_) => return Err(ServiceError::StoreTimeout),
                Ok(Ok(link)) => {
                    let short_url = self.short_url(&link.short_id);
                    return Ok(ShortenedLink { link, short_url });
                }
                Ok(Err(StorageError::Conflict)) => {
                    tracing::warn!(short_id = %short_id, "identifier collision, regenerating");
                }
                Ok(Err(StorageError::Other(e))) => return Err(ServiceError::Store(e)),
            }
        }

        Err(ServiceError::IdSpaceExhausted)
    }

    /// Look up a link and record the visit.
    ///
    /// The click increment is awaited before returning so every issued
    /// redirect is reflected in the counter, but a failure to record only
    /// logs a warning and never fails the redirect itself.
    pub async fn resolve(&self, short_id: &str) -> Result<String, ServiceError> {
        if !id::is_valid(short_id) {
            return Err(ServiceError::NotFound);
        }

        let link = self
            .with_timeout(self.storage.get(short_id))
            .await?
            .ok_or(ServiceError::NotFound)?;

        match timeout(self.store_timeout, self.storage.record_visit(short_id)).await {
            Ok(Ok(_)) => {}
            Ok(Err(err)) => {
                tracing::warn!(short_id = %short_id, error = %err, "failed to record visit");
            }
            Err(_) => {
                tracing::warn!(short_id = %short_id, "timed out recording visit");
            }
        }

        Ok(link.original_url)
    }

    /// Pure read of a link's usage counters. No side effects.
    pub async fn analytics(&self, short_id: &str) -> Result<ShortLink, ServiceError> {
        if !id::is_valid(short_id) {
            return Err(ServiceError::NotFound);
        }

        self.with_timeout(self.storage.get(short_id))
            .await?
            .ok_or(ServiceError::NotFound)
    }

    fn short_url(&self, short_id: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), short_id)
    }

    async fn with_timeout<T, F>(&self, fut: F) -> Result<T, ServiceError>
    where
        F: Future<Output = anyhow::Result<T>>,
    {
        match timeout(self.store_timeout, fut).await {
            Ok(Ok(v)) => Ok(v),
            Ok(Err(e)) => Err(ServiceError::Store(e)),
            Err(_) => Err(ServiceError::StoreTimeout),
        }
    }
}

fn validate_url(raw: &str) -> Result<(), ServiceError> {
    if raw.trim().is_empty() {
        return Err(ServiceError::InvalidUrl("URL is required".to_string()));
    }

    let parsed = Url::parse(raw)
        .map_err(|_| ServiceError::InvalidUrl(format!("not a valid absolute URL: {raw}")))?;

    match parsed.scheme() {
        "http" | "https" => {}
        other => {
            return Err(ServiceError::InvalidUrl(format!(
                "URL scheme must be http or https, got {other}"
            )));
        }
    }

    if parsed.host_str().is_none() {
        return Err(ServiceError::InvalidUrl(format!("URL has no host: {raw}")));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{SqliteStorage, StorageResult};
    use anyhow::Result;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const BASE_URL: &str = "http://localhost:5001";

    // In-memory SQLite pools are capped at one connection so every pooled
    // connection sees the same database.
    async fn test_service() -> LinkService {
        let storage = SqliteStorage::new("sqlite::memory:", 1).await.unwrap();
        storage.init().await.unwrap();
        LinkService::new(
            Arc::new(storage),
            BASE_URL.to_string(),
            Duration::from_secs(5),
        )
    }

    /// Counts insert attempts so tests can assert the store was never
    /// touched by a rejected shorten.
    struct CountingStorage {
        inner: SqliteStorage,
        inserts: AtomicUsize,
    }

    #[async_trait]
    impl Storage for CountingStorage {
        async fn init(&self) -> Result<()> {
            self.inner.init().await
        }

        async fn insert(&self, short_id: &str, original_url: &str) -> StorageResult<ShortLink> {
            self.inserts.fetch_add(1, Ordering::SeqCst);
            self.inner.insert(short_id, original_url).await
        }

        async fn get(&self, short_id: &str) -> Result<Option<ShortLink>> {
            self.inner.get(short_id).await
        }

        async fn record_visit(&self, short_id: &str) -> Result<Option<ShortLink>> {
            self.inner.record_visit(short_id).await
        }
    }

    async fn counting_service() -> (LinkService, Arc<CountingStorage>) {
        let inner = SqliteStorage::new("sqlite::memory:", 1).await.unwrap();
        inner.init().await.unwrap();
        let storage = Arc::new(CountingStorage {
            inner,
            inserts: AtomicUsize::new(0),
        });
        let service = LinkService::new(
            Arc::clone(&storage) as Arc<dyn Storage>,
            BASE_URL.to_string(),
            Duration::from_secs(5),
        );
        (service, storage)
    }

    /// Fails the first `conflicts` inserts with a duplicate-key error,
    /// then behaves like the wrapped storage.
    struct ConflictingStorage {
        inner: SqliteStorage,
        conflicts: AtomicUsize,
    }

    #[async_trait]
    impl Storage for ConflictingStorage {
        async fn init(&self) -> Result<()> {
            self.inner.init().await
        }

        async fn insert(&self, short_id: &str, original_url: &str) -> StorageResult<ShortLink> {
            if self
                .conflicts
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(StorageError::Conflict);
            }
            self.inner.insert(short_id, original_url).await
        }

        async fn get(&self, short_id: &str) -> Result<Option<ShortLink>> {
            self.inner.get(short_id).await
        }

        async fn record_visit(&self, short_id: &str) -> Result<Option<ShortLink>> {
            self.inner.record_visit(short_id).await
        }
    }

    async fn conflicting_service(conflicts: usize) -> LinkService {
        let inner = SqliteStorage::new("sqlite::memory:", 1).await.unwrap();
        inner.init().await.unwrap();
        LinkService::new(
            Arc::new(ConflictingStorage {
                inner,
                conflicts: AtomicUsize::new(conflicts),
            }),
            BASE_URL.to_string(),
            Duration::from_secs(5),
        )
    }

    /// Storage whose reads never complete, for timeout coverage.
    struct StalledStorage;

    #[async_trait]
    impl Storage for StalledStorage {
        async fn init(&self) -> Result<()> {
            Ok(())
        }

        async fn insert(&self, _short_id: &str, _original_url: &str) -> StorageResult<ShortLink> {
            std::future::pending().await
        }

        async fn get(&self, _short_id: &str) -> Result<Option<ShortLink>> {
            std::future::pending().await
        }

        async fn record_visit(&self, _short_id: &str) -> Result<Option<ShortLink>> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn shorten_returns_id_and_composed_url() {
        let service = test_service().await;

        let shortened = service.shorten("https://example.com").await.unwrap();
        assert_eq!(shortened.link.short_id.len(), 8);
        assert_eq!(
            shortened.short_url,
            format!("{}/{}", BASE_URL, shortened.link.short_id)
        );
        assert_eq!(shortened.link.original_url, "https://example.com");
        assert_eq!(shortened.link.clicks, 0);
    }

    #[tokio::test]
    async fn shorten_rejects_empty_url() {
        let (service, storage) = counting_service().await;

        let err = service.shorten("").await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidUrl(_)));

        // Validation happens before generation, so no insert is attempted.
        assert_eq!(storage.inserts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn shorten_rejects_garbage() {
        let (service, storage) = counting_service().await;

        for bad in ["not a url", "example.com/no-scheme", "ftp://example.com"] {
            let err = service.shorten(bad).await.unwrap_err();
            assert!(matches!(err, ServiceError::InvalidUrl(_)), "{bad}");
        }

        assert_eq!(
            storage.inserts.load(Ordering::SeqCst),
            0,
            "rejected URLs must never reach the store"
        );
    }

    #[tokio::test]
    async fn shorten_produces_distinct_ids() {
        let service = test_service().await;

        let mut ids = std::collections::HashSet::new();
        for _ in 0..50 {
            let shortened = service.shorten("https://example.com").await.unwrap();
            ids.insert(shortened.link.short_id);
        }
        assert_eq!(ids.len(), 50);
    }

    #[tokio::test]
    async fn round_trip_resolves_to_original() {
        let service = test_service().await;

        let shortened = service.shorten("https://example.com/a?b=c").await.unwrap();
        let target = service.resolve(&shortened.link.short_id).await.unwrap();
        assert_eq!(target, "https://example.com/a?b=c");
    }

    #[tokio::test]
    async fn resolve_unknown_id_is_not_found() {
        let service = test_service().await;

        let err = service.resolve("AAAAAAAA").await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound));
    }

    #[tokio::test]
    async fn resolve_malformed_id_is_not_found() {
        let service = test_service().await;

        let err = service.resolve("nope").await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound));
    }

    #[tokio::test]
    async fn analytics_on_fresh_link() {
        let service = test_service().await;

        let shortened = service.shorten("https://example.com").await.unwrap();
        let link = service.analytics(&shortened.link.short_id).await.unwrap();
        assert_eq!(link.clicks, 0);
        assert!(link.last_accessed.is_none());
        assert!(link.created_at > 0);
    }

    #[tokio::test]
    async fn analytics_unknown_id_is_not_found() {
        let service = test_service().await;

        let err = service.analytics("AAAAAAAA").await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound));
    }

    #[tokio::test]
    async fn every_resolve_is_counted() {
        let service = test_service().await;

        let shortened = service.shorten("https://example.com").await.unwrap();
        for _ in 0..3 {
            service.resolve(&shortened.link.short_id).await.unwrap();
        }

        let link = service.analytics(&shortened.link.short_id).await.unwrap();
        assert_eq!(link.clicks, 3);
        assert!(link.last_accessed.is_some());
    }

    #[tokio::test]
    async fn collisions_are_retried_transparently() {
        let service = conflicting_service(3).await;

        let shortened = service.shorten("https://example.com").await.unwrap();
        assert_eq!(shortened.link.short_id.len(), 8);
    }

    #[tokio::test]
    async fn retry_bound_exhaustion_fails_the_create() {
        let service = conflicting_service(usize::MAX).await;

        let err = service.shorten("https://example.com").await.unwrap_err();
        assert!(matches!(err, ServiceError::IdSpaceExhausted));
    }

    #[tokio::test]
    async fn stalled_store_times_out() {
        let service = LinkService::new(
            Arc::new(StalledStorage),
            BASE_URL.to_string(),
            Duration::from_millis(20),
        );

        let err = service.shorten("https://example.com").await.unwrap_err();
        assert!(matches!(err, ServiceError::StoreTimeout));

        let err = service.analytics("AAAAAAAA").await.unwrap_err();
        assert!(matches!(err, ServiceError::StoreTimeout));
    }
}
