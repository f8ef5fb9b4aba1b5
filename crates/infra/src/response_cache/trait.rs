use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// The cache backend failed. Never retried, never bypassed.
    #[error("cache backend error: {0}")]
    Backend(String),
}

/// A response captured for replay on a later cache hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

/// Shared response cache handle.
#[async_trait::async_trait]
pub trait ResponseCache: Send + Sync {
    /// `None` on miss or expiry.
    async fn get(&self, key: &str) -> Result<Option<CachedResponse>, CacheError>;

    /// Insert or overwrite `key`, expiring after `ttl`.
    async fn set(&self, key: &str, value: CachedResponse, ttl: Duration) -> Result<(), CacheError>;

    /// Drop every entry.
    async fn clear(&self) -> Result<(), CacheError>;
}

#[async_trait::async_trait]
impl<C> ResponseCache for Arc<C>
where
    C: ResponseCache + ?Sized,
{
    async fn get(&self, key: &str) -> Result<Option<CachedResponse>, CacheError> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: CachedResponse, ttl: Duration) -> Result<(), CacheError> {
        (**self).set(key, value, ttl).await
    }

    async fn clear(&self) -> Result<(), CacheError> {
        (**self).clear().await
    }
}
