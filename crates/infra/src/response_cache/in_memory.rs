//! Process-local response cache backed by Moka.

use std::time::{Duration, Instant};

use moka::Expiry;
use moka::sync::Cache;

use super::r#trait::{CacheError, CachedResponse, ResponseCache};

const DEFAULT_MAX_ENTRIES: u64 = 10_000;

#[derive(Debug, Clone)]
struct Entry {
    response: CachedResponse,
    ttl: Duration,
}

/// Each entry expires after the TTL it was stored with.
struct PerEntryTtl;

impl Expiry<String, Entry> for PerEntryTtl {
    fn expire_after_create(&self, _key: &String, value: &Entry, _created_at: Instant) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &Entry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// In-memory cache for dev/tests and single-process deployments.
///
/// Cloning shares the same underlying cache.
#[derive(Clone)]
pub struct InMemoryResponseCache {
    inner: Cache<String, Entry>,
}

impl InMemoryResponseCache {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_ENTRIES)
    }

    pub fn with_capacity(max_entries: u64) -> Self {
        let inner = Cache::builder()
            .max_capacity(max_entries)
            .expire_after(PerEntryTtl)
            .build();
        Self { inner }
    }
}

impl Default for InMemoryResponseCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ResponseCache for InMemoryResponseCache {
    async fn get(&self, key: &str) -> Result<Option<CachedResponse>, CacheError> {
        Ok(self.inner.get(key).map(|e| e.response))
    }

    async fn set(&self, key: &str, value: CachedResponse, ttl: Duration) -> Result<(), CacheError> {
        self.inner.insert(
            key.to_string(),
            Entry {
                response: value,
                ttl,
            },
        );
        Ok(())
    }

    async fn clear(&self) -> Result<(), CacheError> {
        // Entries inserted before this call are never returned again.
        self.inner.invalidate_all();
        Ok(())
    }
}
