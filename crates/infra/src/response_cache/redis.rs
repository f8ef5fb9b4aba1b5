//! Redis-backed response cache (optional).
//!
//! Each entry is a hash (`status`, `content_type`, `body`) with a key TTL.
//! `clear()` is `FLUSHDB`: point this at a Redis database dedicated to the
//! response cache.

use std::collections::HashMap;
use std::time::Duration;

use redis::Commands;

use super::r#trait::{CacheError, CachedResponse, ResponseCache};

const KEY_PREFIX: &str = "agro:response:";

#[derive(Debug, Clone)]
pub struct RedisResponseCache {
    client: redis::Client,
}

impl RedisResponseCache {
    pub fn new(redis_url: impl AsRef<str>) -> Result<Self, CacheError> {
        let client = redis::Client::open(redis_url.as_ref()).map_err(redis_error)?;
        Ok(Self { client })
    }

    /// Run a blocking Redis call off the async executor.
    async fn with_connection<T, F>(&self, f: F) -> Result<T, CacheError>
    where
        T: Send + 'static,
        F: FnOnce(&mut redis::Connection) -> redis::RedisResult<T> + Send + 'static,
    {
        let client = self.client.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = client.get_connection().map_err(redis_error)?;
            f(&mut conn).map_err(redis_error)
        })
        .await
        .map_err(|e| CacheError::Backend(format!("cache task failed: {e}")))?
    }
}

fn redis_error(e: redis::RedisError) -> CacheError {
    CacheError::Backend(e.to_string())
}

fn decode(mut fields: HashMap<String, Vec<u8>>) -> Option<CachedResponse> {
    let status = String::from_utf8(fields.remove("status")?).ok()?.parse().ok()?;
    let content_type = fields
        .remove("content_type")
        .filter(|v| !v.is_empty())
        .and_then(|v| String::from_utf8(v).ok());
    let body = fields.remove("body")?;
    Some(CachedResponse {
        status,
        content_type,
        body,
    })
}

#[async_trait::async_trait]
impl ResponseCache for RedisResponseCache {
    async fn get(&self, key: &str) -> Result<Option<CachedResponse>, CacheError> {
        let key = format!("{KEY_PREFIX}{key}");
        let fields: HashMap<String, Vec<u8>> = self.with_connection(move |conn| conn.hgetall(key)).await?;
        if fields.is_empty() {
            return Ok(None);
        }

        let decoded = decode(fields);
        if decoded.is_none() {
            tracing::warn!("ignoring malformed response cache entry");
        }
        Ok(decoded)
    }

    async fn set(&self, key: &str, value: CachedResponse, ttl: Duration) -> Result<(), CacheError> {
        let key = format!("{KEY_PREFIX}{key}");
        let seconds = ttl.as_secs().max(1) as i64;
        let fields: Vec<(&'static str, Vec<u8>)> = vec![
            ("status", value.status.to_string().into_bytes()),
            ("content_type", value.content_type.unwrap_or_default().into_bytes()),
            ("body", value.body),
        ];

        self.with_connection(move |conn| {
            redis::pipe()
                .atomic()
                .del(&key)
                .ignore()
                .hset_multiple(&key, fields.as_slice())
                .ignore()
                .expire(&key, seconds)
                .ignore()
                .query::<()>(conn)
        })
        .await
    }

    async fn clear(&self) -> Result<(), CacheError> {
        self.with_connection(|conn| redis::cmd("FLUSHDB").query::<()>(conn))
            .await
    }
}
