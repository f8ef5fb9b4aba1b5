//! HTTP response cache boundary.
//!
//! Holds serialized responses (status, content type, body bytes) under string
//! keys. `clear()` drops everything, never a single key.

pub mod in_memory;
#[cfg(feature = "redis")]
pub mod redis;
pub mod r#trait;

pub use in_memory::InMemoryResponseCache;
#[cfg(feature = "redis")]
pub use self::redis::RedisResponseCache;
pub use r#trait::{CacheError, CachedResponse, ResponseCache};
