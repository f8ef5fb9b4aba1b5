//! Infrastructure layer: product storage and the HTTP response cache.
//!
//! Both are defined as traits with an in-memory implementation for dev/tests
//! and a networked one for deployments (Postgres, Redis).

pub mod product_store;
pub mod response_cache;

pub use product_store::{InMemoryProductStore, PostgresProductStore, ProductStore, StoreError};
pub use response_cache::{CacheError, CachedResponse, InMemoryResponseCache, ResponseCache};
#[cfg(feature = "redis")]
pub use response_cache::RedisResponseCache;
