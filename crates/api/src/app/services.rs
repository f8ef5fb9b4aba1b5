//! Shared collaborators handed to every handler and pipeline stage.
//!
//! Built once at process start; handlers get an `Arc<AppServices>`.

use std::sync::Arc;

use anyhow::Context;

use agro_auth::{Hs256Jwt, InMemoryUserDirectory, UserDirectory, UserRecord};
use agro_infra::{
    InMemoryProductStore, InMemoryResponseCache, PostgresProductStore, ProductStore, ResponseCache,
};

use crate::config::ApiConfig;

#[derive(Clone)]
pub struct AppServices {
    pub store: Arc<dyn ProductStore>,
    pub cache: Arc<dyn ResponseCache>,
    pub users: Arc<dyn UserDirectory>,
    pub jwt: Arc<Hs256Jwt>,
}

impl AppServices {
    pub fn new(
        store: Arc<dyn ProductStore>,
        cache: Arc<dyn ResponseCache>,
        users: Arc<dyn UserDirectory>,
        jwt: Hs256Jwt,
    ) -> Self {
        Self {
            store,
            cache,
            users,
            jwt: Arc::new(jwt),
        }
    }

    /// Wire collaborators from configuration.
    ///
    /// `DATABASE_URL` selects Postgres (migrated on start), `REDIS_URL` selects
    /// Redis; either falls back to its in-memory implementation when unset.
    pub async fn from_config(config: &ApiConfig) -> anyhow::Result<Self> {
        let store: Arc<dyn ProductStore> = match &config.database_url {
            Some(url) => {
                let store = PostgresProductStore::connect(url)
                    .await
                    .context("failed to connect to Postgres")?;
                store.migrate().await.context("failed to migrate products table")?;
                tracing::info!("using Postgres product store");
                Arc::new(store)
            }
            None => {
                tracing::warn!("DATABASE_URL not set; products are kept in memory");
                Arc::new(InMemoryProductStore::new())
            }
        };

        let cache = build_cache(config)?;

        let users = InMemoryUserDirectory::new();
        match &config.admin {
            Some(seed) => {
                let record = UserRecord::with_password(&seed.username, &seed.password)
                    .map_err(|e| anyhow::anyhow!("failed to hash admin password: {e}"))?;
                users.insert(record).context("failed to seed admin user")?;
                tracing::info!(username = %seed.username, "seeded admin user");
            }
            None => tracing::warn!("ADMIN_USERNAME not set; no user can log in"),
        }

        Ok(Self::new(
            store,
            cache,
            Arc::new(users),
            Hs256Jwt::new(config.jwt_secret.as_bytes(), config.token_ttl),
        ))
    }
}

fn build_cache(config: &ApiConfig) -> anyhow::Result<Arc<dyn ResponseCache>> {
    match &config.redis_url {
        Some(url) => {
            #[cfg(feature = "redis")]
            {
                let cache = agro_infra::RedisResponseCache::new(url)
                    .context("failed to open Redis client")?;
                tracing::info!("using Redis response cache");
                Ok(Arc::new(cache))
            }
            #[cfg(not(feature = "redis"))]
            {
                let _ = url;
                tracing::warn!("REDIS_URL set but redis feature not enabled, falling back to in-memory cache");
                Ok(Arc::new(InMemoryResponseCache::new()))
            }
        }
        None => Ok(Arc::new(InMemoryResponseCache::new())),
    }
}
