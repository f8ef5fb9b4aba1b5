//! Process configuration, read once at startup from the environment.

use std::net::SocketAddr;

use chrono::Duration;
use thiserror::Error;

use agro_auth::TokenTtl;

const DEV_JWT_SECRET: &str = "dev-secret";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Seed identity created at startup.
#[derive(Clone, PartialEq, Eq)]
pub struct AdminSeed {
    pub username: String,
    pub password: String,
}

impl core::fmt::Debug for AdminSeed {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AdminSeed")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    pub token_ttl: TokenTtl,
    /// Postgres URL; `None` selects the in-memory store.
    pub database_url: Option<String>,
    /// Redis URL; `None` selects the in-memory cache.
    pub redis_url: Option<String>,
    pub admin: Option<AdminSeed>,
}

impl ApiConfig {
    /// Read configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_addr = match get("BIND_ADDR") {
            Some(v) => v.parse().map_err(|e| ConfigError::Invalid {
                key: "BIND_ADDR",
                reason: format!("{e}"),
            })?,
            None => SocketAddr::from(([0, 0, 0, 0], 8000)),
        };

        let jwt_secret = get("JWT_SECRET").unwrap_or_else(|| {
            tracing::warn!("JWT_SECRET not set; using insecure dev default");
            DEV_JWT_SECRET.to_string()
        });

        let defaults = TokenTtl::default();
        let token_ttl = TokenTtl {
            access: seconds(&get, "ACCESS_TOKEN_TTL_SECS")?.unwrap_or(defaults.access),
            refresh: seconds(&get, "REFRESH_TOKEN_TTL_SECS")?.unwrap_or(defaults.refresh),
        };

        let admin = match (get("ADMIN_USERNAME"), get("ADMIN_PASSWORD")) {
            (Some(username), Some(password)) => Some(AdminSeed { username, password }),
            (None, None) => None,
            _ => {
                return Err(ConfigError::Invalid {
                    key: "ADMIN_USERNAME",
                    reason: "ADMIN_USERNAME and ADMIN_PASSWORD must be set together".to_string(),
                });
            }
        };

        Ok(Self {
            bind_addr,
            jwt_secret,
            token_ttl,
            database_url: get("DATABASE_URL"),
            redis_url: get("REDIS_URL"),
            admin,
        })
    }
}

fn seconds(
    get: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<Duration>, ConfigError> {
    let Some(raw) = get(key) else {
        return Ok(None);
    };
    let secs: i64 = raw.trim().parse().map_err(|e| ConfigError::Invalid {
        key,
        reason: format!("{e}"),
    })?;
    if secs <= 0 {
        return Err(ConfigError::Invalid {
            key,
            reason: "must be a positive number of seconds".to_string(),
        });
    }
    Ok(Some(Duration::seconds(secs)))
}
