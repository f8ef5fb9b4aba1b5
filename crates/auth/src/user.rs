//! Login identities and the directory they are looked up in.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use agro_core::UserId;

use crate::password::hash_password;

// ─────────────────────────────────────────────────────────────────────────────
// User Status
// ─────────────────────────────────────────────────────────────────────────────

/// Account status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum UserStatus {
    /// User can log in.
    #[default]
    Active,
    /// User exists but every login attempt fails.
    Inactive,
}

impl core::fmt::Display for UserStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            UserStatus::Active => write!(f, "Active"),
            UserStatus::Inactive => write!(f, "Inactive"),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// User Record
// ─────────────────────────────────────────────────────────────────────────────

/// A stored identity. `password_hash` is an Argon2 PHC string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: UserId,
    pub username: String,
    pub password_hash: String,
    pub status: UserStatus,
}

impl UserRecord {
    /// Build an active user, hashing the plaintext password.
    pub fn with_password(
        username: impl Into<String>,
        password: &str,
    ) -> Result<Self, argon2::password_hash::Error> {
        Ok(Self {
            id: UserId::new(),
            username: username.into(),
            password_hash: hash_password(password)?,
            status: UserStatus::Active,
        })
    }

    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Directory
// ─────────────────────────────────────────────────────────────────────────────

/// Identity lookup used by login.
pub trait UserDirectory: Send + Sync {
    fn find_by_username(&self, username: &str) -> Option<UserRecord>;
}

impl<S> UserDirectory for Arc<S>
where
    S: UserDirectory + ?Sized,
{
    fn find_by_username(&self, username: &str) -> Option<UserRecord> {
        (**self).find_by_username(username)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("user directory lock poisoned")]
    Poisoned,
}

/// In-memory directory keyed by username (exact, case-sensitive match).
#[derive(Debug, Default)]
pub struct InMemoryUserDirectory {
    inner: RwLock<HashMap<String, UserRecord>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a user.
    pub fn insert(&self, user: UserRecord) -> Result<(), DirectoryError> {
        let mut map = self.inner.write().map_err(|_| DirectoryError::Poisoned)?;
        map.insert(user.username.clone(), user);
        Ok(())
    }

    /// Change a user's status. `false` if no such user.
    ///
    /// Deactivation takes effect on the next request: outstanding tokens of
    /// an inactive user are refused.
    pub fn set_status(&self, username: &str, status: UserStatus) -> Result<bool, DirectoryError> {
        let mut map = self.inner.write().map_err(|_| DirectoryError::Poisoned)?;
        Ok(match map.get_mut(username) {
            Some(user) => {
                user.status = status;
                true
            }
            None => false,
        })
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl UserDirectory for InMemoryUserDirectory {
    fn find_by_username(&self, username: &str) -> Option<UserRecord> {
        let map = self.inner.read().ok()?;
        map.get(username).cloned()
    }
}
