//! Credential check for the login endpoint.

use thiserror::Error;

use crate::password::verify_password;
use crate::user::{UserDirectory, UserRecord};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Unknown user, wrong password, inactive account or missing field.
    /// Deliberately indistinguishable to the caller.
    #[error("Invalid credentials")]
    InvalidCredentials,
}

/// Resolve a username/password pair to an active identity.
///
/// Blocking: runs Argon2 verification. Call from a blocking-capable context.
pub fn authenticate(
    directory: &dyn UserDirectory,
    username: Option<&str>,
    password: Option<&str>,
) -> Result<UserRecord, AuthError> {
    let (Some(username), Some(password)) = (username, password) else {
        return Err(AuthError::InvalidCredentials);
    };

    let user = directory
        .find_by_username(username)
        .ok_or(AuthError::InvalidCredentials)?;

    match verify_password(password, &user.password_hash) {
        Ok(true) => {}
        Ok(false) => return Err(AuthError::InvalidCredentials),
        Err(e) => {
            tracing::warn!(username, error = %e, "stored password hash is malformed");
            return Err(AuthError::InvalidCredentials);
        }
    }

    if !user.is_active() {
        return Err(AuthError::InvalidCredentials);
    }

    Ok(user)
}
