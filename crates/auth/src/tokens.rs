//! Token pair issuance and bearer validation (HS256 JWTs).

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::Serialize;
use thiserror::Error;

use crate::claims::{TokenClaims, TokenType, TokenValidationError, validate_claims};
use crate::user::UserRecord;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// Bad signature, wrong algorithm, not a JWT at all.
    #[error("invalid token: {0}")]
    Invalid(String),

    #[error(transparent)]
    Claims(#[from] TokenValidationError),

    #[error("failed to sign token: {0}")]
    Signing(String),
}

/// Lifetimes of the two token kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenTtl {
    pub access: Duration,
    pub refresh: Duration,
}

impl Default for TokenTtl {
    fn default() -> Self {
        Self {
            access: Duration::minutes(5),
            refresh: Duration::days(1),
        }
    }
}

/// Result of a successful login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Bearer-side contract: turn a raw token into verified claims.
pub trait JwtValidator: Send + Sync {
    /// Verify signature and time window. Does not check the token type.
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<TokenClaims, TokenError>;

    /// Verify a token and require it to be an access token.
    fn validate_access(&self, token: &str, now: DateTime<Utc>) -> Result<TokenClaims, TokenError> {
        let claims = self.validate(token, now)?;
        claims.expect_type(TokenType::Access)?;
        Ok(claims)
    }
}

/// Symmetric-key (HS256) issuer and validator.
#[derive(Clone)]
pub struct Hs256Jwt {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: TokenTtl,
}

impl Hs256Jwt {
    pub fn new(secret: impl AsRef<[u8]>, ttl: TokenTtl) -> Self {
        let secret = secret.as_ref();
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    /// Issue a fresh access/refresh pair for a user.
    pub fn issue_pair(&self, user: &UserRecord, now: DateTime<Utc>) -> Result<TokenPair, TokenError> {
        let access = TokenClaims::new(user.id, &user.username, TokenType::Access, now, self.ttl.access);
        let refresh = TokenClaims::new(user.id, &user.username, TokenType::Refresh, now, self.ttl.refresh);
        Ok(TokenPair {
            access: self.sign(&access)?,
            refresh: self.sign(&refresh)?,
        })
    }

    /// Exchange a valid refresh token for a new access token.
    pub fn refresh_access(&self, refresh_token: &str, now: DateTime<Utc>) -> Result<String, TokenError> {
        let claims = self.validate(refresh_token, now)?;
        claims.expect_type(TokenType::Refresh)?;

        let access = TokenClaims::new(claims.sub, claims.username, TokenType::Access, now, self.ttl.access);
        self.sign(&access)
    }

    fn sign(&self, claims: &TokenClaims) -> Result<String, TokenError> {
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }
}

impl JwtValidator for Hs256Jwt {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<TokenClaims, TokenError> {
        // Time checks run in `validate_claims` against the caller's clock.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;

        let data = jsonwebtoken::decode::<TokenClaims>(token, &self.decoding, &validation)
            .map_err(|e| TokenError::Invalid(e.to_string()))?;

        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}
