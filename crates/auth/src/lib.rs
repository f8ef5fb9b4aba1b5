//! `agro-auth` — login and bearer-token boundary.
//!
//! Decoupled from HTTP and from product storage: the API layer feeds it
//! usernames, passwords and raw token strings, and gets back identities,
//! token pairs and verified claims.

pub mod claims;
pub mod login;
pub mod password;
pub mod tokens;
pub mod user;

pub use claims::{TokenClaims, TokenType, TokenValidationError, validate_claims};
pub use login::{AuthError, authenticate};
pub use password::{hash_password, verify_password};
pub use tokens::{Hs256Jwt, JwtValidator, TokenError, TokenPair, TokenTtl};
pub use user::{DirectoryError, InMemoryUserDirectory, UserDirectory, UserRecord, UserStatus};
