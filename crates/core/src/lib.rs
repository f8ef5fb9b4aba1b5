//! `agro-core` — domain primitives shared by every crate in the workspace.
//!
//! Pure types only: no IO, no framework code.

pub mod entity;
pub mod error;
pub mod id;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{ProductId, UserId};
