//! Products domain module.
//!
//! The `Product` record, the payloads that create or change it, and the
//! validation rules a payload must pass before it reaches a store. Pure
//! domain logic (no IO, no HTTP, no storage).

pub mod product;
pub mod validate;

pub use product::{Product, ProductDraft, ProductPayload};
pub use validate::{merge_partial, validate_product, MAX_NAME_LEN};
