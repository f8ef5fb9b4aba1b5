use std::sync::Arc;

use thiserror::Error;

use agro_core::ProductId;
use agro_products::{Product, ProductDraft};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The backend failed (connection, query, poisoned lock). Never retried.
    #[error("store backend error: {0}")]
    Backend(String),
}

/// Persistence for `Product` rows.
///
/// Implementations provide their own atomicity per call; concurrent writers
/// to the same row are last-write-wins.
#[async_trait::async_trait]
pub trait ProductStore: Send + Sync {
    /// All rows, in insertion order.
    async fn list(&self) -> Result<Vec<Product>, StoreError>;

    async fn get(&self, id: ProductId) -> Result<Option<Product>, StoreError>;

    /// Persist a new row; the store assigns the id.
    async fn insert(&self, draft: ProductDraft) -> Result<Product, StoreError>;

    /// Replace the mutable fields of an existing row. `None` if absent.
    async fn update(&self, id: ProductId, draft: ProductDraft) -> Result<Option<Product>, StoreError>;

    /// Remove a row. `false` if it did not exist.
    async fn delete(&self, id: ProductId) -> Result<bool, StoreError>;

    async fn count(&self) -> Result<u64, StoreError>;
}

#[async_trait::async_trait]
impl<S> ProductStore for Arc<S>
where
    S: ProductStore + ?Sized,
{
    async fn list(&self) -> Result<Vec<Product>, StoreError> {
        (**self).list().await
    }

    async fn get(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        (**self).get(id).await
    }

    async fn insert(&self, draft: ProductDraft) -> Result<Product, StoreError> {
        (**self).insert(draft).await
    }

    async fn update(&self, id: ProductId, draft: ProductDraft) -> Result<Option<Product>, StoreError> {
        (**self).update(id, draft).await
    }

    async fn delete(&self, id: ProductId) -> Result<bool, StoreError> {
        (**self).delete(id).await
    }

    async fn count(&self) -> Result<u64, StoreError> {
        (**self).count().await
    }
}
