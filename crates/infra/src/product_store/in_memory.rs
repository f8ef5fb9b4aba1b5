use std::collections::BTreeMap;
use std::sync::RwLock;

use agro_core::ProductId;
use agro_products::{Product, ProductDraft};

use super::r#trait::{ProductStore, StoreError};

#[derive(Debug)]
struct Rows {
    last_id: i64,
    by_id: BTreeMap<ProductId, Product>,
}

/// In-memory product store for tests/dev.
///
/// Ids come from a counter that never goes backwards, so ordering the map by
/// id is insertion order.
#[derive(Debug)]
pub struct InMemoryProductStore {
    inner: RwLock<Rows>,
}

impl InMemoryProductStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Rows {
                last_id: 0,
                by_id: BTreeMap::new(),
            }),
        }
    }
}

impl Default for InMemoryProductStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned<T>(_: T) -> StoreError {
    StoreError::Backend("product store lock poisoned".to_string())
}

#[async_trait::async_trait]
impl ProductStore for InMemoryProductStore {
    async fn list(&self) -> Result<Vec<Product>, StoreError> {
        let rows = self.inner.read().map_err(poisoned)?;
        Ok(rows.by_id.values().cloned().collect())
    }

    async fn get(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        let rows = self.inner.read().map_err(poisoned)?;
        Ok(rows.by_id.get(&id).cloned())
    }

    async fn insert(&self, draft: ProductDraft) -> Result<Product, StoreError> {
        let mut rows = self.inner.write().map_err(poisoned)?;
        rows.last_id += 1;
        let id = ProductId::new(rows.last_id);
        let product = Product::new(id, draft);
        rows.by_id.insert(id, product.clone());
        Ok(product)
    }

    async fn update(&self, id: ProductId, draft: ProductDraft) -> Result<Option<Product>, StoreError> {
        let mut rows = self.inner.write().map_err(poisoned)?;
        match rows.by_id.get_mut(&id) {
            Some(slot) => {
                *slot = Product::new(id, draft);
                Ok(Some(slot.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, id: ProductId) -> Result<bool, StoreError> {
        let mut rows = self.inner.write().map_err(poisoned)?;
        Ok(rows.by_id.remove(&id).is_some())
    }

    async fn count(&self) -> Result<u64, StoreError> {
        let rows = self.inner.read().map_err(poisoned)?;
        Ok(rows.by_id.len() as u64)
    }
}
