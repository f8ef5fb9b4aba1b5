//! Postgres-backed product store.
//!
//! One `products` table; `BIGSERIAL` ids give insertion order. The column
//! types mirror the validator's limits, and CHECK constraints repeat the two
//! business rules so a row can never hold an empty name or a negative price.

use std::sync::Arc;

use rust_decimal::Decimal;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use tracing::instrument;

use agro_core::ProductId;
use agro_products::{Product, ProductDraft};

use super::r#trait::{ProductStore, StoreError};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS products (
    id    BIGSERIAL PRIMARY KEY,
    name  VARCHAR(100) NOT NULL CHECK (btrim(name) <> ''),
    price NUMERIC(10, 2) NOT NULL CHECK (price >= 0)
)
"#;

#[derive(Debug, Clone)]
pub struct PostgresProductStore {
    pool: Arc<PgPool>,
}

impl PostgresProductStore {
    /// Create a new store with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Open a pool against `database_url`.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Create the `products` table if it does not exist yet.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::query(SCHEMA)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("migrate", e))?;
        Ok(())
    }
}

fn row_to_product(row: &PgRow) -> Result<Product, sqlx::Error> {
    let id: i64 = row.try_get("id")?;
    let name: String = row.try_get("name")?;
    let price: Decimal = row.try_get("price")?;
    Ok(Product::restore(ProductId::new(id), name, price))
}

#[async_trait::async_trait]
impl ProductStore for PostgresProductStore {
    #[instrument(skip(self), err)]
    async fn list(&self) -> Result<Vec<Product>, StoreError> {
        let rows = sqlx::query("SELECT id, name, price FROM products ORDER BY id ASC")
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list", e))?;

        rows.iter()
            .map(|r| row_to_product(r).map_err(|e| map_sqlx_error("list", e)))
            .collect()
    }

    #[instrument(skip(self), fields(product_id = %id), err)]
    async fn get(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        let row = sqlx::query("SELECT id, name, price FROM products WHERE id = $1")
            .bind(id.get())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get", e))?;

        row.as_ref()
            .map(row_to_product)
            .transpose()
            .map_err(|e| map_sqlx_error("get", e))
    }

    #[instrument(skip(self, draft), err)]
    async fn insert(&self, draft: ProductDraft) -> Result<Product, StoreError> {
        let row = sqlx::query(
            "INSERT INTO products (name, price) VALUES ($1, $2) RETURNING id, name, price",
        )
        .bind(draft.name())
        .bind(draft.price())
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert", e))?;

        row_to_product(&row).map_err(|e| map_sqlx_error("insert", e))
    }

    #[instrument(skip(self, draft), fields(product_id = %id), err)]
    async fn update(&self, id: ProductId, draft: ProductDraft) -> Result<Option<Product>, StoreError> {
        let row = sqlx::query(
            "UPDATE products SET name = $2, price = $3 WHERE id = $1 RETURNING id, name, price",
        )
        .bind(id.get())
        .bind(draft.name())
        .bind(draft.price())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update", e))?;

        row.as_ref()
            .map(row_to_product)
            .transpose()
            .map_err(|e| map_sqlx_error("update", e))
    }

    #[instrument(skip(self), fields(product_id = %id), err)]
    async fn delete(&self, id: ProductId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.get())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete", e))?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), err)]
    async fn count(&self) -> Result<u64, StoreError> {
        let row = sqlx::query("SELECT COUNT(*) AS total FROM products")
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("count", e))?;
        let total: i64 = row.try_get("total").map_err(|e| map_sqlx_error("count", e))?;
        Ok(total.max(0) as u64)
    }
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => StoreError::Backend(format!(
            "database error in {}: {} (code {})",
            operation,
            db_err.message(),
            db_err.code().as_deref().unwrap_or("none"),
        )),
        sqlx::Error::PoolClosed => {
            StoreError::Backend(format!("connection pool closed in {operation}"))
        }
        _ => StoreError::Backend(format!("sqlx error in {operation}: {err}")),
    }
}
