//! # Product Repository
//!
//! Database operations for the catalog.
//!
//! ## Stock Updates
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  Two ways units change                                              │
//! │                                                                     │
//! │  1. Admin sets an absolute count                                    │
//! │     UPDATE products SET units = GREATEST($2, 0) WHERE name = $1     │
//! │                                                                     │
//! │  2. A quotation takes units (quotation.rs, inside its transaction)  │
//! │     UPDATE products SET units = units - $q                          │
//! │     WHERE id = $p AND units >= $q         ← check and act at once   │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::PgPool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use colva_core::{NewProduct, Product};

pub(crate) const PRODUCT_COLUMNS: &str =
    "id, name, units, unit_cost_cents, created_at, updated_at";

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: PgPool,
}

impl ProductRepository {
    pub fn new(pool: PgPool) -> Self {
        ProductRepository { pool }
    }

    /// Whole catalog ordered by name.
    pub async fn list(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {} FROM products ORDER BY name",
            PRODUCT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        debug!(count = products.len(), "Listed products");
        Ok(products)
    }

    pub async fn get(&self, id: i64) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {} FROM products WHERE id = $1",
            PRODUCT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    pub async fn get_by_name(&self, name: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {} FROM products WHERE name = $1",
            PRODUCT_COLUMNS
        ))
        .bind(name.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Products whose id is in `ids`, ordered by name. Unknown ids are skipped.
    pub async fn get_many(&self, ids: &[i64]) -> DbResult<Vec<Product>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {} FROM products WHERE id = ANY($1) ORDER BY name",
            PRODUCT_COLUMNS
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Inserts a product with a trimmed name.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - name taken (`products_name_key`)
    pub async fn insert(&self, product: &NewProduct) -> DbResult<Product> {
        let name = product.name.trim();
        debug!(name = %name, units = product.units, "Inserting product");

        let inserted = sqlx::query_as::<_, Product>(&format!(
            "INSERT INTO products (name, units, unit_cost_cents) VALUES ($1, $2, $3) RETURNING {}",
            PRODUCT_COLUMNS
        ))
        .bind(name)
        .bind(product.units)
        .bind(product.unit_cost_cents)
        .fetch_one(&self.pool)
        .await?;

        Ok(inserted)
    }

    /// Sets the units of the product named `name`. Negative input is stored as 0.
    pub async fn set_units(&self, name: &str, units: i64) -> DbResult<Product> {
        debug!(name = %name, units, "Setting product units");

        let updated = sqlx::query_as::<_, Product>(&format!(
            r#"
            UPDATE products
            SET units = GREATEST($2, 0), updated_at = now()
            WHERE name = $1
            RETURNING {}
            "#,
            PRODUCT_COLUMNS
        ))
        .bind(name.trim())
        .bind(units)
        .fetch_optional(&self.pool)
        .await?;

        updated.ok_or_else(|| DbError::not_found("Product", name.trim()))
    }

    /// True when the product named `name` has at least `quantity` units.
    pub async fn check_stock(&self, name: &str, quantity: i64) -> DbResult<bool> {
        let units: Option<i64> = sqlx::query_scalar("SELECT units FROM products WHERE name = $1")
            .bind(name.trim())
            .fetch_optional(&self.pool)
            .await?;

        match units {
            Some(units) => Ok(units >= quantity),
            None => Err(DbError::not_found("Product", name.trim())),
        }
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
