//! # Storage Backend
//!
//! The seam between the application and its storage.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │  commands (colva-cli)                                                │
//! │       │  &dyn Backend                                                │
//! │       ▼                                                              │
//! │  ┌────────────────────┐        ┌─────────────────────────────────┐   │
//! │  │ Database           │        │ MemoryBackend                   │   │
//! │  │ (PostgreSQL, pool) │        │ (tests, offline demo, faults)   │   │
//! │  └────────────────────┘        └─────────────────────────────────┘   │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Both implementations report the same [`DbError`] variants with the same
//! constraint names, so user-facing messages do not depend on the backend.

use async_trait::async_trait;

use crate::error::DbResult;
use crate::pool::Database;
use colva_core::{
    LineItemDetail, NewProduct, NewQuotation, NewUser, Product, Quotation, User, UserUpdate,
};

/// Storage operations used by the application.
#[async_trait]
pub trait Backend: Send + Sync {
    // -- users --------------------------------------------------------------

    async fn get_user(&self, id: i64) -> DbResult<Option<User>>;

    async fn find_user_by_username(&self, username: &str) -> DbResult<Option<User>>;

    async fn list_users(&self) -> DbResult<Vec<User>>;

    async fn insert_user(&self, user: &NewUser) -> DbResult<User>;

    async fn update_user(&self, id: i64, update: &UserUpdate) -> DbResult<User>;

    /// Fails with `NotPermitted` for administrators.
    async fn delete_user(&self, id: i64) -> DbResult<()>;

    async fn count_users(&self) -> DbResult<i64>;

    // -- catalog ------------------------------------------------------------

    async fn list_products(&self) -> DbResult<Vec<Product>>;

    async fn get_product(&self, id: i64) -> DbResult<Option<Product>>;

    async fn get_products(&self, ids: &[i64]) -> DbResult<Vec<Product>>;

    async fn find_product_by_name(&self, name: &str) -> DbResult<Option<Product>>;

    async fn insert_product(&self, product: &NewProduct) -> DbResult<Product>;

    async fn set_product_units(&self, name: &str, units: i64) -> DbResult<Product>;

    async fn check_stock(&self, name: &str, quantity: i64) -> DbResult<bool>;

    async fn count_products(&self) -> DbResult<i64>;

    // -- quotations ---------------------------------------------------------

    /// Header, items and stock decrements commit together or not at all.
    async fn create_quotation(&self, quotation: &NewQuotation) -> DbResult<Quotation>;

    /// Newest first.
    async fn list_quotations(&self, user_id: i64) -> DbResult<Vec<Quotation>>;

    async fn get_quotation(&self, id: i64) -> DbResult<Option<Quotation>>;

    async fn quotation_items(&self, quotation_id: i64) -> DbResult<Vec<LineItemDetail>>;

    async fn health_check(&self) -> bool;
}

#[async_trait]
impl Backend for Database {
    async fn get_user(&self, id: i64) -> DbResult<Option<User>> {
        self.users().get(id).await
    }

    async fn find_user_by_username(&self, username: &str) -> DbResult<Option<User>> {
        self.users().find_by_username(username).await
    }

    async fn list_users(&self) -> DbResult<Vec<User>> {
        self.users().list().await
    }

    async fn insert_user(&self, user: &NewUser) -> DbResult<User> {
        self.users().insert(user).await
    }

    async fn update_user(&self, id: i64, update: &UserUpdate) -> DbResult<User> {
        self.users().update(id, update).await
    }

    async fn delete_user(&self, id: i64) -> DbResult<()> {
        self.users().delete(id).await
    }

    async fn count_users(&self) -> DbResult<i64> {
        self.users().count().await
    }

    async fn list_products(&self) -> DbResult<Vec<Product>> {
        self.products().list().await
    }

    async fn get_product(&self, id: i64) -> DbResult<Option<Product>> {
        self.products().get(id).await
    }

    async fn get_products(&self, ids: &[i64]) -> DbResult<Vec<Product>> {
        self.products().get_many(ids).await
    }

    async fn find_product_by_name(&self, name: &str) -> DbResult<Option<Product>> {
        self.products().get_by_name(name).await
    }

    async fn insert_product(&self, product: &NewProduct) -> DbResult<Product> {
        self.products().insert(product).await
    }

    async fn set_product_units(&self, name: &str, units: i64) -> DbResult<Product> {
        self.products().set_units(name, units).await
    }

    async fn check_stock(&self, name: &str, quantity: i64) -> DbResult<bool> {
        self.products().check_stock(name, quantity).await
    }

    async fn count_products(&self) -> DbResult<i64> {
        self.products().count().await
    }

    async fn create_quotation(&self, quotation: &NewQuotation) -> DbResult<Quotation> {
        self.quotations().create(quotation).await
    }

    async fn list_quotations(&self, user_id: i64) -> DbResult<Vec<Quotation>> {
        self.quotations().list_for_user(user_id).await
    }

    async fn get_quotation(&self, id: i64) -> DbResult<Option<Quotation>> {
        self.quotations().get(id).await
    }

    async fn quotation_items(&self, quotation_id: i64) -> DbResult<Vec<LineItemDetail>> {
        self.quotations().items(quotation_id).await
    }

    async fn health_check(&self) -> bool {
        Database::health_check(self).await
    }
}
