//! # In-Memory Backend
//!
//! A [`Backend`] held entirely in process memory.
//!
//! Used by the test suites and by `--backend memory` for offline demos. It
//! reproduces the database's behaviour where callers can observe it:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │  Constraint                      Emulated as                         │
//! │  ──────────                      ───────────                         │
//! │  users_pkey / username_key       UniqueViolation (same names)        │
//! │  users_id_check                  CheckViolation                      │
//! │  products_name_key               UniqueViolation                     │
//! │  products_*_check                CheckViolation                      │
//! │  quotations_user_id_fkey         ForeignKeyViolation (RESTRICT)      │
//! │  units >= q decrement            InsufficientStock                   │
//! │  one transaction per quotation   every check runs before any write   │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Fault Injection
//! [`MemoryBackend::inject_fault`] makes one [`Operation`] fail with
//! `QueryFailed` until [`MemoryBackend::clear_faults`] is called.
//! `InsertQuotationItems` fails the item step of `create_quotation` after
//! the header was staged, which must leave nothing behind.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use tracing::debug;

use crate::backend::Backend;
use crate::error::{
    DbError, DbResult, PRODUCTS_NAME_KEY, PRODUCTS_UNITS_CHECK, PRODUCTS_UNIT_COST_CHECK,
    QUOTATIONS_USER_FKEY, QUOTATION_ITEMS_QUANTITY_CHECK, USERS_ID_CHECK, USERS_PKEY,
    USERS_USERNAME_KEY,
};
use colva_core::{
    LineItemDetail, NewProduct, NewQuotation, NewUser, Product, Quotation, QuotationLineItem,
    User, UserUpdate,
};

/// Backend operations that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    GetUser,
    FindUser,
    ListUsers,
    InsertUser,
    UpdateUser,
    DeleteUser,
    ListProducts,
    GetProduct,
    InsertProduct,
    SetProductUnits,
    CheckStock,
    CreateQuotation,
    InsertQuotationItems,
    ListQuotations,
    GetQuotation,
    QuotationItems,
}

#[derive(Debug, Default)]
struct MemoryState {
    users: BTreeMap<i64, User>,
    products: BTreeMap<i64, Product>,
    quotations: BTreeMap<i64, Quotation>,
    items: Vec<QuotationLineItem>,
    next_product_id: i64,
    next_quotation_id: i64,
    next_item_id: i64,
    faults: HashMap<Operation, String>,
}

impl MemoryState {
    fn fault(&self, op: Operation) -> DbResult<()> {
        match self.faults.get(&op) {
            Some(message) => Err(DbError::QueryFailed(message.clone())),
            None => Ok(()),
        }
    }

    fn product_by_name(&self, name: &str) -> Option<&Product> {
        let name = name.trim();
        self.products.values().find(|p| p.name == name)
    }

    fn product_by_name_mut(&mut self, name: &str) -> Option<&mut Product> {
        let name = name.trim();
        self.products.values_mut().find(|p| p.name == name)
    }
}

/// In-process storage with the same observable rules as PostgreSQL.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    state: Mutex<MemoryState>,
    calls: AtomicUsize,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `op` fail with `QueryFailed(message)` until cleared.
    pub async fn inject_fault(&self, op: Operation, message: impl Into<String>) {
        self.state.lock().await.faults.insert(op, message.into());
    }

    pub async fn clear_faults(&self) {
        self.state.lock().await.faults.clear();
    }

    /// Number of backend operations invoked so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Number of stored quotation headers, across all users.
    pub async fn quotation_count(&self) -> usize {
        self.state.lock().await.quotations.len()
    }

    /// Number of stored line items, across all quotations.
    pub async fn item_count(&self) -> usize {
        self.state.lock().await.items.len()
    }

    fn record_call(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn get_user(&self, id: i64) -> DbResult<Option<User>> {
        self.record_call();
        let state = self.state.lock().await;
        state.fault(Operation::GetUser)?;
        Ok(state.users.get(&id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> DbResult<Option<User>> {
        self.record_call();
        let state = self.state.lock().await;
        state.fault(Operation::FindUser)?;
        Ok(state.users.values().find(|u| u.username == username).cloned())
    }

    async fn list_users(&self) -> DbResult<Vec<User>> {
        self.record_call();
        let state = self.state.lock().await;
        state.fault(Operation::ListUsers)?;
        let mut users: Vec<User> = state.users.values().cloned().collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(users)
    }

    async fn insert_user(&self, user: &NewUser) -> DbResult<User> {
        self.record_call();
        let mut state = self.state.lock().await;
        state.fault(Operation::InsertUser)?;

        if user.id <= 0 {
            return Err(DbError::check(USERS_ID_CHECK));
        }
        if state.users.contains_key(&user.id) {
            return Err(DbError::unique(USERS_PKEY));
        }
        if state.users.values().any(|u| u.username == user.username) {
            return Err(DbError::unique(USERS_USERNAME_KEY));
        }

        let created = User {
            id: user.id,
            username: user.username.clone(),
            password_hash: user.password_hash.clone(),
            role: user.role,
            created_at: Utc::now(),
        };
        state.users.insert(created.id, created.clone());
        debug!(id = created.id, "Inserted user (memory)");
        Ok(created)
    }

    async fn update_user(&self, id: i64, update: &UserUpdate) -> DbResult<User> {
        self.record_call();
        let mut state = self.state.lock().await;
        state.fault(Operation::UpdateUser)?;

        if let Some(username) = &update.username {
            if state
                .users
                .values()
                .any(|u| u.id != id && &u.username == username)
            {
                return Err(DbError::unique(USERS_USERNAME_KEY));
            }
        }

        let user = state
            .users
            .get_mut(&id)
            .ok_or_else(|| DbError::not_found("User", id))?;

        if let Some(username) = &update.username {
            user.username = username.clone();
        }
        if let Some(hash) = &update.password_hash {
            user.password_hash = hash.clone();
        }
        if let Some(role) = update.role {
            user.role = role;
        }
        Ok(user.clone())
    }

    async fn delete_user(&self, id: i64) -> DbResult<()> {
        self.record_call();
        let mut state = self.state.lock().await;
        state.fault(Operation::DeleteUser)?;

        let user = state
            .users
            .get(&id)
            .ok_or_else(|| DbError::not_found("User", id))?;
        if user.role.is_admin() {
            return Err(DbError::NotPermitted(
                "administrator accounts cannot be deleted".to_string(),
            ));
        }
        if state.quotations.values().any(|q| q.user_id == id) {
            return Err(DbError::foreign_key(QUOTATIONS_USER_FKEY));
        }

        state.users.remove(&id);
        Ok(())
    }

    async fn count_users(&self) -> DbResult<i64> {
        self.record_call();
        let state = self.state.lock().await;
        Ok(state.users.len() as i64)
    }

    async fn list_products(&self) -> DbResult<Vec<Product>> {
        self.record_call();
        let state = self.state.lock().await;
        state.fault(Operation::ListProducts)?;
        let mut products: Vec<Product> = state.products.values().cloned().collect();
        products.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(products)
    }

    async fn get_product(&self, id: i64) -> DbResult<Option<Product>> {
        self.record_call();
        let state = self.state.lock().await;
        state.fault(Operation::GetProduct)?;
        Ok(state.products.get(&id).cloned())
    }

    async fn get_products(&self, ids: &[i64]) -> DbResult<Vec<Product>> {
        self.record_call();
        let state = self.state.lock().await;
        state.fault(Operation::GetProduct)?;
        let mut products: Vec<Product> = state
            .products
            .values()
            .filter(|p| ids.contains(&p.id))
            .cloned()
            .collect();
        products.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(products)
    }

    async fn find_product_by_name(&self, name: &str) -> DbResult<Option<Product>> {
        self.record_call();
        let state = self.state.lock().await;
        state.fault(Operation::GetProduct)?;
        Ok(state.product_by_name(name).cloned())
    }

    async fn insert_product(&self, product: &NewProduct) -> DbResult<Product> {
        self.record_call();
        let mut state = self.state.lock().await;
        state.fault(Operation::InsertProduct)?;

        let name = product.name.trim();
        if state.product_by_name(name).is_some() {
            return Err(DbError::unique(PRODUCTS_NAME_KEY));
        }
        if product.units < 0 {
            return Err(DbError::check(PRODUCTS_UNITS_CHECK));
        }
        if product.unit_cost_cents < 0 {
            return Err(DbError::check(PRODUCTS_UNIT_COST_CHECK));
        }

        state.next_product_id += 1;
        let now = Utc::now();
        let created = Product {
            id: state.next_product_id,
            name: name.to_string(),
            units: product.units,
            unit_cost_cents: product.unit_cost_cents,
            created_at: now,
            updated_at: now,
        };
        state.products.insert(created.id, created.clone());
        Ok(created)
    }

    async fn set_product_units(&self, name: &str, units: i64) -> DbResult<Product> {
        self.record_call();
        let mut state = self.state.lock().await;
        state.fault(Operation::SetProductUnits)?;

        let product = state
            .product_by_name_mut(name)
            .ok_or_else(|| DbError::not_found("Product", name.trim()))?;
        product.units = units.max(0);
        product.updated_at = Utc::now();
        Ok(product.clone())
    }

    async fn check_stock(&self, name: &str, quantity: i64) -> DbResult<bool> {
        self.record_call();
        let state = self.state.lock().await;
        state.fault(Operation::CheckStock)?;

        state
            .product_by_name(name)
            .map(|p| p.units >= quantity)
            .ok_or_else(|| DbError::not_found("Product", name.trim()))
    }

    async fn count_products(&self) -> DbResult<i64> {
        self.record_call();
        let state = self.state.lock().await;
        Ok(state.products.len() as i64)
    }

    async fn create_quotation(&self, new: &NewQuotation) -> DbResult<Quotation> {
        self.record_call();
        let mut state = self.state.lock().await;
        state.fault(Operation::CreateQuotation)?;

        if new.items.is_empty() {
            return Err(DbError::InvalidInput("quotation has no items".to_string()));
        }

        let mut demand = new
            .quantities_by_product()
            .map_err(|e| DbError::InvalidInput(e.to_string()))?;
        demand.sort_by_key(|(product_id, _)| *product_id);

        for &(product_id, requested) in &demand {
            let product = state
                .products
                .get(&product_id)
                .ok_or_else(|| DbError::not_found("Product", product_id))?;
            if product.units < requested {
                return Err(DbError::InsufficientStock {
                    product_id,
                    available: product.units,
                    requested,
                });
            }
        }

        if !state.users.contains_key(&new.user_id) {
            return Err(DbError::foreign_key(QUOTATIONS_USER_FKEY));
        }

        // Header is staged here; nothing is stored until every step passed.
        let quotation = Quotation {
            id: state.next_quotation_id + 1,
            user_id: new.user_id,
            client: new.client.clone(),
            subtotal_cents: new.amounts.subtotal.cents(),
            tax_cents: new.amounts.tax.cents(),
            total_cents: new.amounts.total.cents(),
            created_at: Utc::now(),
        };

        state.fault(Operation::InsertQuotationItems)?;
        if new.items.iter().any(|item| item.quantity <= 0) {
            return Err(DbError::check(QUOTATION_ITEMS_QUANTITY_CHECK));
        }

        // Commit
        for (product_id, requested) in demand {
            if let Some(product) = state.products.get_mut(&product_id) {
                product.units -= requested;
                product.updated_at = quotation.created_at;
            }
        }
        for item in &new.items {
            state.next_item_id += 1;
            let line = QuotationLineItem {
                id: state.next_item_id,
                quotation_id: quotation.id,
                environment: item.environment.clone(),
                product_id: item.product_id,
                quantity: item.quantity,
                unit_price_cents: item.unit_price_cents,
            };
            state.items.push(line);
        }
        state.next_quotation_id = quotation.id;
        state.quotations.insert(quotation.id, quotation.clone());

        debug!(quotation_id = quotation.id, "Created quotation (memory)");
        Ok(quotation)
    }

    async fn list_quotations(&self, user_id: i64) -> DbResult<Vec<Quotation>> {
        self.record_call();
        let state = self.state.lock().await;
        state.fault(Operation::ListQuotations)?;

        let mut quotations: Vec<Quotation> = state
            .quotations
            .values()
            .filter(|q| q.user_id == user_id)
            .cloned()
            .collect();
        quotations.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(quotations)
    }

    async fn get_quotation(&self, id: i64) -> DbResult<Option<Quotation>> {
        self.record_call();
        let state = self.state.lock().await;
        state.fault(Operation::GetQuotation)?;
        Ok(state.quotations.get(&id).cloned())
    }

    async fn quotation_items(&self, quotation_id: i64) -> DbResult<Vec<LineItemDetail>> {
        self.record_call();
        let state = self.state.lock().await;
        state.fault(Operation::QuotationItems)?;

        Ok(state
            .items
            .iter()
            .filter(|item| item.quotation_id == quotation_id)
            .map(|item| LineItemDetail {
                id: item.id,
                quotation_id: item.quotation_id,
                environment: item.environment.clone(),
                product_id: item.product_id,
                product_name: state.products.get(&item.product_id).map(|p| p.name.clone()),
                quantity: item.quantity,
                unit_price_cents: item.unit_price_cents,
            })
            .collect())
    }

    async fn health_check(&self) -> bool {
        true
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use colva_core::{ClientInfo, DocumentType, Money, NewLineItem, Role};
    use colva_core::pricing::Amounts;

    async fn backend_with_catalog() -> MemoryBackend {
        let backend = MemoryBackend::new();
        backend
            .insert_user(&NewUser {
                id: 1001,
                username: "ana".to_string(),
                password_hash: "hash".to_string(),
                role: Role::Client,
            })
            .await
            .unwrap();
        backend
            .insert_product(&NewProduct {
                name: "Lamp".to_string(),
                units: 10,
                unit_cost_cents: 10_000,
            })
            .await
            .unwrap();
        backend
    }

    fn quotation_for(product_id: i64, quantity: i64) -> NewQuotation {
        let subtotal = Money::from_cents(10_000 * quantity);
        let tax = subtotal.calculate_tax(Default::default());
        NewQuotation {
            user_id: 1001,
            client: ClientInfo {
                document_type: DocumentType::CC,
                document_number: "52123456".to_string(),
                names: "Ana".to_string(),
                surnames: "Gomez".to_string(),
                phone: "3001234567".to_string(),
                email: None,
            },
            amounts: Amounts {
                subtotal,
                tax,
                total: subtotal + tax,
            },
            items: vec![NewLineItem {
                environment: "Ambiente 1".to_string(),
                product_id,
                product_name: "Lamp".to_string(),
                quantity,
                unit_price_cents: 10_000,
            }],
        }
    }

    #[tokio::test]
    async fn test_duplicate_user_reports_constraint() {
        let backend = backend_with_catalog().await;

        let same_id = backend
            .insert_user(&NewUser {
                id: 1001,
                username: "other".to_string(),
                password_hash: "hash".to_string(),
                role: Role::Client,
            })
            .await
            .unwrap_err();
        assert!(matches!(same_id, DbError::UniqueViolation { ref constraint } if constraint == USERS_PKEY));

        let same_name = backend
            .insert_user(&NewUser {
                id: 1002,
                username: "ana".to_string(),
                password_hash: "hash".to_string(),
                role: Role::Client,
            })
            .await
            .unwrap_err();
        assert_eq!(same_name.user_message(), "That username is already taken");
    }

    #[tokio::test]
    async fn test_admin_cannot_be_deleted() {
        let backend = MemoryBackend::new();
        backend
            .insert_user(&NewUser {
                id: 1,
                username: "admin".to_string(),
                password_hash: "hash".to_string(),
                role: Role::Admin,
            })
            .await
            .unwrap();

        let err = backend.delete_user(1).await.unwrap_err();
        assert!(matches!(err, DbError::NotPermitted(_)));
        assert!(backend.get_user(1).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_set_units_clamps_negative_to_zero() {
        let backend = backend_with_catalog().await;
        let product = backend.set_product_units(" Lamp ", -4).await.unwrap();
        assert_eq!(product.units, 0);
        assert!(!backend.check_stock("Lamp", 1).await.unwrap());
        assert!(matches!(
            backend.check_stock("Desk", 1).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_create_quotation_decrements_stock() {
        let backend = backend_with_catalog().await;
        let quotation = backend.create_quotation(&quotation_for(1, 4)).await.unwrap();

        assert_eq!(quotation.total_cents, 47_600);
        assert_eq!(backend.get_product(1).await.unwrap().unwrap().units, 6);

        let items = backend.quotation_items(quotation.id).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].product_name.as_deref(), Some("Lamp"));
    }

    #[tokio::test]
    async fn test_insufficient_stock_writes_nothing() {
        let backend = backend_with_catalog().await;
        let err = backend.create_quotation(&quotation_for(1, 11)).await.unwrap_err();

        assert!(matches!(
            err,
            DbError::InsufficientStock { available: 10, requested: 11, .. }
        ));
        assert_eq!(backend.quotation_count().await, 0);
        assert_eq!(backend.get_product(1).await.unwrap().unwrap().units, 10);
    }

    #[tokio::test]
    async fn test_item_fault_leaves_no_header() {
        let backend = backend_with_catalog().await;
        backend
            .inject_fault(Operation::InsertQuotationItems, "connection reset")
            .await;

        let err = backend.create_quotation(&quotation_for(1, 2)).await.unwrap_err();
        assert!(matches!(err, DbError::QueryFailed(_)));
        assert_eq!(backend.quotation_count().await, 0);
        assert_eq!(backend.item_count().await, 0);
        assert_eq!(backend.get_product(1).await.unwrap().unwrap().units, 10);

        backend.clear_faults().await;
        let quotation = backend.create_quotation(&quotation_for(1, 2)).await.unwrap();
        assert_eq!(quotation.id, 1);
    }

    #[tokio::test]
    async fn test_user_with_quotations_cannot_be_deleted() {
        let backend = backend_with_catalog().await;
        backend.create_quotation(&quotation_for(1, 1)).await.unwrap();

        let err = backend.delete_user(1001).await.unwrap_err();
        assert_eq!(
            err.user_message(),
            "The user has quotations and cannot be removed"
        );
    }

    #[tokio::test]
    async fn test_history_is_newest_first_and_per_user() {
        let backend = backend_with_catalog().await;
        let first = backend.create_quotation(&quotation_for(1, 1)).await.unwrap();
        let second = backend.create_quotation(&quotation_for(1, 1)).await.unwrap();

        let history = backend.list_quotations(1001).await.unwrap();
        assert_eq!(
            history.iter().map(|q| q.id).collect::<Vec<_>>(),
            vec![second.id, first.id]
        );
        assert!(backend.list_quotations(2002).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_calls_are_counted() {
        let backend = MemoryBackend::new();
        assert_eq!(backend.calls(), 0);
        backend.list_products().await.unwrap();
        backend.list_users().await.unwrap();
        assert_eq!(backend.calls(), 2);
    }
}
