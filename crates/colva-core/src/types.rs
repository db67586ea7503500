//! # Domain Types
//!
//! Core domain types used throughout Colva.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────────┐   │
//! │  │      User       │   │    Product      │   │     Quotation       │   │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────────  │   │
//! │  │  id (doc no.)   │   │  id (serial)    │   │  id (serial)        │   │
//! │  │  username       │   │  name (unique)  │   │  user_id (FK)       │   │
//! │  │  password_hash  │   │  units          │   │  client snapshot    │   │
//! │  │  role           │   │  unit_cost      │   │  subtotal/tax/total │   │
//! │  └─────────────────┘   └─────────────────┘   └──────────┬──────────┘   │
//! │                                                         │ 1..n         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌──────────┴──────────┐   │
//! │  │    TaxRate      │   │  DocumentType   │   │ QuotationLineItem   │   │
//! │  │  bps (u32)      │   │  CC CE PA NIT   │   │  environment        │   │
//! │  │  1900 = 19%     │   └─────────────────┘   │  product_id, qty    │   │
//! │  └─────────────────┘                         │  unit_price (frozen)│   │
//! │                                              └─────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! A quotation copies the client data and each product's unit price at the
//! moment it is created. Later catalog edits never change an old quotation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate in basis points (1 bps = 0.01%).
///
/// The Colombian IVA is 1900 bps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Rates above 100 % are capped at 100 %.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        if bps > crate::MAX_TAX_RATE_BPS {
            TaxRate(crate::MAX_TAX_RATE_BPS)
        } else {
            TaxRate(bps)
        }
    }

    /// Like [`TaxRate::from_bps`], but rejects rates above 100 %.
    pub fn new(bps: u32) -> Result<Self, ValidationError> {
        crate::validation::validate_tax_rate_bps(bps)?;
        Ok(TaxRate(bps))
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Rate as a percentage, for display only.
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate(crate::DEFAULT_TAX_RATE_BPS)
    }
}

/// `19%`, `8.25%`.
impl fmt::Display for TaxRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 % 100 == 0 {
            write!(f, "{}%", self.0 / 100)
        } else {
            write!(f, "{}%", self.percentage())
        }
    }
}

// =============================================================================
// Role
// =============================================================================

/// Access level of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Manages users and the catalog.
    Admin,
    /// Creates quotations.
    Client,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Client => "client",
        }
    }

    #[inline]
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::Client
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "client" => Ok(Role::Client),
            _ => Err(ValidationError::NotAllowed {
                field: "role".to_string(),
                allowed: vec!["admin".to_string(), "client".to_string()],
            }),
        }
    }
}

// =============================================================================
// User
// =============================================================================

/// A registered user.
///
/// `id` is the person's identification number, chosen at registration.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct User {
    pub id: i64,
    pub username: String,
    /// Argon2 PHC string. Never leaves the data layer in a session snapshot.
    #[serde(skip_serializing, default)]
    #[ts(skip)]
    pub password_hash: String,
    pub role: Role,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Public view of the user (no credential material).
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            username: self.username.clone(),
            role: self.role,
        }
    }
}

/// What the session and the front-end know about a signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    pub role: Role,
}

/// Insert payload for a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub role: Role,
}

/// Partial update for a user. `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub username: Option<String>,
    pub password_hash: Option<String>,
    pub role: Option<Role>,
}

impl UserUpdate {
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.password_hash.is_none() && self.role.is_none()
    }
}

// =============================================================================
// Product
// =============================================================================

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    pub id: i64,
    /// Unique display name.
    pub name: String,
    /// Units in stock, never negative.
    pub units: i64,
    /// Unit cost in cents, quoted to clients as the unit price.
    pub unit_cost_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    #[inline]
    pub fn unit_cost(&self) -> Money {
        Money::from_cents(self.unit_cost_cents)
    }

    /// True when `quantity` units can still be taken from stock.
    #[inline]
    pub fn has_stock(&self, quantity: i64) -> bool {
        self.units >= quantity
    }
}

/// Insert payload for a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub units: i64,
    pub unit_cost_cents: i64,
}

// =============================================================================
// Client Document Type
// =============================================================================

/// Identity document of the quoted client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum DocumentType {
    #[serde(rename = "CC")]
    CC,
    #[serde(rename = "CE")]
    CE,
    #[serde(rename = "PA")]
    PA,
    #[serde(rename = "NIT")]
    NIT,
}

impl DocumentType {
    pub const ALL: [DocumentType; 4] = [
        DocumentType::CC,
        DocumentType::CE,
        DocumentType::PA,
        DocumentType::NIT,
    ];

    /// Short code stored in the database.
    pub fn code(&self) -> &'static str {
        match self {
            DocumentType::CC => "CC",
            DocumentType::CE => "CE",
            DocumentType::PA => "PA",
            DocumentType::NIT => "NIT",
        }
    }

    /// Human-readable label used on documents.
    pub fn label(&self) -> &'static str {
        match self {
            DocumentType::CC => "Cédula de Ciudadanía",
            DocumentType::CE => "Cédula de Extranjería",
            DocumentType::PA => "Pasaporte",
            DocumentType::NIT => "NIT",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for DocumentType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_uppercase();
        DocumentType::ALL
            .into_iter()
            .find(|t| t.code() == code)
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "document_type".to_string(),
                allowed: DocumentType::ALL.iter().map(|t| t.code().to_string()).collect(),
            })
    }
}

// =============================================================================
// Client
// =============================================================================

/// Raw client form input, exactly as typed.
///
/// Turned into a [`ClientInfo`] by
/// [`validate_client_fields`](crate::validation::validate_client_fields).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ClientForm {
    pub document_type: String,
    pub document_number: String,
    pub names: String,
    pub surnames: String,
    pub phone: String,
    pub email: String,
}

/// Validated client snapshot stored with a quotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ClientInfo {
    pub document_type: DocumentType,
    pub document_number: String,
    pub names: String,
    pub surnames: String,
    pub phone: String,
    pub email: Option<String>,
}

impl ClientInfo {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.names, self.surnames)
    }
}

// =============================================================================
// Quotation
// =============================================================================

/// A persisted quotation header. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Quotation {
    pub id: i64,
    /// Author of the quotation.
    pub user_id: i64,
    pub client: ClientInfo,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Quotation {
    pub fn amounts(&self) -> crate::pricing::Amounts {
        crate::pricing::Amounts {
            subtotal: Money::from_cents(self.subtotal_cents),
            tax: Money::from_cents(self.tax_cents),
            total: Money::from_cents(self.total_cents),
        }
    }
}

/// One (environment, product, quantity, unit price) row of a quotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct QuotationLineItem {
    pub id: i64,
    pub quotation_id: i64,
    pub environment: String,
    pub product_id: i64,
    pub quantity: i64,
    /// Unit price in cents at quotation time (frozen).
    pub unit_price_cents: i64,
}

/// A line item joined with the product's current name.
///
/// `product_name` is `None` when the product row no longer exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct LineItemDetail {
    pub id: i64,
    pub quotation_id: i64,
    pub environment: String,
    pub product_id: i64,
    pub product_name: Option<String>,
    pub quantity: i64,
    pub unit_price_cents: i64,
}

/// Line item payload for a new quotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLineItem {
    pub environment: String,
    pub product_id: i64,
    /// Frozen name, used for error messages only (not persisted).
    pub product_name: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
}

/// Header + items written in a single atomic store operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewQuotation {
    pub user_id: i64,
    pub client: ClientInfo,
    pub amounts: crate::pricing::Amounts,
    pub items: Vec<NewLineItem>,
}

impl NewQuotation {
    /// Total quantity per product over every environment, in first-seen order.
    ///
    /// Fails with [`CoreError::AmountOverflow`] when a total does not fit in i64.
    pub fn quantities_by_product(&self) -> CoreResult<Vec<(i64, i64)>> {
        let mut totals: Vec<(i64, i64)> = Vec::new();
        for item in &self.items {
            match totals.iter_mut().find(|(id, _)| *id == item.product_id) {
                Some((_, qty)) => {
                    *qty = qty.checked_add(item.quantity).ok_or_else(|| {
                        CoreError::AmountOverflow {
                            context: format!("quantity of product {}", item.product_id),
                        }
                    })?;
                }
                None => totals.push((item.product_id, item.quantity)),
            }
        }
        Ok(totals)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
