//! # colva-core: Pure Business Logic for Colva
//!
//! Everything the quotation tool decides without talking to the outside
//! world: money math, field validation, the environment-based draft and the
//! printable document.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Colva Architecture                               │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    apps/cli (colva binary)                      │   │
//! │  │    login ──► products ──► quote ──► history ──► export         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ colva-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │  ┌─────────┐ ┌─────────┐ ┌──────────┐ ┌───────┐ ┌──────────┐  │   │
//! │  │  │  types  │ │  money  │ │validation│ │ draft │ │ document │  │   │
//! │  │  │ Product │ │  Money  │ │  client  │ │ envs  │ │   HTML   │  │   │
//! │  │  │Quotation│ │ TaxRate │ │ register │ │ stock │ │  es-CO   │  │   │
//! │  │  └─────────┘ └─────────┘ └──────────┘ └───────┘ └──────────┘  │   │
//! │  │                     pricing: amounts + stock                    │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  colva-db (Data Access Layer)                   │   │
//! │  │          PostgreSQL repositories, in-memory backend             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (User, Product, Quotation, line items)
//! - [`money`] - Integer money with es-CO display
//! - [`error`] - Domain error types
//! - [`validation`] - Client, registration and catalog field rules
//! - [`pricing`] - Line totals, subtotal/tax/total, stock checks
//! - [`draft`] - Quotation draft grouped by environment
//! - [`document`] - Printable quotation document
//!
//! ## Example
//!
//! ```rust
//! use colva_core::money::Money;
//! use colva_core::types::TaxRate;
//!
//! let subtotal = Money::from_major(200);
//! let tax = subtotal.calculate_tax(TaxRate::from_bps(1900));
//! assert_eq!(tax, Money::from_major(38));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod document;
pub mod draft;
pub mod error;
pub mod money;
pub mod pricing;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports
// =============================================================================

pub use draft::QuotationDraft;
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use pricing::Amounts;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Colombian IVA, 19%.
pub const DEFAULT_TAX_RATE_BPS: u32 = 1900;
/// 100 %
pub const MAX_TAX_RATE_BPS: u32 = 10_000;

/// Label prefix for auto-numbered environments (`Ambiente 1`, `Ambiente 2`).
pub const DEFAULT_ENVIRONMENT_PREFIX: &str = "Ambiente";

pub const MIN_PASSWORD_LEN: usize = 6;
pub const MAX_USERNAME_LEN: usize = 50;
pub const MAX_PRODUCT_NAME_LEN: usize = 200;
pub const MAX_ENVIRONMENT_LABEL_LEN: usize = 60;
pub const MAX_DOCUMENT_NUMBER_LEN: usize = 15;

pub const PHONE_MIN_DIGITS: usize = 7;
pub const PHONE_MAX_DIGITS: usize = 10;
