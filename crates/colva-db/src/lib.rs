//! # colva-db: Data Access Layer for Colva
//!
//! Storage for users, the product catalog and quotations, on a hosted
//! PostgreSQL database through sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Colva Data Flow                                  │
//! │                                                                         │
//! │  CLI command (quote, history, products ...)                             │
//! │       │  &dyn Backend                                                   │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐    │
//! │  │                     colva-db (THIS CRATE)                       │    │
//! │  │                                                                 │    │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐    │    │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │    │    │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │    │    │
//! │  │   │               │    │ UserRepo      │    │ 0001_initial │    │    │
//! │  │   │ PgPool        │◄───│ ProductRepo   │    │ _schema.sql  │    │    │
//! │  │   │               │    │ QuotationRepo │    │              │    │    │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘    │    │
//! │  │                                                                 │    │
//! │  │   MemoryBackend: same Backend trait, no server (tests, demo)    │    │
//! │  └─────────────────────────────────────────────────────────────────┘    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐    │
//! │  │                     PostgreSQL (TLS)                            │    │
//! │  └─────────────────────────────────────────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types and user-facing messages
//! - [`repository`] - Repository implementations (user, product, quotation)
//! - [`backend`] - The `Backend` trait the application talks to
//! - [`memory`] - In-memory `Backend` with fault injection
//! - [`credentials`] - Password hashing
//! - [`seed`] - Default administrator and catalog
//!
//! ## Usage
//!
//! ```rust,ignore
//! use colva_db::{Backend, Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new(url)).await?;
//! let products = db.list_products().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod backend;
pub mod credentials;
pub mod error;
pub mod memory;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod seed;

// =============================================================================
// Re-exports
// =============================================================================

pub use backend::Backend;
pub use credentials::{hash_password, verify_password};
pub use error::{DbError, DbResult};
pub use memory::{MemoryBackend, Operation};
pub use pool::{Database, DbConfig};
pub use seed::{seed_defaults, SeedReport};

// Repository re-exports for convenience
pub use repository::product::ProductRepository;
pub use repository::quotation::QuotationRepository;
pub use repository::user::UserRepository;
