//! # Repositories
//!
//! One repository per table family, each holding a clone of the pool.
//!
//! ```text
//! Database ──┬── users()      → UserRepository
//!            ├── products()   → ProductRepository
//!            └── quotations() → QuotationRepository (header + items)
//! ```

pub mod product;
pub mod quotation;
pub mod user;
