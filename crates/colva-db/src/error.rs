//! # Database Error Types
//!
//! Error types for every backend operation.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  PostgreSQL error (sqlx::Error, SQLSTATE + constraint name)            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbError (this module)                                                  │
//! │       │   23505 → UniqueViolation                                       │
//! │       │   23514 → CheckViolation                                        │
//! │       │   23503 → ForeignKeyViolation                                   │
//! │       │   other → QueryFailed (passed through)                          │
//! │       ▼                                                                 │
//! │  DbError::user_message() ← fixed wording per constraint                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ApiError (in the CLI) ← code + message shown to the user               │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The in-memory backend raises the same variants with the same constraint
//! names, so callers cannot tell the two backends apart by their errors.

use thiserror::Error;

// =============================================================================
// Constraint Names
// =============================================================================
// Must match migrations/postgres.

pub const USERS_PKEY: &str = "users_pkey";
pub const USERS_USERNAME_KEY: &str = "users_username_key";
pub const USERS_ROLE_CHECK: &str = "users_role_check";
pub const USERS_ID_CHECK: &str = "users_id_check";
pub const PRODUCTS_NAME_KEY: &str = "products_name_key";
pub const PRODUCTS_UNITS_CHECK: &str = "products_units_check";
pub const PRODUCTS_UNIT_COST_CHECK: &str = "products_unit_cost_check";
pub const QUOTATIONS_USER_FKEY: &str = "quotations_user_id_fkey";
pub const QUOTATION_ITEMS_QUANTITY_CHECK: &str = "quotation_items_quantity_check";

// =============================================================================
// DbError
// =============================================================================

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// SQLSTATE 23505.
    #[error("Unique constraint violated: {constraint}")]
    UniqueViolation { constraint: String },

    /// SQLSTATE 23514.
    #[error("Check constraint violated: {constraint}")]
    CheckViolation { constraint: String },

    /// SQLSTATE 23503.
    #[error("Foreign key violated: {constraint}")]
    ForeignKeyViolation { constraint: String },

    /// The conditional stock decrement matched no row.
    ///
    /// ## When This Occurs
    /// Another quotation took the units between the draft's last stock
    /// check and the write. The whole quotation write is rolled back.
    #[error("Insufficient stock for product {product_id}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: i64,
        available: i64,
        requested: i64,
    },

    /// Operation refused by a data-level rule (deleting the admin).
    #[error("Not permitted: {0}")]
    NotPermitted(String),

    /// Payload rejected before reaching the database.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Any other database-reported error, message passed through.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    #[error("Connection pool exhausted")]
    PoolExhausted,

    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    pub fn unique(constraint: &str) -> Self {
        DbError::UniqueViolation {
            constraint: constraint.to_string(),
        }
    }

    pub fn check(constraint: &str) -> Self {
        DbError::CheckViolation {
            constraint: constraint.to_string(),
        }
    }

    pub fn foreign_key(constraint: &str) -> Self {
        DbError::ForeignKeyViolation {
            constraint: constraint.to_string(),
        }
    }

    /// Fixed user-facing wording for the constraint failures a user can
    /// trigger. Anything unmapped falls back to the error's own text.
    ///
    /// ```rust
    /// use colva_db::DbError;
    ///
    /// let err = DbError::unique("products_name_key");
    /// assert_eq!(err.user_message(), "A product with that name already exists");
    /// ```
    pub fn user_message(&self) -> String {
        match self {
            DbError::UniqueViolation { constraint } => match constraint.as_str() {
                USERS_PKEY => "A user with that identification number is already registered",
                USERS_USERNAME_KEY => "That username is already taken",
                PRODUCTS_NAME_KEY => "A product with that name already exists",
                _ => "A record with those values already exists",
            }
            .to_string(),

            DbError::CheckViolation { constraint } => match constraint.as_str() {
                USERS_ROLE_CHECK => "Invalid role for this user. Contact an administrator",
                PRODUCTS_UNITS_CHECK => "Product units cannot be negative",
                _ => "The data does not satisfy a database rule",
            }
            .to_string(),

            DbError::ForeignKeyViolation { constraint } => match constraint.as_str() {
                QUOTATIONS_USER_FKEY => "The user has quotations and cannot be removed",
                _ => "The record references data that does not exist",
            }
            .to_string(),

            DbError::InsufficientStock {
                available,
                requested,
                ..
            } => format!(
                "Stock changed while saving: only {} units available, {} requested",
                available, requested
            ),

            other => other.to_string(),
        }
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound     → DbError::NotFound
/// sqlx::Error::Database        → SQLSTATE + constraint name
/// sqlx::Error::PoolTimedOut    → DbError::PoolExhausted
/// sqlx::Error::PoolClosed / Io → DbError::ConnectionFailed
/// Other                        → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),

            sqlx::Error::Database(db_err) => {
                let constraint = db_err.constraint().unwrap_or("unknown").to_string();
                match db_err.code().as_deref() {
                    Some("23505") => DbError::UniqueViolation { constraint },
                    Some("23514") => DbError::CheckViolation { constraint },
                    Some("23503") => DbError::ForeignKeyViolation { constraint },
                    _ => DbError::QueryFailed(db_err.message().to_string()),
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            sqlx::Error::Io(e) => DbError::ConnectionFailed(e.to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_messages_by_constraint() {
        assert_eq!(
            DbError::unique(USERS_PKEY).user_message(),
            "A user with that identification number is already registered"
        );
        assert_eq!(
            DbError::check(USERS_ROLE_CHECK).user_message(),
            "Invalid role for this user. Contact an administrator"
        );
        assert_eq!(
            DbError::foreign_key(QUOTATIONS_USER_FKEY).user_message(),
            "The user has quotations and cannot be removed"
        );
    }

    #[test]
    fn test_unmapped_errors_pass_through() {
        assert_eq!(
            DbError::unique("something_else").user_message(),
            "A record with those values already exists"
        );
        let err = DbError::QueryFailed("relation \"x\" does not exist".to_string());
        assert_eq!(
            err.user_message(),
            "Query failed: relation \"x\" does not exist"
        );
    }

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let err: DbError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, DbError::NotFound { .. }));
        let err: DbError = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(err, DbError::PoolExhausted));
    }
}
