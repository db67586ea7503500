//! # API Error Type
//!
//! Unified error type for commands.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Colva                                  │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐   │
//! │  │  Command Function                                                │   │
//! │  │  Result<T, ApiError>                                             │   │
//! │  │         │                                                        │   │
//! │  │         ▼                                                        │   │
//! │  │  Validation Error? ── ValidationError (per field) ───┐           │   │
//! │  │         │                                            │           │   │
//! │  │         ▼                                            ▼           │   │
//! │  │  Business Rule? ───── CoreError::InsufficientStock ── ApiError ──►   │
//! │  │         │                                            ▲           │   │
//! │  │         ▼                                            │           │   │
//! │  │  Store Error? ─────── DbError::UniqueViolation ──────┘           │   │
//! │  │                       (user_message by constraint)               │   │
//! │  └──────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! │  stdout (--json):  { "code": "VALIDATION_ERROR",                        │
//! │                      "message": "That username is already taken" }      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;

use crate::config::ConfigError;
use crate::print::PrintError;
use colva_core::{CoreError, ValidationError};
use colva_db::DbError;

/// Error returned from commands.
///
/// ```json
/// {
///   "code": "INSUFFICIENT_STOCK",
///   "message": "Only 10 units of Lamp available (requested 11)"
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    NotFound,

    /// Input rejected before reaching the store
    ValidationError,

    /// No session, or wrong credentials
    Unauthorized,

    /// Signed in without the required role
    Forbidden,

    DatabaseError,

    BusinessLogic,

    InsufficientStock,

    /// Document could not be rendered, written or shared
    ExportError,

    Internal,
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(
            ErrorCode::NotFound,
            format!("{} not found: {}", resource, id),
        )
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Unauthorized, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Forbidden, message)
    }

    pub fn export(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ExportError, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

/// Converts database errors to API errors.
///
/// Constraint failures carry the fixed wording from
/// [`DbError::user_message`]; infrastructure failures are logged in full and
/// shown generically.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            e @ (DbError::UniqueViolation { .. }
            | DbError::CheckViolation { .. }
            | DbError::ForeignKeyViolation { .. }) => {
                ApiError::new(ErrorCode::ValidationError, e.user_message())
            }
            e @ DbError::InsufficientStock { .. } => {
                ApiError::new(ErrorCode::InsufficientStock, e.user_message())
            }
            DbError::NotPermitted(reason) => ApiError::forbidden(reason),
            DbError::InvalidInput(reason) => ApiError::validation(reason),
            DbError::ConnectionFailed(e) => {
                tracing::error!("Database connection failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(e) => {
                tracing::error!("Database migration failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                tracing::error!("Database query failed: {}", e);
                ApiError::new(
                    ErrorCode::DatabaseError,
                    format!("Database operation failed: {}", e),
                )
            }
            DbError::TransactionFailed(e) => {
                tracing::error!("Transaction failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database transaction failed")
            }
            DbError::PoolExhausted => {
                ApiError::new(ErrorCode::DatabaseError, "Database pool exhausted")
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ProductNotFound(id) => ApiError::not_found("Product", &id.to_string()),
            CoreError::InsufficientStock {
                product,
                available,
                requested,
            } => ApiError::new(
                ErrorCode::InsufficientStock,
                format!(
                    "Only {} units of {} available (requested {})",
                    available, product, requested
                ),
            ),
            CoreError::EmptyQuotation => {
                ApiError::validation("Add at least one product before continuing")
            }
            CoreError::EnvironmentNotFound(label) => ApiError::not_found("Environment", &label),
            e @ CoreError::Render(_) => ApiError::export(e.to_string()),
            e @ (CoreError::NegativeQuantity { .. }
            | CoreError::AmountOverflow { .. }
            | CoreError::LastEnvironment(_)) => {
                ApiError::new(ErrorCode::BusinessLogic, e.to_string())
            }
            CoreError::Validation(e) => e.into(),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl From<PrintError> for ApiError {
    fn from(err: PrintError) -> Self {
        ApiError::export(err.to_string())
    }
}

impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        ApiError::internal(err.to_string())
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ApiError {}
