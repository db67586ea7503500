//! # Error Types
//!
//! Domain errors raised by colva-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  colva-core errors (this file)                                         │
//! │  ├── CoreError        - Quotation rules (stock, quantities, drafts)    │
//! │  └── ValidationError  - One field failed one rule                      │
//! │                                                                         │
//! │  colva-db errors (separate crate)                                      │
//! │  └── DbError          - Backend failures, SQLSTATE mapped              │
//! │                                                                         │
//! │  CLI errors (in app)                                                   │
//! │  └── ApiError         - What the user sees (code + message)            │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Terminal     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Product referenced by a selection is not in the catalog snapshot.
    #[error("Product not found: {0}")]
    ProductNotFound(i64),

    /// Requested quantity (summed over every environment) exceeds the stock.
    ///
    /// ## User Workflow
    /// ```text
    /// Ambiente 1: Lamp x6   (10 in stock)
    ///      │
    ///      ▼
    /// Ambiente 2: Lamp x5   → 6 + 5 = 11
    ///      │
    ///      ▼
    /// InsufficientStock { product: "Lamp", available: 10, requested: 11 }
    ///      │
    ///      ▼
    /// "Only 10 units of Lamp available"
    /// ```
    #[error("Insufficient stock for {product}: available {available}, requested {requested}")]
    InsufficientStock {
        product: String,
        available: i64,
        requested: i64,
    },

    /// A quantity below zero reached the pricing code.
    #[error("Quantity for {product} cannot be negative (got {quantity})")]
    NegativeQuantity { product: String, quantity: i64 },

    /// Line total or aggregate does not fit in i64 cents.
    #[error("Amount overflow while pricing {context}")]
    AmountOverflow { context: String },

    /// Nothing selected in any environment.
    #[error("Quotation has no products selected")]
    EmptyQuotation,

    /// Environment label is not part of the draft.
    #[error("Environment not found: {0}")]
    EnvironmentNotFound(String),

    /// A draft always keeps at least one environment.
    #[error("Cannot remove the last environment ({0})")]
    LastEnvironment(String),

    /// The document template failed to render.
    #[error("Document could not be rendered: {0}")]
    Render(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Each variant names the field it belongs to so front-ends can place the
/// message next to the offending input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be strictly positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value outside an inclusive range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be zero or more.
    #[error("{field} cannot be negative")]
    Negative { field: String },

    /// Invalid format (phone, email, amount).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Duplicate value (environment label, username).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },

    /// Two fields that must agree do not (password confirmation).
    #[error("{field} does not match {other}")]
    Mismatch { field: String, other: String },
}

impl ValidationError {
    /// Name of the field this error is attached to.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Required { field }
            | ValidationError::TooShort { field, .. }
            | ValidationError::TooLong { field, .. }
            | ValidationError::MustBePositive { field }
            | ValidationError::Negative { field }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::InvalidFormat { field, .. }
            | ValidationError::NotAllowed { field, .. }
            | ValidationError::Duplicate { field, .. }
            | ValidationError::Mismatch { field, .. } => field,
        }
    }

    pub(crate) fn required(field: &str) -> Self {
        ValidationError::Required {
            field: field.to_string(),
        }
    }

    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_stock_message() {
        let err = CoreError::InsufficientStock {
            product: "Lamp".to_string(),
            available: 10,
            requested: 11,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for Lamp: available 10, requested 11"
        );
    }

    #[test]
    fn test_validation_error_field() {
        let err = ValidationError::Mismatch {
            field: "confirm_password".to_string(),
            other: "password".to_string(),
        };
        assert_eq!(err.field(), "confirm_password");
        assert_eq!(err.to_string(), "confirm_password does not match password");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let core_err: CoreError = ValidationError::required("phone").into();
        assert!(matches!(core_err, CoreError::Validation(_)));
        assert_eq!(core_err.to_string(), "Validation error: phone is required");
    }
}
