//! # Error Types
//!
//! Domain-specific error types for gearbox-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  gearbox-core errors (this file)                                       │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  gearbox-db errors (separate crate)                                    │
//! │  └── DbError          - Database failures, wraps CoreError             │
//! │                                                                         │
//! │  HTTP errors (in gearbox-api)                                          │
//! │  └── ApiError         - What the frontend sees (code + message)        │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Frontend     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Line-level errors carry the 1-based position of the offending item so
//! the cart UI can highlight it.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product cannot be found by id or barcode.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// A sale line references a product that does not exist.
    ///
    /// ## When This Occurs
    /// - Stale cart: product deleted between scan and checkout
    /// - Hand-built request with a bad id
    #[error("Product not found: {product_id}")]
    LineProductNotFound { line_no: usize, product_id: String },

    /// Insufficient stock to complete the sale.
    ///
    /// ## When This Occurs
    /// - Requested quantity exceeds units on hand
    /// - Another checkout took the last units first (the conditional
    ///   decrement affected no rows)
    ///
    /// ## User Workflow
    /// ```text
    /// Checkout: Brake Pads × 5
    ///      │
    ///      ▼
    /// Check stock: available=3
    ///      │
    ///      ▼
    /// InsufficientStock { line_no: 1, product: "Brake Pads", available: 3, requested: 5 }
    ///      │
    ///      ▼
    /// Nothing is written; the cart highlights item 1
    /// ```
    #[error("Insufficient stock for {product}. Available: {available}, Requested: {requested}")]
    InsufficientStock {
        line_no: usize,
        product: String,
        available: i64,
        requested: i64,
    },

    /// Category still referenced by products.
    #[error("Cannot delete category. It is being used by {product_count} product(s)")]
    CategoryInUse { product_count: i64 },

    /// Validation error (wraps ValidationError).
    #[error("{0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// The 1-based sale line this error refers to, if any.
    pub fn line_no(&self) -> Option<usize> {
        match self {
            CoreError::LineProductNotFound { line_no, .. }
            | CoreError::InsufficientStock { line_no, .. } => Some(*line_no),
            CoreError::Validation(ValidationError::LineItem { line_no, .. }) => Some(*line_no),
            _ => None,
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// A sale request arrived without any lines.
    #[error("Items array is required and must contain at least one item")]
    EmptyItems,

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid barcode, invalid date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Duplicate value (e.g., duplicate barcode).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },

    /// A single sale line is malformed.
    #[error("{reason} for item {line_no}")]
    LineItem { line_no: usize, reason: String },

    /// Discount exceeds subtotal plus tax.
    #[error("Total cannot be negative ({total_cents} cents): discount exceeds subtotal plus tax")]
    NegativeTotal { total_cents: i64 },
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
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            line_no: 1,
            product: "Brake Pads - Front Set".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for Brake Pads - Front Set. Available: 3, Requested: 5"
        );
        assert_eq!(err.line_no(), Some(1));

        let err = CoreError::LineProductNotFound {
            line_no: 2,
            product_id: "abc".to_string(),
        };
        assert_eq!(err.to_string(), "Product not found: abc");
        assert_eq!(err.line_no(), Some(2));
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::LineItem {
            line_no: 3,
            reason: "Valid quantity is required".to_string(),
        };
        assert_eq!(err.to_string(), "Valid quantity is required for item 3");

        let err = ValidationError::Required {
            field: "Payment method".to_string(),
        };
        assert_eq!(err.to_string(), "Payment method is required");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let core_err: CoreError = ValidationError::EmptyItems.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
        assert_eq!(core_err.line_no(), None);
        assert_eq!(
            core_err.to_string(),
            "Items array is required and must contain at least one item"
        );
    }
}
