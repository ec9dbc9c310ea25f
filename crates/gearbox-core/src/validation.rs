//! # Validation Module
//!
//! Input validation utilities for Gearbox POS.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP handler (gearbox-api)                                   │
//! │  ├── Type validation (serde deserialization, enum values)              │
//! │  └── THIS MODULE: Business rule validation                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Repository (gearbox-db)                                      │
//! │  ├── Existence checks, duplicate checks                                │
//! │  └── Conditional stock decrement                                       │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK (stock >= 0), CHECK (price_cents >= 0)                      │
//! │  ├── UNIQUE barcode / sale_number / category name                      │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use gearbox_core::validation::{validate_barcode, validate_quantity};
//!
//! assert!(validate_barcode("1234567890123").is_ok());
//! assert!(validate_quantity(2).is_ok());
//! ```

use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::error::ValidationError;
use crate::MAX_PAGE_SIZE;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a product barcode.
///
/// ## Rules
/// - Must not be empty
/// - At most 64 characters
/// - Letters, digits and hyphens only (EAN/UPC plus in-house codes)
///
/// ## Example
/// ```rust
/// use gearbox_core::validation::validate_barcode;
///
/// assert!(validate_barcode("1234567890123").is_ok());
/// assert!(validate_barcode("").is_err());
/// assert!(validate_barcode("12 34").is_err());
/// ```
pub fn validate_barcode(barcode: &str) -> ValidationResult<()> {
    let barcode = barcode.trim();

    if barcode.is_empty() {
        return Err(ValidationError::Required {
            field: "barcode".to_string(),
        });
    }

    if barcode.len() > 64 {
        return Err(ValidationError::TooLong {
            field: "barcode".to_string(),
            max: 64,
        });
    }

    if !barcode.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(ValidationError::InvalidFormat {
            field: "barcode".to_string(),
            reason: "must contain only letters, numbers, and hyphens".to_string(),
        });
    }

    Ok(())
}

/// Validates a product name.
///
/// ## Rules
/// - Must not be empty
/// - Must be between 1 and 200 characters
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.len() > 200 {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates a category name and returns it trimmed.
///
/// ```rust
/// use gearbox_core::validation::validate_category_name;
///
/// assert_eq!(validate_category_name("  Filters ").unwrap(), "Filters");
/// assert!(validate_category_name("   ").is_err());
/// ```
pub fn validate_category_name(name: &str) -> ValidationResult<String> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "Category name".to_string(),
        });
    }

    if name.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "Category name".to_string(),
            max: 100,
        });
    }

    Ok(name.to_string())
}

/// Validates a staff member's full name and returns it trimmed.
pub fn validate_staff_name(name: &str) -> ValidationResult<String> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "Full name".to_string(),
        });
    }

    if name.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "Full name".to_string(),
            max: 100,
        });
    }

    Ok(name.to_string())
}

/// Validates an email address and returns it trimmed and lowercased.
///
/// Only the shape is checked: one `@`, a non-empty local part and a dotted
/// domain.
///
/// ```rust
/// use gearbox_core::validation::validate_email;
///
/// assert_eq!(validate_email(" Staff@Shop.Test ").unwrap(), "staff@shop.test");
/// assert!(validate_email("staff@localhost").is_err());
/// ```
pub fn validate_email(email: &str) -> ValidationResult<String> {
    let email = email.trim().to_lowercase();

    if email.is_empty() {
        return Err(ValidationError::Required {
            field: "Email".to_string(),
        });
    }

    let invalid = |reason: &str| ValidationError::InvalidFormat {
        field: "email".to_string(),
        reason: reason.to_string(),
    };

    if email.len() > 254 {
        return Err(ValidationError::TooLong {
            field: "Email".to_string(),
            max: 254,
        });
    }
    if email.chars().any(char::is_whitespace) {
        return Err(invalid("must not contain spaces"));
    }

    match email.split_once('@') {
        Some((local, domain))
            if !local.is_empty()
                && !domain.contains('@')
                && domain.split('.').count() >= 2
                && domain.split('.').all(|part| !part.is_empty()) =>
        {
            Ok(email)
        }
        _ => Err(invalid("must look like name@example.com")),
    }
}

/// Validates a search query.
///
/// ## Rules
/// - Can be empty (returns all results)
/// - Maximum 100 characters
///
/// ## Returns
/// The trimmed query string.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "search".to_string(),
            max: 100,
        });
    }

    Ok(query.to_string())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a sale line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
///
/// There is no upper bound: a workshop buying 200 spark plugs is a normal
/// sale, and stock is the real limit.
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    Ok(())
}

/// Validates a price in cents.
///
/// ## Example
/// ```rust
/// use gearbox_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents(8999).is_ok());
/// assert!(validate_price_cents(0).is_ok());
/// assert!(validate_price_cents(-100).is_err());
/// ```
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a stock level. Stock can be zero but never negative.
pub fn validate_stock(stock: i64) -> ValidationResult<()> {
    if stock < 0 {
        return Err(ValidationError::OutOfRange {
            field: "stock".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates an optional sale adjustment (tax or discount) in cents.
pub fn validate_adjustment_cents(field: &str, cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a tax rate in basis points.
///
/// ## Rules
/// - Must be between 0 and 10000 (0% to 100%)
pub fn validate_tax_rate_bps(bps: u32) -> ValidationResult<()> {
    if bps > 10000 {
        return Err(ValidationError::OutOfRange {
            field: "taxRateBps".to_string(),
            min: 0,
            max: 10000,
        });
    }

    Ok(())
}

pub fn validate_low_stock_threshold(threshold: i64) -> ValidationResult<()> {
    if threshold < 0 {
        return Err(ValidationError::OutOfRange {
            field: "lowStockThreshold".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates list paging parameters.
///
/// ## Rules
/// - `page` starts at 1
/// - `limit` is between 1 and MAX_PAGE_SIZE
pub fn validate_page(page: i64, limit: i64) -> ValidationResult<()> {
    if page < 1 {
        return Err(ValidationError::OutOfRange {
            field: "page".to_string(),
            min: 1,
            max: i64::MAX,
        });
    }

    if !(1..=MAX_PAGE_SIZE).contains(&limit) {
        return Err(ValidationError::OutOfRange {
            field: "limit".to_string(),
            min: 1,
            max: MAX_PAGE_SIZE,
        });
    }

    Ok(())
}

/// Validates paging parameters and returns the row offset.
///
/// A page far enough out that the offset overflows is rejected like any
/// other out-of-range page.
///
/// ```rust
/// use gearbox_core::validation::page_offset;
///
/// assert_eq!(page_offset(3, 20).unwrap(), 40);
/// assert!(page_offset(i64::MAX, 10).is_err());
/// ```
pub fn page_offset(page: i64, limit: i64) -> ValidationResult<i64> {
    validate_page(page, limit)?;

    (page - 1).checked_mul(limit).ok_or_else(|| ValidationError::OutOfRange {
        field: "page".to_string(),
        min: 1,
        max: i64::MAX / limit + 1,
    })
}

// =============================================================================
// Date Validators
// =============================================================================

/// Which end of a date range a filter value describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateBound {
    /// Inclusive lower bound.
    Start,
    /// Inclusive upper bound, returned as an exclusive instant.
    End,
}

/// Parses a report filter date.
///
/// Accepts RFC 3339 (`2026-03-01T10:00:00Z`) or a plain day (`2026-03-01`).
/// A plain day used as [`DateBound::End`] covers that whole day, so the
/// returned instant is midnight of the following day and callers compare
/// with `<`.
///
/// ```rust
/// use gearbox_core::validation::{parse_date_bound, DateBound};
///
/// let end = parse_date_bound("endDate", "2026-03-01", DateBound::End).unwrap();
/// assert_eq!(end.to_rfc3339(), "2026-03-02T00:00:00+00:00");
/// ```
pub fn parse_date_bound(field: &str, value: &str, bound: DateBound) -> ValidationResult<DateTime<Utc>> {
    let value = value.trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        let ts = ts.with_timezone(&Utc);
        return Ok(match bound {
            DateBound::Start => ts,
            DateBound::End => ts + Duration::nanoseconds(1),
        });
    }

    let day = NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
        ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "expected YYYY-MM-DD or an RFC 3339 timestamp".to_string(),
        }
    })?;

    let day = match bound {
        DateBound::Start => day,
        DateBound::End => day.succ_opt().ok_or_else(|| ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "date out of range".to_string(),
        })?,
    };

    Ok(day.and_time(chrono::NaiveTime::MIN).and_utc())
}

// =============================================================================
// Unit Tests
// =============================================================================
