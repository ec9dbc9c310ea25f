//! # gearbox-core: Pure Business Logic for Gearbox POS
//!
//! This crate holds the rules of the car-parts point of sale as pure
//! functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Gearbox POS Architecture                         │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Frontend (React)                             │   │
//! │  │    Scanner ──► Cart ──► Checkout ──► Receipt / Admin reports    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ HTTP JSON                              │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    gearbox-api (axum)                           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ gearbox-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │ checkout  │  │sale_number│  │   │
//! │  │   │  Product  │  │   Money   │  │  pricing  │  │ SALE-NNNN │  │   │
//! │  │   │   Sale    │  │  TaxRate  │  │  totals   │  │  fallback │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • NO CLOCK                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  gearbox-db (Database Layer)                    │   │
//! │  │        SQLite queries, migrations, the sale transaction         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Category, Sale, Staff, Settings)
//! - [`money`] - Money type with integer arithmetic
//! - [`checkout`] - Sale request shape, line pricing and totals
//! - [`sale_number`] - Sale number formatting and parsing
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Example Usage
//!
//! ```rust
//! use gearbox_core::money::Money;
//! use gearbox_core::types::TaxRate;
//!
//! let subtotal = Money::from_cents(6748);
//! let tax = subtotal.calculate_tax(TaxRate::from_bps(800));
//! assert_eq!((subtotal + tax).cents(), 7288);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod checkout;
pub mod error;
pub mod money;
pub mod sale_number;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use sale_number::SaleNumber;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Page size used when a list request gives none.
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Largest page a list request may ask for.
pub const MAX_PAGE_SIZE: i64 = 100;

/// Number of entries in the "top products" report.
pub const TOP_PRODUCTS_LIMIT: i64 = 5;
