//! # gearbox-db: Database Layer for Gearbox POS
//!
//! SQLite storage for the catalog, staff, settings and sales, accessed
//! asynchronously through sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Gearbox POS Data Flow                             │
//! │                                                                         │
//! │  POST /api/sales (gearbox-api)                                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    gearbox-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ ProductRepo   │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ SaleRepo      │    │ 001_initial  │  │   │
//! │  │   │ WAL + busy    │    │ SettingsRepo  │    │   _schema    │  │   │
//! │  │   │ timeout       │    │ ...           │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 SQLite Database (gearbox.db)                    │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use gearbox_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./gearbox.db")).await?;
//!
//! let pads = db.products().get_by_barcode("1234567890123").await?;
//! let sale = db.sales().create_sale(&request, &staff_id).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::category::{CategoryPatch, CategoryRepository};
pub use repository::product::{NewProduct, ProductFilter, ProductPage, ProductPatch, ProductRepository};
pub use repository::sale::{SaleFilter, SalePage, SaleRepository};
pub use repository::settings::SettingsRepository;
pub use repository::staff::{StaffPatch, StaffRepository};
