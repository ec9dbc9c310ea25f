//! # Repository Module
//!
//! One repository per table group, each a thin owner of a pool clone.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  axum handler                                                          │
//! │       │                                                                 │
//! │       │  state.db.sales().create_sale(&request, &staff.id)             │
//! │       ▼                                                                 │
//! │  SaleRepository                                                        │
//! │  ├── create_sale(&self, request, staff_id)                             │
//! │  ├── quote(&self, request)                                             │
//! │  ├── list(&self, filter) / get_by_id(&self, id)                        │
//! │  └── stats(&self, now) / monthly_revenue(&self, year)                  │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Catalog CRUD and search
//! - [`CategoryRepository`](category::CategoryRepository) - Categories and their stats
//! - [`SaleRepository`](sale::SaleRepository) - Checkout transaction and reports
//! - [`StaffRepository`](staff::StaffRepository) - Staff lookups and admin management
//! - [`SettingsRepository`](settings::SettingsRepository) - Store settings singleton

pub mod category;
pub mod product;
pub mod sale;
pub mod settings;
pub mod staff;
