//! HTTP routes.
//!
//! ```text
//! /health                          public
//! /api/products/...                reads public, writes admin
//! /api/categories/...              reads public, writes + stats admin
//! /api/sales, /api/sales/quote     POST: any staff member
//! /api/sales/...                   GET: admin
//! /api/settings                    GET public, PUT admin
//! /api/settings/currencies         public
//! /api/settings/reset              POST admin
//! /api/staff/...                   admin
//! ```

pub mod categories;
pub mod health;
pub mod products;
pub mod sales;
pub mod settings;
pub mod staff;

use axum::routing::get;
use axum::Router;

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health_check))
        .merge(products::router())
        .merge(categories::router())
        .merge(sales::router())
        .merge(settings::router())
        .merge(staff::router())
}
