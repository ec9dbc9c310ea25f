//! # Gearbox API
//!
//! HTTP JSON API for the car-parts counter: catalog lookups for the barcode
//! scanner, checkout for the cart, and reports for the admin screens.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                            Gearbox API                                  │
//! │                                                                         │
//! │  request ──► TraceLayer ──► CorsLayer ──► Router                       │
//! │                                             │                           │
//! │                 ┌───────────────────────────┼──────────────────────┐    │
//! │                 ▼                           ▼                      ▼    │
//! │        CurrentStaff / AdminStaff      route handler          ApiError   │
//! │        (x-staff-id lookup)           state.db.<repo>()     {code, msg}  │
//! │                                             │                           │
//! │                                             ▼                           │
//! │                                   gearbox-db (SQLite)                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! Environment variables:
//! - `GEARBOX_PORT` - HTTP port (default: 5000)
//! - `GEARBOX_BIND` - bind address (default: 0.0.0.0)
//! - `GEARBOX_DATABASE_PATH` - SQLite file (default: ./gearbox.db)
//! - `GEARBOX_DB_MAX_CONNECTIONS` - pool size (default: 5)
//! - `GEARBOX_RUN_MIGRATIONS` - apply migrations at startup (default: true)
//! - `GEARBOX_CORS_PERMISSIVE` - allow any origin (default: true)

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use gearbox_db::Database;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

// Re-exports
pub use config::ApiConfig;
pub use error::ApiError;

/// Shared application state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<ApiConfig>,
}

impl AppState {
    pub fn new(db: Database, config: ApiConfig) -> Self {
        AppState {
            db,
            config: Arc::new(config),
        }
    }
}

/// Builds the full router with tracing and CORS layers.
pub fn app(state: AppState) -> Router {
    let cors = if state.config.cors_permissive {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
    };

    routes::router()
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

// =============================================================================
// Router Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use gearbox_core::StaffRole;
    use gearbox_db::DbConfig;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    struct TestApp {
        router: Router,
        db: Database,
        admin_id: String,
        staff_id: String,
    }

    async fn test_app() -> TestApp {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let admin = db
            .staff()
            .insert("Store Admin", "admin@shop.test", StaffRole::Admin)
            .await
            .unwrap();
        let staff = db
            .staff()
            .insert("Counter Staff", "staff@shop.test", StaffRole::Staff)
            .await
            .unwrap();

        TestApp {
            router: app(AppState::new(db.clone(), ApiConfig::default())),
            db,
            admin_id: admin.id,
            staff_id: staff.id,
        }
    }

    impl TestApp {
        async fn send(
            &self,
            method: &str,
            uri: &str,
            staff_id: Option<&str>,
            body: Option<Value>,
        ) -> (StatusCode, Value) {
            let mut builder = Request::builder().method(method).uri(uri);
            if let Some(id) = staff_id {
                builder = builder.header(auth::STAFF_HEADER, id);
            }
            let request = match body {
                Some(body) => builder
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
                None => builder.body(Body::empty()).unwrap(),
            };

            let response = self.router.clone().oneshot(request).await.unwrap();
            let status = response.status();
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            let value = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes).unwrap()
            };
            (status, value)
        }

        async fn create_product(&self, barcode: &str, name: &str, price_cents: i64, stock: i64) -> String {
            let (status, body) = self
                .send(
                    "POST",
                    "/api/products",
                    Some(&self.admin_id),
                    Some(json!({
                        "barcode": barcode,
                        "name": name,
                        "priceCents": price_cents,
                        "stock": stock,
                    })),
                )
                .await;
            assert_eq!(status, StatusCode::CREATED, "{body}");
            body["id"].as_str().unwrap().to_string()
        }
    }

    #[tokio::test]
    async fn test_health() {
        let app = test_app().await;
        let (status, body) = app.send("GET", "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["database"], true);
    }

    #[tokio::test]
    async fn test_checkout_flow() {
        let app = test_app().await;
        let pads = app.create_product("1234567890123", "Brake Pads - Front Set", 2599, 10).await;
        let filter = app.create_product("2345678901234", "Oil Filter", 1550, 5).await;

        // scanner lookup is public
        let (status, body) = app
            .send("GET", "/api/products/barcode/1234567890123", None, None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], pads.as_str());

        let (status, sale) = app
            .send(
                "POST",
                "/api/sales",
                Some(&app.staff_id),
                Some(json!({
                    "items": [
                        { "productId": pads, "quantity": 2 },
                        { "product": { "_id": filter }, "quantity": 1 }
                    ],
                    "paymentMethod": "card",
                    "taxCents": 540,
                    "customer": { "name": "John Smith" }
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{sale}");
        assert_eq!(sale["saleNumber"], "SALE-000001");
        assert_eq!(sale["subtotalCents"], 6748);
        assert_eq!(sale["totalCents"], 7288);
        assert_eq!(sale["paymentStatus"], "completed");
        assert_eq!(sale["createdByName"], "Counter Staff");
        assert_eq!(sale["items"].as_array().unwrap().len(), 2);

        let (_, product) = app
            .send("GET", &format!("/api/products/{pads}"), None, None)
            .await;
        assert_eq!(product["stock"], 8);

        let uri = format!("/api/sales/{}", sale["id"].as_str().unwrap());
        let (status, stored) = app.send("GET", &uri, Some(&app.admin_id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(stored, sale);
    }

    #[tokio::test]
    async fn test_sale_requires_staff() {
        let app = test_app().await;
        let body = json!({ "items": [], "paymentMethod": "cash" });

        let (status, err) = app.send("POST", "/api/sales", None, Some(body.clone())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(err["code"], "UNAUTHORIZED");

        let (status, _) = app
            .send("POST", "/api/sales", Some("not-a-staff-id"), Some(body))
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        app.db.staff().deactivate(&app.staff_id).await.unwrap();
        let (status, _) = app
            .send("POST", "/api/sales/quote", Some(&app.staff_id), Some(json!({})))
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_admin_routes_refuse_staff() {
        let app = test_app().await;

        for (method, uri) in [
            ("GET", "/api/sales"),
            ("GET", "/api/sales/stats"),
            ("GET", "/api/sales/revenue/monthly"),
            ("GET", "/api/categories/stats/overview"),
        ] {
            let (status, err) = app.send(method, uri, Some(&app.staff_id), None).await;
            assert_eq!(status, StatusCode::FORBIDDEN, "{uri}");
            assert_eq!(err["code"], "FORBIDDEN");
        }

        let (status, _) = app
            .send(
                "POST",
                "/api/products",
                Some(&app.staff_id),
                Some(json!({ "barcode": "X1", "name": "Wiper", "priceCents": 999 })),
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_insufficient_stock_echoes_line() {
        let app = test_app().await;
        let filter = app.create_product("2345678901234", "Oil Filter", 1550, 5).await;

        let (status, err) = app
            .send(
                "POST",
                "/api/sales",
                Some(&app.staff_id),
                Some(json!({
                    "items": [{ "productId": filter, "quantity": 6 }],
                    "paymentMethod": "cash"
                })),
            )
            .await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(err["code"], "INSUFFICIENT_STOCK");
        assert_eq!(
            err["message"],
            "Insufficient stock for Oil Filter. Available: 5, Requested: 6"
        );
        assert_eq!(err["details"]["item"], 1);
        assert_eq!(err["details"]["available"], 5);
        assert_eq!(err["details"]["line"]["quantity"], 6);

        let (_, product) = app
            .send("GET", &format!("/api/products/{filter}"), None, None)
            .await;
        assert_eq!(product["stock"], 5);
    }

    #[tokio::test]
    async fn test_unknown_product_is_404_with_item() {
        let app = test_app().await;
        let pads = app.create_product("1234567890123", "Brake Pads", 2599, 10).await;

        let (status, err) = app
            .send(
                "POST",
                "/api/sales",
                Some(&app.staff_id),
                Some(json!({
                    "items": [
                        { "productId": pads, "quantity": 1 },
                        { "productId": "missing", "quantity": 1 }
                    ],
                    "paymentMethod": "cash"
                })),
            )
            .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(err["details"]["item"], 2);
        assert_eq!(err["details"]["productId"], "missing");
    }

    #[tokio::test]
    async fn test_validation_errors() {
        let app = test_app().await;

        let (status, err) = app
            .send(
                "POST",
                "/api/sales",
                Some(&app.staff_id),
                Some(json!({ "paymentMethod": "cash" })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["code"], "VALIDATION_ERROR");
        assert_eq!(
            err["message"],
            "Items array is required and must contain at least one item"
        );

        let (status, err) = app
            .send(
                "POST",
                "/api/sales",
                Some(&app.staff_id),
                Some(json!({
                    "items": [{ "productId": "p", "quantity": 0 }],
                    "paymentMethod": "cash"
                })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["message"], "Valid quantity is required for item 1");
        assert_eq!(err["details"]["item"], 1);

        // unknown payment method fails body parsing
        let (status, err) = app
            .send(
                "POST",
                "/api/sales",
                Some(&app.staff_id),
                Some(json!({ "items": [], "paymentMethod": "bitcoin" })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["code"], "VALIDATION_ERROR");

        let (status, _) = app
            .send("GET", "/api/sales?startDate=yesterday", Some(&app.admin_id), None)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_line_shapes_are_reported_per_item() {
        let app = test_app().await;
        let pads = app.create_product("1234567890123", "Brake Pads", 2599, 10).await;

        let (status, err) = app
            .send(
                "POST",
                "/api/sales",
                Some(&app.staff_id),
                Some(json!({
                    "items": [
                        { "productId": pads, "quantity": 1 },
                        { "productId": pads, "quantity": 1.5 }
                    ],
                    "paymentMethod": "cash"
                })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["message"], "Valid quantity is required for item 2");
        assert_eq!(err["details"]["item"], 2);
        assert_eq!(err["details"]["line"]["quantity"], 1.5);

        // a blank productId falls back to the nested product
        let (status, sale) = app
            .send(
                "POST",
                "/api/sales",
                Some(&app.staff_id),
                Some(json!({
                    "items": [{ "productId": "", "product": { "_id": pads }, "quantity": 1 }],
                    "paymentMethod": "cash"
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{sale}");
        assert_eq!(sale["subtotalCents"], 2599);
    }

    #[tokio::test]
    async fn test_huge_page_is_rejected() {
        let app = test_app().await;

        let (status, err) = app
            .send("GET", "/api/products?page=9223372036854775807", None, None)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["code"], "VALIDATION_ERROR");

        let (status, _) = app
            .send(
                "GET",
                "/api/sales?page=9223372036854775807",
                Some(&app.admin_id),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_staff_management() {
        let app = test_app().await;

        let (status, _) = app.send("GET", "/api/staff", Some(&app.staff_id), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, created) = app
            .send(
                "POST",
                "/api/staff",
                Some(&app.admin_id),
                Some(json!({ "fullName": "New Hire", "email": "New@Shop.Test" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{created}");
        assert_eq!(created["email"], "new@shop.test");
        assert_eq!(created["role"], "staff");
        assert_eq!(created["isActive"], true);
        let new_id = created["id"].as_str().unwrap().to_string();

        let (status, err) = app
            .send(
                "POST",
                "/api/staff",
                Some(&app.admin_id),
                Some(json!({ "fullName": "Copy", "email": "new@shop.test" })),
            )
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(err["code"], "CONFLICT");

        let (status, _) = app
            .send(
                "POST",
                "/api/staff",
                Some(&app.admin_id),
                Some(json!({ "email": "nameless@shop.test" })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, updated) = app
            .send(
                "PUT",
                &format!("/api/staff/{new_id}"),
                Some(&app.admin_id),
                Some(json!({ "fullName": "Senior Hire", "role": "admin" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["fullName"], "Senior Hire");
        assert_eq!(updated["role"], "admin");

        let (status, list) = app.send("GET", "/api/staff", Some(&app.admin_id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list.as_array().unwrap().len(), 3);

        // admins cannot switch themselves off
        for (method, uri) in [
            ("DELETE", format!("/api/staff/{}", app.admin_id)),
            ("PUT", format!("/api/staff/{}/toggle-status", app.admin_id)),
        ] {
            let (status, err) = app.send(method, &uri, Some(&app.admin_id), None).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(err["code"], "VALIDATION_ERROR");
        }

        let (status, toggled) = app
            .send(
                "PUT",
                &format!("/api/staff/{}/toggle-status", app.staff_id),
                Some(&app.admin_id),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(toggled["isActive"], false);

        // a deactivated member can no longer ring up sales
        let (status, _) = app
            .send("POST", "/api/sales/quote", Some(&app.staff_id), Some(json!({})))
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = app
            .send("DELETE", &format!("/api/staff/{new_id}"), Some(&app.admin_id), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        let (_, list) = app.send("GET", "/api/staff", Some(&app.admin_id), None).await;
        assert_eq!(list.as_array().unwrap().len(), 1);

        let (status, _) = app
            .send("DELETE", "/api/staff/missing", Some(&app.admin_id), None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_settings_reset_and_currencies() {
        let app = test_app().await;

        let (status, currencies) = app.send("GET", "/api/settings/currencies", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(currencies.as_array().unwrap().len(), 4);
        assert_eq!(currencies[2]["code"], "GBP");
        assert_eq!(currencies[2]["symbol"], "£");

        app.send(
            "PUT",
            "/api/settings",
            Some(&app.admin_id),
            Some(json!({ "currency": "EUR", "taxRateBps": 800 })),
        )
        .await;

        let (status, _) = app
            .send("POST", "/api/settings/reset", Some(&app.staff_id), None)
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, settings) = app
            .send("POST", "/api/settings/reset", Some(&app.admin_id), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(settings["currency"], "USD");
        assert_eq!(settings["taxRateBps"], 0);
        assert_eq!(settings["lastUpdatedBy"], app.admin_id.as_str());
    }

    #[tokio::test]
    async fn test_catalog_conflicts() {
        let app = test_app().await;
        app.create_product("1234567890123", "Brake Pads", 2599, 10).await;

        let (status, err) = app
            .send(
                "POST",
                "/api/products",
                Some(&app.admin_id),
                Some(json!({ "barcode": "1234567890123", "name": "Copy", "priceCents": 1 })),
            )
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(err["code"], "CONFLICT");

        let (status, category) = app
            .send(
                "POST",
                "/api/categories",
                Some(&app.admin_id),
                Some(json!({ "name": "Filters" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, _) = app
            .send(
                "POST",
                "/api/categories",
                Some(&app.admin_id),
                Some(json!({ "name": "filters" })),
            )
            .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let category_id = category["id"].as_str().unwrap();
        let (status, _) = app
            .send(
                "POST",
                "/api/products",
                Some(&app.admin_id),
                Some(json!({
                    "barcode": "2345678901234",
                    "name": "Oil Filter",
                    "priceCents": 1550,
                    "categoryId": category_id
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, err) = app
            .send(
                "DELETE",
                &format!("/api/categories/{category_id}"),
                Some(&app.admin_id),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            err["message"],
            "Cannot delete category. It is being used by 1 product(s)"
        );
    }

    #[tokio::test]
    async fn test_reports_and_settings() {
        let app = test_app().await;

        let (status, settings) = app.send("GET", "/api/settings", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(settings["currency"], "USD");

        let (status, settings) = app
            .send(
                "PUT",
                "/api/settings",
                Some(&app.admin_id),
                Some(json!({ "taxRateBps": 800, "lowStockThreshold": 3 })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(settings["taxRateBps"], 800);

        let pads = app.create_product("1234567890123", "Brake Pads", 2599, 10).await;
        app.create_product("2345678901234", "Oil Filter", 1550, 2).await;

        let (status, low) = app.send("GET", "/api/products/low-stock", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(low.as_array().unwrap().len(), 1);
        assert_eq!(low[0]["name"], "Oil Filter");

        let (status, quote) = app
            .send(
                "POST",
                "/api/sales/quote",
                Some(&app.staff_id),
                Some(json!({ "items": [{ "productId": pads, "quantity": 2 }] })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(quote["suggestedTaxCents"], 416);

        let (status, _) = app
            .send(
                "POST",
                "/api/sales",
                Some(&app.staff_id),
                Some(json!({
                    "items": [{ "productId": pads, "quantity": 2 }],
                    "paymentMethod": "cash",
                    "taxCents": 416
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, stats) = app
            .send("GET", "/api/sales/stats", Some(&app.admin_id), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(stats["today"]["totalSales"], 1);
        assert_eq!(stats["today"]["totalRevenueCents"], 5614);
        assert_eq!(stats["topProducts"][0]["totalQuantity"], 2);

        let (status, report) = app
            .send("GET", "/api/sales/revenue/monthly", Some(&app.admin_id), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(report["monthlyData"].as_array().unwrap().len(), 12);
        assert_eq!(report["totalYearSales"], 1);

        let (status, page) = app
            .send("GET", "/api/sales?page=1&limit=5", Some(&app.admin_id), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(page["pagination"]["totalItems"], 1);
    }
}
