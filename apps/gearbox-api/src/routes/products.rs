//! Product catalog routes.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use tracing::info;

use gearbox_core::Product;
use gearbox_db::{NewProduct, ProductFilter, ProductPage, ProductPatch};

use crate::auth::AdminStaff;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/products", get(list_products).post(create_product))
        .route("/api/products/categories/list", get(used_categories))
        .route("/api/products/low-stock", get(low_stock))
        .route("/api/products/barcode/{barcode}", get(get_by_barcode))
        .route(
            "/api/products/{id}",
            get(get_product).put(update_product).delete(delete_product),
        )
}

/// GET /api/products?page&limit&category&search
async fn list_products(
    State(state): State<AppState>,
    query: Result<Query<ProductFilter>, QueryRejection>,
) -> ApiResult<Json<ProductPage>> {
    let Query(filter) = query?;
    Ok(Json(state.db.products().list(&filter).await?))
}

async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Product>> {
    state
        .db
        .products()
        .get_by_id(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Product not found"))
}

/// Scanner lookup. Only active products are found.
async fn get_by_barcode(
    State(state): State<AppState>,
    Path(barcode): Path<String>,
) -> ApiResult<Json<Product>> {
    state
        .db
        .products()
        .get_by_barcode(&barcode)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Product not found"))
}

async fn used_categories(State(state): State<AppState>) -> ApiResult<Json<Vec<String>>> {
    Ok(Json(state.db.products().used_category_names().await?))
}

/// Products at or below the store's low-stock threshold.
async fn low_stock(State(state): State<AppState>) -> ApiResult<Json<Vec<Product>>> {
    let settings = state.db.settings().get().await?;
    Ok(Json(
        state
            .db
            .products()
            .low_stock(settings.low_stock_threshold)
            .await?,
    ))
}

async fn create_product(
    State(state): State<AppState>,
    AdminStaff(admin): AdminStaff,
    payload: Result<Json<NewProduct>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    let Json(input) = payload?;
    let product = state.db.products().insert(&input).await?;

    info!(id = %product.id, barcode = %product.barcode, admin = %admin.id, "Product created");
    Ok((StatusCode::CREATED, Json(product)))
}

async fn update_product(
    State(state): State<AppState>,
    AdminStaff(admin): AdminStaff,
    Path(id): Path<String>,
    payload: Result<Json<ProductPatch>, JsonRejection>,
) -> ApiResult<Json<Product>> {
    let Json(patch) = payload?;
    let product = state.db.products().update(&id, patch).await?;

    info!(id = %id, admin = %admin.id, "Product updated");
    Ok(Json(product))
}

async fn delete_product(
    State(state): State<AppState>,
    AdminStaff(admin): AdminStaff,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    state.db.products().soft_delete(&id).await?;

    info!(id = %id, admin = %admin.id, "Product deleted");
    Ok(Json(json!({ "message": "Product deleted successfully" })))
}
