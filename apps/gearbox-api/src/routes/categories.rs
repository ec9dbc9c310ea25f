//! Category routes.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use gearbox_core::{Category, CategoryOverview};
use gearbox_db::CategoryPatch;

use crate::auth::AdminStaff;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/categories", get(list_categories).post(create_category))
        .route("/api/categories/stats/overview", get(overview))
        .route(
            "/api/categories/{id}",
            get(get_category).put(update_category).delete(delete_category),
        )
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct NewCategory {
    name: Option<String>,
    description: Option<String>,
}

async fn list_categories(State(state): State<AppState>) -> ApiResult<Json<Vec<Category>>> {
    Ok(Json(state.db.categories().list_active().await?))
}

async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Category>> {
    state
        .db
        .categories()
        .get_by_id(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Category not found"))
}

async fn create_category(
    State(state): State<AppState>,
    AdminStaff(admin): AdminStaff,
    payload: Result<Json<NewCategory>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Category>)> {
    let Json(input) = payload?;
    let category = state
        .db
        .categories()
        .create(
            input.name.as_deref().unwrap_or_default(),
            input.description.as_deref().unwrap_or_default(),
            &admin.id,
        )
        .await?;

    info!(id = %category.id, name = %category.name, "Category created");
    Ok((StatusCode::CREATED, Json(category)))
}

async fn update_category(
    State(state): State<AppState>,
    AdminStaff(_admin): AdminStaff,
    Path(id): Path<String>,
    payload: Result<Json<CategoryPatch>, JsonRejection>,
) -> ApiResult<Json<Category>> {
    let Json(patch) = payload?;
    Ok(Json(state.db.categories().update(&id, patch).await?))
}

async fn delete_category(
    State(state): State<AppState>,
    AdminStaff(_admin): AdminStaff,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    state.db.categories().soft_delete(&id).await?;
    Ok(Json(json!({ "message": "Category deleted successfully" })))
}

async fn overview(
    State(state): State<AppState>,
    AdminStaff(_admin): AdminStaff,
) -> ApiResult<Json<CategoryOverview>> {
    Ok(Json(state.db.categories().overview().await?))
}
