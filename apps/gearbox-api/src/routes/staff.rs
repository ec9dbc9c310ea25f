//! Staff management routes. All admin only.
//!
//! Staff are soft deleted. An admin cannot deactivate their own account.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use gearbox_core::{Staff, StaffRole};
use gearbox_db::StaffPatch;

use crate::auth::AdminStaff;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/staff", get(list_staff).post(create_staff))
        .route(
            "/api/staff/{id}",
            get(get_staff).put(update_staff).delete(deactivate_staff),
        )
        .route("/api/staff/{id}/toggle-status", put(toggle_status))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct NewStaff {
    full_name: Option<String>,
    email: Option<String>,
    role: Option<StaffRole>,
}

async fn list_staff(
    State(state): State<AppState>,
    AdminStaff(_admin): AdminStaff,
) -> ApiResult<Json<Vec<Staff>>> {
    Ok(Json(state.db.staff().list_active().await?))
}

async fn get_staff(
    State(state): State<AppState>,
    AdminStaff(_admin): AdminStaff,
    Path(id): Path<String>,
) -> ApiResult<Json<Staff>> {
    state
        .db
        .staff()
        .get_by_id(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Staff member not found"))
}

async fn create_staff(
    State(state): State<AppState>,
    AdminStaff(admin): AdminStaff,
    payload: Result<Json<NewStaff>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Staff>)> {
    let Json(input) = payload?;
    let staff = state
        .db
        .staff()
        .insert(
            input.full_name.as_deref().unwrap_or_default(),
            input.email.as_deref().unwrap_or_default(),
            input.role.unwrap_or(StaffRole::Staff),
        )
        .await?;

    info!(id = %staff.id, role = ?staff.role, by = %admin.id, "Staff member registered");
    Ok((StatusCode::CREATED, Json(staff)))
}

async fn update_staff(
    State(state): State<AppState>,
    AdminStaff(_admin): AdminStaff,
    Path(id): Path<String>,
    payload: Result<Json<StaffPatch>, JsonRejection>,
) -> ApiResult<Json<Staff>> {
    let Json(patch) = payload?;
    Ok(Json(state.db.staff().update(&id, patch).await?))
}

async fn deactivate_staff(
    State(state): State<AppState>,
    AdminStaff(admin): AdminStaff,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    if id == admin.id {
        return Err(ApiError::validation("Cannot delete your own account"));
    }

    state.db.staff().deactivate(&id).await?;
    info!(id = %id, by = %admin.id, "Staff member deactivated");
    Ok(Json(json!({ "message": "Staff member deleted successfully" })))
}

async fn toggle_status(
    State(state): State<AppState>,
    AdminStaff(admin): AdminStaff,
    Path(id): Path<String>,
) -> ApiResult<Json<Staff>> {
    if id == admin.id {
        return Err(ApiError::validation("Cannot deactivate your own account"));
    }

    let staff = state.db.staff().toggle_active(&id).await?;
    info!(id = %id, active = staff.is_active, by = %admin.id, "Staff status toggled");
    Ok(Json(staff))
}
