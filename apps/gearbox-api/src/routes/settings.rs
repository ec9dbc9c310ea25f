//! Store settings routes.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use tracing::info;

use gearbox_core::{Currency, CurrencyInfo, Settings, SettingsUpdate};

use crate::auth::AdminStaff;
use crate::error::ApiResult;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/settings", get(get_settings).put(update_settings))
        .route("/api/settings/currencies", get(currencies))
        .route("/api/settings/reset", post(reset_settings))
}

async fn get_settings(State(state): State<AppState>) -> ApiResult<Json<Settings>> {
    Ok(Json(state.db.settings().get().await?))
}

async fn update_settings(
    State(state): State<AppState>,
    AdminStaff(admin): AdminStaff,
    payload: Result<Json<SettingsUpdate>, JsonRejection>,
) -> ApiResult<Json<Settings>> {
    let Json(update) = payload?;
    let settings = state.db.settings().update(update, &admin.id).await?;

    info!(admin = %admin.id, "Settings updated");
    Ok(Json(settings))
}

async fn reset_settings(
    State(state): State<AppState>,
    AdminStaff(admin): AdminStaff,
) -> ApiResult<Json<Settings>> {
    Ok(Json(state.db.settings().reset(&admin.id).await?))
}

async fn currencies() -> Json<Vec<CurrencyInfo>> {
    Json(Currency::ALL.into_iter().map(CurrencyInfo::from).collect())
}
