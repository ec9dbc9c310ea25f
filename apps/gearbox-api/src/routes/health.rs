//! Health check endpoint

use axum::extract::State;
use axum::Json;

use crate::AppState;

pub async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    let database = state.db.health_check().await;

    Json(serde_json::json!({
        "status": if database { "ok" } else { "degraded" },
        "service": "gearbox-api",
        "version": env!("CARGO_PKG_VERSION"),
        "database": database,
    }))
}
