use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::error::ApiError;

/// GET /api
pub async fn welcome() -> Json<Value> {
    Json(json!({ "message": "Welcome to the Notes Taking App API" }))
}

/// GET /health - liveness plus a store ping
pub async fn health(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    if let Err(e) = state.health.ping().await {
        tracing::error!("Health check failed: {}", e);
        return Err(ApiError::service_unavailable("Database unavailable"));
    }

    Ok(Json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now(),
        "database": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    })))
}
