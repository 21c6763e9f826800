use axum::response::Json;
use serde_json::{json, Value};
use tracing::instrument;

use crate::models::ApiResponse;

/// Liveness probe
#[instrument(name = "health_liveness")]
pub async fn liveness() -> Json<ApiResponse<Value>> {
    Json(ApiResponse::success(json!({
        "status": "UP",
        "service": "mealtable-rs",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    })))
}

/// Readiness probe; the process is ready once the router is serving
#[instrument(name = "health_readiness")]
pub async fn readiness() -> Json<ApiResponse<Value>> {
    Json(ApiResponse::success(json!({
        "status": "READY",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    })))
}
