use axum::{Json, Router, http::StatusCode, routing::get};
use serde::Serialize;
use util::{config, state::AppState};

use crate::response::ApiResponse;

#[derive(Serialize, Default)]
pub struct HealthStatus {
    pub status: String,
    pub project: String,
}

/// GET `/api/v1/health`
///
/// Public liveness check.
pub async fn health() -> (StatusCode, Json<ApiResponse<HealthStatus>>) {
    let payload = HealthStatus {
        status: "ok".into(),
        project: config::project_name(),
    };
    (
        StatusCode::OK,
        Json(ApiResponse::success(payload, "Service healthy")),
    )
}

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/", get(health))
}
