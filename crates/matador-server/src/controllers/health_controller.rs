//! Health check controller.

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde::Serialize;
use tracing::warn;

use crate::state::AppState;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Health status.
    pub status: String,
    /// Application version.
    pub version: String,
}

impl HealthResponse {
    fn new(status: &str) -> Self {
        Self {
            status: status.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Creates the liveness router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/live", get(liveness_check))
}

/// Liveness with version.
pub async fn health_check() -> impl IntoResponse {
    Json(HealthResponse::new("healthy"))
}

/// Readiness: the store must answer a ping.
pub async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    match state.monitor.health_check().await {
        Ok(()) => (StatusCode::OK, Json(HealthResponse::new("healthy"))),
        Err(e) => {
            warn!(error = %e, "Store health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse::new("unhealthy")),
            )
        }
    }
}

/// Liveness check endpoint.
pub async fn liveness_check() -> impl IntoResponse {
    StatusCode::OK
}
