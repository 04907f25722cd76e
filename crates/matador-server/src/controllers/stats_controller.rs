//! Job statistics controller.

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use matador_monitor::Stats;

use crate::state::AppState;

/// Create the stats router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/stats", get(overall_stats))
        .route("/stats/:queue", get(queue_stats))
}

/// Status counters across every queue.
pub async fn overall_stats(State(state): State<AppState>) -> Json<Stats> {
    Json(state.monitor.get_stats().await)
}

/// Status counters for one queue.
pub async fn queue_stats(State(state): State<AppState>, Path(queue): Path<String>) -> Json<Stats> {
    Json(state.monitor.get_queue_stats(&queue).await)
}
