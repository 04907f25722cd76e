//! Queue listing controller.

use axum::{extract::State, routing::get, Json, Router};
use matador_monitor::Queue;

use crate::state::AppState;

/// Create the queues router.
pub fn router() -> Router<AppState> {
    Router::new().route("/queues", get(list_queues))
}

/// Lists every discovered queue with its counters.
pub async fn list_queues(State(state): State<AppState>) -> Json<Vec<Queue>> {
    Json(state.monitor.get_queues().await)
}
