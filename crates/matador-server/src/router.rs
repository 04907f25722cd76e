//! Main application router.

use crate::{
    controllers::{health_controller, jobs_controller, queues_controller, stats_controller},
    state::AppState,
};
use axum::{http::HeaderValue, routing::get, Router};
use matador_config::ServerConfig;
use std::path::Path;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    services::{ServeDir, ServeFile},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;

/// Creates the main application router.
pub fn create_router(state: AppState, server_config: &ServerConfig) -> Router {
    let api_router = Router::new()
        .merge(queues_controller::router())
        .merge(jobs_controller::router())
        .merge(stats_controller::router())
        .route("/health", get(health_controller::readiness_check));

    let mut router = Router::new()
        // Liveness endpoints
        .merge(health_controller::router())
        .nest("/api", api_router)
        .with_state(state);

    // Dashboard frontend: unknown paths fall back to index.html for client routing
    if let Some(dir) = &server_config.static_dir {
        let index = Path::new(dir).join("index.html");
        router = router.fallback_service(ServeDir::new(dir).fallback(ServeFile::new(index)));
        info!(static_dir = %dir, "Serving dashboard frontend");
    }

    let router = router
        .layer(TimeoutLayer::new(server_config.request_timeout()))
        .layer(create_cors_layer(server_config))
        .layer(TraceLayer::new_for_http());

    info!("Router created with queue monitoring endpoints under /api");
    router
}

/// Creates a CORS layer based on server configuration.
fn create_cors_layer(server_config: &ServerConfig) -> CorsLayer {
    if !server_config.cors_enabled {
        return CorsLayer::new();
    }

    if server_config.cors_origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = server_config
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}
