//! # Matador Server
//!
//! Read-only monitoring API for Bull and BullMQ queues.

use matador_config::{AppConfig, ConfigLoader};
use matador_monitor::{register_metrics, QueueMonitor};
use matador_server::{
    create_router, startup::print_startup_info, telemetry::init_logging, AppState, ServerError,
    ServerResult,
};
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let config = match ConfigLoader::from_default_location().load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config.observability);

    info!("Starting Matador Server...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(config).await {
        error!("Application error: {}", e);
        std::process::exit(1);
    }
}

async fn run(config: AppConfig) -> ServerResult<()> {
    info!("Environment: {}", config.app.environment);
    register_metrics();

    let monitor = Arc::new(QueueMonitor::connect(&config.redis, &config.monitor).await?);
    let router = create_router(AppState::new(Arc::clone(&monitor)), &config.server);

    let addr = config.server.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    print_startup_info(&config);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("HTTP server stopped, closing store connections...");
    let deadline = config.server.shutdown_timeout();
    tokio::time::timeout(deadline, monitor.close())
        .await
        .map_err(|_| ServerError::ShutdownTimeout(config.server.shutdown_timeout_secs))??;

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            info!("Received terminate signal, initiating graceful shutdown...");
        }
    }
}
