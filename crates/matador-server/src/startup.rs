//! Server startup utilities.

use matador_config::AppConfig;
use tracing::info;

/// Prints server startup information.
pub fn print_startup_info(config: &AppConfig) {
    let separator = "=".repeat(60);
    info!("{}", separator);
    info!("API:        http://{}/api", config.server.addr());
    info!("Health:     http://{}/health", config.server.addr());
    match &config.server.static_dir {
        Some(dir) => info!("Dashboard:  http://{}/ ({})", config.server.addr(), dir),
        None => info!("Dashboard:  not served"),
    }
    info!("Key prefix: {}", config.redis.key_prefix);
    info!("{}", separator);
}
