//! Server error types.

use matador_config::ConfigError;
use matador_monitor::MonitorError;
use thiserror::Error;

/// Result type for server startup and shutdown.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors that stop the server process.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The queue monitor failed to connect or close.
    #[error("Monitor error: {0}")]
    Monitor(#[from] MonitorError),

    /// Binding or serving failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Connections were not released before the shutdown deadline.
    #[error("Shutdown did not complete within {0} seconds")]
    ShutdownTimeout(u64),
}
