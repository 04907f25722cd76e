//! Monitor error types.

use thiserror::Error;

/// Result type for monitor operations.
pub type MonitorResult<T> = Result<T, MonitorError>;

/// Errors raised while reading the queue store.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// Redis error.
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Redis pool error.
    #[error("Redis pool error: {0}")]
    Pool(#[from] deadpool_redis::PoolError),

    /// Store failure reported by a non-Redis backend.
    #[error("Store error: {0}")]
    Store(String),

    /// The connection manager was closed.
    #[error("Connection is closed")]
    Closed,

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<matador_config::ConfigError> for MonitorError {
    fn from(err: matador_config::ConfigError) -> Self {
        MonitorError::Configuration(err.to_string())
    }
}
