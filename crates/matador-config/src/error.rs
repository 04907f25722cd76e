//! Configuration error types.

use thiserror::Error;

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A configuration source could not be read or deserialized.
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    /// A value was loaded but is not acceptable.
    #[error("Invalid configuration for `{field}`: {message}")]
    Invalid { field: &'static str, message: String },

    /// The Redis connection URL could not be built.
    #[error("Invalid Redis URL: {0}")]
    RedisUrl(String),
}

impl ConfigError {
    /// Creates an invalid-value error for the given field.
    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_display_names_field() {
        let err = ConfigError::invalid("monitor.page_size", "must be at least 1");
        let msg = err.to_string();
        assert!(msg.contains("monitor.page_size"));
        assert!(msg.contains("must be at least 1"));
    }

    #[test]
    fn test_redis_url_display() {
        let err = ConfigError::RedisUrl("bad host".into());
        assert!(err.to_string().contains("bad host"));
    }
}
