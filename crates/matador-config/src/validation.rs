//! Configuration validation.

use crate::error::{ConfigError, ConfigResult};
use crate::AppConfig;

impl AppConfig {
    /// Validates values that deserialization alone cannot reject.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.monitor.page_size == 0 {
            return Err(ConfigError::invalid("monitor.page_size", "must be at least 1"));
        }

        if self.redis.pool_size == 0 {
            return Err(ConfigError::invalid("redis.pool_size", "must be at least 1"));
        }

        let prefix = &self.redis.key_prefix;
        if prefix.is_empty() {
            return Err(ConfigError::invalid("redis.key_prefix", "must not be empty"));
        }
        if prefix.contains(['*', '?', '[', ']']) {
            return Err(ConfigError::invalid(
                "redis.key_prefix",
                format!("`{prefix}` contains key pattern characters"),
            ));
        }

        if self.server.request_timeout_secs == 0 {
            return Err(ConfigError::invalid("server.request_timeout_secs", "must be at least 1"));
        }

        self.redis.connection_url()?;

        Ok(())
    }
}
