//! Application configuration structures.

use crate::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application name and metadata.
    #[serde(default)]
    pub app: AppMetadata,

    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Redis connection configuration.
    #[serde(default)]
    pub redis: RedisConfig,

    /// Queue aggregation settings.
    #[serde(default)]
    pub monitor: MonitorConfig,

    /// Observability configuration.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Application metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppMetadata {
    /// Application name.
    pub name: String,
    /// Application version.
    pub version: String,
    /// Environment (development, staging, production).
    pub environment: String,
}

impl Default for AppMetadata {
    fn default() -> Self {
        Self {
            name: "matador".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            environment: "development".to_string(),
        }
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind host.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Time allowed for closing store connections on shutdown, in seconds.
    pub shutdown_timeout_secs: u64,
    /// Enable CORS.
    pub cors_enabled: bool,
    /// CORS allowed origins.
    pub cors_origins: Vec<String>,
    /// Directory holding the built dashboard frontend, served for non-API routes.
    pub static_dir: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            request_timeout_secs: 30,
            shutdown_timeout_secs: 10,
            cors_enabled: true,
            cors_origins: vec!["*".to_string()],
            static_dir: None,
        }
    }
}

impl ServerConfig {
    /// Returns the bind address.
    #[must_use]
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns the request timeout as a Duration.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Returns the shutdown timeout as a Duration.
    #[must_use]
    pub const fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

/// Redis connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RedisConfig {
    /// Full connection URL. When set, host/port/password/db are ignored.
    pub url: Option<String>,
    /// Redis host.
    pub host: String,
    /// Redis port.
    pub port: u16,
    /// Redis password.
    pub password: Option<String>,
    /// Logical database index.
    pub db: i64,
    /// Connection pool size.
    pub pool_size: usize,
    /// Connection timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Key prefix shared by every queue (`bull` for Bull and BullMQ).
    pub key_prefix: String,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: None,
            host: "localhost".to_string(),
            port: 6379,
            password: None,
            db: 0,
            pool_size: 10,
            connect_timeout_secs: 5,
            key_prefix: "bull".to_string(),
        }
    }
}

impl RedisConfig {
    /// Builds the connection URL, percent-encoding the password.
    pub fn connection_url(&self) -> ConfigResult<String> {
        if let Some(url) = self.url.as_deref().filter(|u| !u.is_empty()) {
            return Ok(url.to_string());
        }

        let mut url = Url::parse(&format!("redis://{}:{}/{}", self.host, self.port, self.db))
            .map_err(|e| ConfigError::RedisUrl(e.to_string()))?;

        if let Some(password) = self.password.as_deref().filter(|p| !p.is_empty()) {
            url.set_password(Some(password))
                .map_err(|()| ConfigError::RedisUrl("password cannot be set on this URL".to_string()))?;
        }

        Ok(url.to_string())
    }

    /// Returns the connect timeout as a Duration.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

/// Queue aggregation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Jobs fetched per (queue, status) pair.
    pub page_size: usize,
    /// How long a discovered queue list stays fresh, in milliseconds.
    pub discovery_ttl_ms: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            page_size: 30,
            discovery_ttl_ms: 5000,
        }
    }
}

impl MonitorConfig {
    /// Returns the discovery cache TTL as a Duration.
    #[must_use]
    pub const fn discovery_ttl(&self) -> Duration {
        Duration::from_millis(self.discovery_ttl_ms)
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Default log filter when `RUST_LOG` is unset.
    pub log_filter: String,
    /// Emit JSON log lines instead of the human-readable format.
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_filter: "info,matador=debug,tower_http=debug".to_string(),
            json_logs: false,
        }
    }
}
