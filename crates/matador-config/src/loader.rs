//! Configuration loader with layered sources.

use crate::error::ConfigResult;
use crate::AppConfig;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File};
use std::path::Path;
use tracing::{debug, info};

/// Plain environment variables accepted alongside the `MATADOR__` ones,
/// mapped onto their configuration keys.
const LEGACY_ENV_OVERRIDES: &[(&str, &str)] = &[
    ("PORT", "server.port"),
    ("REDIS_HOST", "redis.host"),
    ("REDIS_PORT", "redis.port"),
    ("REDIS_PASSWORD", "redis.password"),
];

/// Loads [`AppConfig`] from a config directory and the environment.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config_dir: String,
}

impl ConfigLoader {
    /// Creates a loader reading from `config_dir`.
    pub fn new(config_dir: impl Into<String>) -> Self {
        Self {
            config_dir: config_dir.into(),
        }
    }

    /// Loader for the default location (`./config`).
    pub fn from_default_location() -> Self {
        Self::new("./config")
    }

    /// Builds and validates the configuration.
    ///
    /// Sources are applied in order, later ones winning:
    /// 1. `config/default.toml` - Default values
    /// 2. `config/{environment}.toml` - Environment-specific overrides
    /// 3. `config/local.toml` - Local overrides
    /// 4. Environment variables with `MATADOR__` prefix
    /// 5. `PORT`, `REDIS_HOST`, `REDIS_PORT`, `REDIS_PASSWORD`
    pub fn load(&self) -> ConfigResult<AppConfig> {
        let config_dir = &self.config_dir;

        // Load .env file if present
        if let Err(e) = dotenvy::dotenv() {
            debug!("No .env file found or error loading it: {}", e);
        }

        let environment =
            std::env::var("MATADOR_ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        info!("Loading configuration for environment: {}", environment);

        let mut builder = Config::builder().set_default("app.environment", environment.as_str())?;

        builder = add_file_source(builder, &format!("{}/default.toml", config_dir));
        builder = add_file_source(builder, &format!("{}/{}.toml", config_dir, environment));
        builder = add_file_source(builder, &format!("{}/local.toml", config_dir));

        builder = builder.add_source(
            Environment::with_prefix("MATADOR")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        for (var, key) in LEGACY_ENV_OVERRIDES {
            let value = std::env::var(var).ok().filter(|v| !v.is_empty());
            if value.is_some() {
                debug!("Applying {} to {}", var, key);
            }
            builder = builder.set_override_option(*key, value)?;
        }

        let app_config: AppConfig = builder.build()?.try_deserialize()?;

        app_config.validate()?;

        Ok(app_config)
    }
}

fn add_file_source(
    builder: ConfigBuilder<DefaultState>,
    path: &str,
) -> ConfigBuilder<DefaultState> {
    if Path::new(path).exists() {
        debug!("Loading config from: {}", path);
        builder.add_source(File::with_name(path).required(false))
    } else {
        builder
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn loader(dir: &tempfile::TempDir) -> ConfigLoader {
        ConfigLoader::new(dir.path().to_string_lossy().to_string())
    }

    #[test]
    fn test_loads_defaults_without_files() {
        let dir = tempfile::tempdir().unwrap();
        let config = loader(&dir).load().unwrap();
        assert_eq!(config.monitor.page_size, 30);
        assert_eq!(config.monitor.discovery_ttl_ms, 5000);
    }

    #[test]
    fn test_file_values_override_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("default.toml"),
            "[monitor]\npage_size = 12\ndiscovery_ttl_ms = 250\n\n[observability]\njson_logs = true\n",
        )
        .unwrap();

        let config = loader(&dir).load().unwrap();
        assert_eq!(config.monitor.page_size, 12);
        assert_eq!(config.monitor.discovery_ttl_ms, 250);
        assert!(config.observability.json_logs);
    }

    #[test]
    fn test_local_file_wins_over_default() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("default.toml"), "[monitor]\npage_size = 5\n").unwrap();
        fs::write(dir.path().join("local.toml"), "[monitor]\npage_size = 9\n").unwrap();

        assert_eq!(loader(&dir).load().unwrap().monitor.page_size, 9);
    }

    #[test]
    fn test_invalid_file_value_rejected() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("default.toml"), "[monitor]\npage_size = 0\n").unwrap();

        assert!(loader(&dir).load().is_err());
    }
}
