//! Configuration Loader
//!
//! Environment-aware configuration loading. Layers the optional base file, the
//! optional environment file and `PORTLET_BRIDGE_*` variables over the built-in
//! defaults, then validates the result.

use super::error::{ConfigResult, ConfigurationError};
use super::BridgeConfig;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

const CONFIG_FILE_STEM: &str = "portlet-bridge";
const ENV_PREFIX: &str = "PORTLET_BRIDGE";

/// Loaded, validated configuration plus where it came from
#[derive(Debug)]
pub struct ConfigManager {
    config: BridgeConfig,
    environment: String,
    config_directory: PathBuf,
}

impl ConfigManager {
    /// Load configuration with environment auto-detection
    pub fn load() -> ConfigResult<Arc<ConfigManager>> {
        Self::load_from_directory(None)
    }

    /// Load configuration from a specific directory
    pub fn load_from_directory(config_dir: Option<PathBuf>) -> ConfigResult<Arc<ConfigManager>> {
        let environment = Self::detect_environment();
        Self::load_from_directory_with_env(config_dir, &environment)
    }

    /// Load configuration from a specific directory with explicit environment
    /// This is useful for testing without modifying global environment variables
    pub fn load_from_directory_with_env(
        config_dir: Option<PathBuf>,
        environment: &str,
    ) -> ConfigResult<Arc<ConfigManager>> {
        let config_directory = config_dir.unwrap_or_else(Self::default_config_directory);

        debug!(
            "Loading bridge configuration for environment '{}' from directory: {}",
            environment,
            config_directory.display()
        );

        let settings = ::config::Config::builder()
            .add_source(Self::file_source(&config_directory, None))
            .add_source(Self::file_source(&config_directory, Some(environment)))
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| ConfigurationError::load_error(&config_directory, e))?;

        let config: BridgeConfig = settings
            .try_deserialize()
            .map_err(|e| ConfigurationError::invalid_shape(environment, e))?;

        config.validate()?;

        info!(
            environment = %environment,
            readiness_max_attempts = config.readiness.max_attempts,
            readiness_interval_ms = config.readiness.interval_ms,
            idle_poll_interval_ms = config.idle.poll_interval_ms,
            "🔧 Bridge configuration loaded"
        );

        Ok(Arc::new(ConfigManager {
            config,
            environment: environment.to_string(),
            config_directory,
        }))
    }

    /// Get the loaded configuration
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn config_directory(&self) -> &Path {
        &self.config_directory
    }

    /// Detect the deployment environment from environment variables
    pub fn detect_environment() -> String {
        env::var("PORTLET_BRIDGE_ENV")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string())
    }

    fn default_config_directory() -> PathBuf {
        env::var("PORTLET_BRIDGE_CONFIG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config"))
    }

    fn file_source(
        directory: &Path,
        environment: Option<&str>,
    ) -> impl ::config::Source + Send + Sync + 'static {
        let file_name = match environment {
            Some(environment) => format!("{CONFIG_FILE_STEM}.{environment}.toml"),
            None => format!("{CONFIG_FILE_STEM}.toml"),
        };
        let path = directory.join(file_name);
        ::config::File::new(&path.to_string_lossy(), ::config::FileFormat::Toml).required(false)
    }
}
