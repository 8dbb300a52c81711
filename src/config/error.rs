//! Configuration Error Types
//!
//! Specific, actionable error messages for configuration loading and validation.

use std::path::PathBuf;
use thiserror::Error;

/// Configuration-related errors with detailed context
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// Assembling the layered sources failed (unreadable file, bad TOML)
    #[error("Failed to load configuration from '{}': {error}", directory.display())]
    LoadError { directory: PathBuf, error: String },

    /// Sources were readable but did not deserialize into the expected shape
    #[error("Configuration for environment '{environment}' has an invalid shape: {error}")]
    InvalidShape { environment: String, error: String },

    /// Invalid configuration value
    #[error("Invalid value '{value}' for field '{field}': {context}")]
    InvalidValue {
        field: String,
        value: String,
        context: String,
    },
}

impl ConfigurationError {
    pub fn load_error(directory: impl Into<PathBuf>, error: impl std::fmt::Display) -> Self {
        Self::LoadError {
            directory: directory.into(),
            error: error.to_string(),
        }
    }

    pub fn invalid_shape(environment: &str, error: impl std::fmt::Display) -> Self {
        Self::InvalidShape {
            environment: environment.to_string(),
            error: error.to_string(),
        }
    }

    pub fn invalid_value(
        field: impl Into<String>,
        value: impl Into<String>,
        context: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            field: field.into(),
            value: value.into(),
            context: context.into(),
        }
    }
}

pub type ConfigResult<T> = std::result::Result<T, ConfigurationError>;
