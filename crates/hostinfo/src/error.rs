//! Error types for the hostinfo application.

use std::path::PathBuf;

use thiserror::Error;

use hostinfo_core::ContractError;
use hostinfo_server::{ServerError, StartupError};

/// Configuration could not be loaded or is invalid.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        /// File that was requested.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid TOML or JSON.
    #[error("invalid config file {}: {message}", path.display())]
    Parse {
        /// File that failed to parse.
        path: PathBuf,
        /// Parser diagnostic.
        message: String,
    },

    /// The file extension is neither `.toml` nor `.json`.
    #[error("unsupported config format: '{0}' (expected .toml or .json)")]
    UnsupportedFormat(String),

    /// An environment variable holds an unusable value.
    #[error("invalid value for {var}: '{value}'")]
    Env {
        /// Variable name.
        var: &'static str,
        /// Offending value.
        value: String,
    },

    /// A setting is out of range or malformed.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl ConfigError {
    /// Creates an [`Invalid`](Self::Invalid) error.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(message.into())
    }
}

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Failures that stop the service before it serves traffic.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration problem.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A contract file could not be read.
    #[error("failed to read contract {}: {source}", path.display())]
    ContractRead {
        /// File that was requested.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The contract is malformed or inconsistent.
    #[error("invalid contract: {0}")]
    Contract(#[from] ContractError),

    /// Contract and handlers disagree.
    #[error(transparent)]
    Startup(#[from] StartupError),

    /// The listener failed.
    #[error(transparent)]
    Server(#[from] ServerError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::Env {
            var: "HOSTINFO_PORT",
            value: "eighty".to_string(),
        };
        assert_eq!(err.to_string(), "invalid value for HOSTINFO_PORT: 'eighty'");

        let err = ConfigError::UnsupportedFormat("yaml".to_string());
        assert!(err.to_string().contains("yaml"));
    }

    #[test]
    fn test_app_error_from_startup() {
        let err: AppError = StartupError::MissingHandlers(vec!["getIP".to_string()]).into();
        assert!(err.to_string().contains("getIP"));
    }
}
