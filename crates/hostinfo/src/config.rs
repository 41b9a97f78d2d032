//! Startup configuration for the hostinfo service.
//!
//! Settings are layered: built-in defaults, then an optional TOML or JSON
//! file, then `HOSTINFO_*` environment variables, then command-line flags.
//! The result is validated once and passed by value into the server.
//!
//! ```toml
//! [server]
//! host = "0.0.0.0"
//! port = 9000
//! shutdown_timeout_secs = 10
//!
//! [probe]
//! target = "1.1.1.1:53"
//!
//! [logging]
//! level = "hostinfo=debug,info"
//! format = "compact"
//! ```

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use hostinfo_server::config::{DEFAULT_HOST, DEFAULT_PORT, DEFAULT_SHUTDOWN_TIMEOUT_SECS};
use hostinfo_server::ServerConfig;
use hostinfo_telemetry::{LogConfig, LogFormat};

use crate::error::{ConfigError, ConfigResult};
use crate::probe::DEFAULT_PROBE_TARGET;

/// Environment variable names.
pub mod env {
    /// Listen host.
    pub const HOST: &str = "HOSTINFO_HOST";
    /// Listen port.
    pub const PORT: &str = "HOSTINFO_PORT";
    /// Shutdown grace period in seconds.
    pub const SHUTDOWN_TIMEOUT: &str = "HOSTINFO_SHUTDOWN_TIMEOUT";
    /// Advisory per-request deadline in milliseconds.
    pub const REQUEST_DEADLINE_MS: &str = "HOSTINFO_REQUEST_DEADLINE_MS";
    /// Outbound probe target.
    pub const PROBE_TARGET: &str = "HOSTINFO_PROBE_TARGET";
    /// Log filter directive.
    pub const LOG_LEVEL: &str = "HOSTINFO_LOG_LEVEL";
    /// Log output format.
    pub const LOG_FORMAT: &str = "HOSTINFO_LOG_FORMAT";
    /// Contract file replacing the embedded one.
    pub const CONTRACT_PATH: &str = "HOSTINFO_CONTRACT_PATH";
}

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Listener settings.
    pub server: ServerSettings,
    /// Host probe settings.
    pub probe: ProbeSettings,
    /// Logging settings.
    pub logging: LoggingSettings,
    /// Contract settings.
    pub contract: ContractSettings,
}

/// Listener settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerSettings {
    /// Address to bind to.
    pub host: String,
    /// Port to bind to; 0 picks an ephemeral port.
    pub port: u16,
    /// Seconds to wait for open connections on shutdown.
    pub shutdown_timeout_secs: u64,
    /// Advisory per-request deadline in milliseconds.
    pub request_deadline_ms: Option<u64>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            shutdown_timeout_secs: DEFAULT_SHUTDOWN_TIMEOUT_SECS,
            request_deadline_ms: None,
        }
    }
}

/// Host probe settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProbeSettings {
    /// `ip:port` the outbound-address probe routes towards.
    pub target: String,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            target: DEFAULT_PROBE_TARGET.to_string(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingSettings {
    /// Filter directive, overridden by `RUST_LOG` when set.
    pub level: String,
    /// Output format.
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Json,
        }
    }
}

/// Contract settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContractSettings {
    /// Contract file to load instead of the embedded contract.
    pub path: Option<PathBuf>,
}

impl AppConfig {
    /// Loads configuration from a `.toml` or `.json` file.
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let parse_error = |message: String| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        };

        let extension = path.extension().and_then(|s| s.to_str()).unwrap_or("");
        match extension {
            "toml" => toml::from_str(&content).map_err(|e| parse_error(e.to_string())),
            "json" => serde_json::from_str(&content).map_err(|e| parse_error(e.to_string())),
            other => Err(ConfigError::UnsupportedFormat(other.to_string())),
        }
    }

    /// Applies `HOSTINFO_*` environment variables.
    pub fn with_env_overrides(self) -> ConfigResult<Self> {
        self.with_overrides_from(|var| std::env::var(var).ok())
    }

    /// Applies overrides from an arbitrary variable source.
    ///
    /// Unset variables leave the setting alone; set but unparseable values
    /// are errors.
    pub fn with_overrides_from<F>(mut self, lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup(env::HOST) {
            self.server.host = host;
        }
        if let Some(port) = lookup(env::PORT) {
            self.server.port = parse_var(env::PORT, port)?;
        }
        if let Some(secs) = lookup(env::SHUTDOWN_TIMEOUT) {
            self.server.shutdown_timeout_secs = parse_var(env::SHUTDOWN_TIMEOUT, secs)?;
        }
        if let Some(ms) = lookup(env::REQUEST_DEADLINE_MS) {
            self.server.request_deadline_ms = Some(parse_var(env::REQUEST_DEADLINE_MS, ms)?);
        }
        if let Some(target) = lookup(env::PROBE_TARGET) {
            self.probe.target = target;
        }
        if let Some(level) = lookup(env::LOG_LEVEL) {
            self.logging.level = level;
        }
        if let Some(format) = lookup(env::LOG_FORMAT) {
            self.logging.format = parse_var(env::LOG_FORMAT, format)?;
        }
        if let Some(path) = lookup(env::CONTRACT_PATH) {
            self.contract.path = Some(PathBuf::from(path));
        }
        Ok(self)
    }

    /// Checks that every setting is usable.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.server.host.trim().is_empty() {
            return Err(ConfigError::invalid("server.host must not be empty"));
        }
        if self.server.shutdown_timeout_secs == 0 {
            return Err(ConfigError::invalid(
                "server.shutdown_timeout_secs must be greater than zero",
            ));
        }
        if self.server.request_deadline_ms == Some(0) {
            return Err(ConfigError::invalid(
                "server.request_deadline_ms must be greater than zero",
            ));
        }
        self.probe_target()?;
        hostinfo_telemetry::create_env_filter(&self.logging.level)
            .map_err(|e| ConfigError::invalid(e.to_string()))?;
        Ok(())
    }

    /// Parses the probe target.
    pub fn probe_target(&self) -> ConfigResult<SocketAddr> {
        self.probe.target.parse().map_err(|_| {
            ConfigError::invalid(format!(
                "probe.target must be an ip:port pair, got '{}'",
                self.probe.target
            ))
        })
    }

    /// Builds the listener configuration.
    pub fn server_config(&self) -> ServerConfig {
        ServerConfig::builder()
            .host(self.server.host.clone())
            .port(self.server.port)
            .shutdown_timeout(Duration::from_secs(self.server.shutdown_timeout_secs))
            .request_deadline(self.server.request_deadline_ms.map(Duration::from_millis))
            .build()
    }

    /// Builds the logging configuration.
    pub fn log_config(&self) -> LogConfig {
        LogConfig::production()
            .with_level(self.logging.level.clone())
            .with_format(self.logging.format)
    }
}

fn parse_var<T: std::str::FromStr>(var: &'static str, value: String) -> ConfigResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Env { var, value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.probe.target, "8.8.8.8:80");
        assert_eq!(config.logging.format, LogFormat::Json);
        assert!(config.contract.path.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let config = AppConfig::default()
            .with_overrides_from(vars(&[
                (env::HOST, "0.0.0.0"),
                (env::PORT, "9090"),
                (env::SHUTDOWN_TIMEOUT, "5"),
                (env::REQUEST_DEADLINE_MS, "250"),
                (env::PROBE_TARGET, "1.1.1.1:53"),
                (env::LOG_FORMAT, "compact"),
                (env::CONTRACT_PATH, "/etc/hostinfo/contract.json"),
            ]))
            .unwrap();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.shutdown_timeout_secs, 5);
        assert_eq!(config.server.request_deadline_ms, Some(250));
        assert_eq!(config.probe.target, "1.1.1.1:53");
        assert_eq!(config.logging.format, LogFormat::Compact);
        assert_eq!(
            config.contract.path.as_deref(),
            Some(Path::new("/etc/hostinfo/contract.json"))
        );
    }

    #[test]
    fn test_bad_env_value_is_an_error() {
        let err = AppConfig::default()
            .with_overrides_from(vars(&[(env::PORT, "eighty")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Env { var: "HOSTINFO_PORT", .. }));

        let err = AppConfig::default()
            .with_overrides_from(vars(&[(env::LOG_FORMAT, "xml")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Env { .. }));
    }

    #[test]
    fn test_validate_rejects_bad_settings() {
        let mut config = AppConfig::default();
        config.probe.target = "not-an-address".to_string();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.server.shutdown_timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.server.request_deadline_ms = Some(0);
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.server.host = "  ".to_string();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.logging.level = "info=[".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_server_config() {
        let mut config = AppConfig::default();
        config.server.port = 0;
        config.server.request_deadline_ms = Some(1500);

        let server = config.server_config();
        assert_eq!(server.port(), 0);
        assert_eq!(server.host(), "127.0.0.1");
        assert_eq!(server.request_deadline(), Some(Duration::from_millis(1500)));
    }

    #[test]
    fn test_log_config() {
        let mut config = AppConfig::default();
        config.logging.level = "debug".to_string();
        config.logging.format = LogFormat::Pretty;

        let log = config.log_config();
        assert_eq!(log.level, "debug");
        assert_eq!(log.format, LogFormat::Pretty);
    }
}
