//! Command-line interface.

use std::path::PathBuf;

use clap::Parser;
use hostinfo_telemetry::LogFormat;

use crate::config::AppConfig;
use crate::error::ConfigResult;

/// Serves the host's name and outbound IP address over HTTP.
#[derive(Debug, Clone, Default, PartialEq, Eq, Parser)]
#[command(name = "hostinfo", version, about)]
pub struct Cli {
    /// Configuration file (TOML or JSON).
    #[arg(short, long, env = "HOSTINFO_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Address to bind to [default: 127.0.0.1].
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on [default: 8080].
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Contract file replacing the embedded contract.
    #[arg(long, value_name = "PATH")]
    pub contract: Option<PathBuf>,

    /// ip:port the outbound-address probe routes towards [default: 8.8.8.8:80].
    #[arg(long, value_name = "ADDR")]
    pub probe_target: Option<String>,

    /// Seconds to wait for open connections on shutdown [default: 30].
    #[arg(long, value_name = "SECS")]
    pub shutdown_timeout: Option<u64>,

    /// Advisory per-request deadline in milliseconds.
    #[arg(long, value_name = "MS")]
    pub request_deadline_ms: Option<u64>,

    /// Log filter directive, e.g. "info" or "hostinfo_server=debug,warn".
    #[arg(long, value_name = "FILTER")]
    pub log_level: Option<String>,

    /// Log output format: json, pretty or compact.
    #[arg(long, value_name = "FORMAT")]
    pub log_format: Option<LogFormat>,
}

impl Cli {
    /// Builds the validated configuration from file, process environment
    /// and flags.
    pub fn resolve(&self) -> ConfigResult<AppConfig> {
        self.resolve_with(|var| std::env::var(var).ok())
    }

    /// Like [`resolve`](Self::resolve) with an explicit variable source.
    pub fn resolve_with<F>(&self, lookup: F) -> ConfigResult<AppConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base = match &self.config {
            Some(path) => AppConfig::from_file(path)?,
            None => AppConfig::default(),
        };
        let config = self.apply(base.with_overrides_from(lookup)?);
        config.validate()?;
        Ok(config)
    }

    /// Overlays the flags that were given onto `config`.
    pub fn apply(&self, mut config: AppConfig) -> AppConfig {
        if let Some(host) = &self.host {
            config.server.host.clone_from(host);
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(secs) = self.shutdown_timeout {
            config.server.shutdown_timeout_secs = secs;
        }
        if let Some(ms) = self.request_deadline_ms {
            config.server.request_deadline_ms = Some(ms);
        }
        if let Some(target) = &self.probe_target {
            config.probe.target.clone_from(target);
        }
        if let Some(level) = &self.log_level {
            config.logging.level.clone_from(level);
        }
        if let Some(format) = self.log_format {
            config.logging.format = format;
        }
        if let Some(path) = &self.contract {
            config.contract.path = Some(path.clone());
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_flags() {
        let cli = Cli::try_parse_from([
            "hostinfo",
            "--port",
            "9000",
            "--host",
            "0.0.0.0",
            "--log-format",
            "pretty",
            "--contract",
            "/tmp/c.json",
        ])
        .unwrap();

        assert_eq!(cli.port, Some(9000));
        assert_eq!(cli.host.as_deref(), Some("0.0.0.0"));
        assert_eq!(cli.log_format, Some(LogFormat::Pretty));
        assert_eq!(cli.contract, Some(PathBuf::from("/tmp/c.json")));
    }

    #[test]
    fn test_bad_flag_value_rejected() {
        assert!(Cli::try_parse_from(["hostinfo", "--port", "high"]).is_err());
        assert!(Cli::try_parse_from(["hostinfo", "--log-format", "xml"]).is_err());
    }

    #[test]
    fn test_flags_beat_environment() {
        let cli = Cli {
            port: Some(9000),
            ..Cli::default()
        };
        let config = cli
            .resolve_with(|var| match var {
                "HOSTINFO_PORT" => Some("7000".to_string()),
                "HOSTINFO_HOST" => Some("0.0.0.0".to_string()),
                _ => None,
            })
            .unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
    }

    #[test]
    fn test_resolve_validates() {
        let cli = Cli {
            probe_target: Some("nowhere".to_string()),
            ..Cli::default()
        };
        assert!(cli.resolve_with(|_| None).is_err());
    }
}
