//! Config file loading and layering.

use std::fs;
use std::path::PathBuf;

use hostinfo::{AppConfig, Cli, ConfigError};
use hostinfo_telemetry::LogFormat;
use tempfile::TempDir;

#[test]
fn loads_toml() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("hostinfo.toml");
    fs::write(
        &path,
        r#"
[server]
host = "0.0.0.0"
port = 9000

[probe]
target = "1.1.1.1:53"

[logging]
format = "compact"
"#,
    )
    .unwrap();

    let config = AppConfig::from_file(&path).unwrap();

    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.server.port, 9000);
    assert_eq!(config.server.shutdown_timeout_secs, 30);
    assert_eq!(config.probe.target, "1.1.1.1:53");
    assert_eq!(config.logging.format, LogFormat::Compact);
    assert_eq!(config.logging.level, "info");
}

#[test]
fn loads_json() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("hostinfo.json");
    fs::write(
        &path,
        r#"{ "server": { "port": 7070, "request_deadline_ms": 500 }, "contract": { "path": "/srv/c.json" } }"#,
    )
    .unwrap();

    let config = AppConfig::from_file(&path).unwrap();

    assert_eq!(config.server.port, 7070);
    assert_eq!(config.server.request_deadline_ms, Some(500));
    assert_eq!(config.contract.path, Some(PathBuf::from("/srv/c.json")));
}

#[test]
fn rejects_unknown_extension() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("hostinfo.yaml");
    fs::write(&path, "server: {}").unwrap();

    let err = AppConfig::from_file(&path).unwrap_err();
    assert!(matches!(err, ConfigError::UnsupportedFormat(ext) if ext == "yaml"));
}

#[test]
fn rejects_unknown_keys() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("hostinfo.toml");
    fs::write(&path, "[server]\nlisten_port = 1\n").unwrap();

    let err = AppConfig::from_file(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
}

#[test]
fn missing_file_is_read_error() {
    let temp_dir = TempDir::new().unwrap();
    let err = AppConfig::from_file(temp_dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));
}

#[test]
fn file_then_env_then_flags() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("hostinfo.toml");
    fs::write(
        &path,
        "[server]\nhost = \"10.1.1.1\"\nport = 1000\nshutdown_timeout_secs = 3\n",
    )
    .unwrap();

    let cli = Cli {
        config: Some(path),
        port: Some(3000),
        ..Cli::default()
    };
    let config = cli
        .resolve_with(|var| match var {
            "HOSTINFO_HOST" => Some("10.2.2.2".to_string()),
            "HOSTINFO_PORT" => Some("2000".to_string()),
            _ => None,
        })
        .unwrap();

    assert_eq!(config.server.shutdown_timeout_secs, 3);
    assert_eq!(config.server.host, "10.2.2.2");
    assert_eq!(config.server.port, 3000);
}
