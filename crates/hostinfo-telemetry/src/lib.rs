//! Observability setup for hostinfo.
//!
//! Logging is structured through `tracing`; this crate owns the subscriber
//! installation so the binary and tests agree on formats and field names.
//!
//! ```rust,no_run
//! use hostinfo_telemetry::{init_logging, LogConfig, LogFormat};
//!
//! let config = LogConfig::production().with_format(LogFormat::Compact);
//! init_logging(&config)?;
//! # Ok::<(), hostinfo_telemetry::TelemetryError>(())
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
pub mod logging;

pub use error::TelemetryError;
pub use logging::{create_env_filter, init_logging, LogConfig, LogFormat};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
