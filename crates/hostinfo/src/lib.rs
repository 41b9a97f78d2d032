//! # hostinfo
//!
//! A small HTTP service that reports the name of the machine it runs on and
//! the local IP address it uses for outbound traffic.
//!
//! | Method | Path        | Operation     | Success               |
//! |--------|-------------|---------------|-----------------------|
//! | GET    | `/hostname` | `getHostname` | `200 "<hostname>"`    |
//! | GET    | `/ip`       | `getIP`       | `200 "<ip address>"`  |
//!
//! Both operations answer `500 {"code":500,"message":...}` when the host
//! cannot be queried; any other request gets a JSON `404`.
//!
//! The routes live in a contract (`contract/hostinfo.json`) embedded in the
//! binary. The contract is validated at startup and every operation in it
//! must have a handler before the server binds.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use hostinfo::{build_server, AppConfig, SystemProbe};
//!
//! # async fn run() -> Result<(), hostinfo::AppError> {
//! let config = AppConfig::default();
//! let probe = SystemProbe::new(config.probe_target()?);
//! build_server(&config, Arc::new(probe))?.run().await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod cli;
pub mod config;
mod error;
pub mod handlers;
pub mod probe;

use std::path::Path;
use std::sync::Arc;

use hostinfo_core::Contract;
use hostinfo_server::{Dispatcher, DispatcherConfig, Server};

pub use cli::Cli;
pub use config::AppConfig;
pub use error::{AppError, ConfigError, ConfigResult};
pub use probe::{HostProbe, ProbeError, SystemProbe};

/// The contract compiled into the binary.
pub const EMBEDDED_CONTRACT: &str = include_str!("../contract/hostinfo.json");

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Loads the contract at `path`, or the embedded one when `path` is `None`.
pub fn load_contract(path: Option<&Path>) -> Result<Contract, AppError> {
    match path {
        Some(path) => {
            let text = std::fs::read_to_string(path).map_err(|source| AppError::ContractRead {
                path: path.to_path_buf(),
                source,
            })?;
            Ok(Contract::from_json(&text)?)
        }
        None => Ok(Contract::from_json(EMBEDDED_CONTRACT)?),
    }
}

/// Wires the reference handlers to `contract`.
pub fn build_dispatcher(
    contract: Contract,
    probe: Arc<dyn HostProbe>,
    config: DispatcherConfig,
) -> Result<Dispatcher, AppError> {
    Ok(Dispatcher::new(
        Arc::new(contract),
        handlers::registry(probe),
        config,
    )?)
}

/// Loads the configured contract and builds an unbound server.
pub fn build_server(config: &AppConfig, probe: Arc<dyn HostProbe>) -> Result<Server, AppError> {
    let contract = load_contract(config.contract.path.as_deref())?;
    tracing::info!(
        contract = contract.name(),
        version = contract.version(),
        operations = contract.operations().len(),
        "contract loaded"
    );

    let server_config = config.server_config();
    let dispatcher = build_dispatcher(contract, probe, server_config.dispatcher_config())?;
    Ok(Server::builder(dispatcher).config(server_config).build())
}
