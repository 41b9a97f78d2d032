//! hostinfo - entry point.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};

use hostinfo::{AppConfig, Cli, SystemProbe};
use hostinfo_telemetry::init_logging;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // No subscriber is installed yet.
    let config = match cli.resolve() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("hostinfo: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = init_logging(&config.log_config()) {
        eprintln!("hostinfo: {e}");
        std::process::exit(1);
    }

    if let Err(e) = run(config).await {
        error!("hostinfo failed: {e:#}");
        std::process::exit(1);
    }
}

async fn run(config: AppConfig) -> anyhow::Result<()> {
    info!(version = hostinfo::VERSION, "starting hostinfo");

    let probe = SystemProbe::new(config.probe_target()?);
    let server = hostinfo::build_server(&config, Arc::new(probe))
        .context("failed to initialize server")?;

    server.run().await.context("server error")?;
    info!("hostinfo stopped");
    Ok(())
}
