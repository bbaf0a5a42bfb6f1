//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `uptime_sentinel` library that handles:
//! - Command-line argument parsing
//! - Environment variable loading (.env file)
//! - Logger initialization
//!
//! All core functionality is implemented in the library crate.

use anyhow::{Context, Result};
use clap::Parser;
use std::process;

use uptime_sentinel::initialization::{init_crypto_provider, init_logger_with};
use uptime_sentinel::{run_service, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file (if it exists); this is
    // where SMTP/SNMP alert defaults live.
    let _ = dotenvy::dotenv();

    let config = Config::parse();

    let log_level = config.log_level.clone();
    let log_format = config.log_format.clone();
    init_logger_with(log_level.into(), log_format).context("Failed to initialize logger")?;

    // Initialize crypto provider for TLS operations
    init_crypto_provider();

    match run_service(config).await {
        Ok(()) => Ok(()),
        Err(e) => {
            eprintln!("uptime_sentinel error: {e:#}");
            process::exit(1);
        }
    }
}
