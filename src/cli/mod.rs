//! CLI module for the Todo API
//!
//! - `serve`: HTTP API with the background verification sweeper
//! - `sweep`: delete expired verification codes once and exit

pub mod serve;
pub mod sweep;

use clap::{Parser, Subcommand};

use crate::config::AppConfig;
use crate::infrastructure::logging;

/// Todo API - to-do lists with email-verified accounts
#[derive(Parser)]
#[command(name = "todo-api")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP API server
    Serve,

    /// Remove expired verification codes and exit
    Sweep,
}

/// Read `.env`, load configuration and install logging
pub(crate) fn bootstrap() -> anyhow::Result<AppConfig> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;
    logging::init_logging(&config.logging);

    Ok(config)
}
