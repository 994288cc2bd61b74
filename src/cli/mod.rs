//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for Prvotkar using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// Prvotkar - local replica of Czech SVJ and BD registry subjects
#[derive(Parser, Debug)]
#[command(name = "prvotkar")]
#[command(version, about, long_about = None)]
#[command(author = "Prvotkar Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "prvotkar.toml", env = "PRVOTKAR_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "PRVOTKAR_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Refresh the replica from the registry, then geocode new addresses
    Sync(commands::sync::SyncArgs),

    /// Geocode subjects that are still pending
    Geocode(commands::geocode::GeocodeArgs),

    /// Return failed geocodes to the pending pool
    RetryFailed(commands::retry_failed::RetryFailedArgs),

    /// Show replica statistics
    Status(commands::status::StatusArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}
