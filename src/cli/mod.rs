//! CLI interface and argument parsing
//!
//! This module provides the command-line interface using clap.

pub mod commands;

use crate::domain::ExporterError;
use clap::{Parser, Subcommand};

/// Exit code of a successful run, including runs with recorded failures
pub const EXIT_SUCCESS: i32 = 0;
/// Missing or invalid configuration or credentials
pub const EXIT_CONFIGURATION: i32 = 2;
/// The token endpoint rejected the client
pub const EXIT_AUTHENTICATION: i32 = 3;
/// Any other fatal error
pub const EXIT_FATAL: i32 = 5;
/// Stopped by SIGINT/SIGTERM
pub const EXIT_INTERRUPTED: i32 = 130;

/// Map a fatal error to the process exit code
pub fn exit_code(error: &ExporterError) -> i32 {
    match error {
        ExporterError::Configuration(_) => EXIT_CONFIGURATION,
        ExporterError::Authentication(_) => EXIT_AUTHENTICATION,
        ExporterError::Interrupted(_) => EXIT_INTERRUPTED,
        _ => EXIT_FATAL,
    }
}

/// Vibrent Export - survey data export tool
#[derive(Parser, Debug)]
#[command(name = "vibrent-export")]
#[command(version, about, long_about = None)]
#[command(author = "Vibrent Export Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "vibrent_export.toml", env = "VIBRENT_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "VIBRENT_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Platform environment to use (overrides [environment] default)
    #[arg(short, long, global = true, env = "VIBRENT_ENVIRONMENT")]
    pub environment: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Export survey data for the configured date range
    Export(commands::export::ExportArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}
