//! Validate config command implementation
//!
//! This module implements the `validate-config` command. It loads the
//! configuration file, resolves the active environment and checks that client
//! credentials are available, without any network activity.

use crate::cli::{EXIT_CONFIGURATION, EXIT_SUCCESS};
use crate::config::{load_config, ClientCredentials};
use chrono::Utc;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Treat missing client credentials as an error
    #[arg(long)]
    pub require_credentials: bool,
}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str, environment: Option<&str>) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        let config = match load_config(config_path) {
            Ok(c) => {
                println!("✅ Configuration file loaded and validated");
                c
            }
            Err(e) => {
                println!("❌ Configuration is invalid");
                println!("   Error: {e}");
                return Ok(EXIT_CONFIGURATION);
            }
        };

        let (name, endpoints) = match config.environment.resolve(environment) {
            Ok(resolved) => resolved,
            Err(e) => {
                println!("❌ {e}");
                return Ok(EXIT_CONFIGURATION);
            }
        };

        let window = match config.export.build_request(Utc::now()) {
            Ok(request) => request,
            Err(e) => {
                println!("❌ Invalid export date range");
                println!("   Error: {e}");
                return Ok(EXIT_CONFIGURATION);
            }
        };

        println!();
        println!("Configuration Summary:");
        println!("  Log Level: {}", config.application.log_level);
        println!("  Environments: {}", config.environment.names().join(", "));
        println!("  Active Environment: {name}");
        println!("  Base URL: {}", endpoints.base_url);
        println!("  Token URL: {}", endpoints.token_url);
        println!("  Export Format: {}", config.export.format);
        println!(
            "  Date Range (epoch ms): {} .. {}",
            window.date_from, window.date_to
        );
        println!(
            "  Polling Interval: {}s",
            config.export.monitoring.polling_interval_seconds
        );
        match config.export.monitoring.max_wait_seconds {
            Some(max) => println!("  Max Wait: {max}s"),
            None => println!("  Max Wait: unbounded"),
        }
        println!(
            "  Output Directory: {}",
            config
                .output
                .base_directory
                .join(&config.output.survey_exports_dir)
                .display()
        );
        println!();

        match ClientCredentials::from_env() {
            Ok(credentials) => {
                println!("✅ Client credentials found (client id: {})", credentials.client_id);
            }
            Err(e) if self.require_credentials => {
                println!("❌ {e}");
                return Ok(EXIT_CONFIGURATION);
            }
            Err(e) => {
                println!("⚠️  {e}");
                println!("   Exports will fail until the credentials are set");
            }
        }
        println!();

        Ok(EXIT_SUCCESS)
    }
}
