//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use crate::cli::{EXIT_CONFIGURATION, EXIT_FATAL, EXIT_SUCCESS};
use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "vibrent_export.toml")]
    pub output: String,

    /// Include every setting with comments
    #[arg(long)]
    pub with_examples: bool,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing Vibrent export configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(EXIT_CONFIGURATION);
        }

        let config_content = if self.with_examples {
            Self::generate_config_with_examples()
        } else {
            Self::generate_minimal_config()
        };

        match fs::write(&self.output, config_content) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} with your platform endpoints", self.output);
                println!("  2. Create a .env file with your client credentials:");
                println!("     - VIBRENT_CLIENT_ID=<client id>");
                println!("     - VIBRENT_CLIENT_SECRET=<client secret>");
                println!("  3. Validate configuration: vibrent-export validate-config");
                println!("  4. Run export: vibrent-export export");
                println!();
                Ok(EXIT_SUCCESS)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {e}");
                Ok(EXIT_FATAL)
            }
        }
    }

    /// Generate minimal configuration
    fn generate_minimal_config() -> String {
        r#"# Vibrent Export Configuration File
# Survey data export from the Vibrent Health platform

[application]
log_level = "info"

[environment]
default = "staging"

[environment.environments.staging]
base_url = "https://staging.example.com"
token_url = "https://auth.staging.example.com/auth/realms/platform/protocol/openid-connect/token"

[export]
format = "JSON"

[export.date_range]
default_days_back = 30

[output]
base_directory = "output"
"#
        .to_string()
    }

    /// Generate configuration with every setting documented
    fn generate_config_with_examples() -> String {
        r#"# Vibrent Export Configuration File
# Survey data export from the Vibrent Health platform
#
# Client credentials are never stored here. Set VIBRENT_CLIENT_ID and
# VIBRENT_CLIENT_SECRET in the environment or in a .env file.
#
# Any value may reference an environment variable with ${VAR_NAME}, and most
# settings can be overridden with VIBRENT_<SECTION>_<KEY> variables.

# ============================================================================
# Application Settings
# ============================================================================
[application]
# Log level: trace, debug, info, warn, error
log_level = "info"

# ============================================================================
# Platform Environments
# ============================================================================
[environment]
# Environment used when --environment is not given
default = "staging"

[environment.environments.staging]
base_url = "https://staging.example.com"
token_url = "https://auth.staging.example.com/auth/realms/platform/protocol/openid-connect/token"

[environment.environments.production]
base_url = "https://production.example.com"
token_url = "https://auth.production.example.com/auth/realms/platform/protocol/openid-connect/token"

# ============================================================================
# Authentication
# ============================================================================
[auth]
# Token request timeout in seconds
timeout_seconds = 30

# Refresh the access token this many seconds before it expires
refresh_buffer_seconds = 300

# ============================================================================
# API Requests
# ============================================================================
[api]
# Per-request timeout in seconds
timeout_seconds = 30

# ============================================================================
# Export Settings
# ============================================================================
[export]
# Payload format: JSON or CSV
format = "JSON"

[export.date_range]
# Rolling window ending now, used when no absolute range is given
default_days_back = 30

# Absolute range (YYYY-MM-DD or RFC 3339); both must be set to take effect
# absolute_start_date = "2025-01-01"
# absolute_end_date = "2025-02-01"

[export.request]
# Export at most this many surveys
# max_surveys = 10

# Restrict the session to these platform form ids
# survey_ids = [101, 102]

# Skip these platform form ids
# exclude_survey_ids = [103]

# Pause after each accepted export request, in milliseconds
submission_delay_ms = 500

[export.monitoring]
# Seconds between status sweeps
polling_interval_seconds = 10

# Give up on jobs still pending after this many seconds (unbounded if unset)
# max_wait_seconds = 3600

# Record status check errors and keep polling instead of aborting
continue_on_failure = true

# Status checks in flight per sweep
status_check_concurrency = 1

# ============================================================================
# Output Settings
# ============================================================================
[output]
# Root of all export sessions
base_directory = "output"

# Sessions are written to <base_directory>/<survey_exports_dir>/survey_data_<timestamp>
survey_exports_dir = "survey_exports"

# Unpack downloaded archives
extract_files = true

# Delete an archive once every payload file was extracted
remove_zip_after_extract = true

# ============================================================================
# Session Report
# ============================================================================
[metadata]
# Write the session report into the session directory
save_metadata = true
filename = "export_metadata.json"

# Include per-survey details and per-export status in the report
include_survey_details = true
include_export_status = true

# ============================================================================
# Logging Configuration
# ============================================================================
[logging]
# Enable JSON file logging
local_enabled = false

# Directory for log files
local_path = "logs"

# Log rotation: daily, hourly or never
local_rotation = "daily"
"#
        .to_string()
    }
}
