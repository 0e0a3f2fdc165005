//! Configuration management for the exporter.
//!
//! # Overview
//!
//! Configuration lives in a TOML file with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `VIBRENT_*` environment overrides
//! - Default values for every optional setting
//! - Validation once, at load time
//!
//! Client credentials are never read from the file; they come from
//! `VIBRENT_CLIENT_ID` and `VIBRENT_CLIENT_SECRET` (see [`ClientCredentials`]).
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use vibrent_export::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("vibrent_export.toml")?;
//! let (name, endpoints) = config.environment.resolve(None)?;
//! println!("{name}: {}", endpoints.base_url);
//! # Ok(())
//! # }
//! ```
//!
//! # Example Configuration
//!
//! ```toml
//! [environment]
//! default = "staging"
//!
//! [environment.environments.staging]
//! base_url = "https://staging.example.com"
//! token_url = "https://auth.staging.example.com/oauth/token"
//!
//! [export]
//! format = "JSON"
//!
//! [export.monitoring]
//! polling_interval_seconds = 10
//! max_wait_seconds = 3600
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

pub use loader::{load_config, parse_config};
pub use schema::{
    ApiConfig, ApplicationConfig, AuthConfig, DateRangeConfig, EndpointConfig, EnvironmentConfig,
    ExportConfig, ExporterConfig, LoggingConfig, MetadataConfig, MonitoringConfig, OutputConfig,
    SurveyFilterConfig,
};
pub use secret::{secret_string, ClientCredentials, SecretString, SecretValue};
