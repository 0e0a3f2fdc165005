//! Configuration schema types
//!
//! This module defines the configuration structure that maps to the TOML file.
//! Every section has defaults so a minimal file only needs the environment
//! endpoints.

use crate::domain::{ExportFormat, ExportRequest, ExportTargetId};
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Main exporter configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExporterConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Named platform environments and the default one
    #[serde(default)]
    pub environment: EnvironmentConfig,

    /// Token endpoint settings
    #[serde(default)]
    pub auth: AuthConfig,

    /// Platform API settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Export request, filtering and monitoring settings
    #[serde(default)]
    pub export: ExportConfig,

    /// Where artifacts are written
    #[serde(default)]
    pub output: OutputConfig,

    /// Session metadata file settings
    #[serde(default)]
    pub metadata: MetadataConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ExporterConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.environment.validate()?;
        self.auth.validate()?;
        self.api.validate()?;
        self.export.validate()?;
        self.output.validate()?;
        self.metadata.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Endpoints of one platform environment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Base URL of the platform API
    pub base_url: String,

    /// OAuth2 token endpoint
    pub token_url: String,
}

impl EndpointConfig {
    fn validate(&self, name: &str) -> Result<(), String> {
        validate_http_url(&format!("environment.environments.{name}.base_url"), &self.base_url)?;
        validate_http_url(
            &format!("environment.environments.{name}.token_url"),
            &self.token_url,
        )
    }
}

/// Environment selection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    /// Environment used when none is selected explicitly
    #[serde(default = "default_environment")]
    pub default: String,

    /// Named environments (e.g. staging, production)
    #[serde(default)]
    pub environments: BTreeMap<String, EndpointConfig>,
}

impl EnvironmentConfig {
    fn validate(&self) -> Result<(), String> {
        if self.environments.is_empty() {
            return Err("environment.environments must define at least one environment".to_string());
        }

        if !self.environments.contains_key(&self.default) {
            return Err(format!(
                "Default environment '{}' is not defined. Available: {}",
                self.default,
                self.names().join(", ")
            ));
        }

        for (name, endpoints) in &self.environments {
            endpoints.validate(name)?;
        }
        Ok(())
    }

    /// Names of the configured environments, sorted
    pub fn names(&self) -> Vec<&str> {
        self.environments.keys().map(String::as_str).collect()
    }

    /// Endpoints of `name`, or of the default environment when `None`
    ///
    /// # Errors
    ///
    /// Returns an error naming the available environments when `name` is not
    /// configured.
    pub fn resolve(&self, name: Option<&str>) -> Result<(&str, &EndpointConfig), String> {
        let name = name.unwrap_or(&self.default);
        self.environments
            .get_key_value(name)
            .map(|(k, v)| (k.as_str(), v))
            .ok_or_else(|| {
                format!(
                    "Unknown environment '{name}'. Available: {}",
                    self.names().join(", ")
                )
            })
    }
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            default: default_environment(),
            environments: BTreeMap::new(),
        }
    }
}

/// Token endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Token request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Tokens are renewed when they expire within this many seconds
    #[serde(default = "default_refresh_buffer_seconds")]
    pub refresh_buffer_seconds: u64,
}

impl AuthConfig {
    fn validate(&self) -> Result<(), String> {
        if self.timeout_seconds == 0 {
            return Err("auth.timeout_seconds must be > 0".to_string());
        }
        if self.refresh_buffer_seconds > 86_400 {
            return Err(format!(
                "auth.refresh_buffer_seconds must be <= 86400, got {}",
                self.refresh_buffer_seconds
            ));
        }
        Ok(())
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout_seconds(),
            refresh_buffer_seconds: default_refresh_buffer_seconds(),
        }
    }
}

/// Platform API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl ApiConfig {
    fn validate(&self) -> Result<(), String> {
        if self.timeout_seconds == 0 {
            return Err("api.timeout_seconds must be > 0".to_string());
        }
        Ok(())
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

/// Export configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Requested output format
    #[serde(default)]
    pub format: ExportFormat,

    /// Date window of the exported data
    #[serde(default)]
    pub date_range: DateRangeConfig,

    /// Survey selection and submission pacing
    #[serde(default)]
    pub request: SurveyFilterConfig,

    /// Completion polling
    #[serde(default)]
    pub monitoring: MonitoringConfig,
}

impl ExportConfig {
    fn validate(&self) -> Result<(), String> {
        self.date_range.validate()?;
        self.request.validate()?;
        self.monitoring.validate()?;
        Ok(())
    }

    /// Build the export request shared by every survey of a session
    pub fn build_request(&self, now: DateTime<Utc>) -> Result<ExportRequest, String> {
        let (from, to) = self.date_range.window(now)?;
        Ok(ExportRequest::new(
            from.timestamp_millis(),
            to.timestamp_millis(),
            self.format,
        ))
    }
}

/// Date range configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DateRangeConfig {
    /// Window length when no absolute dates are given
    #[serde(default = "default_days_back")]
    pub default_days_back: u32,

    /// Absolute start (`YYYY-MM-DD` or RFC 3339)
    #[serde(default)]
    pub absolute_start_date: Option<String>,

    /// Absolute end (`YYYY-MM-DD` or RFC 3339)
    #[serde(default)]
    pub absolute_end_date: Option<String>,
}

impl DateRangeConfig {
    fn validate(&self) -> Result<(), String> {
        if self.default_days_back == 0 {
            return Err("export.date_range.default_days_back must be > 0".to_string());
        }
        self.window(Utc::now()).map(|_| ())
    }

    /// Resolve the export window `[from, to)`
    ///
    /// Absolute dates win when both are set; otherwise the window ends at
    /// `now` and spans `default_days_back` days.
    pub fn window(&self, now: DateTime<Utc>) -> Result<(DateTime<Utc>, DateTime<Utc>), String> {
        match (&self.absolute_start_date, &self.absolute_end_date) {
            (Some(start), Some(end)) => {
                let from = parse_date("export.date_range.absolute_start_date", start)?;
                let to = parse_date("export.date_range.absolute_end_date", end)?;
                if from >= to {
                    return Err(format!(
                        "export.date_range.absolute_start_date ({start}) must be before absolute_end_date ({end})"
                    ));
                }
                Ok((from, to))
            }
            _ => Ok((now - Duration::days(i64::from(self.default_days_back)), now)),
        }
    }
}

impl Default for DateRangeConfig {
    fn default() -> Self {
        Self {
            default_days_back: default_days_back(),
            absolute_start_date: None,
            absolute_end_date: None,
        }
    }
}

/// Survey selection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurveyFilterConfig {
    /// Cap on the number of surveys exported
    #[serde(default)]
    pub max_surveys: Option<usize>,

    /// Export only these export-target ids
    #[serde(default)]
    pub survey_ids: Option<Vec<ExportTargetId>>,

    /// Skip these export-target ids (ignored when `survey_ids` is set)
    #[serde(default)]
    pub exclude_survey_ids: Option<Vec<ExportTargetId>>,

    /// Pause after each accepted submission, in milliseconds
    #[serde(default = "default_submission_delay_ms")]
    pub submission_delay_ms: u64,
}

impl SurveyFilterConfig {
    fn validate(&self) -> Result<(), String> {
        if self.max_surveys == Some(0) {
            return Err("export.request.max_surveys must be > 0 when set".to_string());
        }
        Ok(())
    }
}

impl Default for SurveyFilterConfig {
    fn default() -> Self {
        Self {
            max_surveys: None,
            survey_ids: None,
            exclude_survey_ids: None,
            submission_delay_ms: default_submission_delay_ms(),
        }
    }
}

/// Completion monitoring configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    /// Seconds between status sweeps
    #[serde(default = "default_polling_interval_seconds")]
    pub polling_interval_seconds: u64,

    /// Give up on pending jobs after this many seconds (unbounded when unset)
    #[serde(default)]
    pub max_wait_seconds: Option<u64>,

    /// Record a failed status check and keep going instead of aborting
    #[serde(default = "default_true")]
    pub continue_on_failure: bool,

    /// Status checks in flight per sweep
    #[serde(default = "default_status_check_concurrency")]
    pub status_check_concurrency: usize,
}

impl MonitoringConfig {
    fn validate(&self) -> Result<(), String> {
        if self.polling_interval_seconds == 0 {
            return Err("export.monitoring.polling_interval_seconds must be > 0".to_string());
        }

        if self.status_check_concurrency == 0 || self.status_check_concurrency > 32 {
            return Err(format!(
                "export.monitoring.status_check_concurrency must be between 1 and 32, got {}",
                self.status_check_concurrency
            ));
        }
        Ok(())
    }
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            polling_interval_seconds: default_polling_interval_seconds(),
            max_wait_seconds: None,
            continue_on_failure: true,
            status_check_concurrency: default_status_check_concurrency(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Root output directory
    #[serde(default = "default_base_directory")]
    pub base_directory: PathBuf,

    /// Subdirectory holding one directory per session
    #[serde(default = "default_survey_exports_dir")]
    pub survey_exports_dir: String,

    /// Unpack payload files from downloaded archives
    #[serde(default = "default_true", alias = "extract_json")]
    pub extract_files: bool,

    /// Delete an archive once it was unpacked without errors
    #[serde(default = "default_true")]
    pub remove_zip_after_extract: bool,
}

impl OutputConfig {
    fn validate(&self) -> Result<(), String> {
        if self.base_directory.as_os_str().is_empty() {
            return Err("output.base_directory cannot be empty".to_string());
        }
        if self.survey_exports_dir.trim().is_empty() {
            return Err("output.survey_exports_dir cannot be empty".to_string());
        }
        Ok(())
    }

    /// Directory of the session whose timestamp label is `label`
    pub fn session_directory(&self, label: &str) -> PathBuf {
        self.base_directory
            .join(&self.survey_exports_dir)
            .join(format!("survey_data_{label}"))
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            base_directory: default_base_directory(),
            survey_exports_dir: default_survey_exports_dir(),
            extract_files: true,
            remove_zip_after_extract: true,
        }
    }
}

/// Session metadata configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataConfig {
    /// Write the session report to the session directory
    #[serde(default = "default_true")]
    pub save_metadata: bool,

    /// Report file name
    #[serde(default = "default_metadata_filename")]
    pub filename: String,

    /// Include one record per exported survey
    #[serde(default = "default_true")]
    pub include_survey_details: bool,

    /// Include the final job status in each survey record
    #[serde(default = "default_true")]
    pub include_export_status: bool,
}

impl MetadataConfig {
    fn validate(&self) -> Result<(), String> {
        if self.filename.trim().is_empty() {
            return Err("metadata.filename cannot be empty".to_string());
        }
        if self.filename.contains('/') || self.filename.contains('\\') {
            return Err(format!(
                "metadata.filename must be a plain file name, got '{}'",
                self.filename
            ));
        }
        Ok(())
    }
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            save_metadata: true,
            filename: default_metadata_filename(),
            include_survey_details: true,
            include_export_status: true,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable local file logging
    #[serde(default)]
    pub local_enabled: bool,

    /// Local log directory
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Log rotation strategy
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }

        if self.local_enabled && self.local_path.trim().is_empty() {
            return Err("logging.local_path cannot be empty when local_enabled = true".to_string());
        }
        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
        }
    }
}

fn validate_http_url(field: &str, value: &str) -> Result<(), String> {
    let parsed = url::Url::parse(value).map_err(|e| format!("{field} is not a valid URL: {e}"))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(format!("{field} must start with http:// or https://"));
    }
    Ok(())
}

fn parse_date(field: &str, value: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(Utc.from_utc_datetime(&midnight));
        }
    }

    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| format!("{field} '{value}' is not a YYYY-MM-DD date or RFC 3339 timestamp"))
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_environment() -> String {
    "staging".to_string()
}

fn default_true() -> bool {
    true
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_refresh_buffer_seconds() -> u64 {
    300
}

fn default_days_back() -> u32 {
    30
}

fn default_submission_delay_ms() -> u64 {
    500
}

fn default_polling_interval_seconds() -> u64 {
    10
}

fn default_status_check_concurrency() -> usize {
    1
}

fn default_base_directory() -> PathBuf {
    PathBuf::from("output")
}

fn default_survey_exports_dir() -> String {
    "survey_exports".to_string()
}

fn default_metadata_filename() -> String {
    "export_metadata.json".to_string()
}

fn default_local_path() -> String {
    "logs".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}
