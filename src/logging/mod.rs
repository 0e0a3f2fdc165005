//! Logging and observability
//!
//! This module provides structured logging with support for:
//! - Configurable log levels (`--log-level`, `[application] log_level`, `RUST_LOG`)
//! - Console output
//! - JSON file logging with rotation (`[logging] local_enabled`)
//!
//! # Example
//!
//! ```no_run
//! use vibrent_export::logging::init_logging;
//! use vibrent_export::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!("Application started");
//! ```

pub mod structured;

pub use structured::{init_logging, LoggingGuard};

/// Log a failure that was recorded in the session report
///
/// # Example
///
/// ```no_run
/// use vibrent_export::log_recorded_failure;
/// use vibrent_export::core::export::FailureStage;
///
/// log_recorded_failure!(FailureStage::Download, "job-1", "connection reset");
/// ```
#[macro_export]
macro_rules! log_recorded_failure {
    ($stage:expr, $identifier:expr, $error:expr) => {
        tracing::warn!(
            stage = $stage.as_str(),
            identifier = %$identifier,
            error = %$error,
            "Failure recorded"
        );
    };
}

/// Log a pipeline stage cut short by the shutdown signal
///
/// # Example
///
/// ```no_run
/// use vibrent_export::log_stage_interrupted;
///
/// log_stage_interrupted!("submission", 3);
/// ```
#[macro_export]
macro_rules! log_stage_interrupted {
    ($stage:expr, $done:expr) => {
        tracing::warn!(
            stage = $stage,
            done = $done,
            "Stage interrupted by shutdown signal"
        );
    };
}

/// Log an error with context
///
/// # Example
///
/// ```no_run
/// use vibrent_export::log_error_with_context;
/// use vibrent_export::domain::ExporterError;
///
/// let error = ExporterError::Configuration("Invalid config".to_string());
/// log_error_with_context!(&error, "Failed to load configuration");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            context = $context,
            "Error occurred"
        );
    };
}
