//! Export command implementation
//!
//! This module implements the `export` command: one export session against
//! the selected platform environment.

use crate::cli::{exit_code, EXIT_CONFIGURATION, EXIT_INTERRUPTED, EXIT_SUCCESS};
use crate::config::{load_config, ClientCredentials, ExporterConfig};
use crate::core::export::{ExportCoordinator, SessionReport};
use crate::domain::{ExportFormat, ExportTargetId};
use clap::Args;
use std::path::PathBuf;
use tokio::sync::watch;

/// Arguments for the export command
#[derive(Args, Debug, Default)]
pub struct ExportArgs {
    /// Export only these survey ids (platform form ids, comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub survey_id: Vec<ExportTargetId>,

    /// Skip these survey ids (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub exclude_survey_id: Vec<ExportTargetId>,

    /// Export at most this many surveys
    #[arg(long)]
    pub max_surveys: Option<usize>,

    /// Override export format (JSON or CSV)
    #[arg(long)]
    pub format: Option<ExportFormat>,

    /// Override the output base directory
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Give up on jobs still pending after this many seconds
    #[arg(long)]
    pub max_wait_seconds: Option<u64>,
}

impl ExportArgs {
    /// Apply CLI overrides to the loaded configuration
    pub fn apply_overrides(&self, config: &mut ExporterConfig) {
        if !self.survey_id.is_empty() {
            tracing::info!(survey_ids = ?self.survey_id, "Overriding survey ids from CLI");
            config.export.request.survey_ids = Some(self.survey_id.clone());
        }

        if !self.exclude_survey_id.is_empty() {
            tracing::info!(
                exclude_survey_ids = ?self.exclude_survey_id,
                "Overriding excluded survey ids from CLI"
            );
            config.export.request.exclude_survey_ids = Some(self.exclude_survey_id.clone());
        }

        if let Some(max) = self.max_surveys {
            config.export.request.max_surveys = Some(max);
        }

        if let Some(format) = self.format {
            tracing::info!(format = %format, "Overriding export format from CLI");
            config.export.format = format;
        }

        if let Some(dir) = &self.output_dir {
            config.output.base_directory = dir.clone();
        }

        if let Some(max_wait) = self.max_wait_seconds {
            config.export.monitoring.max_wait_seconds = Some(max_wait);
        }
    }

    /// Execute the export command
    pub async fn execute(
        &self,
        config_path: &str,
        environment: Option<&str>,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!("Starting export command");

        let mut config = match load_config(config_path) {
            Ok(config) => config,
            Err(e) => {
                crate::log_error_with_context!(&e, "Failed to load configuration");
                eprintln!("{e}");
                return Ok(EXIT_CONFIGURATION);
            }
        };

        self.apply_overrides(&mut config);

        if let Err(e) = config.validate() {
            tracing::error!(error = %e, "Configuration validation failed");
            eprintln!("Configuration validation failed: {e}");
            return Ok(EXIT_CONFIGURATION);
        }

        let credentials = match ClientCredentials::from_env() {
            Ok(credentials) => credentials,
            Err(e) => {
                crate::log_error_with_context!(&e, "Client credentials unavailable");
                eprintln!("{e}");
                return Ok(EXIT_CONFIGURATION);
            }
        };

        let coordinator =
            match ExportCoordinator::new(config, credentials, environment, shutdown_signal) {
                Ok(c) => c,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to create export coordinator");
                    eprintln!("Failed to initialize export: {e}");
                    return Ok(exit_code(&e));
                }
            };

        println!("🚀 Starting export ({})...", coordinator.environment());
        println!();

        let report = match coordinator.execute_export().await {
            Ok(report) => report,
            Err(e) => {
                tracing::error!(error = %e, "Export failed");
                eprintln!("Export failed: {e}");
                return Ok(exit_code(&e));
            }
        };

        print_report(&report);

        if report.interrupted {
            Ok(EXIT_INTERRUPTED)
        } else {
            Ok(EXIT_SUCCESS)
        }
    }
}

fn print_report(report: &SessionReport) {
    println!();
    println!("📊 Export Summary:");
    println!("  Session: {}", report.export_session_id);
    println!("  Surveys listed: {}", report.total_surveys);
    println!("  Successful: {}", report.successful_exports);
    println!("  Failed: {}", report.failed_exports);
    println!("  Duration: {:.2}s", report.duration_seconds);
    println!("  Output: {}", report.output_directory.display());

    if !report.failures.is_empty() {
        println!();
        println!("  ⚠️  Failures:");
        for failure in report.failures.iter().take(10) {
            println!(
                "    - [{}] {}: {}",
                failure.stage.as_str(),
                failure.identifier,
                failure.error
            );
        }
        if report.failures.len() > 10 {
            println!("    ... and {} more", report.failures.len() - 10);
        }
    }

    if report.interrupted {
        println!();
        println!("⚠️  Export was interrupted; the report covers the completed stages only");
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;

    fn parse(args: &[&str]) -> ExportArgs {
        let mut argv = vec!["vibrent-export", "export"];
        argv.extend_from_slice(args);
        match Cli::parse_from(argv).command {
            Commands::Export(args) => args,
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_survey_ids() {
        let args = parse(&["--survey-id", "10,20", "--max-surveys", "1"]);
        assert_eq!(
            args.survey_id,
            vec![ExportTargetId::new(10), ExportTargetId::new(20)]
        );
        assert_eq!(args.max_surveys, Some(1));
    }

    #[test]
    fn test_parse_format() {
        let args = parse(&["--format", "csv"]);
        assert_eq!(args.format, Some(ExportFormat::Csv));
    }

    #[test]
    fn test_apply_overrides() {
        let args = parse(&[
            "--exclude-survey-id",
            "7",
            "--output-dir",
            "/data/exports",
            "--max-wait-seconds",
            "120",
        ]);
        let mut config = ExporterConfig::default();
        args.apply_overrides(&mut config);

        assert_eq!(
            config.export.request.exclude_survey_ids,
            Some(vec![ExportTargetId::new(7)])
        );
        assert!(config.export.request.survey_ids.is_none());
        assert_eq!(config.output.base_directory, PathBuf::from("/data/exports"));
        assert_eq!(config.export.monitoring.max_wait_seconds, Some(120));
    }

    #[test]
    fn test_no_overrides_keeps_config() {
        let mut config = ExporterConfig::default();
        ExportArgs::default().apply_overrides(&mut config);
        assert!(config.export.request.survey_ids.is_none());
        assert_eq!(config.export.format, ExportFormat::Json);
    }

    #[tokio::test]
    async fn test_missing_config_is_configuration_exit() {
        let (_tx, rx) = watch::channel(false);
        let code = ExportArgs::default()
            .execute("does_not_exist_vibrent.toml", None, rx)
            .await
            .unwrap();
        assert_eq!(code, EXIT_CONFIGURATION);
    }
}
