//! Export coordinator - main orchestrator for the export process
//!
//! This module runs one export session end to end: list surveys, select,
//! submit, wait, download, unpack, and persist the session report.

use super::extract::ArchiveExtractor;
use super::filter::SurveyFilter;
use super::metadata::MetadataWriter;
use super::retrieve::{DownloadedExport, Retriever};
use super::submit::JobSubmitter;
use super::summary::{FailureRecord, FailureStage, SessionReport};
use super::watch::CompletionWatcher;
use crate::adapters::vibrent::{ExportApi, VibrentClient};
use crate::config::{ClientCredentials, ExporterConfig};
use crate::core::shutdown::Shutdown;
use crate::domain::{ExporterError, Result, Survey};
use chrono::{Local, Utc};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;

/// Timestamp label shared by the session id and the session directory
const SESSION_TIMESTAMP_FORMAT: &str = "%d_%m_%Y_%H%M%S";

/// Export coordinator
pub struct ExportCoordinator {
    config: ExporterConfig,
    environment: String,
    api: Arc<dyn ExportApi>,
    shutdown: Shutdown,
}

impl ExportCoordinator {
    /// Create a coordinator talking to the platform of `environment`
    ///
    /// `environment` falls back to `[environment] default` when `None`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an unknown environment or an
    /// invalid base URL.
    pub fn new(
        config: ExporterConfig,
        credentials: ClientCredentials,
        environment: Option<&str>,
        shutdown_signal: watch::Receiver<bool>,
    ) -> Result<Self> {
        let (name, endpoints) = config
            .environment
            .resolve(environment)
            .map_err(ExporterError::Configuration)?;
        let name = name.to_string();

        tracing::info!(
            environment = %name,
            base_url = %endpoints.base_url,
            "Using platform environment"
        );

        let client = VibrentClient::new(endpoints, credentials, &config.auth, &config.api)?;

        Ok(Self::with_api(config, name, Arc::new(client), shutdown_signal))
    }

    /// Create a coordinator on top of any [`ExportApi`]
    pub fn with_api(
        config: ExporterConfig,
        environment: impl Into<String>,
        api: Arc<dyn ExportApi>,
        shutdown_signal: watch::Receiver<bool>,
    ) -> Self {
        Self {
            config,
            environment: environment.into(),
            api,
            shutdown: Shutdown::new(shutdown_signal),
        }
    }

    /// Name of the active environment
    pub fn environment(&self) -> &str {
        &self.environment
    }

    /// Execute the export
    ///
    /// This is the main entry point for the export process. It:
    /// 1. Creates the session directory
    /// 2. Lists and selects surveys
    /// 3. Submits one export job per survey
    /// 4. Waits for the jobs to finish
    /// 5. Downloads and unpacks the archives
    /// 6. Finalizes, persists and logs the session report
    ///
    /// Recoverable failures end up in the report. A shutdown signal skips
    /// the remaining stages and returns the report marked as interrupted.
    ///
    /// # Errors
    ///
    /// Fatal errors: authentication failures, a failed survey listing, a
    /// failed status check when `continue_on_failure` is off, and I/O errors
    /// creating the session directory.
    pub async fn execute_export(&self) -> Result<SessionReport> {
        let label = Local::now().format(SESSION_TIMESTAMP_FORMAT).to_string();
        let output_dir = self.config.output.session_directory(&label);

        tokio::fs::create_dir_all(&output_dir).await.map_err(|e| {
            ExporterError::Io(format!(
                "Failed to create output directory {}: {e}",
                output_dir.display()
            ))
        })?;

        let mut report = SessionReport::new(format!("export_{label}"), &output_dir);

        tracing::info!(
            session_id = %report.export_session_id,
            environment = %self.environment,
            output_dir = %output_dir.display(),
            "Starting export session"
        );

        let surveys = match self.shutdown.run(self.api.list_surveys()).await {
            Some(result) => result.map_err(|e| {
                tracing::error!(error = %e, "Failed to list surveys");
                e
            })?,
            None => return self.interrupted(report, &[], 0, &[]).await,
        };
        report.total_surveys = surveys.len();
        tracing::info!(count = surveys.len(), "Surveys listed");

        if surveys.is_empty() {
            tracing::warn!("No surveys available for export");
            return self.finish(report, &[], 0, &[]).await;
        }

        let selected = SurveyFilter::from_config(&self.config.export.request).apply(surveys);
        if selected.is_empty() {
            tracing::warn!("No surveys matched the configured filters");
            return self.finish(report, &[], 0, &[]).await;
        }
        tracing::info!(count = selected.len(), "Surveys selected for export");

        let request = self
            .config
            .export
            .build_request(Utc::now())
            .map_err(ExporterError::Configuration)?;

        let submitter =
            JobSubmitter::new(self.api.clone(), &self.config.export.request, self.shutdown.clone());
        let submission = match submitter.submit(&selected, &request, &mut report).await {
            Ok(submission) => submission,
            Err(e) => return self.abort(report, &selected, 0, &[], e).await,
        };

        if submission.interrupted {
            return self.interrupted(report, &selected, 0, &[]).await;
        }
        if submission.jobs.is_empty() {
            tracing::warn!("No export jobs were accepted");
            return self.finish(report, &selected, 0, &[]).await;
        }

        let watcher = CompletionWatcher::new(
            self.api.clone(),
            &self.config.export.monitoring,
            self.shutdown.clone(),
        );
        let outcome = match watcher
            .wait_for_completion(&submission.jobs, &mut report)
            .await
        {
            Ok(outcome) => outcome,
            Err(aborted) => {
                let completed = aborted.partial.completed.len();
                return self
                    .abort(report, &selected, completed, &[], aborted.error)
                    .await;
            }
        };

        let max_wait = self.config.export.monitoring.max_wait_seconds.unwrap_or(0);
        for job in &outcome.abandoned {
            report.add_failure(FailureRecord::new(
                FailureStage::Timeout,
                job,
                format!("export did not complete within {max_wait}s"),
            ));
        }

        let completed = outcome.completed.len();
        if outcome.interrupted {
            return self.interrupted(report, &selected, completed, &[]).await;
        }

        let retriever = Retriever::new(self.api.clone(), self.shutdown.clone());
        let retrieval = match retriever
            .download_all(&outcome.completed, &submission.jobs, &output_dir, &mut report)
            .await
        {
            Ok(retrieval) => retrieval,
            Err(aborted) => {
                return self
                    .abort(
                        report,
                        &selected,
                        completed,
                        &aborted.partial.downloads,
                        aborted.error,
                    )
                    .await;
            }
        };

        if retrieval.interrupted {
            return self
                .interrupted(report, &selected, completed, &retrieval.downloads)
                .await;
        }

        if self.config.output.extract_files && !retrieval.downloads.is_empty() {
            self.extract(output_dir.clone(), retrieval.paths()).await;
        }

        self.finish(report, &selected, completed, &retrieval.downloads)
            .await
    }

    /// Unpack the downloaded archives off the runtime threads
    async fn extract(&self, output_dir: PathBuf, archives: Vec<PathBuf>) {
        let extractor = ArchiveExtractor::new(
            output_dir,
            self.config.export.format,
            self.config.output.remove_zip_after_extract,
        );

        match tokio::task::spawn_blocking(move || extractor.extract_all(&archives)).await {
            Ok(summary) => {
                tracing::info!(
                    archives = summary.archives_extracted,
                    files = summary.files.len(),
                    removed = summary.archives_removed,
                    errors = summary.errors.len(),
                    "Extraction finished"
                );
            }
            Err(e) => {
                tracing::error!(error = %e, "Extraction task failed");
            }
        }
    }

    /// Finalize, persist and log the report
    async fn finish(
        &self,
        mut report: SessionReport,
        surveys: &[Survey],
        completed: usize,
        downloads: &[DownloadedExport],
    ) -> Result<SessionReport> {
        report.finalize(surveys, completed, downloads, &self.config.metadata);

        let writer = MetadataWriter::new(self.config.metadata.clone());
        if let Err(e) = writer.write(&report).await {
            tracing::error!(error = %e, "Failed to save session metadata");
        }

        report.log_summary();
        Ok(report)
    }

    async fn interrupted(
        &self,
        mut report: SessionReport,
        surveys: &[Survey],
        completed: usize,
        downloads: &[DownloadedExport],
    ) -> Result<SessionReport> {
        tracing::warn!("Export session interrupted, skipping remaining stages");
        report.mark_interrupted();
        self.finish(report, surveys, completed, downloads).await
    }

    /// Persist what is known, then fail with `error`
    async fn abort(
        &self,
        report: SessionReport,
        surveys: &[Survey],
        completed: usize,
        downloads: &[DownloadedExport],
        error: ExporterError,
    ) -> Result<SessionReport> {
        tracing::error!(error = %error, "Export session aborted");
        self.finish(report, surveys, completed, downloads).await?;
        Err(error)
    }
}
