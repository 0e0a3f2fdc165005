//! Session report
//!
//! This module defines the record of one export session: counters, the
//! surveys that were requested, and every recoverable failure in the order it
//! happened. The report is written to disk by [`super::metadata`].

use super::retrieve::DownloadedExport;
use crate::config::MetadataConfig;
use crate::domain::{ExportStatus, ExportTargetId, ExporterError, JobId, Survey};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Pipeline stage a failure was recorded in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    /// The export request for a survey was rejected
    ExportRequest,
    /// The platform reported the job as failed
    ExportStatus,
    /// Polling the job status failed
    StatusCheck,
    /// Downloading the artifact failed
    Download,
    /// The job was still pending when the wait limit was reached
    Timeout,
}

impl FailureStage {
    /// Wire name of the stage
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureStage::ExportRequest => "export_request",
            FailureStage::ExportStatus => "export_status",
            FailureStage::StatusCheck => "status_check",
            FailureStage::Download => "download",
            FailureStage::Timeout => "timeout",
        }
    }
}

/// A recoverable failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureRecord {
    /// Stage the failure happened in
    pub stage: FailureStage,

    /// Export-target id or job id, depending on the stage
    pub identifier: String,

    /// Error message
    pub error: String,

    /// Last known job status, when there was one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ExportStatus>,
}

impl FailureRecord {
    /// Create a new failure record
    pub fn new(stage: FailureStage, identifier: impl ToString, error: impl Into<String>) -> Self {
        Self {
            stage,
            identifier: identifier.to_string(),
            error: error.into(),
            status: None,
        }
    }

    /// Attach the job status
    pub fn with_status(mut self, status: ExportStatus) -> Self {
        self.status = Some(status);
        self
    }
}

/// A fatal error raised part way through a stage
///
/// `partial` holds what the stage gathered before it stopped.
#[derive(Debug)]
pub struct StageAborted<T> {
    pub partial: T,
    pub error: ExporterError,
}

impl<T> StageAborted<T> {
    /// Wrap `error` with the partial result of the stage
    pub fn new(partial: T, error: ExporterError) -> Self {
        Self { partial, error }
    }
}

/// Export details of a downloaded survey
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportDetail {
    pub export_id: JobId,
    pub status: ExportStatus,
}

/// Survey entry of the report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurveyRecord {
    pub id: i64,
    pub name: String,
    pub display_name: String,
    pub platform_form_id: ExportTargetId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_details: Option<ExportDetail>,
}

impl From<&Survey> for SurveyRecord {
    fn from(survey: &Survey) -> Self {
        Self {
            id: survey.id,
            name: survey.name.clone(),
            display_name: survey.display_name.clone(),
            platform_form_id: survey.platform_form_id,
            export_details: None,
        }
    }
}

/// Report of one export session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionReport {
    /// Session id, `export_<timestamp>`
    pub export_session_id: String,

    /// When the session started
    pub start_timestamp: DateTime<Utc>,

    /// When the report was finalized
    #[serde(default)]
    pub end_timestamp: Option<DateTime<Utc>>,

    /// Wall-clock duration in seconds
    #[serde(default)]
    pub duration_seconds: f64,

    /// Surveys listed by the platform, before filtering
    pub total_surveys: usize,

    /// Jobs that reached COMPLETED
    pub successful_exports: usize,

    /// Number of failure records
    pub failed_exports: usize,

    /// Session output directory
    pub output_directory: PathBuf,

    /// The session was stopped by a shutdown signal
    #[serde(default)]
    pub interrupted: bool,

    #[serde(default)]
    pub surveys: Vec<SurveyRecord>,

    #[serde(default)]
    pub failures: Vec<FailureRecord>,
}

impl SessionReport {
    /// Start a report for `session_id`
    pub fn new(session_id: impl Into<String>, output_directory: impl Into<PathBuf>) -> Self {
        Self {
            export_session_id: session_id.into(),
            start_timestamp: Utc::now(),
            end_timestamp: None,
            duration_seconds: 0.0,
            total_surveys: 0,
            successful_exports: 0,
            failed_exports: 0,
            output_directory: output_directory.into(),
            interrupted: false,
            surveys: Vec::new(),
            failures: Vec::new(),
        }
    }

    /// Append a failure
    pub fn add_failure(&mut self, failure: FailureRecord) {
        self.failures.push(failure);
    }

    /// Failures recorded for `stage`
    pub fn failures_in(&self, stage: FailureStage) -> impl Iterator<Item = &FailureRecord> {
        self.failures.iter().filter(move |f| f.stage == stage)
    }

    /// Mark the session as interrupted
    pub fn mark_interrupted(&mut self) {
        self.interrupted = true;
    }

    /// Compute counters, survey records and timing
    ///
    /// `completed` is the number of jobs that reached COMPLETED. Survey
    /// records are built from `surveys` when `include_survey_details` is set;
    /// a survey whose export was downloaded also carries its export details
    /// when `include_export_status` is set.
    pub fn finalize(
        &mut self,
        surveys: &[Survey],
        completed: usize,
        downloads: &[DownloadedExport],
        options: &MetadataConfig,
    ) {
        self.successful_exports = completed;
        self.failed_exports = self.failures.len();

        self.surveys = if options.include_survey_details {
            surveys
                .iter()
                .map(|survey| {
                    let mut record = SurveyRecord::from(survey);
                    if options.include_export_status {
                        record.export_details = downloads
                            .iter()
                            .find(|d| d.target == Some(survey.platform_form_id))
                            .map(|d| ExportDetail {
                                export_id: d.job_id.clone(),
                                status: d.status.clone(),
                            });
                    }
                    record
                })
                .collect()
        } else {
            Vec::new()
        };

        let end = Utc::now();
        self.duration_seconds = (end - self.start_timestamp)
            .to_std()
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0);
        self.end_timestamp = Some(end);
    }

    /// Check if the session finished without failures
    pub fn is_successful(&self) -> bool {
        !self.interrupted && self.failures.is_empty()
    }

    /// Log the summary
    pub fn log_summary(&self) {
        tracing::info!(
            session_id = %self.export_session_id,
            total_surveys = self.total_surveys,
            successful = self.successful_exports,
            failed = self.failed_exports,
            interrupted = self.interrupted,
            duration_secs = format!("{:.2}", self.duration_seconds),
            output_directory = %self.output_directory.display(),
            "Export session completed"
        );

        if !self.failures.is_empty() {
            tracing::warn!(
                failure_count = self.failures.len(),
                "Export session completed with failures"
            );
            for failure in &self.failures {
                tracing::warn!(
                    stage = failure.stage.as_str(),
                    identifier = %failure.identifier,
                    error = %failure.error,
                    "Export failure"
                );
            }
        }
    }
}
