//! Export request and export job status models

use super::decode;
use super::errors::DecodeError;
use super::ids::JobId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

const STATUS_ENTITY: &str = "ExportStatus";

/// Output format requested from the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ExportFormat {
    /// JSON payload files
    #[default]
    #[serde(alias = "json")]
    Json,
    /// CSV payload files
    #[serde(alias = "csv")]
    Csv,
}

impl ExportFormat {
    /// Wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Json => "JSON",
            ExportFormat::Csv => "CSV",
        }
    }

    /// File extension of the payload files inside an export archive
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "JSON" => Ok(ExportFormat::Json),
            "CSV" => Ok(ExportFormat::Csv),
            _ => Err(format!("Invalid export format '{s}'. Must be one of: JSON, CSV")),
        }
    }
}

/// Export request body, shared by every survey of a session
///
/// `date_from` is inclusive and `date_to` exclusive, both in epoch
/// milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRequest {
    /// Range start (inclusive), epoch milliseconds
    #[serde(rename = "dateFrom")]
    pub date_from: i64,

    /// Range end (exclusive), epoch milliseconds
    #[serde(rename = "dateTo")]
    pub date_to: i64,

    /// Output format
    pub format: ExportFormat,
}

impl ExportRequest {
    /// Create a new export request
    pub fn new(date_from: i64, date_to: i64, format: ExportFormat) -> Self {
        Self {
            date_from,
            date_to,
            format,
        }
    }
}

/// State of an export job as reported by the platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum JobStatus {
    /// Accepted, not started
    Submitted,
    /// Being generated
    InProgress,
    /// Archive ready for download
    Completed,
    /// Generation failed
    Failed,
    /// A status string this client does not know; treated as still running
    Unknown(String),
}

impl JobStatus {
    /// Parse the platform's status string
    pub fn from_wire(s: &str) -> Self {
        match s {
            "SUBMITTED" => JobStatus::Submitted,
            "IN_PROGRESS" => JobStatus::InProgress,
            "COMPLETED" => JobStatus::Completed,
            "FAILED" => JobStatus::Failed,
            other => JobStatus::Unknown(other.to_string()),
        }
    }

    /// Platform's status string
    pub fn as_str(&self) -> &str {
        match self {
            JobStatus::Submitted => "SUBMITTED",
            JobStatus::InProgress => "IN_PROGRESS",
            JobStatus::Completed => "COMPLETED",
            JobStatus::Failed => "FAILED",
            JobStatus::Unknown(s) => s,
        }
    }

    /// Completed or Failed; a terminal job is never polled again
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for JobStatus {
    fn from(s: String) -> Self {
        JobStatus::from_wire(&s)
    }
}

impl From<JobStatus> for String {
    fn from(status: JobStatus) -> Self {
        status.as_str().to_string()
    }
}

/// One poll result for an export job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportStatus {
    /// Job id
    pub export_id: JobId,

    /// Job state
    pub status: JobStatus,

    /// Name of the generated file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,

    /// Submission timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_on: Option<String>,

    /// Completion timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_on: Option<String>,

    /// Download reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_endpoint: Option<String>,

    /// Why the job failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
}

impl ExportStatus {
    /// Create a status with only id and state set
    pub fn new(export_id: JobId, status: JobStatus) -> Self {
        Self {
            export_id,
            status,
            file_name: None,
            submitted_on: None,
            completed_on: None,
            download_endpoint: None,
            failure_reason: None,
        }
    }

    /// Set the failure reason
    pub fn with_failure_reason(mut self, reason: impl Into<String>) -> Self {
        self.failure_reason = Some(reason.into());
        self
    }

    /// Set the file name
    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    /// Decode a status payload
    ///
    /// `requested` is used when the payload carries no (or a blank)
    /// `exportId`. A missing `status` decodes as `Unknown("UNKNOWN")`.
    pub fn from_value(value: &Value, requested: &JobId) -> Result<Self, DecodeError> {
        let obj = decode::object(value, STATUS_ENTITY)?;

        let export_id = decode::optional_string(obj, STATUS_ENTITY, "exportId")?
            .and_then(|id| JobId::new(id).ok())
            .unwrap_or_else(|| requested.clone());
        let status = decode::string_or(obj, STATUS_ENTITY, "status", "UNKNOWN")?;

        Ok(Self {
            export_id,
            status: JobStatus::from_wire(&status),
            file_name: decode::optional_string(obj, STATUS_ENTITY, "fileName")?,
            submitted_on: decode::optional_text(obj, STATUS_ENTITY, "submittedOn")?,
            completed_on: decode::optional_text(obj, STATUS_ENTITY, "completedOn")?,
            download_endpoint: decode::optional_string(obj, STATUS_ENTITY, "downloadEndpoint")?,
            failure_reason: decode::optional_string(obj, STATUS_ENTITY, "failureReason")?,
        })
    }
}
