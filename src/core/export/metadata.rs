//! Session report persistence

use super::summary::SessionReport;
use crate::config::MetadataConfig;
use crate::domain::{ExporterError, Result};
use std::path::{Path, PathBuf};

/// Writes the session report as pretty-printed JSON
#[derive(Debug, Clone)]
pub struct MetadataWriter {
    config: MetadataConfig,
}

impl MetadataWriter {
    /// Create a writer for the `[metadata]` section
    pub fn new(config: MetadataConfig) -> Self {
        Self { config }
    }

    /// Write `report` to `{output_directory}/{filename}`
    ///
    /// Returns `None` without touching the disk when `save_metadata` is off.
    pub async fn write(&self, report: &SessionReport) -> Result<Option<PathBuf>> {
        if !self.config.save_metadata {
            tracing::debug!("Metadata saving disabled");
            return Ok(None);
        }

        tokio::fs::create_dir_all(&report.output_directory).await?;
        let path = report.output_directory.join(&self.config.filename);
        let json = serde_json::to_string_pretty(report)?;

        tokio::fs::write(&path, json).await.map_err(|e| {
            ExporterError::Io(format!("Failed to write metadata {}: {e}", path.display()))
        })?;

        tracing::info!(path = %path.display(), "Session metadata saved");
        Ok(Some(path))
    }
}

/// Read a report written by [`MetadataWriter`]
pub async fn read_report(path: impl AsRef<Path>) -> Result<SessionReport> {
    let path = path.as_ref();
    let contents = tokio::fs::read_to_string(path).await.map_err(|e| {
        ExporterError::Io(format!("Failed to read metadata {}: {e}", path.display()))
    })?;
    Ok(serde_json::from_str(&contents)?)
}
