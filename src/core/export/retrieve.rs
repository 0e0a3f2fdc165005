//! Artifact retrieval

use super::submit::SubmissionMap;
use super::summary::{FailureRecord, FailureStage, SessionReport, StageAborted};
use crate::adapters::vibrent::ExportApi;
use crate::core::shutdown::Shutdown;
use crate::domain::{ExportStatus, ExportTargetId, ExporterError, JobId};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A downloaded export archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedExport {
    /// Job the archive belongs to
    pub job_id: JobId,

    /// Export target the job was submitted for
    pub target: Option<ExportTargetId>,

    /// Local path of the archive
    pub path: PathBuf,

    /// Final job status
    pub status: ExportStatus,
}

/// Result of a retrieval pass
#[derive(Debug, Clone, Default)]
pub struct Retrieval {
    /// Archives on disk, in completion order
    pub downloads: Vec<DownloadedExport>,

    /// Retrieval was cut short by a shutdown signal
    pub interrupted: bool,
}

impl Retrieval {
    /// Paths of every downloaded archive
    pub fn paths(&self) -> Vec<PathBuf> {
        self.downloads.iter().map(|d| d.path.clone()).collect()
    }
}

/// Downloads the artifacts of completed jobs
pub struct Retriever {
    api: Arc<dyn ExportApi>,
    shutdown: Shutdown,
}

impl Retriever {
    /// Create a retriever over `api`
    pub fn new(api: Arc<dyn ExportApi>, shutdown: Shutdown) -> Self {
        Self { api, shutdown }
    }

    /// Download every completed job into `dest_dir`
    ///
    /// A failed download is recorded as a `download` failure and the next job
    /// is attempted.
    ///
    /// # Errors
    ///
    /// Only authentication failures are returned, together with the archives
    /// downloaded before them.
    pub async fn download_all(
        &self,
        completed: &[(JobId, ExportStatus)],
        jobs: &SubmissionMap,
        dest_dir: &Path,
        report: &mut SessionReport,
    ) -> Result<Retrieval, StageAborted<Retrieval>> {
        let mut retrieval = Retrieval::default();

        tracing::info!(
            jobs = completed.len(),
            dest = %dest_dir.display(),
            "Downloading completed exports"
        );

        for (job, status) in completed {
            if self.shutdown.is_requested() {
                retrieval.interrupted = true;
                break;
            }

            let target = jobs.target_of(job);
            let result = match self.shutdown.run(self.api.download(job, dest_dir)).await {
                Some(result) => result,
                None => {
                    retrieval.interrupted = true;
                    break;
                }
            };

            match result {
                Ok(path) => {
                    tracing::info!(
                        job_id = %job,
                        target_id = ?target.map(|t| t.value()),
                        path = %path.display(),
                        "Export downloaded"
                    );
                    retrieval.downloads.push(DownloadedExport {
                        job_id: job.clone(),
                        target,
                        path,
                        status: status.clone(),
                    });
                }
                Err(e @ ExporterError::Authentication(_)) => {
                    return Err(StageAborted::new(retrieval, e));
                }
                Err(e) => {
                    crate::log_recorded_failure!(FailureStage::Download, job, e);
                    report.add_failure(
                        FailureRecord::new(FailureStage::Download, job, e.to_string())
                            .with_status(status.clone()),
                    );
                }
            }
        }

        if retrieval.interrupted {
            crate::log_stage_interrupted!("retrieval", retrieval.downloads.len());
        }

        Ok(retrieval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::export::testing::{job, Reply, ScriptedApi};
    use crate::domain::JobStatus;
    use tempfile::TempDir;
    use tokio::sync::watch;

    fn completed(ids: &[&str]) -> Vec<(JobId, ExportStatus)> {
        ids.iter()
            .map(|id| (job(id), ExportStatus::new(job(id), JobStatus::Completed)))
            .collect()
    }

    fn jobs() -> SubmissionMap {
        [
            (ExportTargetId::new(10), job("a")),
            (ExportTargetId::new(20), job("b")),
            (ExportTargetId::new(30), job("c")),
        ]
        .into_iter()
        .collect()
    }

    #[tokio::test]
    async fn test_downloads_in_completion_order() {
        let dir = TempDir::new().unwrap();
        let api = Arc::new(ScriptedApi::new());
        let mut report = SessionReport::new("s", dir.path());

        let retrieval = Retriever::new(api.clone(), Shutdown::never())
            .download_all(&completed(&["c", "a"]), &jobs(), dir.path(), &mut report)
            .await
            .unwrap();

        assert_eq!(api.calls(), vec!["download:c", "download:a"]);
        assert_eq!(retrieval.downloads.len(), 2);
        assert_eq!(retrieval.downloads[0].target, Some(ExportTargetId::new(30)));
        assert_eq!(retrieval.downloads[1].target, Some(ExportTargetId::new(10)));
        assert!(retrieval.downloads[0].path.exists());
        assert_eq!(retrieval.paths().len(), 2);
    }

    #[tokio::test]
    async fn test_download_failure_recorded_and_continues() {
        let dir = TempDir::new().unwrap();
        let api = Arc::new(ScriptedApi::new().with_download("a", Reply::Status(404)));
        let mut report = SessionReport::new("s", dir.path());

        let retrieval = Retriever::new(api, Shutdown::never())
            .download_all(&completed(&["a", "b"]), &jobs(), dir.path(), &mut report)
            .await
            .unwrap();

        assert_eq!(retrieval.downloads.len(), 1);
        assert_eq!(retrieval.downloads[0].job_id, job("b"));
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].stage, FailureStage::Download);
        assert_eq!(report.failures[0].identifier, "a");
    }

    #[tokio::test]
    async fn test_unknown_job_has_no_target() {
        let dir = TempDir::new().unwrap();
        let api = Arc::new(ScriptedApi::new());
        let mut report = SessionReport::new("s", dir.path());

        let retrieval = Retriever::new(api, Shutdown::never())
            .download_all(&completed(&["zzz"]), &jobs(), dir.path(), &mut report)
            .await
            .unwrap();

        assert_eq!(retrieval.downloads[0].target, None);
    }

    #[tokio::test]
    async fn test_shutdown_skips_remaining_downloads() {
        let dir = TempDir::new().unwrap();
        let api = Arc::new(ScriptedApi::new());
        let (tx, rx) = watch::channel(false);
        tx.send(true).unwrap();
        let mut report = SessionReport::new("s", dir.path());

        let retrieval = Retriever::new(api.clone(), Shutdown::new(rx))
            .download_all(&completed(&["a", "b"]), &jobs(), dir.path(), &mut report)
            .await
            .unwrap();

        assert!(retrieval.interrupted);
        assert!(retrieval.downloads.is_empty());
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_authentication_failure_propagates() {
        let dir = TempDir::new().unwrap();
        let api = Arc::new(ScriptedApi::new().with_download("a", Reply::Auth));
        let mut report = SessionReport::new("s", dir.path());

        let aborted = Retriever::new(api, Shutdown::never())
            .download_all(&completed(&["b", "a", "c"]), &jobs(), dir.path(), &mut report)
            .await
            .unwrap_err();

        assert!(matches!(aborted.error, ExporterError::Authentication(_)));
        assert_eq!(aborted.partial.downloads.len(), 1);
        assert_eq!(aborted.partial.downloads[0].job_id, job("b"));
    }
}
