//! Completion watcher
//!
//! Polls every pending job once per cycle until all of them are terminal, the
//! wait limit is reached, or shutdown is requested. A job leaves the pending
//! set exactly once.

use super::submit::SubmissionMap;
use super::summary::{FailureRecord, FailureStage, SessionReport, StageAborted};
use crate::adapters::vibrent::ExportApi;
use crate::config::MonitoringConfig;
use crate::core::shutdown::Shutdown;
use crate::domain::{ExportStatus, ExporterError, JobId, JobStatus};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// How the submitted jobs ended up
#[derive(Debug, Clone, Default)]
pub struct WatchOutcome {
    /// Completed jobs with their final status, in the order observed
    pub completed: Vec<(JobId, ExportStatus)>,

    /// Jobs reported FAILED or whose status check failed
    pub failed: Vec<JobId>,

    /// Jobs still pending when the wait limit was reached
    pub abandoned: Vec<JobId>,

    /// Watching was cut short by a shutdown signal
    pub interrupted: bool,
}

/// Polls export jobs until they reach a terminal state
pub struct CompletionWatcher {
    api: Arc<dyn ExportApi>,
    polling_interval: Duration,
    max_wait: Option<Duration>,
    continue_on_failure: bool,
    concurrency: usize,
    shutdown: Shutdown,
}

impl CompletionWatcher {
    /// Create a watcher from the `[export.monitoring]` section
    pub fn new(api: Arc<dyn ExportApi>, config: &MonitoringConfig, shutdown: Shutdown) -> Self {
        Self {
            api,
            polling_interval: Duration::from_secs(config.polling_interval_seconds),
            max_wait: config.max_wait_seconds.map(Duration::from_secs),
            continue_on_failure: config.continue_on_failure,
            concurrency: config.status_check_concurrency.max(1),
            shutdown,
        }
    }

    /// Wait for every job in `jobs` to complete or fail
    ///
    /// Jobs reported FAILED are recorded as `export_status` failures. A
    /// failed status check is recorded as a `status_check` failure when
    /// `continue_on_failure` is set.
    ///
    /// # Errors
    ///
    /// Authentication failures, and status check failures when
    /// `continue_on_failure` is off. The error carries the outcome observed
    /// up to that point.
    pub async fn wait_for_completion(
        &self,
        jobs: &SubmissionMap,
        report: &mut SessionReport,
    ) -> Result<WatchOutcome, StageAborted<WatchOutcome>> {
        let mut outcome = WatchOutcome::default();
        let mut pending: Vec<JobId> = jobs.job_ids().cloned().collect();
        let started = Instant::now();
        let mut cycle: u32 = 0;

        tracing::info!(
            jobs = pending.len(),
            polling_interval_secs = self.polling_interval.as_secs(),
            max_wait_secs = ?self.max_wait.map(|d| d.as_secs()),
            "Waiting for export jobs to complete"
        );

        loop {
            if pending.is_empty() {
                break;
            }

            if let Some(max_wait) = self.max_wait {
                if started.elapsed() >= max_wait {
                    tracing::warn!(
                        pending = pending.len(),
                        max_wait_secs = max_wait.as_secs(),
                        "Maximum wait time reached, abandoning pending jobs"
                    );
                    outcome.abandoned = std::mem::take(&mut pending);
                    break;
                }
            }

            if self.shutdown.sleep(self.polling_interval).await {
                outcome.interrupted = true;
                break;
            }

            cycle += 1;
            let checking = std::mem::take(&mut pending);
            let api = &self.api;
            let sweep = stream::iter(checking)
                .map(|job| async move {
                    let result = api.get_status(&job).await;
                    (job, result)
                })
                .buffered(self.concurrency);
            futures::pin_mut!(sweep);

            let (mut cycle_completed, mut cycle_failed) = (0usize, 0usize);

            loop {
                let next = match self.shutdown.run(sweep.next()).await {
                    Some(next) => next,
                    None => {
                        outcome.interrupted = true;
                        break;
                    }
                };
                let Some((job, result)) = next else {
                    break;
                };

                match result {
                    Ok(status) => match &status.status {
                        JobStatus::Completed => {
                            tracing::info!(job_id = %job, "Export job completed");
                            outcome.completed.push((job, status));
                            cycle_completed += 1;
                        }
                        JobStatus::Failed => {
                            let error = status
                                .failure_reason
                                .clone()
                                .unwrap_or_else(|| "export failed".to_string());
                            crate::log_recorded_failure!(FailureStage::ExportStatus, job, error);
                            report.add_failure(
                                FailureRecord::new(FailureStage::ExportStatus, &job, error)
                                    .with_status(status),
                            );
                            outcome.failed.push(job);
                            cycle_failed += 1;
                        }
                        JobStatus::Unknown(raw) => {
                            tracing::warn!(
                                job_id = %job,
                                status = %raw,
                                "Unrecognized export status, still waiting"
                            );
                            pending.push(job);
                        }
                        JobStatus::Submitted | JobStatus::InProgress => pending.push(job),
                    },
                    Err(e @ ExporterError::Authentication(_)) => {
                        return Err(StageAborted::new(outcome, e));
                    }
                    Err(e) if self.continue_on_failure => {
                        crate::log_recorded_failure!(FailureStage::StatusCheck, job, e);
                        report.add_failure(FailureRecord::new(
                            FailureStage::StatusCheck,
                            &job,
                            e.to_string(),
                        ));
                        outcome.failed.push(job);
                        cycle_failed += 1;
                    }
                    Err(e) => {
                        tracing::error!(job_id = %job, error = %e, "Status check failed, aborting");
                        return Err(StageAborted::new(outcome, e));
                    }
                }
            }

            if outcome.interrupted {
                break;
            }

            tracing::info!(
                cycle,
                completed = cycle_completed,
                failed = cycle_failed,
                in_progress = pending.len(),
                total_completed = outcome.completed.len(),
                total_failed = outcome.failed.len(),
                "Status check cycle finished"
            );
        }

        if outcome.interrupted {
            crate::log_stage_interrupted!("watch", outcome.completed.len());
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::export::testing::{job, Reply, ScriptedApi};
    use crate::domain::ExportTargetId;
    use tokio::sync::watch;

    fn jobs(ids: &[&str]) -> SubmissionMap {
        ids.iter()
            .enumerate()
            .map(|(i, id)| (ExportTargetId::new(i as i64 + 1), job(id)))
            .collect()
    }

    fn config(max_wait: Option<u64>, continue_on_failure: bool) -> MonitoringConfig {
        MonitoringConfig {
            polling_interval_seconds: 10,
            max_wait_seconds: max_wait,
            continue_on_failure,
            status_check_concurrency: 1,
        }
    }

    fn watcher(api: Arc<ScriptedApi>, config: &MonitoringConfig) -> CompletionWatcher {
        CompletionWatcher::new(api, config, Shutdown::never())
    }

    #[tokio::test(start_paused = true)]
    async fn test_jobs_polled_until_terminal() {
        let api = Arc::new(
            ScriptedApi::new()
                .with_statuses(
                    "a",
                    vec![
                        Reply::Ok(JobStatus::Submitted),
                        Reply::Ok(JobStatus::InProgress),
                        Reply::Ok(JobStatus::Completed),
                    ],
                )
                .with_statuses("b", vec![Reply::Ok(JobStatus::Completed)]),
        );
        let mut report = SessionReport::new("s", "/tmp");

        let outcome = watcher(api.clone(), &config(None, true))
            .wait_for_completion(&jobs(&["a", "b"]), &mut report)
            .await
            .unwrap();

        let completed: Vec<_> = outcome.completed.iter().map(|(j, _)| j.as_str()).collect();
        assert_eq!(completed, vec!["b", "a"]);
        assert!(outcome.failed.is_empty());
        assert!(outcome.abandoned.is_empty());
        // terminal jobs are never polled again
        assert_eq!(
            api.calls(),
            vec!["status:a", "status:b", "status:a", "status:a"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_status_stays_pending() {
        let api = Arc::new(ScriptedApi::new().with_statuses(
            "a",
            vec![
                Reply::Ok(JobStatus::Unknown("QUEUED".to_string())),
                Reply::Ok(JobStatus::Completed),
            ],
        ));
        let mut report = SessionReport::new("s", "/tmp");

        let outcome = watcher(api.clone(), &config(None, true))
            .wait_for_completion(&jobs(&["a"]), &mut report)
            .await
            .unwrap();

        assert_eq!(outcome.completed.len(), 1);
        assert_eq!(api.calls_with_prefix("status:").len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_max_wait_partitions_jobs() {
        let api = Arc::new(
            ScriptedApi::new()
                .with_statuses("a", vec![Reply::Ok(JobStatus::Completed)])
                .with_statuses("b", vec![Reply::Ok(JobStatus::Failed)])
                .with_statuses("c", vec![Reply::Ok(JobStatus::InProgress)]),
        );
        let mut report = SessionReport::new("s", "/tmp");

        let outcome = watcher(api, &config(Some(5), true))
            .wait_for_completion(&jobs(&["a", "b", "c"]), &mut report)
            .await
            .unwrap();

        assert_eq!(outcome.completed.len(), 1);
        assert_eq!(outcome.completed[0].0, job("a"));
        assert_eq!(outcome.failed, vec![job("b")]);
        assert_eq!(outcome.abandoned, vec![job("c")]);

        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].stage, FailureStage::ExportStatus);
        assert_eq!(report.failures[0].identifier, "b");
        assert_eq!(report.failures[0].error, "generation failed");
    }

    #[tokio::test(start_paused = true)]
    async fn test_max_wait_over_two_cycles() {
        let api = Arc::new(
            ScriptedApi::new()
                .with_statuses("a", vec![Reply::Ok(JobStatus::Completed)])
                .with_statuses(
                    "b",
                    vec![Reply::Ok(JobStatus::InProgress), Reply::Ok(JobStatus::Failed)],
                )
                .with_statuses("c", vec![Reply::Ok(JobStatus::InProgress)]),
        );
        let mut report = SessionReport::new("s", "/tmp");
        let started = Instant::now();

        let outcome = watcher(api.clone(), &config(Some(20), true))
            .wait_for_completion(&jobs(&["a", "b", "c"]), &mut report)
            .await
            .unwrap();

        let completed: Vec<_> = outcome.completed.iter().map(|(j, _)| j.as_str()).collect();
        assert_eq!(completed, vec!["a"]);
        assert_eq!(outcome.failed, vec![job("b")]);
        assert_eq!(outcome.abandoned, vec![job("c")]);
        assert!(!outcome.interrupted);

        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].stage, FailureStage::ExportStatus);
        assert_eq!(report.failures[0].identifier, "b");

        assert_eq!(
            api.calls(),
            vec!["status:a", "status:b", "status:c", "status:b", "status:c"]
        );
        assert_eq!(started.elapsed().as_secs(), 20);
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_error_recorded_when_continuing() {
        let api = Arc::new(
            ScriptedApi::new()
                .with_statuses("a", vec![Reply::Status(502)])
                .with_statuses("b", vec![Reply::Ok(JobStatus::Completed)]),
        );
        let mut report = SessionReport::new("s", "/tmp");

        let outcome = watcher(api, &config(None, true))
            .wait_for_completion(&jobs(&["a", "b"]), &mut report)
            .await
            .unwrap();

        assert_eq!(outcome.failed, vec![job("a")]);
        assert_eq!(outcome.completed.len(), 1);
        assert_eq!(report.failures[0].stage, FailureStage::StatusCheck);
        assert!(report.failures[0].error.contains("502"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_error_aborts_without_continue() {
        let api = Arc::new(
            ScriptedApi::new()
                .with_statuses("a", vec![Reply::Status(502)])
                .with_statuses("b", vec![Reply::Ok(JobStatus::Completed)]),
        );
        let mut report = SessionReport::new("s", "/tmp");

        let aborted = watcher(api.clone(), &config(None, false))
            .wait_for_completion(&jobs(&["a", "b"]), &mut report)
            .await
            .unwrap_err();

        assert!(matches!(aborted.error, ExporterError::Api(_)));
        assert!(aborted.partial.completed.is_empty());
        assert!(report.failures.is_empty());
        assert_eq!(api.calls(), vec!["status:a"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_abort_keeps_jobs_completed_before_the_error() {
        let api = Arc::new(
            ScriptedApi::new()
                .with_statuses("a", vec![Reply::Ok(JobStatus::Completed)])
                .with_statuses("b", vec![Reply::Status(500)]),
        );
        let mut report = SessionReport::new("s", "/tmp");

        let aborted = watcher(api, &config(None, false))
            .wait_for_completion(&jobs(&["a", "b"]), &mut report)
            .await
            .unwrap_err();

        assert!(matches!(aborted.error, ExporterError::Api(_)));
        assert_eq!(aborted.partial.completed.len(), 1);
        assert_eq!(aborted.partial.completed[0].0, job("a"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_authentication_error_always_fatal() {
        let api = Arc::new(ScriptedApi::new().with_statuses("a", vec![Reply::Auth]));
        let mut report = SessionReport::new("s", "/tmp");

        let aborted = watcher(api, &config(None, true))
            .wait_for_completion(&jobs(&["a"]), &mut report)
            .await
            .unwrap_err();

        assert!(matches!(aborted.error, ExporterError::Authentication(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_submission_returns_immediately() {
        let api = Arc::new(ScriptedApi::new());
        let mut report = SessionReport::new("s", "/tmp");
        let started = Instant::now();

        let outcome = watcher(api.clone(), &config(None, true))
            .wait_for_completion(&SubmissionMap::new(), &mut report)
            .await
            .unwrap();

        assert!(outcome.completed.is_empty());
        assert!(api.calls().is_empty());
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_sweep_keeps_insertion_order() {
        let api = Arc::new(ScriptedApi::new());
        let mut report = SessionReport::new("s", "/tmp");
        let config = MonitoringConfig {
            status_check_concurrency: 4,
            ..config(None, true)
        };

        let outcome = watcher(api, &config)
            .wait_for_completion(&jobs(&["a", "b", "c", "d", "e"]), &mut report)
            .await
            .unwrap();

        let completed: Vec<_> = outcome.completed.iter().map(|(j, _)| j.as_str()).collect();
        assert_eq!(completed, vec!["a", "b", "c", "d", "e"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_during_poll_sleep() {
        let api = Arc::new(
            ScriptedApi::new().with_statuses("a", vec![Reply::Ok(JobStatus::InProgress)]),
        );
        let (tx, rx) = watch::channel(false);
        let mut report = SessionReport::new("s", "/tmp");

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(25)).await;
            let _ = tx.send(true);
        });

        let outcome = CompletionWatcher::new(api.clone(), &config(None, true), Shutdown::new(rx))
            .wait_for_completion(&jobs(&["a"]), &mut report)
            .await
            .unwrap();

        assert!(outcome.interrupted);
        assert!(outcome.completed.is_empty());
        assert_eq!(api.calls().len(), 2);
    }
}
