//! Job submission
//!
//! One export request per survey, in listing order, with a pause after each
//! accepted request. A rejected request is recorded and the batch moves on.

use super::summary::{FailureRecord, FailureStage, SessionReport};
use crate::adapters::vibrent::ExportApi;
use crate::config::SurveyFilterConfig;
use crate::core::shutdown::Shutdown;
use crate::domain::{ExportRequest, ExportTargetId, ExporterError, JobId, Result, Survey};
use std::sync::Arc;
use std::time::Duration;

/// Export-target id to job id, in submission order
///
/// A target maps to at most one job.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmissionMap {
    entries: Vec<(ExportTargetId, JobId)>,
}

impl SubmissionMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a job; returns `false` if `target` already has one
    pub fn insert(&mut self, target: ExportTargetId, job: JobId) -> bool {
        if self.contains_target(target) {
            return false;
        }
        self.entries.push((target, job));
        true
    }

    /// True if `target` was submitted
    pub fn contains_target(&self, target: ExportTargetId) -> bool {
        self.entries.iter().any(|(t, _)| *t == target)
    }

    /// Job submitted for `target`
    pub fn job_for(&self, target: ExportTargetId) -> Option<&JobId> {
        self.entries
            .iter()
            .find(|(t, _)| *t == target)
            .map(|(_, job)| job)
    }

    /// Target a job was submitted for (first match)
    pub fn target_of(&self, job: &JobId) -> Option<ExportTargetId> {
        self.entries
            .iter()
            .find(|(_, j)| j == job)
            .map(|(target, _)| *target)
    }

    /// Job ids in submission order
    pub fn job_ids(&self) -> impl Iterator<Item = &JobId> {
        self.entries.iter().map(|(_, job)| job)
    }

    /// Target and job pairs in submission order
    pub fn iter(&self) -> impl Iterator<Item = &(ExportTargetId, JobId)> {
        self.entries.iter()
    }

    /// Number of submitted jobs
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no job was submitted
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(ExportTargetId, JobId)> for SubmissionMap {
    fn from_iter<I: IntoIterator<Item = (ExportTargetId, JobId)>>(iter: I) -> Self {
        let mut map = SubmissionMap::new();
        for (target, job) in iter {
            map.insert(target, job);
        }
        map
    }
}

/// Result of a submission batch
#[derive(Debug, Clone, Default)]
pub struct Submission {
    /// Accepted jobs
    pub jobs: SubmissionMap,

    /// The batch was cut short by a shutdown signal
    pub interrupted: bool,
}

/// Submits export requests for a list of surveys
pub struct JobSubmitter {
    api: Arc<dyn ExportApi>,
    delay: Duration,
    shutdown: Shutdown,
}

impl JobSubmitter {
    /// Create a submitter pausing `submission_delay_ms` after each success
    pub fn new(api: Arc<dyn ExportApi>, config: &SurveyFilterConfig, shutdown: Shutdown) -> Self {
        Self {
            api,
            delay: Duration::from_millis(config.submission_delay_ms),
            shutdown,
        }
    }

    /// Request one export per survey
    ///
    /// # Errors
    ///
    /// Only authentication failures are returned; every other failure is
    /// recorded in `report` as an `export_request` failure.
    pub async fn submit(
        &self,
        surveys: &[Survey],
        request: &ExportRequest,
        report: &mut SessionReport,
    ) -> Result<Submission> {
        let mut submission = Submission::default();

        tracing::info!(
            surveys = surveys.len(),
            date_from = request.date_from,
            date_to = request.date_to,
            format = %request.format,
            "Submitting export requests"
        );

        for survey in surveys {
            let target = survey.platform_form_id;

            if self.shutdown.is_requested() {
                submission.interrupted = true;
                break;
            }

            if submission.jobs.contains_target(target) {
                tracing::warn!(target_id = %target, "Duplicate export target, skipping");
                continue;
            }

            let result = match self
                .shutdown
                .run(self.api.request_export(target, request))
                .await
            {
                Some(result) => result,
                None => {
                    submission.interrupted = true;
                    break;
                }
            };

            match result {
                Ok(job) => {
                    tracing::info!(
                        target_id = %target,
                        survey = %survey.display_name,
                        job_id = %job,
                        "Export requested"
                    );
                    submission.jobs.insert(target, job);

                    if !self.delay.is_zero() && self.shutdown.sleep(self.delay).await {
                        submission.interrupted = true;
                        break;
                    }
                }
                Err(e @ ExporterError::Authentication(_)) => return Err(e),
                Err(e) => {
                    crate::log_recorded_failure!(FailureStage::ExportRequest, target, e);
                    report.add_failure(FailureRecord::new(
                        FailureStage::ExportRequest,
                        target,
                        e.to_string(),
                    ));
                }
            }
        }

        if submission.interrupted {
            crate::log_stage_interrupted!("submission", submission.jobs.len());
        } else {
            tracing::info!(
                submitted = submission.jobs.len(),
                rejected = surveys.len().saturating_sub(submission.jobs.len()),
                "Export requests submitted"
            );
        }

        Ok(submission)
    }
}
