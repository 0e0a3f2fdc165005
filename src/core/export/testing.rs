//! Scripted [`ExportApi`] used by the pipeline unit tests

use crate::adapters::vibrent::ExportApi;
use crate::domain::{
    ApiError, ExportRequest, ExportStatus, ExportTargetId, ExporterError, JobId, JobStatus,
    Result, Survey,
};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

/// Scripted answer of one call
#[derive(Debug, Clone)]
pub(crate) enum Reply<T> {
    Ok(T),
    Status(u16),
    Auth,
}

impl<T> Reply<T> {
    fn into_result(self, endpoint: &str) -> Result<T> {
        match self {
            Reply::Ok(value) => Ok(value),
            Reply::Status(status) => Err(ApiError::Status {
                endpoint: endpoint.to_string(),
                status,
                body: "scripted failure".to_string(),
            }
            .into()),
            Reply::Auth => Err(ExporterError::Authentication(
                "scripted token failure".to_string(),
            )),
        }
    }
}

pub(crate) fn job(id: &str) -> JobId {
    JobId::new(id).unwrap()
}

pub(crate) fn survey(target: i64) -> Survey {
    Survey::new(target, format!("s{target}"), format!("Survey {target}"), ExportTargetId::new(target))
}

/// Fake platform: unscripted targets get job `job-{target}`, unscripted jobs
/// complete on their first poll and download as an empty archive.
#[derive(Default)]
pub(crate) struct ScriptedApi {
    surveys: Mutex<Option<Reply<Vec<Survey>>>>,
    exports: Mutex<HashMap<i64, Reply<String>>>,
    statuses: Mutex<HashMap<String, VecDeque<Reply<JobStatus>>>>,
    downloads: Mutex<HashMap<String, Reply<Vec<u8>>>>,
    request_delay: Option<Duration>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedApi {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_surveys(self, surveys: Vec<Survey>) -> Self {
        *self.surveys.lock().unwrap() = Some(Reply::Ok(surveys));
        self
    }

    pub(crate) fn with_survey_reply(self, reply: Reply<Vec<Survey>>) -> Self {
        *self.surveys.lock().unwrap() = Some(reply);
        self
    }

    pub(crate) fn with_export(self, target: i64, reply: Reply<String>) -> Self {
        self.exports.lock().unwrap().insert(target, reply);
        self
    }

    /// Successive poll answers for `job`; the last one repeats
    pub(crate) fn with_statuses(self, job: &str, replies: Vec<Reply<JobStatus>>) -> Self {
        self.statuses
            .lock()
            .unwrap()
            .insert(job.to_string(), replies.into());
        self
    }

    pub(crate) fn with_download(self, job: &str, reply: Reply<Vec<u8>>) -> Self {
        self.downloads.lock().unwrap().insert(job.to_string(), reply);
        self
    }

    pub(crate) fn with_request_delay(mut self, delay: Duration) -> Self {
        self.request_delay = Some(delay);
        self
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn calls_with_prefix(&self, prefix: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.starts_with(prefix))
            .collect()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl ExportApi for ScriptedApi {
    async fn list_surveys(&self) -> Result<Vec<Survey>> {
        self.record("list".to_string());
        let reply = self
            .surveys
            .lock()
            .unwrap()
            .clone()
            .unwrap_or(Reply::Ok(Vec::new()));
        reply.into_result("/api/ext/forms")
    }

    async fn request_export(&self, target: ExportTargetId, _request: &ExportRequest) -> Result<JobId> {
        self.record(format!("request:{target}"));
        if let Some(delay) = self.request_delay {
            tokio::time::sleep(delay).await;
        }
        let reply = self
            .exports
            .lock()
            .unwrap()
            .get(&target.value())
            .cloned()
            .unwrap_or_else(|| Reply::Ok(format!("job-{target}")));
        reply
            .into_result("/api/ext/export/survey/request")
            .map(|id| JobId::new(id).unwrap())
    }

    async fn get_status(&self, job: &JobId) -> Result<ExportStatus> {
        self.record(format!("status:{job}"));
        let reply = {
            let mut statuses = self.statuses.lock().unwrap();
            match statuses.get_mut(job.as_str()) {
                Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
                Some(queue) => queue.front().cloned().unwrap_or(Reply::Ok(JobStatus::Completed)),
                None => Reply::Ok(JobStatus::Completed),
            }
        };
        reply.into_result("/api/ext/export/status").map(|status| {
            let mut export_status = ExportStatus::new(job.clone(), status.clone());
            if status == JobStatus::Failed {
                export_status = export_status.with_failure_reason("generation failed");
            }
            export_status
        })
    }

    async fn download(&self, job: &JobId, dest_dir: &Path) -> Result<PathBuf> {
        self.record(format!("download:{job}"));
        let reply = self
            .downloads
            .lock()
            .unwrap()
            .get(job.as_str())
            .cloned()
            .unwrap_or(Reply::Ok(Vec::new()));
        let bytes = reply.into_result("/api/ext/export/download")?;
        tokio::fs::create_dir_all(dest_dir).await?;
        let path = dest_dir.join(format!("export_{job}.zip"));
        tokio::fs::write(&path, bytes).await?;
        Ok(path)
    }
}
