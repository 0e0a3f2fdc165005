//! Authenticated gateway to the platform's survey and export endpoints
//!
//! [`ExportApi`] is the seam the export pipeline depends on; [`VibrentClient`]
//! implements it over HTTP. Every call obtains a bearer token from the
//! [`TokenProvider`] first. Calls are not retried.

use super::auth::TokenProvider;
use super::models::ExportIdResponse;
use crate::config::{ApiConfig, AuthConfig, ClientCredentials, EndpointConfig};
use crate::domain::{
    ApiError, ExportRequest, ExportStatus, ExportTargetId, ExporterError, JobId, Result, Survey,
};
use async_trait::async_trait;
use reqwest::header::CONTENT_DISPOSITION;
use reqwest::{Client, RequestBuilder, Response};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use url::Url;

/// Operations the export pipeline needs from the platform
#[async_trait]
pub trait ExportApi: Send + Sync {
    /// List all surveys visible to the client
    ///
    /// Rows that cannot be decoded are skipped with a warning.
    async fn list_surveys(&self) -> Result<Vec<Survey>>;

    /// Ask the platform to start an export job for `target`
    async fn request_export(&self, target: ExportTargetId, request: &ExportRequest)
        -> Result<JobId>;

    /// Current status of an export job
    async fn get_status(&self, job: &JobId) -> Result<ExportStatus>;

    /// Download the artifact of a completed job into `dest_dir`
    ///
    /// Returns the path of the written file.
    async fn download(&self, job: &JobId, dest_dir: &Path) -> Result<PathBuf>;
}

/// HTTP implementation of [`ExportApi`]
pub struct VibrentClient {
    client: Client,
    base_url: Url,
    tokens: TokenProvider,
}

impl VibrentClient {
    /// Create a client for one platform environment
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the base URL is invalid or an HTTP
    /// client cannot be built.
    pub fn new(
        endpoints: &EndpointConfig,
        credentials: ClientCredentials,
        auth: &AuthConfig,
        api: &ApiConfig,
    ) -> Result<Self> {
        let base_url = Url::parse(&endpoints.base_url).map_err(|e| {
            ExporterError::Configuration(format!("Invalid base_url '{}': {e}", endpoints.base_url))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ExporterError::Configuration(format!(
                "base_url '{}' cannot be used as a base URL",
                endpoints.base_url
            )));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(api.timeout_seconds))
            .build()
            .map_err(|e| {
                ExporterError::Configuration(format!("Failed to build API HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            base_url,
            tokens: TokenProvider::new(endpoints.token_url.clone(), credentials, auth)?,
        })
    }

    /// Build `{base}/{segments...}`, percent-encoding each segment
    fn endpoint_url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Attach the bearer token, send, and map failures to [`ApiError`]
    async fn send(&self, request: RequestBuilder, endpoint: &str) -> Result<Response> {
        let token = self.tokens.get_valid_token().await?;

        let response = request
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| ApiError::Transport {
                endpoint: endpoint.to_string(),
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                endpoint: endpoint.to_string(),
                status,
                body,
            }
            .into());
        }

        Ok(response)
    }

    async fn json_body(response: Response, endpoint: &str) -> Result<Value> {
        response.json::<Value>().await.map_err(|e| {
            ApiError::InvalidResponse {
                endpoint: endpoint.to_string(),
                message: e.to_string(),
            }
            .into()
        })
    }

    async fn write_body(mut response: Response, part: &Path, endpoint: &str) -> Result<()> {
        let io_error = |e: std::io::Error| ApiError::Io {
            path: part.to_path_buf(),
            message: e.to_string(),
        };

        let mut file = tokio::fs::File::create(part).await.map_err(io_error)?;
        while let Some(chunk) = response.chunk().await.map_err(|e| ApiError::Transport {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        })? {
            file.write_all(&chunk).await.map_err(io_error)?;
        }
        file.flush().await.map_err(io_error)?;
        file.sync_all().await.map_err(io_error)?;
        Ok(())
    }
}

#[async_trait]
impl ExportApi for VibrentClient {
    async fn list_surveys(&self) -> Result<Vec<Survey>> {
        let endpoint = "/api/ext/forms";
        let url = self.endpoint_url(&["api", "ext", "forms"]);

        let response = self.send(self.client.get(url), endpoint).await?;
        let body = Self::json_body(response, endpoint).await?;

        let rows = body.as_array().ok_or_else(|| ApiError::InvalidResponse {
            endpoint: endpoint.to_string(),
            message: "expected a JSON array of surveys".to_string(),
        })?;

        let mut surveys = Vec::with_capacity(rows.len());
        for (index, row) in rows.iter().enumerate() {
            match Survey::from_value(row) {
                Ok(survey) => surveys.push(survey),
                Err(e) => {
                    tracing::warn!(index = index, error = %e, "Skipping undecodable survey row");
                }
            }
        }

        tracing::info!(count = surveys.len(), "Fetched survey list");
        Ok(surveys)
    }

    async fn request_export(
        &self,
        target: ExportTargetId,
        request: &ExportRequest,
    ) -> Result<JobId> {
        let endpoint = format!("/api/ext/export/survey/{target}/request");
        let target_segment = target.to_string();
        let url = self.endpoint_url(&["api", "ext", "export", "survey", &target_segment, "request"]);

        let response = self
            .send(self.client.post(url).json(request), &endpoint)
            .await?;

        let body: ExportIdResponse = response.json().await.map_err(|e| ApiError::InvalidResponse {
            endpoint: endpoint.clone(),
            message: e.to_string(),
        })?;

        let job = body
            .export_id
            .and_then(|id| JobId::new(id).ok())
            .ok_or_else(|| ApiError::InvalidResponse {
                endpoint: endpoint.clone(),
                message: "response has no exportId".to_string(),
            })?;

        tracing::debug!(target_id = %target, export_id = %job, "Export requested");
        Ok(job)
    }

    async fn get_status(&self, job: &JobId) -> Result<ExportStatus> {
        let endpoint = format!("/api/ext/export/status/{job}");
        let url = self.endpoint_url(&["api", "ext", "export", "status", job.as_str()]);

        let response = self.send(self.client.get(url), &endpoint).await?;
        let body = Self::json_body(response, &endpoint).await?;

        ExportStatus::from_value(&body, job).map_err(|e| {
            ApiError::InvalidResponse {
                endpoint,
                message: e.to_string(),
            }
            .into()
        })
    }

    async fn download(&self, job: &JobId, dest_dir: &Path) -> Result<PathBuf> {
        let endpoint = format!("/api/ext/export/download/{job}");
        let url = self.endpoint_url(&["api", "ext", "export", "download", job.as_str()]);

        let response = self.send(self.client.get(url), &endpoint).await?;

        let disposition = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok());
        let file_name = download_file_name(job, disposition);

        tokio::fs::create_dir_all(dest_dir)
            .await
            .map_err(|e| ApiError::Io {
                path: dest_dir.to_path_buf(),
                message: e.to_string(),
            })?;

        let final_path = dest_dir.join(&file_name);
        let part_path = dest_dir.join(format!("{file_name}.part"));

        if let Err(e) = Self::write_body(response, &part_path, &endpoint).await {
            let _ = tokio::fs::remove_file(&part_path).await;
            return Err(e);
        }

        tokio::fs::rename(&part_path, &final_path)
            .await
            .map_err(|e| ApiError::Io {
                path: final_path.clone(),
                message: e.to_string(),
            })?;

        tracing::debug!(export_id = %job, path = %final_path.display(), "Export downloaded");
        Ok(final_path)
    }
}

/// Local file name of a downloaded artifact
///
/// `{job}_{filename}` when the `Content-Disposition` header names a file,
/// otherwise `export_{job}.zip`. Only the final path component of the
/// announced name is used.
pub fn download_file_name(job: &JobId, content_disposition: Option<&str>) -> String {
    let announced = content_disposition
        .and_then(|header| header.split_once("filename="))
        .map(|(_, rest)| rest.split(';').next().unwrap_or_default())
        .map(|name| name.trim().trim_matches('"').trim())
        .and_then(|name| name.rsplit(['/', '\\']).next())
        .filter(|name| !name.is_empty() && *name != "." && *name != "..");

    match announced {
        Some(name) => format!("{job}_{name}"),
        None => format!("export_{job}.zip"),
    }
}
