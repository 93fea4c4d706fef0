//! HTTP client for the submission, preview and task-status endpoints
//!
//! [`SubmissionClient`] performs exactly one request per call and never retries.
//! It also implements [`StatusFetcher`], so it can drive a [`TaskPoller`]
//! directly.

use crate::config::Config;
use crate::error::{Error, Result, SubmissionError, TransportError};
use crate::poller::{StatusFetcher, TaskPoller};
use crate::progress::ProgressSink;
use crate::types::{SourceFile, TaskHandle, TaskStatus};
use crate::upload::{PreviewResponse, UploadBundle, UploadFile};
use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::multipart::Form;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Client for the optimizer front end
#[derive(Clone, Debug)]
pub struct SubmissionClient {
    http: reqwest::Client,
    config: Config,
    submit_url: Url,
    preview_url: Url,
    status_url: Url,
}

impl SubmissionClient {
    /// Build a client with its own connection pool and the configured request timeout
    pub fn new(config: Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| Error::Config {
                message: format!("failed to build HTTP client: {e}"),
                key: None,
            })?;
        Self::with_http_client(config, http)
    }

    /// Build a client around an existing `reqwest::Client`
    pub fn with_http_client(config: Config, http: reqwest::Client) -> Result<Self> {
        config.validate()?;
        let base = config.base()?;
        if base.cannot_be_a_base() {
            return Err(Error::Config {
                message: format!("base URL {} cannot carry paths", config.base_url),
                key: Some("base_url".to_string()),
            });
        }

        let submit_url = base.join(&config.endpoints.submit_path)?;
        let preview_url = base.join(&config.endpoints.preview_path)?;
        let status_url = base.join(&config.endpoints.status_path)?;

        Ok(Self {
            http,
            config,
            submit_url,
            preview_url,
            status_url,
        })
    }

    /// Active configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Validate `bundle`, then submit it and return the task it started
    ///
    /// Validation failures return before any request is made. On a non-success
    /// status the server's `detail` message is used when present.
    pub async fn submit(&self, bundle: &UploadBundle) -> Result<TaskHandle> {
        bundle.validate(&self.config)?;

        let form = bundle.to_form().map_err(|e| SubmissionError {
            status: None,
            message: format!("could not encode upload: {e}"),
        })?;

        tracing::info!(url = %self.submit_url, "submitting timetable inputs");

        let response = self
            .http
            .post(self.submit_url.clone())
            .multipart(form)
            .send()
            .await
            .map_err(|e| SubmissionError {
                status: None,
                message: e.to_string(),
            })?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| SubmissionError {
            status: Some(status.as_u16()),
            message: format!("failed to read response: {e}"),
        })?;

        if !status.is_success() {
            let message = error_message(status, &body);
            tracing::warn!(status = status.as_u16(), error = %message, "submission rejected");
            return Err(SubmissionError {
                status: Some(status.as_u16()),
                message,
            }
            .into());
        }

        let handle = parse_task_handle(&body).ok_or_else(|| SubmissionError {
            status: Some(status.as_u16()),
            message: "response did not contain a task id".to_string(),
        })?;

        tracing::info!(task_id = %handle, "submission accepted");
        Ok(handle)
    }

    /// Upload one file to the preview endpoint and return its parsed preview
    ///
    /// Server-side parse problems come back in [`PreviewResponse::error`].
    pub async fn preview(&self, file: SourceFile, upload: &UploadFile) -> Result<PreviewResponse> {
        let part = upload.to_part().map_err(TransportError::from);
        let form = Form::new()
            .part("file", part.map_err(|e| preview_error(file, e))?)
            .text("file_type", file.preview_key());

        let response = self
            .http
            .post(self.preview_url.clone())
            .multipart(form)
            .send()
            .await
            .map_err(|e| preview_error(file, e.into()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| preview_error(file, e.into()))?;

        // Parse failures are reported in-body, sometimes alongside an error status.
        let parsed = serde_json::from_slice::<PreviewResponse>(&body)
            .ok()
            .filter(|p| status.is_success() || p.error.is_some());
        if let Some(preview) = parsed {
            tracing::debug!(
                file = file.preview_key(),
                rows = preview.preview.len(),
                extra = preview.extra_cols.len(),
                missing = preview.missing_cols.len(),
                "preview received"
            );
            return Ok(preview);
        }

        let source = if status.is_success() {
            TransportError::Decode("preview body is not valid JSON".to_string())
        } else {
            TransportError::Status {
                status: status.as_u16(),
                message: error_message(status, &body),
            }
        };
        Err(preview_error(file, source))
    }

    /// Query the task-status endpoint once
    pub async fn fetch_status(
        &self,
        task: &TaskHandle,
    ) -> std::result::Result<TaskStatus, TransportError> {
        let url = self.task_status_url(task);
        let response = self.http.get(url).send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                message: error_message(status, &body),
            });
        }

        serde_json::from_slice(&body).map_err(|e| TransportError::Decode(e.to_string()))
    }

    /// Poll `task` with the configured interval and ceiling
    pub async fn poll_until_done<S>(
        &self,
        task: &TaskHandle,
        sink: &mut S,
        cancel: &CancellationToken,
    ) -> Result<TaskStatus>
    where
        S: ProgressSink + ?Sized,
    {
        TaskPoller::from_config(&self.config.polling)
            .poll_until_done(task, self, sink, cancel)
            .await
    }

    fn task_status_url(&self, task: &TaskHandle) -> Url {
        let mut url = self.status_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(task.as_str());
        }
        url
    }
}

#[async_trait]
impl StatusFetcher for SubmissionClient {
    async fn fetch_status(
        &self,
        task: &TaskHandle,
    ) -> std::result::Result<TaskStatus, TransportError> {
        SubmissionClient::fetch_status(self, task).await
    }
}

fn preview_error(file: SourceFile, source: TransportError) -> Error {
    tracing::warn!(file = file.preview_key(), error = %source, "preview failed");
    Error::Preview { file, source }
}

/// Server `detail` if the body carries one, otherwise a message built from the status
fn error_message(status: StatusCode, body: &[u8]) -> String {
    let detail = serde_json::from_slice::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("detail").cloned());

    match detail {
        Some(serde_json::Value::String(s)) if !s.is_empty() => s,
        Some(serde_json::Value::Null) | None => format!("server returned {status}"),
        Some(other) => other.to_string(),
    }
}

/// Task id from a submission response: `task_id`, else `id`; string or integer
fn parse_task_handle(body: &[u8]) -> Option<TaskHandle> {
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;
    let id = value.get("task_id").or_else(|| value.get("id"))?;
    match id {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(TaskHandle::new(s.trim())),
        serde_json::Value::Number(n) => Some(TaskHandle::new(n.to_string())),
        _ => None,
    }
}
