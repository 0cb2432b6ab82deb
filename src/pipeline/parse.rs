//! Parsing-service client: statement upload and per-job result retrieval.
//!
//! The remote service parses an uploaded PDF asynchronously: `submit` returns
//! an opaque job id immediately, and results (text, page manifest, page
//! images) become retrievable once the job completes. Until then the result
//! endpoints answer 404, which this module surfaces as
//! [`TextResult::Pending`] so the poll loop in [`crate::pipeline::poll`] can
//! decide how long to keep waiting — no retry policy lives here.
//!
//! Everything network-facing hides behind [`ParseService`] so the formatter
//! and its tests can run against an in-memory fake.

use crate::config::PipelineConfig;
use crate::error::ExtratoError;
use crate::pipeline::images::PageManifest;
use async_trait::async_trait;
use reqwest::{multipart, StatusCode};
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use tracing::{debug, info};

/// Environment variable holding the parsing-service bearer credential.
pub const API_KEY_VAR: &str = "LLAMA_CLOUD_API_KEY";

/// Opaque identifier of one parse job, valid for the duration of one upload.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome of a single text-result request.
#[derive(Debug, Clone, PartialEq)]
pub enum TextResult {
    /// The job finished; here is the extracted statement text.
    Ready(String),
    /// The job is still processing — ask again later.
    Pending,
}

/// The remote document-parsing service, seen from the pipeline.
///
/// One method per endpoint the pipeline consumes. Implemented by
/// [`LlamaParseClient`] for the real service and by in-memory fakes in the
/// integration tests.
#[async_trait]
pub trait ParseService: Send + Sync {
    /// Upload one statement PDF; returns the job id tracking its parse.
    async fn submit(&self, file: Vec<u8>, file_name: &str) -> Result<JobId, ExtratoError>;

    /// Fetch the job's extracted text, or `Pending` while it processes.
    async fn text_result(&self, job: &JobId) -> Result<TextResult, ExtratoError>;

    /// Fetch the job's page/image manifest.
    async fn page_manifest(&self, job: &JobId) -> Result<PageManifest, ExtratoError>;

    /// Download one page image by manifest name.
    async fn page_image(&self, job: &JobId, name: &str) -> Result<Vec<u8>, ExtratoError>;
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct TextPayload {
    text: String,
}

/// HTTP client for the cloud parsing service.
///
/// Holds the bearer credential and the fixed upload options (page cap, mode
/// flags) from [`PipelineConfig`]; every request carries the credential, so a
/// missing key is caught once at construction rather than on the Nth call of
/// a batch.
#[derive(Debug)]
pub struct LlamaParseClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    max_pages: u32,
    premium_mode: bool,
    fast_mode: bool,
}

impl LlamaParseClient {
    /// Build a client with an explicit credential.
    pub fn new(api_key: impl Into<String>, config: &PipelineConfig) -> Result<Self, ExtratoError> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(ExtratoError::MissingCredential {
                var: API_KEY_VAR.to_string(),
            });
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()
            .map_err(|e| ExtratoError::Internal(format!("http client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            api_key,
            max_pages: config.max_pages,
            premium_mode: config.premium_mode,
            fast_mode: config.fast_mode,
        })
    }

    /// Build a client with the credential from `LLAMA_CLOUD_API_KEY`.
    pub fn from_env(config: &PipelineConfig) -> Result<Self, ExtratoError> {
        let api_key = std::env::var(API_KEY_VAR)
            .ok()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ExtratoError::MissingCredential {
                var: API_KEY_VAR.to_string(),
            })?;
        Self::new(api_key, config)
    }

    fn job_url(&self, job: &JobId, result: &str) -> String {
        format!(
            "{}/api/v1/parsing/job/{}/result/{}",
            self.base_url, job, result
        )
    }

    /// First 200 chars of an error body, for diagnostics without log spam.
    async fn error_detail(response: reqwest::Response) -> String {
        match response.text().await {
            Ok(body) if !body.is_empty() => body.chars().take(200).collect(),
            _ => "no response body".to_string(),
        }
    }
}

#[async_trait]
impl ParseService for LlamaParseClient {
    async fn submit(&self, file: Vec<u8>, file_name: &str) -> Result<JobId, ExtratoError> {
        let url = format!("{}/api/v1/parsing/upload", self.base_url);
        info!("Submitting '{}' ({} bytes) to parser", file_name, file.len());

        let part = multipart::Part::bytes(file)
            .file_name(file_name.to_string())
            .mime_str("application/pdf")
            .map_err(|e| ExtratoError::Internal(format!("multipart part: {e}")))?;

        let form = multipart::Form::new()
            .part("file", part)
            .text("max_pages", self.max_pages.to_string())
            .text("premium_mode", self.premium_mode.to_string())
            .text("fast_mode", self.fast_mode.to_string());

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ExtratoError::Submission {
                status: 0,
                detail: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExtratoError::Submission {
                status: status.as_u16(),
                detail: Self::error_detail(response).await,
            });
        }

        let upload: UploadResponse =
            response.json().await.map_err(|e| ExtratoError::Submission {
                status: status.as_u16(),
                detail: format!("unreadable upload response: {e}"),
            })?;

        debug!("Parse job accepted: {}", upload.id);
        Ok(JobId::new(upload.id))
    }

    async fn text_result(&self, job: &JobId) -> Result<TextResult, ExtratoError> {
        let response = self
            .http
            .get(self.job_url(job, "text"))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| ExtratoError::Retrieval {
                resource: "text result".into(),
                detail: e.to_string(),
            })?;

        // 404 means "still processing", not "gone".
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(TextResult::Pending);
        }

        let status = response.status();
        if !status.is_success() {
            return Err(ExtratoError::Retrieval {
                resource: "text result".into(),
                detail: format!("HTTP {status}: {}", Self::error_detail(response).await),
            });
        }

        let payload: TextPayload =
            response.json().await.map_err(|e| ExtratoError::Retrieval {
                resource: "text result".into(),
                detail: format!("unreadable text payload: {e}"),
            })?;

        Ok(TextResult::Ready(payload.text))
    }

    async fn page_manifest(&self, job: &JobId) -> Result<PageManifest, ExtratoError> {
        let response = self
            .http
            .get(self.job_url(job, "json"))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| ExtratoError::Retrieval {
                resource: "page manifest".into(),
                detail: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExtratoError::Retrieval {
                resource: "page manifest".into(),
                detail: format!("HTTP {status}: {}", Self::error_detail(response).await),
            });
        }

        response.json().await.map_err(|e| ExtratoError::Retrieval {
            resource: "page manifest".into(),
            detail: format!("unreadable manifest: {e}"),
        })
    }

    async fn page_image(&self, job: &JobId, name: &str) -> Result<Vec<u8>, ExtratoError> {
        let response = self
            .http
            .get(self.job_url(job, &format!("image/{name}")))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| ExtratoError::Retrieval {
                resource: format!("page image '{name}'"),
                detail: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExtratoError::Retrieval {
                resource: format!("page image '{name}'"),
                detail: format!("HTTP {status}: {}", Self::error_detail(response).await),
            });
        }

        let bytes = response.bytes().await.map_err(|e| ExtratoError::Retrieval {
            resource: format!("page image '{name}'"),
            detail: e.to_string(),
        })?;

        Ok(bytes.to_vec())
    }
}
