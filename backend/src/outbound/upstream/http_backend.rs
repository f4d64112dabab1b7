//! Reqwest-backed generation backend.
//!
//! This adapter owns transport details only: the multipart request, the time
//! budget, status mapping and body decoding. Interpreting the decoded payload
//! is left to the domain normalizer.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, StatusCode, Url};
use serde_json::Value;
use tracing::debug;

use crate::domain::StagedUpload;
use crate::domain::generation::UpstreamResult;
use crate::domain::ports::{GenerationBackend, GenerationBackendError};

/// Multipart field carrying the image.
pub const IMAGE_FIELD_NAME: &str = "image";

const DEFAULT_FILE_NAME: &str = "upload";
const DEFAULT_USER_AGENT: &str = concat!("headshot-backend/", env!("CARGO_PKG_VERSION"));

/// Generation backend that POSTs the staged image to one endpoint.
pub struct HttpGenerationBackend {
    client: Client,
    endpoint: Url,
    timeout: Duration,
}

impl HttpGenerationBackend {
    /// Build an adapter whose requests fail after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(endpoint: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(DEFAULT_USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            endpoint,
            timeout,
        })
    }

    /// Endpoint requests are sent to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn build_form(&self, upload: &StagedUpload) -> Result<Form, GenerationBackendError> {
        let path = upload.path().ok_or_else(|| {
            GenerationBackendError::transport("staged upload was released before forwarding")
        })?;
        let file = tokio::fs::File::open(path).await.map_err(|error| {
            GenerationBackendError::transport(format!("failed to open staged upload: {error}"))
        })?;

        let mut part = Part::stream_with_length(Body::from(file), upload.size_bytes())
            .file_name(upload.file_name().unwrap_or(DEFAULT_FILE_NAME).to_owned());
        if let Some(content_type) = upload.content_type() {
            part = part.mime_str(content_type).map_err(|error| {
                GenerationBackendError::transport(format!("invalid upload content type: {error}"))
            })?;
        }
        Ok(Form::new().part(IMAGE_FIELD_NAME, part))
    }
}

#[async_trait]
impl GenerationBackend for HttpGenerationBackend {
    async fn forward(
        &self,
        upload: &StagedUpload,
    ) -> Result<UpstreamResult, GenerationBackendError> {
        let form = self.build_form(upload).await?;
        debug!(
            endpoint = %self.endpoint,
            size_bytes = upload.size_bytes(),
            timeout_secs = self.timeout.as_secs(),
            "forwarding upload"
        );

        let response = self
            .client
            .post(self.endpoint.clone())
            .multipart(form)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }

        Ok(UpstreamResult::new(decode_body(body.as_ref())))
    }
}

/// Parse a success body as JSON, falling back to the raw text.
fn decode_body(body: &[u8]) -> Value {
    serde_json::from_slice(body)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(body).trim().to_owned()))
}

fn map_transport_error(error: reqwest::Error) -> GenerationBackendError {
    if error.is_timeout() {
        GenerationBackendError::timeout(error.to_string())
    } else {
        GenerationBackendError::transport(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> GenerationBackendError {
    let details = serde_json::from_slice(body).unwrap_or_else(|_| Value::String(body_preview(body)));
    GenerationBackendError::rejected(status.as_u16(), details)
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}
