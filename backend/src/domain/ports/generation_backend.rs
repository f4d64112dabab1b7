//! Port for the remote image transformation service.
//!
//! The service is opaque: it accepts an image and answers with a payload whose
//! shape is interpreted later by the response normalizer. Adapters must not
//! retry on their own.

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::domain::StagedUpload;
use crate::domain::generation::UpstreamResult;

use super::define_port_error;

define_port_error! {
    /// Errors raised while forwarding an upload.
    pub enum GenerationBackendError {
        /// The request could not be sent or the reply could not be read.
        Transport { message: String } =>
            "upstream request failed: {message}",
        /// The time budget elapsed before a reply arrived.
        Timeout { message: String } =>
            "upstream timed out: {message}",
        /// The service answered with a non-success status.
        Rejected { status: u16, body: Value } =>
            "upstream rejected the request with status {status}",
    }
}

/// Port for forwarding a staged upload to the compute service.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Send the staged image and return the decoded reply.
    async fn forward(&self, upload: &StagedUpload)
    -> Result<UpstreamResult, GenerationBackendError>;
}

/// Fixture backend answering every request with the same image URL.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureGenerationBackend;

/// Image URL returned by [`FixtureGenerationBackend`].
pub const FIXTURE_IMAGE_URL: &str = "https://images.example.invalid/headshot.png";

#[async_trait]
impl GenerationBackend for FixtureGenerationBackend {
    async fn forward(
        &self,
        _upload: &StagedUpload,
    ) -> Result<UpstreamResult, GenerationBackendError> {
        Ok(UpstreamResult::new(json!({ "url": FIXTURE_IMAGE_URL })))
    }
}
