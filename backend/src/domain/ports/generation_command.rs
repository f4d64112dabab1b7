//! Driving port for the generation use case.
//!
//! Inbound adapters hand over the authenticated identity and the staged
//! upload; the implementation owns the upload from then on and releases it
//! before returning.

use async_trait::async_trait;

use crate::domain::{Credits, Error, ImageReference, StagedUpload, UserId};

/// One generation attempt.
#[derive(Debug)]
pub struct GenerateRequest {
    pub user_id: UserId,
    /// `None` when the client sent no image.
    pub upload: Option<StagedUpload>,
}

/// Successful generation: the image and the balance after charging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateResponse {
    pub image_reference: ImageReference,
    pub credits_remaining: Credits,
}

/// Domain use-case port for running a generation.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GenerationCommand: Send + Sync {
    /// Run the full credit-check, forward, charge and record pipeline.
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse, Error>;
}

/// Fixture command that succeeds for every request carrying an image.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureGenerationCommand;

#[async_trait]
impl GenerationCommand for FixtureGenerationCommand {
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse, Error> {
        let GenerateRequest { upload, .. } = request;
        let Some(mut upload) = upload else {
            return Err(Error::invalid_request("No image file uploaded"));
        };
        upload
            .release()
            .map_err(|err| Error::internal(format!("failed to release fixture upload: {err}")))?;
        let image_reference = ImageReference::new(super::FIXTURE_IMAGE_URL)
            .map_err(|err| Error::internal(format!("invalid fixture reference: {err}")))?;
        Ok(GenerateResponse {
            image_reference,
            credits_remaining: Credits::new(75),
        })
    }
}
