//! Generation API handler.
//!
//! ```text
//! POST /api/v1/generate/create  (multipart, image under field "image")
//! ```
//!
//! The image is streamed to the staging directory before the use case runs.
//! The use case itself runs on a spawned task so a client disconnect cannot
//! abandon a charge or leave the staged file behind.

use std::sync::Arc;

use actix_multipart::{Field, Multipart, MultipartError};
use actix_web::{post, web};
use futures_util::{StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::domain::ports::{GenerateRequest, GenerateResponse};
use crate::domain::{Credits, Error, StagedUpload, StagingError, TraceId, UploadStaging};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::BearerIdentity;
use crate::inbound::http::state::HttpState;

/// Multipart field carrying the uploaded image.
pub const IMAGE_FIELD: &str = "image";

const SUCCESS_MESSAGE: &str = "Headshot generated successfully";

/// Successful generation payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResponseBody {
    #[schema(example = "Headshot generated successfully")]
    pub message: String,
    /// Network locator or `data:` URI of the generated image.
    #[schema(example = "https://images.example.com/headshot.png")]
    pub image_reference: String,
    pub credits_remaining: Credits,
}

impl From<GenerateResponse> for GenerationResponseBody {
    fn from(value: GenerateResponse) -> Self {
        Self {
            message: SUCCESS_MESSAGE.to_owned(),
            image_reference: value.image_reference.into(),
            credits_remaining: value.credits_remaining,
        }
    }
}

/// Multipart body accepted by the generation endpoint.
#[derive(utoipa::ToSchema)]
#[allow(dead_code)]
pub struct GenerationUpload {
    /// Source image.
    #[schema(value_type = String, format = Binary)]
    image: Vec<u8>,
}

fn malformed_body(err: MultipartError) -> Error {
    Error::invalid_request("Malformed multipart body").with_cause(err.to_string())
}

fn staging_failure(err: StagingError) -> Error {
    match err {
        StagingError::Stream { .. } => {
            Error::invalid_request("Upload interrupted").with_cause(err.to_string())
        }
        StagingError::Prepare { .. } | StagingError::Write { .. } => {
            error!(error = %err, "failed to stage upload");
            Error::internal("Generation failed").with_cause(err.to_string())
        }
    }
}

async fn drain(mut field: Field) -> Result<(), Error> {
    while let Some(chunk) = field.next().await {
        chunk.map_err(malformed_body)?;
    }
    Ok(())
}

/// Stage the first `image` field; every other field is read and discarded.
async fn stage_image(
    staging: &UploadStaging,
    mut payload: Multipart,
) -> Result<Option<StagedUpload>, Error> {
    let mut upload = None;
    while let Some(field) = payload.try_next().await.map_err(malformed_body)? {
        if upload.is_some() || field.name() != Some(IMAGE_FIELD) {
            debug!(field = ?field.name(), "ignoring multipart field");
            drain(field).await?;
            continue;
        }
        let file_name = field
            .content_disposition()
            .and_then(|disposition| disposition.get_filename())
            .map(str::to_owned);
        let content_type = field.content_type().map(ToString::to_string);
        let staged = staging
            .stage(file_name, content_type, field.boxed_local())
            .await
            .map_err(staging_failure)?;
        upload = Some(staged);
    }
    Ok(upload)
}

/// Generate a headshot from the uploaded image and charge the caller.
#[utoipa::path(
    post,
    path = "/api/v1/generate/create",
    request_body(content = GenerationUpload, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Image generated and credits charged", body = GenerationResponseBody),
        (status = 400, description = "No image uploaded", body = Error),
        (status = 401, description = "Missing or invalid bearer token", body = Error),
        (status = 403, description = "Insufficient credits", body = Error),
        (status = 500, description = "Upstream, account or persistence failure", body = Error)
    ),
    tags = ["generate"],
    operation_id = "createGeneration",
    security(("bearerAuth" = []))
)]
#[post("/generate/create")]
pub async fn create_generation(
    state: web::Data<HttpState>,
    identity: BearerIdentity,
    payload: Multipart,
) -> ApiResult<web::Json<GenerationResponseBody>> {
    let upload = stage_image(&state.staging, payload).await?;
    let request = GenerateRequest {
        user_id: identity.into_user_id(),
        upload,
    };

    let generation = Arc::clone(&state.generation);
    let task = actix_web::rt::spawn(TraceId::propagate(async move {
        generation.generate(request).await
    }));
    let response = task.await.map_err(|err| {
        error!(error = %err, "generation task aborted");
        Error::internal("Generation failed").with_cause(err.to_string())
    })??;

    Ok(web::Json(response.into()))
}

#[cfg(test)]
#[path = "generate_tests.rs"]
mod tests;
