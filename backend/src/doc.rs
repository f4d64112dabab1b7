//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers the generation, account and health endpoints together
//! with the bearer security scheme. Swagger UI serves it in debug builds.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::{Error, ErrorCode};
use crate::inbound::http::generate::{GenerationResponseBody, GenerationUpload};
use crate::inbound::http::users::{AccountBody, HistoryEntryBody};

/// Register the bearer token security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "bearerAuth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .description(Some("Signed account token"))
                    .build(),
            ),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Headshot gateway API",
        description = "Credit-metered headshot generation backed by an external compute service."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("bearerAuth" = [])),
    paths(
        crate::inbound::http::generate::create_generation,
        crate::inbound::http::users::current_user,
        crate::inbound::http::users::current_user_history,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        Error,
        ErrorCode,
        GenerationResponseBody,
        GenerationUpload,
        AccountBody,
        HistoryEntryBody
    )),
    tags(
        (name = "generate", description = "Image generation"),
        (name = "users", description = "Account balance and history"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
