//! Credit-metered headshot generation gateway.
//!
//! - `domain`: types, ports and the generation orchestrator
//! - `inbound`: actix-web HTTP adapter
//! - `outbound`: upstream client, persistence, identity and metrics adapters

pub mod config;
pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use domain::TraceId;
pub use middleware::Trace;
