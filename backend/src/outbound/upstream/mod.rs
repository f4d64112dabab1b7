//! Adapters for the remote image transformation service.

mod http_backend;

pub use http_backend::{HttpGenerationBackend, IMAGE_FIELD_NAME};
