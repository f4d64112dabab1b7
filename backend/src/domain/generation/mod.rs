//! Generation use case: response normalisation, failure taxonomy and the
//! orchestrating service.

mod error;
mod normalizer;
mod service;
mod stage;

pub use self::error::GenerationError;
pub use self::normalizer::{
    CanonicalResult, ResponseNormalizer, ShapeSniffingNormalizer, UnrecognizedResponseShape,
    UpstreamResult, normalize,
};
pub use self::service::{GenerationService, GenerationSettings};
pub use self::stage::GenerationStage;
