//! Port for recording generation outcomes.
//!
//! Keeps the orchestrator independent of any metrics backend. Recording is
//! best effort; callers log and ignore failures.

use async_trait::async_trait;

use super::define_port_error;

define_port_error! {
    /// Errors exposed when recording generation metrics.
    pub enum GenerationMetricsError {
        /// Metric exporter rejected the write.
        Export { message: String } => "generation metrics exporter failed: {message}",
    }
}

/// Terminal outcome of one generation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GenerationOutcome {
    Succeeded,
    MissingUpload,
    UnknownAccount,
    InsufficientCredits,
    UpstreamFailed,
    UpstreamTimedOut,
    UnrecognizedResponse,
    PersistenceFailed,
}

impl GenerationOutcome {
    /// Label value used by metric exporters.
    pub const fn as_label(self) -> &'static str {
        match self {
            Self::Succeeded => "succeeded",
            Self::MissingUpload => "missing_upload",
            Self::UnknownAccount => "unknown_account",
            Self::InsufficientCredits => "insufficient_credits",
            Self::UpstreamFailed => "upstream_failed",
            Self::UpstreamTimedOut => "upstream_timed_out",
            Self::UnrecognizedResponse => "unrecognized_response",
            Self::PersistenceFailed => "persistence_failed",
        }
    }
}

/// Metrics recording port for generation outcomes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GenerationMetrics: Send + Sync {
    /// Count one finished request.
    async fn record(&self, outcome: GenerationOutcome) -> Result<(), GenerationMetricsError>;
}

/// Metrics sink that discards every observation.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpGenerationMetrics;

#[async_trait]
impl GenerationMetrics for NoOpGenerationMetrics {
    async fn record(&self, _outcome: GenerationOutcome) -> Result<(), GenerationMetricsError> {
        Ok(())
    }
}
