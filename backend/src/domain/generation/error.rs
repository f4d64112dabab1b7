//! Failure taxonomy of the generation pipeline and its mapping onto the
//! transport-agnostic [`Error`].

use serde_json::{Value, json};

use crate::domain::credits::LedgerGuardError;
use crate::domain::ports::{
    CreditLedgerError, GenerationBackendError, GenerationOutcome, HistoryRepositoryError,
};
use crate::domain::{Credits, Error, ErrorCode, GenerationCost, UserId};

use super::UnrecognizedResponseShape;

const GENERATION_FAILED: &str = "Generation failed";

/// Why a generation did not produce a result.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GenerationError {
    /// The request carried no image bytes.
    #[error("No image file uploaded")]
    MissingUpload,
    /// The balance cannot pay for the generation.
    #[error("Insufficient credits (Minimum {cost} required)")]
    InsufficientCredits {
        balance: Credits,
        cost: GenerationCost,
    },
    /// The authenticated identity has no balance.
    #[error("no credit balance recorded for user {user_id}")]
    UnknownAccount { user_id: UserId },
    /// The upstream could not be reached or answered with an error status.
    #[error("upstream request failed: {message}")]
    UpstreamTransport {
        message: String,
        details: Option<Value>,
    },
    /// The upstream exceeded the time budget.
    #[error("upstream timed out: {message}")]
    UpstreamTimeout { message: String },
    /// The upstream answered with no recognisable image.
    #[error(transparent)]
    UnrecognizedResponseShape(#[from] UnrecognizedResponseShape),
    /// A store failed; the balance may already have been charged.
    #[error("persistence failed: {message}")]
    PersistenceFailure { message: String },
}

impl GenerationError {
    /// Metrics outcome for this failure.
    pub fn outcome(&self) -> GenerationOutcome {
        match self {
            Self::MissingUpload => GenerationOutcome::MissingUpload,
            Self::InsufficientCredits { .. } => GenerationOutcome::InsufficientCredits,
            Self::UnknownAccount { .. } => GenerationOutcome::UnknownAccount,
            Self::UpstreamTransport { .. } => GenerationOutcome::UpstreamFailed,
            Self::UpstreamTimeout { .. } => GenerationOutcome::UpstreamTimedOut,
            Self::UnrecognizedResponseShape(_) => GenerationOutcome::UnrecognizedResponse,
            Self::PersistenceFailure { .. } => GenerationOutcome::PersistenceFailed,
        }
    }
}

impl From<LedgerGuardError> for GenerationError {
    fn from(value: LedgerGuardError) -> Self {
        match value {
            LedgerGuardError::Insufficient { balance, cost } => {
                Self::InsufficientCredits { balance, cost }
            }
            LedgerGuardError::UnknownAccount { user_id } => Self::UnknownAccount { user_id },
            LedgerGuardError::Ledger(error) => error.into(),
        }
    }
}

impl From<CreditLedgerError> for GenerationError {
    fn from(value: CreditLedgerError) -> Self {
        Self::PersistenceFailure {
            message: value.to_string(),
        }
    }
}

impl From<HistoryRepositoryError> for GenerationError {
    fn from(value: HistoryRepositoryError) -> Self {
        Self::PersistenceFailure {
            message: value.to_string(),
        }
    }
}

impl From<GenerationBackendError> for GenerationError {
    fn from(value: GenerationBackendError) -> Self {
        match value {
            GenerationBackendError::Timeout { message } => Self::UpstreamTimeout { message },
            GenerationBackendError::Transport { ref message } => Self::UpstreamTransport {
                message: message.clone(),
                details: None,
            },
            GenerationBackendError::Rejected { status, ref body } => Self::UpstreamTransport {
                message: value.to_string(),
                details: Some(json!({ "status": status, "body": body })),
            },
        }
    }
}

impl From<GenerationError> for Error {
    fn from(value: GenerationError) -> Self {
        match value {
            GenerationError::MissingUpload => Error::invalid_request(value.to_string()),
            GenerationError::InsufficientCredits { balance, cost } => {
                Error::insufficient_credits(value.to_string())
                    .with_details(json!({ "balance": balance, "cost": cost.value() }))
            }
            GenerationError::UnknownAccount { .. } => {
                Error::internal(GENERATION_FAILED).with_cause(value.to_string())
            }
            GenerationError::UpstreamTransport { message, details } => {
                let error =
                    Error::new(ErrorCode::UpstreamUnavailable, GENERATION_FAILED).with_cause(message);
                match details {
                    Some(details) => error.with_details(details),
                    None => error,
                }
            }
            GenerationError::UpstreamTimeout { message } => {
                Error::new(ErrorCode::UpstreamTimeout, GENERATION_FAILED).with_cause(message)
            }
            GenerationError::UnrecognizedResponseShape(shape) => {
                Error::new(ErrorCode::UnrecognizedResponse, GENERATION_FAILED)
                    .with_cause(shape.to_string())
                    .with_details(json!({ "keysReceived": shape.observed_keys() }))
            }
            GenerationError::PersistenceFailure { message } => {
                Error::internal(GENERATION_FAILED).with_cause(message)
            }
        }
    }
}
