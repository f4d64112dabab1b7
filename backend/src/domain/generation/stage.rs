//! Pipeline stages, used as structured log fields.

use std::fmt;

/// Position of a request in the generation pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GenerationStage {
    Received,
    CreditChecked,
    Proxied,
    Normalized,
    Committed,
    Recorded,
    Responded,
    Failed,
}

impl GenerationStage {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::CreditChecked => "credit_checked",
            Self::Proxied => "proxied",
            Self::Normalized => "normalized",
            Self::Committed => "committed",
            Self::Recorded => "recorded",
            Self::Responded => "responded",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for GenerationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
