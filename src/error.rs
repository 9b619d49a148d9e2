//! Error taxonomy for the governance pipeline.
//!
//! Only `InputOutOfBounds`, `DocumentLike`, `InvalidIntent`, `Config` and
//! `Interrupted` ever reach a caller as a failed request. `EmbeddingUnavailable` and
//! `MalformedProviderOutput` are folded into blocked verdicts by the
//! governor, and `AuditWriteFailed` is reported through the audit handle
//! without touching the decision.

use thiserror::Error;

use crate::core::input::InputViolation;

/// Errors raised by the governance core
#[derive(Debug, Clone, Error)]
pub enum GovernanceError {
    #[error("Text length out of bounds: {actual} characters (allowed {min}..={max})")]
    InputOutOfBounds { actual: usize, min: usize, max: usize },

    #[error("Input looks like a full document: {reason}")]
    DocumentLike { reason: String },

    #[error("Unknown intent '{0}' (expected rewrite, humanize or clarify)")]
    InvalidIntent(String),

    #[error("Embedding provider unavailable: {0}")]
    EmbeddingUnavailable(String),

    #[error("Audit write failed after {attempts} attempt(s): {reason}")]
    AuditWriteFailed { attempts: u32, reason: String },

    #[error("Provider output unusable: {0}")]
    MalformedProviderOutput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation interrupted: {0}")]
    Interrupted(String),
}

impl From<InputViolation> for GovernanceError {
    fn from(violation: InputViolation) -> Self {
        match violation {
            InputViolation::TooShort { actual, min, max }
            | InputViolation::TooLong { actual, min, max } => {
                GovernanceError::InputOutOfBounds { actual, min, max }
            }
            InputViolation::DocumentLike { reason } => GovernanceError::DocumentLike { reason },
        }
    }
}

pub type GovernanceResult<T> = Result<T, GovernanceError>;
