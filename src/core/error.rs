use crate::core::pipeline::Stage;
use thiserror::Error;

/// Failure of a single backend call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The request never produced a usable answer (connection refused, DNS,
    /// a non-2xx status without a JSON body, ...).
    #[error("could not reach the server: {0}")]
    Transport(String),

    /// The backend answered `{"success": false, "error": ...}`.
    #[error("{0}")]
    Backend(String),

    /// The backend answered, but not in the shape of the contract.
    #[error("malformed response: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    /// A local precondition failed; nothing was sent.
    #[error("{0}")]
    Validation(String),

    #[error("{}: {source}", stage.error_prefix())]
    Api {
        stage: Stage,
        #[source]
        source: ApiError,
    },
}

impl WorkflowError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn api(stage: Stage, source: ApiError) -> Self {
        Self::Api { stage, source }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}
