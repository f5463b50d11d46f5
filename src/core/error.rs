use thiserror::Error;

use crate::services::StoreError;

/// Errors surfaced by match discovery and the match state machine
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Cannot match with yourself")]
    SelfMatch,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Concurrent writers kept racing on the same pair
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl MatchError {
    /// Stable machine-readable kind, used in error responses
    pub fn kind(&self) -> &'static str {
        match self {
            MatchError::NotFound(_) => "not_found",
            MatchError::SelfMatch => "self_match",
            MatchError::InvalidInput(_) => "invalid_input",
            MatchError::Conflict(_) => "conflict",
            MatchError::Store(_) => "store_error",
        }
    }
}
