/// Error types for the invite engine
use document_store::StoreError;
use thiserror::Error;

use crate::domain::models::InviteStatus;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("not authenticated")]
    Unauthenticated,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invite fan-out partially applied: {applied} of {total} records written")]
    PartialFanOut { applied: usize, total: usize },

    #[error("invalid invite transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: InviteStatus,
        to: InviteStatus,
    },

    #[error("subscription error: {0}")]
    Subscription(String),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Result type alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
