//! Error types for the likes engine.
//! Wraps vote store failures and adds the validation and lookup errors raised
//! before the store is reached.
use likes_repository::VoteStoreError;
use thiserror::Error;

/// Represents errors that can occur within the likes engine.
///
/// Policy denials are not errors: they come back as a `denied` toggle outcome.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Vote store error: {0}")]
    Store(#[from] VoteStoreError),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Collaborator error: {0}")]
    Collaborator(String),
}

impl EngineError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn collaborator(msg: impl Into<String>) -> Self {
        Self::Collaborator(msg.into())
    }
}
