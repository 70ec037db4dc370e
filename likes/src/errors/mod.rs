//! Error types for the likes application.
//! Consolidates errors from configuration, the vote store and the engine.
use likes_engine::EngineError;
use likes_repository::VoteStoreError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Usage error: {0}")]
    Usage(String),
    #[error("Tracing error: {0}")]
    Tracing(String),
    #[error("Vote store error: {0}")]
    Store(#[from] VoteStoreError),
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AppError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn usage(msg: impl Into<String>) -> Self {
        Self::Usage(msg.into())
    }
}
