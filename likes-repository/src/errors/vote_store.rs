//! Error types for the vote store.
//! Defines specific errors that can occur during vote persistence and lookup.
use likes_shared::types::{OwnerId, ResourceId, VoteId};
use thiserror::Error;

/// Represents errors that can occur within the vote store.
///
/// Unique-constraint violations on create surface as `Conflict` rather than as a
/// generic database error, so the toggle engine can recover from the race.
#[derive(Debug, Error)]
pub enum VoteStoreError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("Vote already exists for owner {owner_id} on resource {resource_id}")]
    Conflict {
        owner_id: OwnerId,
        resource_id: ResourceId,
    },

    #[error("Vote not found: {0}")]
    NotFound(VoteId),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl VoteStoreError {
    pub fn conflict(owner_id: OwnerId, resource_id: ResourceId) -> Self {
        Self::Conflict {
            owner_id,
            resource_id,
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}
