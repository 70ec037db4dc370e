use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier assigned to a vote row on creation.
pub type VoteId = i64;

/// Opaque identifier of the voting actor, handed out by the identity provider.
pub type OwnerId = i64;

/// Opaque identifier of the voted-on resource, handed out by the resource store.
pub type ResourceId = i64;

/// Represents a user's vote on a resource.
///
/// There is at most one `Vote` per `(owner_id, resource_id)` pair. The absence of a
/// row is the "not voted" state, so `liked` only ever carries a like (`true`) or a
/// dislike (`false`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Vote {
    pub id: VoteId,
    pub owner_id: OwnerId,
    pub resource_id: ResourceId,
    pub liked: bool,
    pub created_at: DateTime<Utc>,
    /// Set whenever the polarity is rewritten after creation.
    pub modified_at: Option<DateTime<Utc>>,
}
