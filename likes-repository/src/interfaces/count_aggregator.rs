use likes_shared::types::{OwnerId, ResourceId, VotesCount};
use std::collections::HashMap;

use crate::errors::VoteStoreError;

/// Derived reads over the vote records.
#[async_trait::async_trait]
pub trait CountAggregator: Send + Sync {
    /// Likes, dislikes and total for a resource. `{0, 0, 0}` when nobody voted.
    async fn counts(&self, resource_id: ResourceId) -> Result<VotesCount, VoteStoreError>;

    /// Counts for several resources in one round trip. Every requested id is present
    /// in the returned map.
    async fn counts_many(
        &self,
        resource_ids: &[ResourceId],
    ) -> Result<HashMap<ResourceId, VotesCount>, VoteStoreError>;

    /// The actor's own polarity on the resource, `None` when they have not voted.
    async fn user_status(
        &self,
        resource_id: ResourceId,
        owner_id: OwnerId,
    ) -> Result<Option<bool>, VoteStoreError>;
}
