//! This module defines the `VoteStore` trait, which provides an interface
//! for durable CRUD over vote records.
use likes_shared::types::{OwnerId, ResourceId, Vote, VoteId};

use crate::errors::VoteStoreError;

/// A trait that defines the interface for the vote record store.
///
/// Implementors must enforce at most one vote per `(owner_id, resource_id)` pair
/// at the storage level, so concurrent creates cannot both succeed.
#[async_trait::async_trait]
pub trait VoteStore: Send + Sync {
    /// Inserts a new vote.
    ///
    /// # Returns
    ///
    /// * `Ok(Vote)` - The stored vote, with its assigned id and creation time
    /// * `Err(VoteStoreError::Conflict)` - The pair already has a vote
    async fn create(
        &self,
        owner_id: OwnerId,
        resource_id: ResourceId,
        liked: bool,
    ) -> Result<Vote, VoteStoreError>;

    /// Point lookup on the `(owner_id, resource_id)` pair.
    async fn find(
        &self,
        owner_id: OwnerId,
        resource_id: ResourceId,
    ) -> Result<Option<Vote>, VoteStoreError>;

    /// Point lookup by vote id.
    async fn get(&self, id: VoteId) -> Result<Option<Vote>, VoteStoreError>;

    /// Rewrites the polarity of a vote and stamps `modified_at`.
    ///
    /// # Returns
    ///
    /// * `Ok(Vote)` - The updated vote
    /// * `Err(VoteStoreError::NotFound)` - The vote was deleted in the meantime
    async fn update(&self, id: VoteId, liked: bool) -> Result<Vote, VoteStoreError>;

    /// Deletes a vote. Deleting a missing vote is not an error.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - A row was deleted
    /// * `Ok(false)` - No such vote
    async fn delete(&self, id: VoteId) -> Result<bool, VoteStoreError>;

    /// Deletes every vote on any of the given resources and returns how many were removed.
    async fn delete_by_resources(&self, resource_ids: &[ResourceId]) -> Result<u64, VoteStoreError>;

    /// Cascade for a removed actor.
    ///
    /// # Returns
    ///
    /// The resource id of every deleted vote, one entry per removed row.
    async fn delete_by_owner(&self, owner_id: OwnerId) -> Result<Vec<ResourceId>, VoteStoreError>;

    /// Cascade for a removed resource.
    async fn delete_by_resource(&self, resource_id: ResourceId) -> Result<u64, VoteStoreError> {
        self.delete_by_resources(&[resource_id]).await
    }
}
