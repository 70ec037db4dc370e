#![allow(dead_code)]

use async_trait::async_trait;
use likes_engine::EngineError;
use likes_engine::collaborators::{IdentityProvider, ResourceStore};
use likes_repository::{
    CountAggregator, MemoryVoteStore, VoteSearch, VoteStore, VoteStoreError,
};
use likes_shared::types::{
    Actor, OwnerId, RankingCriteria, Resource, ResourceId, ResourceRanking, ResourceType,
    SearchResult, Vote, VoteCriteria, VoteId, VotesCount,
};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Barrier;

/// Identity provider and resource store backed by fixed maps.
#[derive(Debug, Default)]
pub struct Directory {
    pub actors: HashSet<OwnerId>,
    pub resources: HashMap<ResourceId, (ResourceType, HashSet<ResourceId>)>,
    pub current: Option<OwnerId>,
}

impl Directory {
    /// Actors 1..=10 and item resources 1..=20.
    pub fn populated() -> Self {
        let mut directory = Self::default();
        directory.actors.extend(1..=10);
        for id in 1..=20 {
            directory.resources.insert(id, (ResourceType::Items, HashSet::new()));
        }
        directory
    }

    pub fn with_resource(
        mut self,
        id: ResourceId,
        resource_type: ResourceType,
        groups: &[ResourceId],
    ) -> Self {
        self.resources
            .insert(id, (resource_type, groups.iter().copied().collect()));
        self
    }

    pub fn with_current(mut self, owner_id: OwnerId) -> Self {
        self.current = Some(owner_id);
        self
    }
}

#[async_trait]
impl IdentityProvider for Directory {
    async fn resolve_actor(&self, id: OwnerId) -> Result<Option<Actor>, EngineError> {
        Ok(self.actors.contains(&id).then_some(Actor { id }))
    }

    async fn current_actor(&self) -> Result<Option<Actor>, EngineError> {
        Ok(self.current.map(|id| Actor { id }))
    }
}

#[async_trait]
impl ResourceStore for Directory {
    async fn resolve_resource(&self, id: ResourceId) -> Result<Option<Resource>, EngineError> {
        Ok(self.resources.get(&id).map(|(resource_type, _)| Resource {
            id,
            resource_type: *resource_type,
        }))
    }

    async fn resource_type(&self, id: ResourceId) -> Result<Option<ResourceType>, EngineError> {
        Ok(self.resources.get(&id).map(|(resource_type, _)| *resource_type))
    }

    async fn group_membership(&self, id: ResourceId) -> Result<HashSet<ResourceId>, EngineError> {
        Ok(self
            .resources
            .get(&id)
            .map(|(_, groups)| groups.clone())
            .unwrap_or_default())
    }
}

/// Store whose first `blind_finds` lookups miss, as if another request created
/// the vote right after this one looked.
///
/// A lockstep store instead holds its first lookups at a barrier until every
/// party has read, so concurrent toggles all observe the same state.
pub struct RacingStore {
    pub inner: MemoryVoteStore,
    blind_finds: AtomicUsize,
    gated_finds: AtomicUsize,
    gate: Option<Barrier>,
}

impl RacingStore {
    pub fn new(inner: MemoryVoteStore, blind_finds: usize) -> Self {
        Self {
            inner,
            blind_finds: AtomicUsize::new(blind_finds),
            gated_finds: AtomicUsize::new(0),
            gate: None,
        }
    }

    pub fn lockstep(inner: MemoryVoteStore, parties: usize) -> Self {
        Self {
            inner,
            blind_finds: AtomicUsize::new(0),
            gated_finds: AtomicUsize::new(parties),
            gate: Some(Barrier::new(parties)),
        }
    }
}

fn take_one(counter: &AtomicUsize) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

#[async_trait]
impl VoteStore for RacingStore {
    async fn create(
        &self,
        owner_id: OwnerId,
        resource_id: ResourceId,
        liked: bool,
    ) -> Result<Vote, VoteStoreError> {
        self.inner.create(owner_id, resource_id, liked).await
    }

    async fn find(
        &self,
        owner_id: OwnerId,
        resource_id: ResourceId,
    ) -> Result<Option<Vote>, VoteStoreError> {
        if take_one(&self.blind_finds) {
            return Ok(None);
        }
        let found = self.inner.find(owner_id, resource_id).await?;
        if let Some(gate) = &self.gate {
            if take_one(&self.gated_finds) {
                gate.wait().await;
            }
        }
        Ok(found)
    }

    async fn get(&self, id: VoteId) -> Result<Option<Vote>, VoteStoreError> {
        self.inner.get(id).await
    }

    async fn update(&self, id: VoteId, liked: bool) -> Result<Vote, VoteStoreError> {
        self.inner.update(id, liked).await
    }

    async fn delete(&self, id: VoteId) -> Result<bool, VoteStoreError> {
        self.inner.delete(id).await
    }

    async fn delete_by_resources(
        &self,
        resource_ids: &[ResourceId],
    ) -> Result<u64, VoteStoreError> {
        self.inner.delete_by_resources(resource_ids).await
    }

    async fn delete_by_owner(&self, owner_id: OwnerId) -> Result<Vec<ResourceId>, VoteStoreError> {
        self.inner.delete_by_owner(owner_id).await
    }
}

#[async_trait]
impl CountAggregator for RacingStore {
    async fn counts(&self, resource_id: ResourceId) -> Result<VotesCount, VoteStoreError> {
        self.inner.counts(resource_id).await
    }

    async fn counts_many(
        &self,
        resource_ids: &[ResourceId],
    ) -> Result<HashMap<ResourceId, VotesCount>, VoteStoreError> {
        self.inner.counts_many(resource_ids).await
    }

    async fn user_status(
        &self,
        resource_id: ResourceId,
        owner_id: OwnerId,
    ) -> Result<Option<bool>, VoteStoreError> {
        self.inner.user_status(resource_id, owner_id).await
    }
}

#[async_trait]
impl VoteSearch for RacingStore {
    async fn search(&self, criteria: &VoteCriteria) -> Result<SearchResult<Vote>, VoteStoreError> {
        self.inner.search(criteria).await
    }

    async fn distinct_resources(
        &self,
        criteria: &VoteCriteria,
    ) -> Result<Vec<ResourceId>, VoteStoreError> {
        self.inner.distinct_resources(criteria).await
    }

    async fn rank_resources(
        &self,
        criteria: &RankingCriteria,
    ) -> Result<SearchResult<ResourceRanking>, VoteStoreError> {
        self.inner.rank_resources(criteria).await
    }
}
