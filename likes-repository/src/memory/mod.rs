//! In-memory vote store.
//!
//! Backs the engine tests and local development. Counts are always computed from
//! the stored votes, so the count strategy does not apply here.
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use likes_shared::types::{
    CallerStatus, OwnerId, RankingCriteria, ResourceId, ResourceRanking, SearchResult, SortField,
    SortOrder, Vote, VoteCriteria, VoteId, VotesCount,
};
use rand::seq::SliceRandom;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::{CountAggregator, VoteSearch, VoteStore, VoteStoreError};

#[derive(Debug, Default)]
struct State {
    next_id: VoteId,
    votes: BTreeMap<VoteId, Vote>,
    by_pair: HashMap<(OwnerId, ResourceId), VoteId>,
}

impl State {
    fn insert(
        &mut self,
        owner_id: OwnerId,
        resource_id: ResourceId,
        liked: bool,
        created_at: DateTime<Utc>,
    ) -> Result<Vote, VoteStoreError> {
        if self.by_pair.contains_key(&(owner_id, resource_id)) {
            return Err(VoteStoreError::conflict(owner_id, resource_id));
        }
        self.next_id += 1;
        let vote = Vote {
            id: self.next_id,
            owner_id,
            resource_id,
            liked,
            created_at,
            modified_at: None,
        };
        self.by_pair.insert((owner_id, resource_id), vote.id);
        self.votes.insert(vote.id, vote.clone());
        Ok(vote)
    }

    fn remove(&mut self, id: VoteId) -> Option<Vote> {
        let vote = self.votes.remove(&id)?;
        self.by_pair.remove(&(vote.owner_id, vote.resource_id));
        Some(vote)
    }

    fn counts(&self) -> HashMap<ResourceId, VotesCount> {
        let mut counts: HashMap<ResourceId, VotesCount> = HashMap::new();
        for vote in self.votes.values() {
            counts.entry(vote.resource_id).or_default().record(vote.liked);
        }
        counts
    }

    fn caller_accepts(&self, caller: &CallerStatus, resource_id: ResourceId) -> bool {
        let own_vote = self
            .by_pair
            .get(&(caller.owner_id, resource_id))
            .and_then(|id| self.votes.get(id))
            .map(|vote| vote.liked);
        caller.status.accepts(own_vote)
    }

    fn matching(&self, criteria: &VoteCriteria) -> Vec<Vote> {
        self.votes
            .values()
            .filter(|vote| criteria.matches(vote))
            .filter(|vote| {
                criteria
                    .caller_status
                    .as_ref()
                    .is_none_or(|caller| self.caller_accepts(caller, vote.resource_id))
            })
            .cloned()
            .collect()
    }
}

/// Missing values sort after present ones, as PostgreSQL does for `ASC`.
fn cmp_nulls_last<T: Ord>(a: &Option<T>, b: &Option<T>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
    }
}

fn directed(ordering: Ordering, order: SortOrder) -> Ordering {
    match order {
        SortOrder::Asc => ordering,
        SortOrder::Desc => ordering.reverse(),
    }
}

fn compare_votes(
    a: &Vote,
    b: &Vote,
    field: SortField,
    counts: &HashMap<ResourceId, VotesCount>,
) -> Ordering {
    let count_of = |vote: &Vote| counts.get(&vote.resource_id).copied().unwrap_or_default();
    let primary = match field {
        SortField::Id | SortField::Random => Ordering::Equal,
        SortField::OwnerId => a.owner_id.cmp(&b.owner_id),
        SortField::ResourceId => a.resource_id.cmp(&b.resource_id),
        SortField::Liked => a.liked.cmp(&b.liked),
        SortField::Created => a.created_at.cmp(&b.created_at),
        SortField::Modified => cmp_nulls_last(&a.modified_at, &b.modified_at),
        SortField::LikeCount => count_of(a).likes.cmp(&count_of(b).likes),
        SortField::DislikeCount => count_of(a).dislikes.cmp(&count_of(b).dislikes),
        SortField::VoteCount => count_of(a).total.cmp(&count_of(b).total),
    };
    primary.then(a.id.cmp(&b.id))
}

/// Thread-safe in-memory vote store.
///
/// A single lock guards the votes and the pair index, so the uniqueness check and
/// the insert happen atomically.
#[derive(Debug, Clone, Default)]
pub struct MemoryVoteStore {
    state: Arc<RwLock<State>>,
}

impl MemoryVoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a vote with an explicit creation time.
    pub async fn create_at(
        &self,
        owner_id: OwnerId,
        resource_id: ResourceId,
        liked: bool,
        created_at: DateTime<Utc>,
    ) -> Result<Vote, VoteStoreError> {
        self.state
            .write()
            .await
            .insert(owner_id, resource_id, liked, created_at)
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.votes.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.read().await.votes.is_empty()
    }
}

#[async_trait]
impl VoteStore for MemoryVoteStore {
    async fn create(
        &self,
        owner_id: OwnerId,
        resource_id: ResourceId,
        liked: bool,
    ) -> Result<Vote, VoteStoreError> {
        self.create_at(owner_id, resource_id, liked, Utc::now()).await
    }

    async fn find(
        &self,
        owner_id: OwnerId,
        resource_id: ResourceId,
    ) -> Result<Option<Vote>, VoteStoreError> {
        let state = self.state.read().await;
        Ok(state
            .by_pair
            .get(&(owner_id, resource_id))
            .and_then(|id| state.votes.get(id))
            .cloned())
    }

    async fn get(&self, id: VoteId) -> Result<Option<Vote>, VoteStoreError> {
        Ok(self.state.read().await.votes.get(&id).cloned())
    }

    async fn update(&self, id: VoteId, liked: bool) -> Result<Vote, VoteStoreError> {
        let mut state = self.state.write().await;
        let vote = state.votes.get_mut(&id).ok_or(VoteStoreError::NotFound(id))?;
        vote.liked = liked;
        vote.modified_at = Some(Utc::now());
        Ok(vote.clone())
    }

    async fn delete(&self, id: VoteId) -> Result<bool, VoteStoreError> {
        Ok(self.state.write().await.remove(id).is_some())
    }

    async fn delete_by_resources(
        &self,
        resource_ids: &[ResourceId],
    ) -> Result<u64, VoteStoreError> {
        let mut state = self.state.write().await;
        let doomed: Vec<VoteId> = state
            .votes
            .values()
            .filter(|vote| resource_ids.contains(&vote.resource_id))
            .map(|vote| vote.id)
            .collect();
        for id in &doomed {
            state.remove(*id);
        }
        Ok(doomed.len() as u64)
    }

    async fn delete_by_owner(&self, owner_id: OwnerId) -> Result<Vec<ResourceId>, VoteStoreError> {
        let mut state = self.state.write().await;
        let doomed: Vec<VoteId> = state
            .votes
            .values()
            .filter(|vote| vote.owner_id == owner_id)
            .map(|vote| vote.id)
            .collect();
        Ok(doomed
            .into_iter()
            .filter_map(|id| state.remove(id))
            .map(|vote| vote.resource_id)
            .collect())
    }
}

#[async_trait]
impl CountAggregator for MemoryVoteStore {
    async fn counts(&self, resource_id: ResourceId) -> Result<VotesCount, VoteStoreError> {
        let state = self.state.read().await;
        let mut counts = VotesCount::default();
        for vote in state.votes.values().filter(|v| v.resource_id == resource_id) {
            counts.record(vote.liked);
        }
        Ok(counts)
    }

    async fn counts_many(
        &self,
        resource_ids: &[ResourceId],
    ) -> Result<HashMap<ResourceId, VotesCount>, VoteStoreError> {
        let all = self.state.read().await.counts();
        Ok(resource_ids
            .iter()
            .map(|id| (*id, all.get(id).copied().unwrap_or_default()))
            .collect())
    }

    async fn user_status(
        &self,
        resource_id: ResourceId,
        owner_id: OwnerId,
    ) -> Result<Option<bool>, VoteStoreError> {
        Ok(self
            .find(owner_id, resource_id)
            .await?
            .map(|vote| vote.liked))
    }
}

#[async_trait]
impl VoteSearch for MemoryVoteStore {
    async fn search(&self, criteria: &VoteCriteria) -> Result<SearchResult<Vote>, VoteStoreError> {
        let state = self.state.read().await;
        let mut votes = state.matching(criteria);
        let total_count = votes.len() as u64;

        if criteria.sort.field == SortField::Random {
            votes.shuffle(&mut rand::thread_rng());
        } else {
            let counts = if criteria.sort.field.needs_counts() {
                state.counts()
            } else {
                HashMap::new()
            };
            votes.sort_by(|a, b| {
                directed(
                    compare_votes(a, b, criteria.sort.field, &counts),
                    criteria.sort.order,
                )
            });
        }

        Ok(match &criteria.window {
            Some(window) => SearchResult {
                items: window.apply(votes),
                total_count,
            },
            None => SearchResult::unbounded(votes),
        })
    }

    async fn distinct_resources(
        &self,
        criteria: &VoteCriteria,
    ) -> Result<Vec<ResourceId>, VoteStoreError> {
        let state = self.state.read().await;
        let resource_ids: BTreeSet<ResourceId> = state
            .matching(criteria)
            .into_iter()
            .map(|vote| vote.resource_id)
            .collect();
        Ok(resource_ids.into_iter().collect())
    }

    async fn rank_resources(
        &self,
        criteria: &RankingCriteria,
    ) -> Result<SearchResult<ResourceRanking>, VoteStoreError> {
        let state = self.state.read().await;
        let counts = state.counts();
        let candidates: Vec<ResourceId> = match &criteria.resource_ids {
            Some(ids) => ids.clone(),
            None => counts
                .keys()
                .copied()
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect(),
        };

        let mut ranked: Vec<ResourceRanking> = candidates
            .into_iter()
            .map(|resource_id| ResourceRanking {
                resource_id,
                counts: counts.get(&resource_id).copied().unwrap_or_default(),
            })
            .filter(|ranking| criteria.keeps(&ranking.counts))
            .filter(|ranking| {
                criteria
                    .caller_status
                    .as_ref()
                    .is_none_or(|caller| state.caller_accepts(caller, ranking.resource_id))
            })
            .collect();
        let total_count = ranked.len() as u64;

        ranked.sort_by(|a, b| {
            let ordering = criteria
                .rank_by
                .key(&a.counts)
                .cmp(&criteria.rank_by.key(&b.counts))
                .then(a.resource_id.cmp(&b.resource_id));
            directed(ordering, criteria.order)
        });

        Ok(match &criteria.window {
            Some(window) => SearchResult {
                items: window.apply(ranked),
                total_count,
            },
            None => SearchResult::unbounded(ranked),
        })
    }
}
