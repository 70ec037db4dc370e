//! Vote search and resource ranking.
//!
//! Turns caller-facing queries into store criteria. Resource type and item set
//! filters cannot be answered by the vote store, so they are resolved in two
//! phases: list the distinct resources matching the other filters, classify them
//! through the resource store, then search again restricted to the survivors.
use likes_repository::{VoteRepository, VoteSearch};
use likes_shared::types::{
    CallerStatus, LikeStatus, OwnerId, RankingCriteria, RankingQuery, ResourceId,
    ResourceRanking, ScalarField, SearchResult, Vote, VoteCriteria, VoteId, VoteQuery,
};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

use crate::collaborators::ResourceStore;
use crate::errors::EngineError;

/// The status filter only applies to authenticated callers.
fn caller_status(status: Option<LikeStatus>, caller: Option<OwnerId>) -> Option<CallerStatus> {
    status
        .zip(caller)
        .map(|(status, owner_id)| CallerStatus { owner_id, status })
}

pub struct QueryLayer {
    store: Arc<dyn VoteRepository>,
    resources: Arc<dyn ResourceStore>,
}

impl QueryLayer {
    pub fn new(store: Arc<dyn VoteRepository>, resources: Arc<dyn ResourceStore>) -> Self {
        Self { store, resources }
    }

    /// Resolves a query into store criteria.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(criteria))` - Criteria ready for the store
    /// * `Ok(None)` - The resource filters leave no candidate, the result is empty
    /// * `Err(EngineError::Validation)` - Malformed ids or pagination
    pub async fn criteria(
        &self,
        query: &VoteQuery,
        caller: Option<OwnerId>,
    ) -> Result<Option<VoteCriteria>, EngineError> {
        let mut criteria = VoteCriteria::from_query(query).map_err(EngineError::validation)?;
        criteria.caller_status = caller_status(query.like_status, caller);

        if query.needs_resource_lookup() {
            let candidates = self.store.distinct_resources(&criteria).await?;
            let kept = self.classify(query, candidates).await?;
            debug!(kept = kept.len(), "Resolved resource filters");
            if kept.is_empty() {
                return Ok(None);
            }
            criteria.resource_ids = Some(kept);
        }
        Ok(Some(criteria))
    }

    async fn classify(
        &self,
        query: &VoteQuery,
        candidates: Vec<ResourceId>,
    ) -> Result<Vec<ResourceId>, EngineError> {
        let resource_types = query.resource_types.as_deref().filter(|t| !t.is_empty());
        let item_set_ids = query.item_set_ids.as_deref().filter(|ids| !ids.is_empty());

        let mut kept = Vec::with_capacity(candidates.len());
        for resource_id in candidates {
            if let Some(resource_types) = resource_types {
                let resource_type = self.resources.resource_type(resource_id).await?;
                if !resource_type.is_some_and(|t| resource_types.contains(&t)) {
                    continue;
                }
            }
            if let Some(item_set_ids) = item_set_ids {
                let groups = self.resources.group_membership(resource_id).await?;
                if !item_set_ids.iter().any(|id| groups.contains(id)) {
                    continue;
                }
            }
            kept.push(resource_id);
        }
        Ok(kept)
    }

    pub async fn search(
        &self,
        query: &VoteQuery,
        caller: Option<OwnerId>,
    ) -> Result<SearchResult<Vote>, EngineError> {
        match self.criteria(query, caller).await? {
            Some(criteria) => Ok(self.store.search(&criteria).await?),
            None => Ok(SearchResult::empty()),
        }
    }

    /// Maps each matching vote id to the named field.
    ///
    /// An unknown field name is a `BadRequest`.
    pub async fn search_scalar(
        &self,
        query: &VoteQuery,
        field: &str,
        caller: Option<OwnerId>,
    ) -> Result<BTreeMap<VoteId, Value>, EngineError> {
        let field: ScalarField = field.parse().map_err(EngineError::bad_request)?;
        match self.criteria(query, caller).await? {
            Some(criteria) => Ok(self.store.search_scalar(&criteria, field).await?),
            None => Ok(BTreeMap::new()),
        }
    }

    pub async fn rank(
        &self,
        query: &RankingQuery,
        caller: Option<OwnerId>,
    ) -> Result<SearchResult<ResourceRanking>, EngineError> {
        let mut criteria = RankingCriteria::from_query(query).map_err(EngineError::validation)?;
        criteria.caller_status = caller_status(query.like_status, caller);
        Ok(self.store.rank_resources(&criteria).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caller_status_needs_caller() {
        assert_eq!(caller_status(Some(LikeStatus::Voted), None), None);
        assert_eq!(caller_status(None, Some(3)), None);
        assert_eq!(
            caller_status(Some(LikeStatus::Liked), Some(3)),
            Some(CallerStatus {
                owner_id: 3,
                status: LikeStatus::Liked
            })
        );
    }
}
