use likes_shared::types::{
    RankingCriteria, ResourceId, ResourceRanking, ScalarField, SearchResult, Vote, VoteCriteria,
    VoteId,
};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::errors::VoteStoreError;

/// Filtered, sorted and paginated reads over votes.
#[async_trait::async_trait]
pub trait VoteSearch: Send + Sync {
    /// Runs a vote search.
    ///
    /// Orders by the requested field with `id` as tie-break in the same direction.
    /// The total-count query is skipped when `criteria.window` is `None`.
    async fn search(&self, criteria: &VoteCriteria) -> Result<SearchResult<Vote>, VoteStoreError>;

    /// Distinct resource ids of the votes matching the criteria, ignoring sort and window.
    async fn distinct_resources(
        &self,
        criteria: &VoteCriteria,
    ) -> Result<Vec<ResourceId>, VoteStoreError>;

    /// Ranks resources by their vote counts, ties broken on `resource_id`.
    async fn rank_resources(
        &self,
        criteria: &RankingCriteria,
    ) -> Result<SearchResult<ResourceRanking>, VoteStoreError>;

    /// Maps each matching vote id to a single field.
    async fn search_scalar(
        &self,
        criteria: &VoteCriteria,
        field: ScalarField,
    ) -> Result<BTreeMap<VoteId, Value>, VoteStoreError> {
        let result = self.search(criteria).await?;
        Ok(result
            .items
            .iter()
            .map(|vote| (vote.id, field.project(vote)))
            .collect())
    }
}
