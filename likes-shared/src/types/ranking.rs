use serde::{Deserialize, Serialize};

use crate::types::{
    CallerStatus, LikeStatus, Pagination, ResourceId, SortOrder, VotesCount, Window,
};

/// Count a resource ranking is ordered by.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RankBy {
    #[default]
    LikeCount,
    DislikeCount,
    VoteCount,
}

impl RankBy {
    pub fn key(&self, counts: &VotesCount) -> i64 {
        match self {
            RankBy::LikeCount => counts.likes,
            RankBy::DislikeCount => counts.dislikes,
            RankBy::VoteCount => counts.total,
        }
    }
}

/// A resource with its vote counts, as returned by a ranking.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResourceRanking {
    pub resource_id: ResourceId,
    pub counts: VotesCount,
}

/// Resource ranking parameters.
///
/// Without `resource_ids` the ranking covers every resource with at least one vote.
/// With them, every listed resource is ranked, including the ones nobody voted on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct RankingQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_ids: Option<Vec<ResourceId>>,
    /// `true` keeps resources with at least one like, `false` those with none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_likes: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub like_status: Option<LikeStatus>,
    #[serde(default)]
    pub rank_by: RankBy,
    #[serde(default)]
    pub order: SortOrder,
    #[serde(default)]
    pub pagination: Pagination,
}

impl RankingQuery {
    pub fn top(rank_by: RankBy, limit: u64) -> Self {
        Self {
            rank_by,
            order: SortOrder::Desc,
            pagination: Pagination::limit(limit, 0),
            ..Self::default()
        }
    }

    pub fn among(mut self, resource_ids: Vec<ResourceId>) -> Self {
        self.resource_ids = Some(resource_ids);
        self
    }

    pub fn with_has_likes(mut self, has_likes: bool) -> Self {
        self.has_likes = Some(has_likes);
        self
    }

    pub fn with_like_status(mut self, status: LikeStatus) -> Self {
        self.like_status = Some(status);
        self
    }
}

/// Store-level ranking input.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct RankingCriteria {
    /// Deduplicated candidate resources.
    pub resource_ids: Option<Vec<ResourceId>>,
    pub has_likes: Option<bool>,
    pub caller_status: Option<CallerStatus>,
    pub rank_by: RankBy,
    pub order: SortOrder,
    pub window: Option<Window>,
}

impl RankingCriteria {
    pub fn from_query(query: &RankingQuery) -> Result<Self, String> {
        let resource_ids = query.resource_ids.as_ref().map(|ids| {
            let mut ids = ids.clone();
            ids.sort_unstable();
            ids.dedup();
            ids
        });
        Ok(Self {
            resource_ids,
            has_likes: query.has_likes,
            caller_status: None,
            rank_by: query.rank_by,
            order: query.order,
            window: query.pagination.window()?,
        })
    }

    /// Checks the filters that only depend on the resource's own counts.
    pub fn keeps(&self, counts: &VotesCount) -> bool {
        self.has_likes
            .is_none_or(|has_likes| has_likes == (counts.likes > 0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_criteria_dedupes_candidates() {
        let query = RankingQuery::top(RankBy::VoteCount, 5).among(vec![3, 1, 3, 2]);
        let criteria = RankingCriteria::from_query(&query).unwrap();
        assert_eq!(criteria.resource_ids, Some(vec![1, 2, 3]));
        assert_eq!(
            criteria.window,
            Some(Window {
                limit: Some(5),
                offset: 0
            })
        );
    }

    #[test]
    fn test_has_likes_filter() {
        let criteria = RankingCriteria {
            has_likes: Some(false),
            ..RankingCriteria::default()
        };
        assert!(criteria.keeps(&VotesCount::new(0, 3)));
        assert!(!criteria.keeps(&VotesCount::new(1, 0)));
    }

    #[test]
    fn test_rank_key() {
        let counts = VotesCount::new(4, 1);
        assert_eq!(RankBy::LikeCount.key(&counts), 4);
        assert_eq!(RankBy::DislikeCount.key(&counts), 1);
        assert_eq!(RankBy::VoteCount.key(&counts), 5);
    }
}
