//! Search query types for votes.
//!
//! `VoteQuery` is what callers build. The query layer resolves the parts that need
//! external lookups (resource types, item sets, the caller's own vote) and hands a
//! `VoteCriteria` to the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

use crate::types::{OwnerId, ResourceId, ResourceType, Vote, VoteId};

/// Page size used when a page is requested without `per_page`.
pub const DEFAULT_PER_PAGE: u64 = 25;

/// Filter on the caller's own vote for each candidate resource.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LikeStatus {
    Liked,
    Disliked,
    Voted,
    NotVoted,
}

impl FromStr for LikeStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "liked" => Ok(LikeStatus::Liked),
            "disliked" => Ok(LikeStatus::Disliked),
            "voted" => Ok(LikeStatus::Voted),
            "not_voted" => Ok(LikeStatus::NotVoted),
            other => Err(format!("unknown like status: {}", other)),
        }
    }
}

impl LikeStatus {
    /// Whether the caller's own vote (if any) satisfies this status.
    pub fn accepts(&self, own_vote: Option<bool>) -> bool {
        match self {
            LikeStatus::Liked => own_vote == Some(true),
            LikeStatus::Disliked => own_vote == Some(false),
            LikeStatus::Voted => own_vote.is_some(),
            LikeStatus::NotVoted => own_vote.is_none(),
        }
    }
}

/// `like_status` bound to an authenticated caller.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CallerStatus {
    pub owner_id: OwnerId,
    pub status: LikeStatus,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// Lenient parse: anything other than `desc` (any case) sorts ascending.
    pub fn parse_lenient(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("desc") {
            SortOrder::Desc
        } else {
            SortOrder::Asc
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Fields a vote search can be ordered by.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    #[default]
    Id,
    OwnerId,
    ResourceId,
    Liked,
    Created,
    Modified,
    /// Likes received by the vote's resource.
    LikeCount,
    /// Dislikes received by the vote's resource.
    DislikeCount,
    /// All votes received by the vote's resource.
    VoteCount,
    Random,
}

impl FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "id" => Ok(SortField::Id),
            "owner_id" => Ok(SortField::OwnerId),
            "resource_id" => Ok(SortField::ResourceId),
            "liked" => Ok(SortField::Liked),
            "created" => Ok(SortField::Created),
            "modified" => Ok(SortField::Modified),
            "like_count" => Ok(SortField::LikeCount),
            "dislike_count" => Ok(SortField::DislikeCount),
            "vote_count" => Ok(SortField::VoteCount),
            "random" => Ok(SortField::Random),
            other => Err(format!("unknown sort field: {}", other)),
        }
    }
}

impl SortField {
    /// Count-based fields need the per-resource aggregation joined in.
    pub fn needs_counts(&self) -> bool {
        matches!(
            self,
            SortField::LikeCount | SortField::DislikeCount | SortField::VoteCount
        )
    }
}

/// Primary ordering of a vote search. Ties always break on `id` in the same direction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct VoteSort {
    pub field: SortField,
    pub order: SortOrder,
}

impl VoteSort {
    pub fn new(field: SortField, order: SortOrder) -> Self {
        Self { field, order }
    }
}

/// Requested result window. Page-based pagination wins over limit/offset.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Pagination {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
}

/// Resolved `LIMIT` / `OFFSET` pair.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Window {
    pub limit: Option<u64>,
    pub offset: u64,
}

impl Window {
    /// Applies the window to an already ordered list.
    pub fn apply<T>(&self, items: Vec<T>) -> Vec<T> {
        let skipped = items.into_iter().skip(self.offset as usize);
        match self.limit {
            Some(limit) => skipped.take(limit as usize).collect(),
            None => skipped.collect(),
        }
    }
}

impl Pagination {
    pub fn page(page: u64, per_page: u64) -> Self {
        Self {
            page: Some(page),
            per_page: Some(per_page),
            ..Self::default()
        }
    }

    pub fn limit(limit: u64, offset: u64) -> Self {
        Self {
            limit: Some(limit),
            offset: Some(offset),
            ..Self::default()
        }
    }

    /// Resolves the pagination into a window.
    ///
    /// Returns `Ok(None)` when no limiting was requested, which lets stores skip
    /// the total-count query.
    pub fn window(&self) -> Result<Option<Window>, String> {
        if let Some(page) = self.page {
            if page == 0 {
                return Err("page must be 1 or greater".to_string());
            }
            let per_page = self.per_page.unwrap_or(DEFAULT_PER_PAGE);
            if per_page == 0 {
                return Err("per_page must be 1 or greater".to_string());
            }
            let offset = (page - 1)
                .checked_mul(per_page)
                .filter(|offset| *offset <= MAX_WINDOW_VALUE)
                .ok_or_else(|| {
                    format!("page {} is out of range for per_page {}", page, per_page)
                })?;
            return Ok(Some(Window {
                limit: Some(bounded(per_page, "per_page")?),
                offset,
            }));
        }

        match (self.limit, self.offset) {
            (None, None) | (None, Some(0)) => Ok(None),
            (limit, offset) => Ok(Some(Window {
                limit: limit.map(|limit| bounded(limit, "limit")).transpose()?,
                offset: bounded(offset.unwrap_or(0), "offset")?,
            })),
        }
    }
}

/// Largest limit or offset a store can bind as a signed 64-bit integer.
const MAX_WINDOW_VALUE: u64 = i64::MAX as u64;

fn bounded(value: u64, name: &str) -> Result<u64, String> {
    if value > MAX_WINDOW_VALUE {
        return Err(format!("{} must not exceed {}", name, MAX_WINDOW_VALUE));
    }
    Ok(value)
}

/// Timestamp bounds on a vote field.
///
/// `before`/`after` are strict, `until`/`since` are inclusive. A missing timestamp
/// (a never-modified vote) matches no bound.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct TimeRange {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub before: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub until: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub since: Option<DateTime<Utc>>,
}

impl TimeRange {
    pub fn is_unbounded(&self) -> bool {
        self.before.is_none()
            && self.after.is_none()
            && self.until.is_none()
            && self.since.is_none()
    }

    pub fn contains(&self, value: Option<DateTime<Utc>>) -> bool {
        if self.is_unbounded() {
            return true;
        }
        let Some(value) = value else {
            return false;
        };
        self.before.is_none_or(|bound| value < bound)
            && self.after.is_none_or(|bound| value > bound)
            && self.until.is_none_or(|bound| value <= bound)
            && self.since.is_none_or(|bound| value >= bound)
    }
}

/// Vote search parameters, all filters combined with AND.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct VoteQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ids: Option<Vec<VoteId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<OwnerId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<ResourceId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub liked: Option<bool>,
    /// Resolved through the resource store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_types: Option<Vec<ResourceType>>,
    /// Keeps votes on resources belonging to any of these item sets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_set_ids: Option<Vec<ResourceId>>,
    #[serde(default)]
    pub created: TimeRange,
    #[serde(default)]
    pub modified: TimeRange,
    /// Ignored for anonymous callers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub like_status: Option<LikeStatus>,
    #[serde(default)]
    pub sort: VoteSort,
    #[serde(default)]
    pub pagination: Pagination,
}

impl VoteQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_owner(owner_id: OwnerId) -> Self {
        Self {
            owner_id: Some(owner_id),
            ..Self::default()
        }
    }

    pub fn for_resource(resource_id: ResourceId) -> Self {
        Self {
            resource_id: Some(resource_id),
            ..Self::default()
        }
    }

    pub fn with_ids(mut self, ids: Vec<VoteId>) -> Self {
        self.ids = Some(ids);
        self
    }

    pub fn with_liked(mut self, liked: bool) -> Self {
        self.liked = Some(liked);
        self
    }

    pub fn with_resource_types(mut self, resource_types: Vec<ResourceType>) -> Self {
        self.resource_types = Some(resource_types);
        self
    }

    pub fn with_item_sets(mut self, item_set_ids: Vec<ResourceId>) -> Self {
        self.item_set_ids = Some(item_set_ids);
        self
    }

    pub fn with_like_status(mut self, status: LikeStatus) -> Self {
        self.like_status = Some(status);
        self
    }

    pub fn sorted_by(mut self, field: SortField, order: SortOrder) -> Self {
        self.sort = VoteSort::new(field, order);
        self
    }

    pub fn with_page(mut self, page: u64, per_page: u64) -> Self {
        self.pagination.page = Some(page);
        self.pagination.per_page = Some(per_page);
        self
    }

    pub fn with_limit(mut self, limit: u64) -> Self {
        self.pagination.limit = Some(limit);
        self
    }

    pub fn with_offset(mut self, offset: u64) -> Self {
        self.pagination.offset = Some(offset);
        self
    }

    /// True when the query filters on resource classification and needs the
    /// resource store to resolve candidates.
    pub fn needs_resource_lookup(&self) -> bool {
        self.resource_types.as_ref().is_some_and(|t| !t.is_empty())
            || self.item_set_ids.as_ref().is_some_and(|ids| !ids.is_empty())
    }

    /// Validate the query parameters.
    pub fn validate(&self) -> Result<(), String> {
        if self.ids.as_ref().is_some_and(|ids| ids.is_empty()) {
            return Err("ids must not be empty when provided".to_string());
        }
        self.pagination.window()?;
        Ok(())
    }
}

/// Store-level vote search input: a `VoteQuery` with every external lookup resolved.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct VoteCriteria {
    pub ids: Option<Vec<VoteId>>,
    pub owner_id: Option<OwnerId>,
    pub resource_id: Option<ResourceId>,
    pub liked: Option<bool>,
    /// Restricts matches to these resources.
    pub resource_ids: Option<Vec<ResourceId>>,
    pub created: TimeRange,
    pub modified: TimeRange,
    pub caller_status: Option<CallerStatus>,
    pub sort: VoteSort,
    pub window: Option<Window>,
}

impl VoteCriteria {
    /// Copies the plain filters of a query. Resource restriction and caller status
    /// are left for the query layer to fill in.
    pub fn from_query(query: &VoteQuery) -> Result<Self, String> {
        query.validate()?;
        Ok(Self {
            ids: query.ids.clone(),
            owner_id: query.owner_id,
            resource_id: query.resource_id,
            liked: query.liked,
            resource_ids: None,
            created: query.created,
            modified: query.modified,
            caller_status: None,
            sort: query.sort,
            window: query.pagination.window()?,
        })
    }

    /// Checks the single-row filters. Caller status depends on other rows and is
    /// evaluated by the store.
    pub fn matches(&self, vote: &Vote) -> bool {
        self.ids.as_ref().is_none_or(|ids| ids.contains(&vote.id))
            && self.owner_id.is_none_or(|owner| owner == vote.owner_id)
            && self.resource_id.is_none_or(|resource| resource == vote.resource_id)
            && self.liked.is_none_or(|liked| liked == vote.liked)
            && self
                .resource_ids
                .as_ref()
                .is_none_or(|ids| ids.contains(&vote.resource_id))
            && self.created.contains(Some(vote.created_at))
            && self.modified.contains(vote.modified_at)
    }
}

/// Single-field projection of a vote.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScalarField {
    Id,
    Owner,
    Resource,
    Liked,
    Created,
    Modified,
}

impl FromStr for ScalarField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "id" => Ok(ScalarField::Id),
            "owner" => Ok(ScalarField::Owner),
            "resource" => Ok(ScalarField::Resource),
            "liked" => Ok(ScalarField::Liked),
            "created" => Ok(ScalarField::Created),
            "modified" => Ok(ScalarField::Modified),
            other => Err(format!("unknown scalar field: {}", other)),
        }
    }
}

impl ScalarField {
    pub fn project(&self, vote: &Vote) -> Value {
        match self {
            ScalarField::Id => Value::from(vote.id),
            ScalarField::Owner => Value::from(vote.owner_id),
            ScalarField::Resource => Value::from(vote.resource_id),
            ScalarField::Liked => Value::from(vote.liked),
            ScalarField::Created => Value::from(vote.created_at.to_rfc3339()),
            ScalarField::Modified => vote
                .modified_at
                .map(|at| Value::from(at.to_rfc3339()))
                .unwrap_or(Value::Null),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn vote_at(created_at: DateTime<Utc>, modified_at: Option<DateTime<Utc>>) -> Vote {
        Vote {
            id: 7,
            owner_id: 1,
            resource_id: 2,
            liked: true,
            created_at,
            modified_at,
        }
    }

    #[test]
    fn test_page_takes_precedence_over_limit() {
        let pagination = Pagination {
            page: Some(3),
            per_page: Some(10),
            limit: Some(2),
            offset: Some(1),
        };
        assert_eq!(
            pagination.window(),
            Ok(Some(Window {
                limit: Some(10),
                offset: 20
            }))
        );
    }

    #[test]
    fn test_page_without_per_page_uses_default() {
        let pagination = Pagination {
            page: Some(2),
            ..Pagination::default()
        };
        assert_eq!(
            pagination.window(),
            Ok(Some(Window {
                limit: Some(DEFAULT_PER_PAGE),
                offset: DEFAULT_PER_PAGE
            }))
        );
    }

    #[test]
    fn test_no_pagination_is_unbounded() {
        assert_eq!(Pagination::default().window(), Ok(None));
        assert_eq!(
            Pagination {
                offset: Some(0),
                ..Pagination::default()
            }
            .window(),
            Ok(None)
        );
    }

    #[test]
    fn test_zero_page_is_rejected() {
        assert!(Pagination::page(0, 10).window().is_err());
        assert!(Pagination::page(1, 0).window().is_err());
    }

    #[test]
    fn test_oversized_window_is_rejected() {
        assert!(Pagination::page(u64::MAX, 25).window().is_err());
        assert!(Pagination::page(2, u64::MAX).window().is_err());
        assert!(Pagination::limit(u64::MAX, 0).window().is_err());
        assert!(Pagination::limit(10, i64::MAX as u64 + 1).window().is_err());
        assert_eq!(
            Pagination::limit(10, i64::MAX as u64).window(),
            Ok(Some(Window {
                limit: Some(10),
                offset: i64::MAX as u64
            }))
        );
    }

    #[test]
    fn test_window_apply() {
        let window = Window {
            limit: Some(2),
            offset: 1,
        };
        assert_eq!(window.apply(vec![1, 2, 3, 4]), vec![2, 3]);
        let open = Window {
            limit: None,
            offset: 3,
        };
        assert_eq!(open.apply(vec![1, 2, 3, 4]), vec![4]);
    }

    #[test]
    fn test_time_range_strict_and_inclusive_bounds() {
        let at = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap();

        let strict = TimeRange {
            before: Some(at),
            ..TimeRange::default()
        };
        assert!(!strict.contains(Some(at)));
        assert!(strict.contains(Some(at - Duration::seconds(1))));

        let inclusive = TimeRange {
            until: Some(at),
            ..TimeRange::default()
        };
        assert!(inclusive.contains(Some(at)));

        let after = TimeRange {
            after: Some(at),
            ..TimeRange::default()
        };
        assert!(!after.contains(Some(at)));

        let since = TimeRange {
            since: Some(at),
            ..TimeRange::default()
        };
        assert!(since.contains(Some(at)));
    }

    #[test]
    fn test_time_range_excludes_missing_timestamp() {
        let at = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap();
        assert!(TimeRange::default().contains(None));
        assert!(!TimeRange {
            since: Some(at),
            ..TimeRange::default()
        }
        .contains(None));
    }

    #[test]
    fn test_criteria_matches_plain_filters() {
        let created = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap();
        let vote = vote_at(created, None);

        let query = VoteQuery::for_resource(2).with_liked(true);
        let criteria = VoteCriteria::from_query(&query).unwrap();
        assert!(criteria.matches(&vote));

        let query = VoteQuery::for_owner(9);
        let criteria = VoteCriteria::from_query(&query).unwrap();
        assert!(!criteria.matches(&vote));

        let mut modified = VoteCriteria::default();
        modified.modified.since = Some(created);
        assert!(!modified.matches(&vote));
    }

    #[test]
    fn test_empty_ids_are_rejected() {
        assert!(VoteQuery::new().with_ids(vec![]).validate().is_err());
    }

    #[test]
    fn test_like_status_accepts() {
        assert!(LikeStatus::Liked.accepts(Some(true)));
        assert!(!LikeStatus::Liked.accepts(Some(false)));
        assert!(LikeStatus::Disliked.accepts(Some(false)));
        assert!(LikeStatus::Voted.accepts(Some(false)));
        assert!(!LikeStatus::Voted.accepts(None));
        assert!(LikeStatus::NotVoted.accepts(None));
    }

    #[test]
    fn test_sort_parsing() {
        assert_eq!("like_count".parse::<SortField>(), Ok(SortField::LikeCount));
        assert!("popularity".parse::<SortField>().is_err());
        assert_eq!(SortOrder::parse_lenient("DESC"), SortOrder::Desc);
        assert_eq!(SortOrder::parse_lenient("sideways"), SortOrder::Asc);
    }

    #[test]
    fn test_scalar_projection() {
        let created = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap();
        let vote = vote_at(created, None);
        assert_eq!(ScalarField::Owner.project(&vote), Value::from(1));
        assert_eq!(ScalarField::Liked.project(&vote), Value::from(true));
        assert_eq!(ScalarField::Modified.project(&vote), Value::Null);
        assert!("title".parse::<ScalarField>().is_err());
    }
}
