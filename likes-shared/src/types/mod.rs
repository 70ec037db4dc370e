mod ranking;
mod resource;
mod search_query;
mod search_result;
mod toggle;
mod vote;
mod vote_event;
mod votes_count;

pub use ranking::{RankBy, RankingCriteria, RankingQuery, ResourceRanking};
pub use resource::{Actor, Resource, ResourceType};
pub use search_query::{
    CallerStatus, LikeStatus, Pagination, ScalarField, SortField, SortOrder, TimeRange,
    VoteCriteria, VoteQuery, VoteSort, Window, DEFAULT_PER_PAGE,
};
pub use search_result::SearchResult;
pub use toggle::{ToggleAction, ToggleOutcome};
pub use vote::{OwnerId, ResourceId, Vote, VoteId};
pub use vote_event::{VoteChangeKind, VoteChanged};
pub use votes_count::{CountStrategy, VotesCount};
