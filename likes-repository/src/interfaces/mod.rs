//! This module defines and re-exports the interfaces for the vote store.
//! It serves as a central point for accessing traits related to data interaction.
mod count_aggregator;
mod vote_search;
mod vote_store;

pub use count_aggregator::CountAggregator;
pub use vote_search::VoteSearch;
pub use vote_store::VoteStore;

/// Everything the engine needs from a backend: record CRUD, counts and search.
pub trait VoteRepository: VoteStore + CountAggregator + VoteSearch {}

impl<T> VoteRepository for T where T: VoteStore + CountAggregator + VoteSearch {}
