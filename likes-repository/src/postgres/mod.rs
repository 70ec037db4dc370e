//! PostgreSQL backend for the vote store.
//! Schema migrations live in the crate's `migrations/` directory.
mod vote_store;

pub use vote_store::PostgresVoteStore;
