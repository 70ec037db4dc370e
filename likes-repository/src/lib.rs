//! # Likes Repository
//! This crate provides traits and implementations for interacting with the
//! vote store. It includes definitions for errors, interfaces, and concrete
//! implementations for PostgreSQL and for an in-memory store.
pub mod errors;
pub mod interfaces;
pub mod memory;
pub mod postgres;

pub use errors::VoteStoreError;
pub use interfaces::{CountAggregator, VoteRepository, VoteSearch, VoteStore};
pub use memory::MemoryVoteStore;
pub use postgres::PostgresVoteStore;
