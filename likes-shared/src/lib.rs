//! # Likes Shared
//! This crate defines shared data structures and types used across the likes crates.
//! It includes common definitions for votes, vote counts, toggle outcomes, change events,
//! resource classification and the search / ranking query types.
pub mod types;
