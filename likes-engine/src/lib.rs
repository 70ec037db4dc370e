//! # Likes Engine
//! This crate holds the vote toggle state machine and the layers built on top of
//! the vote store: query resolution, domain events, settings and the service
//! facade that boundary code talks to.
pub mod collaborators;
pub mod events;
pub mod query;
pub mod service;
pub mod settings;
pub mod toggle;

pub mod errors;

pub use errors::EngineError;
pub use service::{LikesService, StatusResponse, ToggleResponse};
