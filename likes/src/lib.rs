//! Likes Library
//!
//! Configuration loading, dependency wiring and the maintenance commands of the
//! `likes` binary.

pub mod command;
pub mod config;
pub mod errors;
pub mod event_log;

pub use command::Command;
pub use config::{AppConfig, Dependencies};
pub use errors::AppError;
pub use event_log::spawn_event_logger;
