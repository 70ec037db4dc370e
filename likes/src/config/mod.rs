//! Configuration module for the likes application.
//! Loads settings from the environment and wires up dependencies.
mod dependencies;
mod env;

pub use dependencies::Dependencies;
pub use env::AppConfig;
