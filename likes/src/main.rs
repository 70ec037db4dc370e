//! Likes Main Entry Point
//!
//! Maintenance binary for the likes vote store: applies migrations and runs
//! administrative commands (bulk reset, cascades, counts, rankings).

use dotenv::dotenv;
use likes::{AppConfig, AppError, Command, Dependencies, spawn_event_logger};
use std::env;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing/logging.
fn init_tracing() -> Result<(), AppError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("likes=info,likes_engine=info,likes_repository=info"));

    let json = env::var("LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json"));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true),
            )
            .try_init()
            .map_err(|e| AppError::Tracing(e.to_string()))?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(true).pretty())
            .try_init()
            .map_err(|e| AppError::Tracing(e.to_string()))?;
    }

    info!(
        service_name = "likes",
        service_version = env!("CARGO_PKG_VERSION"),
        json,
        "Tracing initialized"
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Load environment variables from .env file
    dotenv().ok();

    init_tracing()?;

    let command = Command::parse(env::args().skip(1))?;
    let config = AppConfig::from_env()?;

    let deps = match Dependencies::new(&config).await {
        Ok(deps) => {
            info!("Dependencies initialized successfully");
            deps
        }
        Err(e) => {
            error!(error = %e, "Failed to initialize dependencies");
            return Err(e);
        }
    };
    let logger = spawn_event_logger(deps.service.subscribe());

    let result = command.execute(&deps).await;
    drop(deps);
    match logger.await {
        Ok(logged) => info!(logged, "Vote events flushed"),
        Err(e) => warn!(error = %e, "Vote event logger stopped unexpectedly"),
    }

    if let Err(e) = &result {
        error!(error = %e, command = ?command, "Command failed");
    }
    result
}
