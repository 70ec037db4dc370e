use likes_engine::LikesService;
use likes_engine::collaborators::{PassthroughDirectory, SettingsPolicy};
use likes_repository::PostgresVoteStore;
use std::sync::Arc;
use tracing::info;

use crate::config::AppConfig;
use crate::errors::AppError;

/// `Dependencies` holds the wired-up components of the likes application.
///
/// The store is kept alongside the service for operations that only the
/// PostgreSQL backend offers, such as rebuilding the counter table.
pub struct Dependencies {
    pub store: Arc<PostgresVoteStore>,
    pub service: LikesService,
}

impl Dependencies {
    /// Connects to the database, applies migrations and builds the service.
    ///
    /// # Arguments
    ///
    /// * `config` - Application configuration loaded from the environment
    ///
    /// # Returns
    ///
    /// A `Result` which is `Ok(Self)` on successful initialization or an
    /// `AppError` if the database is unreachable or a migration fails.
    pub async fn new(config: &AppConfig) -> Result<Self, AppError> {
        let store = PostgresVoteStore::connect(&config.database_url, config.max_connections)
            .await?
            .with_strategy(config.settings.count_strategy);
        store.migrate().await?;
        info!(
            max_connections = config.max_connections,
            count_strategy = ?store.strategy(),
            "Connected to vote store"
        );

        let store = Arc::new(store);
        let directory = Arc::new(PassthroughDirectory::default());
        let policy = Arc::new(SettingsPolicy::new(config.settings.clone()));
        let service = LikesService::new(
            store.clone(),
            directory.clone(),
            directory,
            policy,
            config.settings.clone(),
        );

        Ok(Self { store, service })
    }
}
