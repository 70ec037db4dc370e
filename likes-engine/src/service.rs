//! Likes service implementation.
//!
//! The entry point boundary code (web handlers, maintenance tooling) uses for
//! every vote operation. It validates input, applies the settings, delegates to
//! the toggle engine and the query layer, and publishes a `VoteChanged` event
//! for every write.

use likes_repository::{CountAggregator, VoteRepository, VoteStore};
use likes_shared::types::{
    OwnerId, Pagination, RankingQuery, ResourceId, ResourceRanking, SearchResult, SortField,
    SortOrder, ToggleAction, Vote, VoteChangeKind, VoteChanged, VoteId, VoteQuery, VotesCount,
};
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{info, instrument, warn};

use crate::collaborators::{AccessPolicy, IdentityProvider, PolicyScope, ResourceStore};
use crate::errors::EngineError;
use crate::events::VoteEvents;
use crate::query::QueryLayer;
use crate::settings::LikesSettings;
use crate::toggle::ToggleEngine;

/// Result of a toggle, with the resource's counts after the write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ToggleResponse {
    pub action: ToggleAction,
    pub liked: Option<bool>,
    pub counts: VotesCount,
}

/// Read-only view of a resource for a (possibly anonymous) caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusResponse {
    pub liked: Option<bool>,
    pub counts: VotesCount,
    pub is_authenticated: bool,
}

/// The main service for casting and reading votes.
///
/// Holds the vote store behind `Arc<dyn VoteRepository>` so PostgreSQL and the
/// in-memory store are interchangeable.
pub struct LikesService {
    store: Arc<dyn VoteRepository>,
    identity: Arc<dyn IdentityProvider>,
    resources: Arc<dyn ResourceStore>,
    policy: Arc<dyn AccessPolicy>,
    settings: LikesSettings,
    engine: ToggleEngine,
    query: QueryLayer,
    events: VoteEvents,
}

impl LikesService {
    /// Create a new LikesService with its own event channel.
    ///
    /// # Arguments
    ///
    /// * `store` - Vote store implementation (e.g., `PostgresVoteStore`)
    /// * `identity` - Resolves actors and the current caller
    /// * `resources` - Resolves and classifies resources
    /// * `policy` - Decides whether existing votes may change
    /// * `settings` - Global behaviour settings
    pub fn new(
        store: Arc<dyn VoteRepository>,
        identity: Arc<dyn IdentityProvider>,
        resources: Arc<dyn ResourceStore>,
        policy: Arc<dyn AccessPolicy>,
        settings: LikesSettings,
    ) -> Self {
        Self::with_events(store, identity, resources, policy, settings, VoteEvents::default())
    }

    /// Create a new LikesService publishing on an existing event channel.
    pub fn with_events(
        store: Arc<dyn VoteRepository>,
        identity: Arc<dyn IdentityProvider>,
        resources: Arc<dyn ResourceStore>,
        policy: Arc<dyn AccessPolicy>,
        settings: LikesSettings,
        events: VoteEvents,
    ) -> Self {
        let engine = ToggleEngine::new(store.clone(), identity.clone(), resources.clone());
        let query = QueryLayer::new(store.clone(), resources.clone());
        Self {
            store,
            identity,
            resources,
            policy,
            settings,
            engine,
            query,
            events,
        }
    }

    pub fn settings(&self) -> &LikesSettings {
        &self.settings
    }

    pub fn subscribe(&self) -> broadcast::Receiver<VoteChanged> {
        self.events.subscribe()
    }

    fn validate_id(field_name: &str, value: i64) -> Result<(), EngineError> {
        if value <= 0 {
            return Err(EngineError::validation(format!(
                "{} must be a positive id, got {}",
                field_name, value
            )));
        }
        Ok(())
    }

    /// Checks a request that would cast or flip a vote against the scope's settings.
    ///
    /// Clearing a vote and toggling it off are always allowed, so a vote cast
    /// before a setting changed can still be removed.
    async fn validate_vote(
        &self,
        resource_id: ResourceId,
        actor_id: OwnerId,
        requested: Option<bool>,
        settings: &LikesSettings,
    ) -> Result<(), EngineError> {
        let Some(polarity) = requested else {
            return Ok(());
        };
        let current = self.store.find(actor_id, resource_id).await?;
        if current.is_some_and(|vote| vote.liked == polarity) {
            return Ok(());
        }

        if !polarity && !settings.allow_dislike {
            return Err(EngineError::validation("dislikes are disabled"));
        }
        if let Some(resource_type) = self.resources.resource_type(resource_id).await? {
            if !settings.is_likeable(resource_type) {
                return Err(EngineError::validation(format!(
                    "{} resources cannot be voted on",
                    resource_type
                )));
            }
        }
        Ok(())
    }

    fn publish(&self, resource_id: ResourceId, kind: VoteChangeKind) {
        self.events.publish(VoteChanged::new(resource_id, kind));
    }

    /// Toggle the actor's vote on a resource.
    ///
    /// # Arguments
    ///
    /// * `resource_id` - The voted-on resource
    /// * `actor_id` - The voting actor
    /// * `requested` - `Some(true)` like, `Some(false)` dislike, `None` clear
    /// * `scope` - Scope the change-vote policy is looked up in
    ///
    /// # Returns
    ///
    /// * `Ok(ToggleResponse)` - Action taken (including `denied` and `error`) and fresh counts
    /// * `Err(EngineError::Validation)` - Bad ids, or a cast or flip onto disabled dislikes or a
    ///   non-likeable resource type under the scope's settings
    #[instrument(skip(self))]
    pub async fn toggle(
        &self,
        resource_id: ResourceId,
        actor_id: OwnerId,
        requested: Option<bool>,
        scope: PolicyScope,
    ) -> Result<ToggleResponse, EngineError> {
        Self::validate_id("resource_id", resource_id)?;
        Self::validate_id("actor_id", actor_id)?;
        let settings = self.policy.settings_for(scope);
        self.validate_vote(resource_id, actor_id, requested, &settings)
            .await?;

        let change_allowed = settings.allow_change_vote;
        let outcome = self
            .engine
            .toggle(resource_id, actor_id, requested, change_allowed)
            .await?;
        if let Some(kind) = VoteChangeKind::from_toggle(outcome.action) {
            self.publish(resource_id, kind);
        }

        let counts = self.store.counts(resource_id).await?;
        info!(resource_id, actor_id, action = %outcome.action, "Toggled vote");

        Ok(ToggleResponse {
            action: outcome.action,
            liked: outcome.liked,
            counts,
        })
    }

    /// The caller's own polarity and the counts of a resource.
    pub async fn status(
        &self,
        resource_id: ResourceId,
        actor_id: Option<OwnerId>,
    ) -> Result<StatusResponse, EngineError> {
        Self::validate_id("resource_id", resource_id)?;
        let liked = match actor_id {
            Some(actor_id) => self.store.user_status(resource_id, actor_id).await?,
            None => None,
        };
        let counts = self.store.counts(resource_id).await?;
        Ok(StatusResponse {
            liked,
            counts,
            is_authenticated: actor_id.is_some(),
        })
    }

    /// `status` for the actor behind the current request.
    pub async fn current_status(
        &self,
        resource_id: ResourceId,
    ) -> Result<StatusResponse, EngineError> {
        let actor = self.identity.current_actor().await?;
        self.status(resource_id, actor.map(|a| a.id)).await
    }

    pub async fn counts(&self, resource_id: ResourceId) -> Result<VotesCount, EngineError> {
        Ok(self.store.counts(resource_id).await?)
    }

    pub async fn counts_many(
        &self,
        resource_ids: &[ResourceId],
    ) -> Result<HashMap<ResourceId, VotesCount>, EngineError> {
        Ok(self.store.counts_many(resource_ids).await?)
    }

    /// Search votes. `caller` enables the `like_status` filter.
    pub async fn search(
        &self,
        query: &VoteQuery,
        caller: Option<OwnerId>,
    ) -> Result<SearchResult<Vote>, EngineError> {
        self.query.search(query, caller).await
    }

    pub async fn search_scalar(
        &self,
        query: &VoteQuery,
        field: &str,
        caller: Option<OwnerId>,
    ) -> Result<BTreeMap<VoteId, Value>, EngineError> {
        self.query.search_scalar(query, field, caller).await
    }

    pub async fn rank_resources(
        &self,
        query: &RankingQuery,
        caller: Option<OwnerId>,
    ) -> Result<SearchResult<ResourceRanking>, EngineError> {
        self.query.rank(query, caller).await
    }

    /// The actor's own votes, newest first.
    pub async fn owner_votes(
        &self,
        owner_id: OwnerId,
        pagination: Pagination,
    ) -> Result<SearchResult<Vote>, EngineError> {
        Self::validate_id("owner_id", owner_id)?;
        let mut query =
            VoteQuery::for_owner(owner_id).sorted_by(SortField::Created, SortOrder::Desc);
        query.pagination = pagination;
        self.query.search(&query, Some(owner_id)).await
    }

    pub async fn get_vote(&self, id: VoteId) -> Result<Vote, EngineError> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| EngineError::not_found(format!("vote {}", id)))
    }

    /// Administrative delete of a single vote.
    #[instrument(skip(self))]
    pub async fn delete_vote(&self, id: VoteId) -> Result<(), EngineError> {
        let vote = self.get_vote(id).await?;
        if self.store.delete(id).await? {
            self.publish(vote.resource_id, VoteChangeKind::Deleted);
            info!(vote_id = id, resource_id = vote.resource_id, "Deleted vote");
        }
        Ok(())
    }

    /// Deletes all votes of the given resources.
    ///
    /// Failures on individual resources are logged and skipped; the returned count
    /// covers the resources that were reset.
    #[instrument(skip(self, resource_ids), fields(resources = resource_ids.len()))]
    pub async fn batch_reset(&self, resource_ids: &[ResourceId]) -> Result<u64, EngineError> {
        let mut deleted = 0;
        for resource_id in resource_ids {
            match self.store.delete_by_resource(*resource_id).await {
                Ok(count) => {
                    if count > 0 {
                        self.publish(*resource_id, VoteChangeKind::Deleted);
                    }
                    deleted += count;
                }
                Err(e) => {
                    warn!(resource_id, error = %e, "Failed to reset votes");
                }
            }
        }
        info!(deleted, "Reset votes");
        Ok(deleted)
    }

    /// Cascade for an actor removed by the identity provider.
    #[instrument(skip(self))]
    pub async fn actor_deleted(&self, owner_id: OwnerId) -> Result<u64, EngineError> {
        let touched = self.store.delete_by_owner(owner_id).await?;
        let resources: BTreeSet<ResourceId> = touched.iter().copied().collect();
        for resource_id in resources {
            self.publish(resource_id, VoteChangeKind::Deleted);
        }
        info!(owner_id, deleted = touched.len(), "Removed votes of deleted actor");
        Ok(touched.len() as u64)
    }

    /// Cascade for a resource removed by the resource store.
    #[instrument(skip(self))]
    pub async fn resource_deleted(&self, resource_id: ResourceId) -> Result<u64, EngineError> {
        let deleted = self.store.delete_by_resource(resource_id).await?;
        if deleted > 0 {
            self.publish(resource_id, VoteChangeKind::Deleted);
        }
        Ok(deleted)
    }
}
