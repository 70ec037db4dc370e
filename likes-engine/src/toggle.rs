//! The vote toggle state machine.
//!
//! `decide` is the pure transition table. `ToggleEngine` reads the current vote,
//! applies the decided transition to the store and settles the create race: when
//! two first votes for the same pair collide, the loser re-reads the winner's
//! vote once and applies the table to it.
use likes_repository::{VoteRepository, VoteStore, VoteStoreError};
use likes_shared::types::{OwnerId, ResourceId, ToggleOutcome, Vote};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::collaborators::{IdentityProvider, ResourceStore};
use crate::errors::EngineError;

/// Vote state of an `(owner, resource)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteState {
    NoVote,
    Liked,
    Disliked,
}

impl VoteState {
    pub fn of(vote: Option<&Vote>) -> Self {
        match vote.map(|v| v.liked) {
            None => VoteState::NoVote,
            Some(true) => VoteState::Liked,
            Some(false) => VoteState::Disliked,
        }
    }

    pub fn polarity(&self) -> Option<bool> {
        match self {
            VoteState::NoVote => None,
            VoteState::Liked => Some(true),
            VoteState::Disliked => Some(false),
        }
    }
}

/// What a toggle request does to the pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Create(bool),
    Update(bool),
    Delete,
    Deny,
    Noop,
}

/// Decides the transition for a requested polarity (`None` clears the vote).
///
/// Repeating the current polarity always removes the vote, even when changes are
/// locked. The lock only blocks flipping or clearing an existing vote.
pub fn decide(current: VoteState, requested: Option<bool>, change_allowed: bool) -> Transition {
    match (current.polarity(), requested) {
        (None, Some(liked)) => Transition::Create(liked),
        (None, None) => Transition::Noop,
        (Some(current), Some(requested)) if current == requested => Transition::Delete,
        (Some(_), _) if !change_allowed => Transition::Deny,
        (Some(_), Some(requested)) => Transition::Update(requested),
        (Some(_), None) => Transition::Delete,
    }
}

/// Applies toggle requests to the vote store.
pub struct ToggleEngine {
    store: Arc<dyn VoteRepository>,
    identity: Arc<dyn IdentityProvider>,
    resources: Arc<dyn ResourceStore>,
}

impl ToggleEngine {
    pub fn new(
        store: Arc<dyn VoteRepository>,
        identity: Arc<dyn IdentityProvider>,
        resources: Arc<dyn ResourceStore>,
    ) -> Self {
        Self {
            store,
            identity,
            resources,
        }
    }

    /// Toggles the vote of `owner_id` on `resource_id`.
    ///
    /// # Arguments
    ///
    /// * `resource_id` - The voted-on resource
    /// * `owner_id` - The voting actor
    /// * `requested` - `Some(true)` like, `Some(false)` dislike, `None` clear
    /// * `change_allowed` - Whether an existing vote may be flipped or cleared
    ///
    /// # Returns
    ///
    /// The action taken and the polarity left in place. Unresolvable actors or
    /// resources and unsettled races come back as an `error` outcome.
    pub async fn toggle(
        &self,
        resource_id: ResourceId,
        owner_id: OwnerId,
        requested: Option<bool>,
        change_allowed: bool,
    ) -> Result<ToggleOutcome, EngineError> {
        let existing = self.store.find(owner_id, resource_id).await?;
        match decide(VoteState::of(existing.as_ref()), requested, change_allowed) {
            Transition::Create(liked) => {
                self.create(resource_id, owner_id, liked, change_allowed)
                    .await
            }
            transition => self.apply(existing, transition).await,
        }
    }

    async fn create(
        &self,
        resource_id: ResourceId,
        owner_id: OwnerId,
        liked: bool,
        change_allowed: bool,
    ) -> Result<ToggleOutcome, EngineError> {
        if self.identity.resolve_actor(owner_id).await?.is_none() {
            warn!(owner_id, resource_id, "Cannot vote: actor not found");
            return Ok(ToggleOutcome::error());
        }
        if self.resources.resolve_resource(resource_id).await?.is_none() {
            warn!(owner_id, resource_id, "Cannot vote: resource not found");
            return Ok(ToggleOutcome::error());
        }

        match self.store.create(owner_id, resource_id, liked).await {
            Ok(vote) => Ok(ToggleOutcome::created(vote.liked)),
            Err(err) if err.is_conflict() => {
                debug!(owner_id, resource_id, "Lost create race, retrying on the stored vote");
                self.retry_after_conflict(resource_id, owner_id, liked, change_allowed)
                    .await
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn retry_after_conflict(
        &self,
        resource_id: ResourceId,
        owner_id: OwnerId,
        liked: bool,
        change_allowed: bool,
    ) -> Result<ToggleOutcome, EngineError> {
        let Some(vote) = self.store.find(owner_id, resource_id).await? else {
            warn!(owner_id, resource_id, "Conflicting vote vanished before retry");
            return Ok(ToggleOutcome::error());
        };
        let transition = decide(VoteState::of(Some(&vote)), Some(liked), change_allowed);
        self.apply(Some(vote), transition).await
    }

    async fn apply(
        &self,
        existing: Option<Vote>,
        transition: Transition,
    ) -> Result<ToggleOutcome, EngineError> {
        match (transition, existing) {
            (Transition::Noop, _) => Ok(ToggleOutcome::none()),
            (Transition::Deny, Some(vote)) => Ok(ToggleOutcome::denied(vote.liked)),
            (Transition::Delete, Some(vote)) => {
                self.store.delete(vote.id).await?;
                Ok(ToggleOutcome::deleted())
            }
            (Transition::Update(liked), Some(vote)) => {
                match self.store.update(vote.id, liked).await {
                    Ok(updated) => Ok(ToggleOutcome::updated(updated.liked)),
                    Err(VoteStoreError::NotFound(id)) => {
                        warn!(vote_id = id, "Vote vanished before update");
                        Ok(ToggleOutcome::error())
                    }
                    Err(err) => Err(err.into()),
                }
            }
            (Transition::Create(_), _) | (_, None) => Ok(ToggleOutcome::error()),
        }
    }
}
