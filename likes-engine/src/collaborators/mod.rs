//! Interfaces to the systems the engine does not own: the identity provider,
//! the resource store and the access policy gate.
mod passthrough;
mod policy;

pub use passthrough::PassthroughDirectory;
pub use policy::SettingsPolicy;

use likes_shared::types::{Actor, OwnerId, Resource, ResourceId, ResourceType};
use std::collections::HashSet;

use crate::errors::EngineError;
use crate::settings::LikesSettings;

/// Identifier of a logical sub-site with its own settings.
pub type SiteId = i64;

/// Where a policy decision applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PolicyScope {
    #[default]
    Global,
    Site(SiteId),
}

/// Resolves actors. Actors are opaque ids owned elsewhere.
#[async_trait::async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn resolve_actor(&self, id: OwnerId) -> Result<Option<Actor>, EngineError>;

    /// The actor behind the current request, `None` for anonymous callers.
    async fn current_actor(&self) -> Result<Option<Actor>, EngineError>;
}

/// Resolves and classifies resources.
#[async_trait::async_trait]
pub trait ResourceStore: Send + Sync {
    async fn resolve_resource(&self, id: ResourceId) -> Result<Option<Resource>, EngineError>;

    async fn resource_type(&self, id: ResourceId) -> Result<Option<ResourceType>, EngineError>;

    /// Item sets (or other groups) the resource belongs to.
    async fn group_membership(&self, id: ResourceId) -> Result<HashSet<ResourceId>, EngineError>;
}

/// Supplies the effective settings of a scope, including the "can an existing
/// vote be changed" decision.
pub trait AccessPolicy: Send + Sync {
    fn settings_for(&self, scope: PolicyScope) -> LikesSettings;

    fn change_allowed(&self, scope: PolicyScope) -> bool {
        self.settings_for(scope).allow_change_vote
    }
}
