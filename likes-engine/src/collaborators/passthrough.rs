use likes_shared::types::{Actor, OwnerId, Resource, ResourceId, ResourceType};
use std::collections::HashSet;

use crate::collaborators::{IdentityProvider, ResourceStore};
use crate::errors::EngineError;

/// Directory that trusts every positive id.
///
/// Used by maintenance tooling that runs without the host application: every
/// resource is reported as `resource_type` and belongs to no group, and there is
/// never a current actor.
#[derive(Debug, Clone)]
pub struct PassthroughDirectory {
    resource_type: ResourceType,
}

impl PassthroughDirectory {
    pub fn new(resource_type: ResourceType) -> Self {
        Self { resource_type }
    }
}

impl Default for PassthroughDirectory {
    fn default() -> Self {
        Self::new(ResourceType::Items)
    }
}

#[async_trait::async_trait]
impl IdentityProvider for PassthroughDirectory {
    async fn resolve_actor(&self, id: OwnerId) -> Result<Option<Actor>, EngineError> {
        Ok((id > 0).then_some(Actor { id }))
    }

    async fn current_actor(&self) -> Result<Option<Actor>, EngineError> {
        Ok(None)
    }
}

#[async_trait::async_trait]
impl ResourceStore for PassthroughDirectory {
    async fn resolve_resource(&self, id: ResourceId) -> Result<Option<Resource>, EngineError> {
        Ok((id > 0).then_some(Resource {
            id,
            resource_type: self.resource_type,
        }))
    }

    async fn resource_type(&self, id: ResourceId) -> Result<Option<ResourceType>, EngineError> {
        Ok((id > 0).then_some(self.resource_type))
    }

    async fn group_membership(&self, _id: ResourceId) -> Result<HashSet<ResourceId>, EngineError> {
        Ok(HashSet::new())
    }
}
