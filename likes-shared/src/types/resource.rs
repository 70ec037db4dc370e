use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::types::{OwnerId, ResourceId};

/// Classification of a resource, as reported by the external resource store.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    Items,
    ItemSets,
    Media,
}

impl ResourceType {
    pub const ALL: [ResourceType; 3] = [
        ResourceType::Items,
        ResourceType::ItemSets,
        ResourceType::Media,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Items => "items",
            ResourceType::ItemSets => "item_sets",
            ResourceType::Media => "media",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "items" => Ok(ResourceType::Items),
            "item_sets" => Ok(ResourceType::ItemSets),
            "media" => Ok(ResourceType::Media),
            other => Err(format!("unknown resource type: {}", other)),
        }
    }
}

/// An actor resolved by the identity provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Actor {
    pub id: OwnerId,
}

/// A resource resolved by the resource store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Resource {
    pub id: ResourceId,
    pub resource_type: ResourceType,
}
