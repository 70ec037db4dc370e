use serde::{Deserialize, Serialize};

use crate::types::{ResourceId, ToggleAction};

/// The kind of write that touched the votes of a resource.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum VoteChangeKind {
    Created,
    Updated,
    Deleted,
}

impl VoteChangeKind {
    /// Maps a toggle action to the change it caused, if any.
    pub fn from_toggle(action: ToggleAction) -> Option<Self> {
        match action {
            ToggleAction::Created => Some(Self::Created),
            ToggleAction::Updated => Some(Self::Updated),
            ToggleAction::Deleted => Some(Self::Deleted),
            ToggleAction::Denied | ToggleAction::None | ToggleAction::Error => None,
        }
    }
}

/// Domain event published whenever the votes of a resource change.
///
/// Reindexers and other downstream collaborators subscribe to these instead of
/// hooking into the write path.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VoteChanged {
    pub resource_id: ResourceId,
    pub action: VoteChangeKind,
}

impl VoteChanged {
    pub fn new(resource_id: ResourceId, action: VoteChangeKind) -> Self {
        Self {
            resource_id,
            action,
        }
    }
}
