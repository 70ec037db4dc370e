use serde::{Deserialize, Serialize};
use std::fmt;

/// What a toggle request did to the vote of an `(owner, resource)` pair.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ToggleAction {
    /// A first vote was cast.
    Created,
    /// An existing vote flipped polarity.
    Updated,
    /// The vote was removed (toggle-off or explicit clear).
    Deleted,
    /// The policy locks the existing vote; nothing changed.
    Denied,
    /// Clear requested with no vote in place; nothing changed.
    None,
    /// The actor or resource could not be resolved, or a race could not be settled.
    Error,
}

impl ToggleAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToggleAction::Created => "created",
            ToggleAction::Updated => "updated",
            ToggleAction::Deleted => "deleted",
            ToggleAction::Denied => "denied",
            ToggleAction::None => "none",
            ToggleAction::Error => "error",
        }
    }
}

impl fmt::Display for ToggleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a toggle: the action taken and the polarity left in place.
///
/// `liked` is `None` after `none`, `deleted` and `error`; after `denied` it is the
/// unchanged polarity of the locked vote.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToggleOutcome {
    pub action: ToggleAction,
    pub liked: Option<bool>,
}

impl ToggleOutcome {
    pub fn created(liked: bool) -> Self {
        Self {
            action: ToggleAction::Created,
            liked: Some(liked),
        }
    }

    pub fn updated(liked: bool) -> Self {
        Self {
            action: ToggleAction::Updated,
            liked: Some(liked),
        }
    }

    pub fn deleted() -> Self {
        Self {
            action: ToggleAction::Deleted,
            liked: None,
        }
    }

    pub fn denied(current: bool) -> Self {
        Self {
            action: ToggleAction::Denied,
            liked: Some(current),
        }
    }

    pub fn none() -> Self {
        Self {
            action: ToggleAction::None,
            liked: None,
        }
    }

    pub fn error() -> Self {
        Self {
            action: ToggleAction::Error,
            liked: None,
        }
    }
}
