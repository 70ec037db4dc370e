//! Behaviour and presentation settings.
//!
//! `LikesSettings` holds the global values. `SiteSettings` carries per-site
//! overrides where an unset value inherits the global one.

use likes_shared::types::{CountStrategy, ResourceType, VotesCount};
use serde::{Deserialize, Serialize};

/// Global likes configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikesSettings {
    /// When false, a cast vote is locked: it can be neither flipped nor cleared.
    pub allow_change_vote: bool,
    pub allow_dislike: bool,
    /// Resource types that accept votes.
    pub resource_types: Vec<ResourceType>,
    pub show_count_like: bool,
    pub show_count_dislike: bool,
    pub count_strategy: CountStrategy,
}

impl Default for LikesSettings {
    fn default() -> Self {
        Self {
            allow_change_vote: true,
            allow_dislike: true,
            resource_types: vec![ResourceType::Items],
            show_count_like: true,
            show_count_dislike: false,
            count_strategy: CountStrategy::Live,
        }
    }
}

/// Counts as they should be displayed, hidden counts are `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayCounts {
    pub likes: Option<i64>,
    pub dislikes: Option<i64>,
}

impl LikesSettings {
    pub fn is_likeable(&self, resource_type: ResourceType) -> bool {
        self.resource_types.contains(&resource_type)
    }

    /// Applies site overrides on top of these settings.
    pub fn resolve(&self, site: &SiteSettings) -> LikesSettings {
        LikesSettings {
            allow_change_vote: site.allow_change_vote.unwrap_or(self.allow_change_vote),
            allow_dislike: site.allow_dislike.unwrap_or(self.allow_dislike),
            resource_types: site
                .resource_types
                .clone()
                .unwrap_or_else(|| self.resource_types.clone()),
            show_count_like: site.show_count_like.unwrap_or(self.show_count_like),
            show_count_dislike: site.show_count_dislike.unwrap_or(self.show_count_dislike),
            count_strategy: self.count_strategy,
        }
    }

    pub fn display_counts(&self, counts: &VotesCount) -> DisplayCounts {
        DisplayCounts {
            likes: self.show_count_like.then_some(counts.likes),
            dislikes: (self.allow_dislike && self.show_count_dislike).then_some(counts.dislikes),
        }
    }
}

/// Per-site overrides. `None` inherits the global value.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SiteSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_change_vote: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_dislike: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_types: Option<Vec<ResourceType>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_count_like: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_count_dislike: Option<bool>,
}

impl SiteSettings {
    /// Parses a stored site flag. The empty string means "inherit".
    pub fn parse_flag(value: &str) -> Result<Option<bool>, String> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" => Ok(None),
            "1" | "true" | "yes" | "on" => Ok(Some(true)),
            "0" | "false" | "no" | "off" => Ok(Some(false)),
            other => Err(format!("invalid flag value: {}", other)),
        }
    }
}
