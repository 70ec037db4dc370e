use std::collections::HashMap;

use crate::collaborators::{AccessPolicy, PolicyScope, SiteId};
use crate::settings::{LikesSettings, SiteSettings};

/// Access policy backed by the global settings and per-site overrides.
#[derive(Debug, Clone, Default)]
pub struct SettingsPolicy {
    global: LikesSettings,
    sites: HashMap<SiteId, SiteSettings>,
}

impl SettingsPolicy {
    pub fn new(global: LikesSettings) -> Self {
        Self {
            global,
            sites: HashMap::new(),
        }
    }

    pub fn with_site(mut self, site_id: SiteId, settings: SiteSettings) -> Self {
        self.sites.insert(site_id, settings);
        self
    }
}

impl AccessPolicy for SettingsPolicy {
    /// Unknown sites inherit everything.
    fn settings_for(&self, scope: PolicyScope) -> LikesSettings {
        match scope {
            PolicyScope::Global => self.global.clone(),
            PolicyScope::Site(site_id) => match self.sites.get(&site_id) {
                Some(site) => self.global.resolve(site),
                None => self.global.clone(),
            },
        }
    }
}
