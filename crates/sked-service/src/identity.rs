//! NewsML-style GUIDs for events and series.

use chrono::Utc;
use sked_core::config::IdentityConfig;
use sked_core::constants::NEWSML_URN_PREFIX;

use crate::ports::IdGenerator;

/// Mints `urn:newsml:<domain>:<timestamp>:<uuid>` identifiers.
#[derive(Debug, Clone)]
pub struct NewsmlGuidGenerator {
    urn_domain: String,
}

impl NewsmlGuidGenerator {
    #[must_use]
    pub fn new(urn_domain: impl Into<String>) -> Self {
        Self {
            urn_domain: urn_domain.into(),
        }
    }

    #[must_use]
    pub fn from_config(config: &IdentityConfig) -> Self {
        Self::new(config.urn_domain.clone())
    }
}

impl Default for NewsmlGuidGenerator {
    fn default() -> Self {
        Self::from_config(&IdentityConfig::default())
    }
}

impl IdGenerator for NewsmlGuidGenerator {
    fn new_id(&mut self) -> String {
        format!(
            "{NEWSML_URN_PREFIX}:{}:{}:{}",
            self.urn_domain,
            Utc::now().format("%Y-%m-%dT%H:%M:%S%.6f"),
            uuid::Uuid::new_v4()
        )
    }
}
