//! Storage key derivation

use crate::types::{OverrideField, SiteId};

/// Prefix used when the configuration does not name one
pub const DEFAULT_KEY_PREFIX: &str = "override_";

/// The two attribute keys an overlay reads and writes for its site
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverrideKeys {
    site: SiteId,
    display_name: String,
    description: String,
}

impl OverrideKeys {
    /// Derive `<prefix><field>_<site>` for both fields
    pub fn derive(prefix: &str, site: SiteId) -> Self {
        Self {
            site,
            display_name: format!("{}{}_{}", prefix, OverrideField::DisplayName.slug(), site),
            description: format!("{}{}_{}", prefix, OverrideField::Description.slug(), site),
        }
    }

    pub fn site(&self) -> SiteId {
        self.site
    }

    pub fn key(&self, field: OverrideField) -> &str {
        match field {
            OverrideField::DisplayName => &self.display_name,
            OverrideField::Description => &self.description,
        }
    }
}
