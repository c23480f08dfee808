//! The overlay bound to one active site

use serde::Serialize;
use tracing::{debug, info, warn};

use super::form::{FormField, ProfileForm};
use super::keys::OverrideKeys;
use super::submission::ProfileSubmission;
use crate::config::OverlaySettings;
use crate::error::{Error, Result};
use crate::host::HostServices;
use crate::types::{OverrideField, Site, SiteId, UserId};

/// Overrides currently stored for one (user, site) pair
///
/// Empty stored values are reported as `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SiteOverrides {
    pub display_name: Option<String>,
    pub description: Option<String>,
}

impl SiteOverrides {
    pub fn get(&self, field: OverrideField) -> Option<&str> {
        match field {
            OverrideField::DisplayName => self.display_name.as_deref(),
            OverrideField::Description => self.description.as_deref(),
        }
    }
}

/// Result of a successful save: the sanitized values that were written
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SavedOverrides {
    pub user_id: UserId,
    pub site_id: SiteId,
    pub display_name: String,
    pub description: String,
}

impl SavedOverrides {
    pub fn get(&self, field: OverrideField) -> &str {
        match field {
            OverrideField::DisplayName => &self.display_name,
            OverrideField::Description => &self.description,
        }
    }
}

/// Site-scoped attribute overlay
///
/// Built once per request for the active site. The site and its two
/// storage keys are fixed for the overlay's lifetime.
#[derive(Debug, Clone)]
pub struct SiteOverlay {
    site: Site,
    keys: OverrideKeys,
    nonce_action: String,
    nonce_field: String,
    host: HostServices,
}

impl SiteOverlay {
    pub fn new(site: Site, settings: &OverlaySettings, host: HostServices) -> Self {
        let keys = OverrideKeys::derive(&settings.key_prefix, site.id);
        Self {
            site,
            keys,
            nonce_action: settings.nonce_action.clone(),
            nonce_field: settings.nonce_field.clone(),
            host,
        }
    }

    pub fn site(&self) -> &Site {
        &self.site
    }

    pub fn keys(&self) -> &OverrideKeys {
        &self.keys
    }

    pub fn nonce_action(&self) -> &str {
        &self.nonce_action
    }

    pub fn nonce_field(&self) -> &str {
        &self.nonce_field
    }

    // ─────────────────────────────────────────────────────────────────
    // Reads
    // ─────────────────────────────────────────────────────────────────

    /// Stored override for `user` on this site; empty counts as absent
    pub fn read_override(&self, user: UserId, field: OverrideField) -> Result<Option<String>> {
        let value = self.host.store.read_attribute(user, self.keys.key(field))?;
        Ok(value.filter(|v| !v.is_empty()))
    }

    /// Both overrides for `user` on this site
    pub fn overrides_for(&self, user: UserId) -> Result<SiteOverrides> {
        Ok(SiteOverrides {
            display_name: self.read_override(user, OverrideField::DisplayName)?,
            description: self.read_override(user, OverrideField::Description)?,
        })
    }

    // ─────────────────────────────────────────────────────────────────
    // Form Rendering
    // ─────────────────────────────────────────────────────────────────

    /// Build the override fields for `user`'s profile-edit page
    ///
    /// Issues a fresh anti-forgery token; performs no writes.
    pub fn render_fields(&self, user: UserId) -> Result<ProfileForm> {
        let mut fields = Vec::with_capacity(OverrideField::all().len());
        for field in OverrideField::all() {
            let value = self.read_override(user, *field)?.unwrap_or_default();
            fields.push(FormField::new(*field, self.keys.key(*field), &self.site, value));
        }

        let nonce = self.host.nonces.issue(&self.nonce_action);
        debug!(user_id = %user, site_id = %self.site.id, "Rendered override fields");

        Ok(ProfileForm::new(
            user,
            self.site.id,
            &self.nonce_field,
            nonce,
            fields,
        ))
    }

    /// A submission carrying `values` and a freshly issued token
    ///
    /// Used by callers that drive the save path without a browser form.
    pub fn prepare_submission(
        &self,
        display_name: Option<&str>,
        description: Option<&str>,
    ) -> ProfileSubmission {
        let mut submission = ProfileSubmission::new().with_field(
            self.nonce_field.as_str(),
            self.host.nonces.issue(&self.nonce_action),
        );
        if let Some(value) = display_name {
            submission = submission.with_field(self.keys.key(OverrideField::DisplayName), value);
        }
        if let Some(value) = description {
            submission = submission.with_field(self.keys.key(OverrideField::Description), value);
        }
        submission
    }

    // ─────────────────────────────────────────────────────────────────
    // Save
    // ─────────────────────────────────────────────────────────────────

    /// Persist both overrides for `user` on this site
    ///
    /// The permission and token checks run before anything is written.
    /// An absent field is saved as the empty string, clearing it.
    pub fn save(&self, user: UserId, submission: &ProfileSubmission) -> Result<SavedOverrides> {
        if !self.host.authorizer.can_edit_user(user) {
            return Err(Error::permission_denied(user));
        }

        let token = submission
            .get(&self.nonce_field)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::invalid_request("missing anti-forgery token"))?;
        if !self.host.nonces.verify(&self.nonce_action, token) {
            return Err(Error::invalid_request("anti-forgery token rejected"));
        }

        let sanitize = |field: OverrideField| {
            let raw = submission.get(self.keys.key(field)).unwrap_or("");
            self.host.sanitizer.sanitize(field, raw)
        };
        let saved = SavedOverrides {
            user_id: user,
            site_id: self.site.id,
            display_name: sanitize(OverrideField::DisplayName),
            description: sanitize(OverrideField::Description),
        };

        for field in OverrideField::all() {
            self.host
                .store
                .write_attribute(user, self.keys.key(*field), saved.get(*field))?;
        }

        info!(
            user_id = %user,
            site_id = %self.site.id,
            display_name_set = !saved.display_name.is_empty(),
            description_set = !saved.description.is_empty(),
            "Saved site overrides"
        );
        Ok(saved)
    }

    // ─────────────────────────────────────────────────────────────────
    // Resolution
    // ─────────────────────────────────────────────────────────────────

    /// Effective value of `field` for `subject` on this site
    ///
    /// Never fails: a missing subject or a store error yields `base`.
    pub fn resolve(&self, field: OverrideField, base: &str, subject: Option<UserId>) -> String {
        match self.try_resolve(field, subject) {
            Ok(Some(value)) => value,
            Ok(None) => base.to_string(),
            Err(e @ Error::MissingSubject { .. }) => {
                debug!(field = %field, site_id = %self.site.id, "{}", e);
                base.to_string()
            }
            Err(e) => {
                warn!(field = %field, site_id = %self.site.id, "{}", e.format_for_log());
                base.to_string()
            }
        }
    }

    pub fn resolve_display_name(&self, base: &str, subject: Option<UserId>) -> String {
        self.resolve(OverrideField::DisplayName, base, subject)
    }

    pub fn resolve_description(&self, base: &str, subject: Option<UserId>) -> String {
        self.resolve(OverrideField::Description, base, subject)
    }

    fn try_resolve(&self, field: OverrideField, subject: Option<UserId>) -> Result<Option<String>> {
        let user = subject.ok_or(Error::MissingSubject { field })?;
        self.read_override(user, field)
    }
}
