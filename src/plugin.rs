//! Host-facing hook surface
//!
//! The host calls these methods from its profile screens and template
//! filters. None of them fail: errors are logged and the hook falls back to
//! rendering nothing, writing nothing, or returning its input unchanged.

use tracing::{error, info, warn};

use crate::config::OverlaySettings;
use crate::host::HostServices;
use crate::overlay::{ProfileSubmission, SiteOverlay};
use crate::types::{Site, UserId};

/// Admin notice shown when the host is a single-site install
pub const NOT_MULTISITE_NOTICE: &str =
    "Site Author Overrides only works with a multisite installation.";

/// Which profile-edit screen is being rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileScreen {
    /// The acting user edits their own profile
    OwnProfile,
    /// The acting user edits somebody else
    OtherUser,
}

/// Which save path delivered a profile update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOrigin {
    PersonalOptions,
    AdminEdit,
}

impl ProfileScreen {
    fn as_str(&self) -> &'static str {
        match self {
            ProfileScreen::OwnProfile => "own_profile",
            ProfileScreen::OtherUser => "other_user",
        }
    }
}

impl SaveOrigin {
    fn as_str(&self) -> &'static str {
        match self {
            SaveOrigin::PersonalOptions => "personal_options",
            SaveOrigin::AdminEdit => "admin_edit",
        }
    }
}

/// The plugin as activated for one request
#[derive(Debug, Clone)]
pub struct SiteAuthorPlugin {
    overlay: Option<SiteOverlay>,
}

impl SiteAuthorPlugin {
    /// Activate for the current site
    ///
    /// On a single-site host the plugin comes up disabled: hooks pass
    /// their input through and `admin_notices` explains why.
    pub fn activate(
        multisite: bool,
        site: Site,
        settings: &OverlaySettings,
        host: HostServices,
    ) -> Self {
        if !multisite {
            info!(site_id = %site.id, "Host is not multisite, overrides disabled");
            return Self { overlay: None };
        }
        Self {
            overlay: Some(SiteOverlay::new(site, settings, host)),
        }
    }

    pub fn is_active(&self) -> bool {
        self.overlay.is_some()
    }

    pub fn overlay(&self) -> Option<&SiteOverlay> {
        self.overlay.as_ref()
    }

    /// Notices to print on admin screens
    pub fn admin_notices(&self) -> Vec<String> {
        if self.is_active() {
            Vec::new()
        } else {
            vec![format!(
                r#"<div class="error"><p>{}</p></div>"#,
                NOT_MULTISITE_NOTICE
            )]
        }
    }

    /// Markup to inject into a profile-edit page; empty on failure
    pub fn render_profile_fields(&self, screen: ProfileScreen, user: UserId) -> String {
        let Some(overlay) = &self.overlay else {
            return String::new();
        };

        match overlay.render_fields(user).and_then(|form| form.to_html()) {
            Ok(html) => html,
            Err(e) => {
                error!(
                    user_id = %user,
                    screen = screen.as_str(),
                    "Failed to render override fields: {}",
                    e.format_for_log()
                );
                String::new()
            }
        }
    }

    /// Persist submitted overrides; rejected or failed saves are no-ops
    pub fn on_profile_update(
        &self,
        origin: SaveOrigin,
        user: UserId,
        submission: &ProfileSubmission,
    ) {
        let Some(overlay) = &self.overlay else {
            return;
        };

        match overlay.save(user, submission) {
            Ok(_) => {}
            Err(e) if e.is_silent() => {
                warn!(
                    user_id = %user,
                    origin = origin.as_str(),
                    "Profile update ignored: {}",
                    e.format_for_log()
                );
            }
            Err(e) => {
                error!(
                    user_id = %user,
                    origin = origin.as_str(),
                    "Profile update failed: {}",
                    e.format_for_log()
                );
            }
        }
    }

    /// Legacy author filter; `current_author` comes from the ambient post
    pub fn filter_the_author(&self, base: &str, current_author: Option<UserId>) -> String {
        self.filter_author_display_name(base, current_author)
    }

    pub fn filter_author_display_name(&self, base: &str, user: Option<UserId>) -> String {
        match &self.overlay {
            Some(overlay) => overlay.resolve_display_name(base, user),
            None => base.to_string(),
        }
    }

    pub fn filter_author_description(&self, base: &str, user: Option<UserId>) -> String {
        match &self.overlay {
            Some(overlay) => overlay.resolve_description(base, user),
            None => base.to_string(),
        }
    }
}
