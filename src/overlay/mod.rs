//! Site-scoped attribute overlay
//!
//! Layers per-site display name and biography overrides on top of the
//! host's global user attributes. An overlay is built once per request for
//! the active site; every read and write it performs is keyed by that site.

mod form;
mod keys;
mod site_overlay;
mod submission;

pub use form::{FormField, ProfileForm};
pub use keys::{OverrideKeys, DEFAULT_KEY_PREFIX};
pub use site_overlay::{SavedOverrides, SiteOverlay, SiteOverrides};
pub use submission::ProfileSubmission;
