//! site-author: per-site author display names and biographies
//!
//! A user account shared across a multisite network can present a
//! different display name and biography on each site. The overlay stores
//! those overrides on the user's attribute store under site-scoped keys and
//! substitutes them whenever the host resolves author information.
//!
//! The host's storage, permission checks, anti-forgery tokens and field
//! sanitation are reached through the traits in [`host`]; reference
//! implementations of each live alongside them.

pub mod cli;
pub mod config;
pub mod error;
pub mod host;
pub mod logging;
pub mod overlay;
pub mod plugin;
pub mod types;
pub mod version;

pub use error::{Error, ErrorCode, Result};
pub use overlay::{ProfileForm, ProfileSubmission, SiteOverlay};
pub use plugin::{ProfileScreen, SaveOrigin, SiteAuthorPlugin};
