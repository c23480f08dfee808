//! Type definitions for site-author
//!
//! Identifiers for the host's users and sites, and the two profile
//! fields that can be overridden per site.

mod field;
mod ids;

pub use field::*;
pub use ids::*;
