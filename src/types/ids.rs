//! Host entity identifiers
//!
//! Users and sites are owned by the host platform; this crate only ever
//! refers to them by their stable numeric ids.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

// ─────────────────────────────────────────────────────────────────
// User Id
// ─────────────────────────────────────────────────────────────────

/// Stable numeric identifier of a user account in the host's identity system
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(u64);

impl UserId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub const fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for UserId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl FromStr for UserId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_positive(s, "user id").map(Self)
    }
}

// ─────────────────────────────────────────────────────────────────
// Site Id
// ─────────────────────────────────────────────────────────────────

/// Identifier of a site, unique within the network
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SiteId(u64);

impl SiteId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub const fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for SiteId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl FromStr for SiteId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_positive(s, "site id").map(Self)
    }
}

// ─────────────────────────────────────────────────────────────────
// Site
// ─────────────────────────────────────────────────────────────────

/// The active site of a request: its id plus the base URL shown in labels
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Site {
    pub id: SiteId,
    pub base_url: String,
}

impl Site {
    pub fn new(id: SiteId, base_url: impl Into<String>) -> Self {
        Self {
            id,
            base_url: base_url.into(),
        }
    }
}

/// Host ids start at 1; zero is the host's "no object" sentinel.
fn parse_positive(s: &str, what: &str) -> Result<u64, Error> {
    let id: u64 = s
        .trim()
        .parse()
        .map_err(|e| Error::invalid_identifier(s, format!("{} must be numeric: {}", what, e)))?;
    if id == 0 {
        return Err(Error::invalid_identifier(s, format!("{} must be positive", what)));
    }
    Ok(id)
}
