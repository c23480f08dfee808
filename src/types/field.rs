//! Overridable profile fields

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// One of the two user attributes a site may override
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverrideField {
    /// Public author name
    DisplayName,
    /// Author biography
    Description,
}

impl OverrideField {
    /// Both fields, in form order
    pub fn all() -> &'static [OverrideField] {
        &[OverrideField::DisplayName, OverrideField::Description]
    }

    /// Slug used inside storage keys
    pub fn slug(&self) -> &'static str {
        match self {
            OverrideField::DisplayName => "display_name",
            OverrideField::Description => "description",
        }
    }

    /// Name of the user's global attribute this field shadows
    pub fn global_attribute(&self) -> &'static str {
        self.slug()
    }

    /// DOM id of the form control
    pub fn element_id(&self) -> &'static str {
        match self {
            OverrideField::DisplayName => "site_author_display_name",
            OverrideField::Description => "site_author_description",
        }
    }

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            OverrideField::DisplayName => "Site-specific display name",
            OverrideField::Description => "Site-specific biography",
        }
    }
}

impl fmt::Display for OverrideField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.slug())
    }
}

impl FromStr for OverrideField {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "display-name" | "display_name" | "displayname" | "name" => {
                Ok(OverrideField::DisplayName)
            }
            "description" | "biography" | "bio" => Ok(OverrideField::Description),
            _ => Err(Error::invalid_identifier(
                s,
                "valid fields: display-name, description",
            )),
        }
    }
}
