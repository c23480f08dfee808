//! Role-based edit permission

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::types::UserId;

use super::traits::Authorizer;

/// Coarse role of the acting principal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    /// Manages the whole network; may edit every user
    NetworkAdmin,
    /// Administers the active site; may edit every user
    SiteAdmin,
    /// Regular author; may edit only their own profile
    Author,
}

impl Role {
    pub fn slug(&self) -> &'static str {
        match self {
            Role::NetworkAdmin => "network-admin",
            Role::SiteAdmin => "site-admin",
            Role::Author => "author",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.slug())
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "network-admin" | "super-admin" => Ok(Role::NetworkAdmin),
            "site-admin" | "admin" => Ok(Role::SiteAdmin),
            "author" => Ok(Role::Author),
            _ => Err(Error::invalid_identifier(
                s,
                "valid roles: network-admin, site-admin, author",
            )),
        }
    }
}

/// Authorizer for a principal with a fixed role
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleAuthorizer {
    principal: Option<UserId>,
    role: Role,
}

impl RoleAuthorizer {
    pub fn new(principal: Option<UserId>, role: Role) -> Self {
        Self { principal, role }
    }

    /// The network operator driving the admin CLI
    pub fn operator() -> Self {
        Self::new(None, Role::NetworkAdmin)
    }

    pub fn principal(&self) -> Option<UserId> {
        self.principal
    }

    pub fn role(&self) -> Role {
        self.role
    }
}

impl Authorizer for RoleAuthorizer {
    fn can_edit_user(&self, target: UserId) -> bool {
        match self.role {
            Role::NetworkAdmin | Role::SiteAdmin => true,
            Role::Author => self.principal == Some(target),
        }
    }
}
