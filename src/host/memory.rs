//! In-process attribute store
//!
//! Backs the tests and any embedding host that keeps user attributes in
//! memory for the lifetime of the process.

use std::collections::{BTreeMap, HashMap};

use parking_lot::RwLock;
use tracing::trace;

use crate::error::Result;
use crate::types::UserId;

use super::traits::AttributeStore;

/// Attribute store held entirely in memory
#[derive(Debug, Default)]
pub struct MemoryAttributeStore {
    attributes: RwLock<HashMap<UserId, BTreeMap<String, String>>>,
}

impl MemoryAttributeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an attribute (builder style)
    pub fn with_attribute(self, user: UserId, key: &str, value: &str) -> Self {
        self.attributes
            .write()
            .entry(user)
            .or_default()
            .insert(key.to_string(), value.to_string());
        self
    }

    /// All attributes of one user, sorted by key
    pub fn attributes_of(&self, user: UserId) -> BTreeMap<String, String> {
        self.attributes
            .read()
            .get(&user)
            .cloned()
            .unwrap_or_default()
    }

    /// Total number of stored attributes across all users
    pub fn len(&self) -> usize {
        self.attributes.read().values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AttributeStore for MemoryAttributeStore {
    fn read_attribute(&self, user: UserId, key: &str) -> Result<Option<String>> {
        Ok(self
            .attributes
            .read()
            .get(&user)
            .and_then(|attrs| attrs.get(key))
            .cloned())
    }

    fn write_attribute(&self, user: UserId, key: &str, value: &str) -> Result<()> {
        trace!(user_id = %user, key, "Writing attribute");
        self.attributes
            .write()
            .entry(user)
            .or_default()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}
