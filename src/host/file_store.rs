//! File-backed attribute store
//!
//! Keeps every user's attributes in one TOML document:
//!
//! ```toml
//! [users."7"]
//! display_name = "Jane Doe"
//! override_display_name_3 = "J. Doe (Site 3)"
//! ```
//!
//! The whole document is rewritten atomically on every write (temp file in
//! the same directory, then rename), so readers never observe a torn file.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::types::UserId;

use super::traits::AttributeStore;

/// On-disk layout of the attribute document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct AttributeDocument {
    #[serde(default)]
    users: BTreeMap<String, BTreeMap<String, String>>,
}

/// Attribute store persisted to a TOML file
#[derive(Debug)]
pub struct TomlAttributeStore {
    path: PathBuf,
    document: RwLock<AttributeDocument>,
}

impl TomlAttributeStore {
    /// Open the store at `path`. A missing file is an empty store; the
    /// file is created on the first write.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let document = if path.exists() {
            let content = fs::read_to_string(&path).map_err(|e| Error::IoRead {
                path: path.clone(),
                source: e,
            })?;
            let document: AttributeDocument =
                toml::from_str(&content).map_err(|e| Error::StoreCorrupt {
                    path: path.clone(),
                    message: e.to_string(),
                })?;
            info!(
                path = %path.display(),
                users = document.users.len(),
                "Attribute store loaded"
            );
            document
        } else {
            debug!(path = %path.display(), "Attribute store not found, starting empty");
            AttributeDocument::default()
        };

        Ok(Self {
            path,
            document: RwLock::new(document),
        })
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All attributes of one user, sorted by key
    pub fn attributes_of(&self, user: UserId) -> BTreeMap<String, String> {
        self.document
            .read()
            .users
            .get(&user.to_string())
            .cloned()
            .unwrap_or_default()
    }

    fn persist(&self, document: &AttributeDocument) -> Result<()> {
        let content = toml::to_string_pretty(document)?;
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(|e| Error::IoWrite {
            path: dir.clone(),
            source: e,
        })?;

        let mut tmp = NamedTempFile::new_in(&dir).map_err(|e| Error::IoWrite {
            path: dir.clone(),
            source: e,
        })?;
        tmp.write_all(content.as_bytes()).map_err(|e| Error::IoWrite {
            path: tmp.path().to_path_buf(),
            source: e,
        })?;
        tmp.persist(&self.path).map_err(|e| Error::IoWrite {
            path: self.path.clone(),
            source: e.error,
        })?;
        Ok(())
    }
}

impl AttributeStore for TomlAttributeStore {
    fn read_attribute(&self, user: UserId, key: &str) -> Result<Option<String>> {
        Ok(self
            .document
            .read()
            .users
            .get(&user.to_string())
            .and_then(|attrs| attrs.get(key))
            .cloned())
    }

    fn write_attribute(&self, user: UserId, key: &str, value: &str) -> Result<()> {
        let mut document = self.document.write();
        let mut updated = document.clone();
        updated
            .users
            .entry(user.to_string())
            .or_default()
            .insert(key.to_string(), value.to_string());

        // Only publish the new state once it is on disk.
        self.persist(&updated)
            .map_err(|e| Error::store_write(user, key, e.to_string()))?;
        *document = updated;

        debug!(user_id = %user, key, path = %self.path.display(), "Attribute persisted");
        Ok(())
    }
}
