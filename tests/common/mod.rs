//! Common test utilities and fixtures
//!
//! This module provides shared test infrastructure

#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use assert_cmd::Command;
use tempfile::TempDir;

use site_author::config::OverlaySettings;
use site_author::host::{
    AttributeStore, Authorizer, HostServices, MemoryAttributeStore, ProfileSanitizer,
    SignedNonceService, TomlAttributeStore,
};
use site_author::overlay::SiteOverlay;
use site_author::types::{Site, SiteId, UserId};

// ─────────────────────────────────────────────────────────────────
// Fixture Files
// ─────────────────────────────────────────────────────────────────

/// Get the path to the test fixtures directory
pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

/// Get a path to a specific fixture file
pub fn fixture_path(name: &str) -> PathBuf {
    fixtures_dir().join(name)
}

pub fn valid_config_fixture() -> PathBuf {
    fixture_path("valid_config.toml")
}

pub fn invalid_config_fixture() -> PathBuf {
    fixture_path("invalid_config.toml")
}

// ─────────────────────────────────────────────────────────────────
// In-Memory Host
// ─────────────────────────────────────────────────────────────────

/// Host seams backed by memory, with the store kept for inspection
pub struct TestHost {
    pub store: Arc<MemoryAttributeStore>,
    pub host: HostServices,
}

impl TestHost {
    /// Host whose acting principal may edit everyone
    pub fn new() -> Self {
        Self::with_store(MemoryAttributeStore::new())
    }

    pub fn with_store(store: MemoryAttributeStore) -> Self {
        let store = Arc::new(store);
        let host = HostServices::new(
            store.clone(),
            Arc::new(|_: UserId| true),
            Arc::new(SignedNonceService::new(
                "integration-secret",
                Duration::from_secs(3600),
                None,
            )),
            Arc::new(ProfileSanitizer::new()),
        );
        Self { store, host }
    }

    /// Same store, different acting principal
    pub fn acting_as(&self, authorizer: Arc<dyn Authorizer>) -> HostServices {
        self.host.with_authorizer(authorizer)
    }

    /// Overlay for site `site` with default settings
    pub fn overlay(&self, site: u64) -> SiteOverlay {
        overlay_on(&self.host, site)
    }
}

pub fn site(id: u64) -> Site {
    Site::new(SiteId::new(id), format!("https://site{}.example.org", id))
}

pub fn overlay_on(host: &HostServices, site_id: u64) -> SiteOverlay {
    SiteOverlay::new(site(site_id), &OverlaySettings::default(), host.clone())
}

// ─────────────────────────────────────────────────────────────────
// CLI Environment
// ─────────────────────────────────────────────────────────────────

/// Temp directory with a config file and an attribute document
pub struct CliEnv {
    pub temp_dir: TempDir,
    pub config_path: PathBuf,
    pub store_path: PathBuf,
}

impl CliEnv {
    /// Network with sites 3 and 5
    pub fn new() -> Self {
        Self::with_multisite(true)
    }

    pub fn with_multisite(multisite: bool) -> Self {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("site-author.toml");
        let store_path = temp_dir.path().join("attributes.toml");

        let content = format!(
            r#"[network]
multisite = {multisite}

[[network.sites]]
id = 3
base_url = "https://three.example.org"

[[network.sites]]
id = 5
base_url = "https://five.example.org"

[security]
nonce_secret = "cli-test-secret"

[storage]
path = "{store}"

[logging]
level = "warn"
"#,
            multisite = multisite,
            store = store_path.display()
        );
        fs::write(&config_path, content).unwrap();

        Self {
            temp_dir,
            config_path,
            store_path,
        }
    }

    /// Command for the binary, pointed at this environment's config
    pub fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("site-author").unwrap();
        cmd.env_remove("RUST_LOG")
            .arg("--config")
            .arg(&self.config_path);
        cmd
    }

    /// Write an attribute straight into the document
    pub fn seed(&self, user: u64, key: &str, value: &str) {
        let store = TomlAttributeStore::open(&self.store_path).unwrap();
        store.write_attribute(UserId::new(user), key, value).unwrap();
    }

    pub fn store(&self) -> TomlAttributeStore {
        TomlAttributeStore::open(&self.store_path).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixtures_exist() {
        assert!(fixtures_dir().exists(), "Fixtures directory should exist");
        assert!(valid_config_fixture().exists());
        assert!(invalid_config_fixture().exists());
    }
}
