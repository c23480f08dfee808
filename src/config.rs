//! Configuration system for site-author
//!
//! Supports multiple configuration sources with the following precedence (highest to lowest):
//! 1. CLI arguments
//! 2. Environment variables (SITE_AUTHOR_* prefix, `__` between section and key)
//! 3. Configuration file (TOML)
//! 4. Default values

use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::overlay::DEFAULT_KEY_PREFIX;
use crate::types::{Site, SiteId};

/// Environment variable prefix
pub const ENV_PREFIX: &str = "SITE_AUTHOR";

/// Placeholder printed instead of secrets
pub const REDACTED: &str = "********";

/// Shortest accepted anti-forgery token lifetime
pub const MIN_NONCE_LIFETIME_SECS: u64 = 60;

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthorConfig {
    /// Network topology and known sites
    pub network: NetworkSettings,

    /// Override storage keys and form fields
    pub overlay: OverlaySettings,

    /// Anti-forgery token settings
    pub security: SecuritySettings,

    /// Attribute store location
    pub storage: StorageSettings,

    /// Logging configuration
    pub logging: LoggingSettings,
}

/// Network settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkSettings {
    /// Whether the host runs as a multisite network
    pub multisite: bool,

    /// Sites in the network
    pub sites: Vec<Site>,
}

/// Overlay settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlaySettings {
    /// Prefix of the per-site attribute keys
    pub key_prefix: String,

    /// Action name the anti-forgery token is bound to
    pub nonce_action: String,

    /// Hidden form field carrying the token
    pub nonce_field: String,
}

/// Security settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecuritySettings {
    /// Token signing secret (empty = random per process)
    pub nonce_secret: String,

    /// Token lifetime in seconds
    pub nonce_lifetime_secs: u64,
}

/// Storage settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Attribute document path
    pub path: String,
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log level: trace, debug, info, warn, error
    pub level: String,

    /// Log file path (empty = no file logging)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    /// Number of rotated log files to keep
    pub max_files: u32,

    /// Enable JSON formatted logging
    pub json_format: bool,
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self {
            multisite: true,
            sites: vec![Site::new(SiteId::new(1), "http://localhost/")],
        }
    }
}

impl Default for OverlaySettings {
    fn default() -> Self {
        Self {
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            nonce_action: "site_author_profile_update".to_string(),
            nonce_field: "site_author_profile_nonce".to_string(),
        }
    }
}

impl Default for SecuritySettings {
    fn default() -> Self {
        Self {
            nonce_secret: String::new(),
            nonce_lifetime_secs: 86_400,
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            path: "~/.site-author/attributes.toml".to_string(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            max_files: 5,
            json_format: false,
        }
    }
}

impl AuthorConfig {
    /// Load configuration from file with environment variable overrides
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut builder = config::Config::builder();

        // 1. Configuration file, if any
        let config_file = Self::find_config_file(config_path)?;
        if let Some(ref path) = config_file {
            debug!(path = %path.display(), "Loading configuration file");
            builder = builder.add_source(
                config::File::from(path.as_path())
                    .format(config::FileFormat::Toml)
                    .required(true),
            );
        }

        // 2. Environment variable overrides
        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let mut config: AuthorConfig = builder.build()?.try_deserialize()?;
        if let Some(path) = config_file {
            info!(path = %path.display(), "Configuration loaded from file");
        }

        // 3. Expand paths
        config.expand_paths();

        // 4. Validate
        config.validate()?;

        Ok(config)
    }

    /// Find the configuration file to use
    fn find_config_file(explicit_path: Option<&str>) -> Result<Option<PathBuf>> {
        // If explicit path provided, use it (error if not found)
        if let Some(path) = explicit_path {
            let path = PathBuf::from(expand_path(path));
            if path.exists() {
                return Ok(Some(path));
            }
            return Err(Error::config_not_found(path));
        }

        // Search in standard locations
        let search_paths = [
            // Current directory
            Some(PathBuf::from("site-author.toml")),
            // User config directory
            dirs::config_dir().map(|p| p.join("site-author").join("config.toml")),
            // Home directory
            dirs::home_dir().map(|p| p.join(".site-author").join("config.toml")),
            // System config (Linux)
            Some(PathBuf::from("/etc/site-author/config.toml")),
        ];

        for path in search_paths.iter().flatten() {
            if path.exists() {
                debug!(path = %path.display(), "Found configuration file");
                return Ok(Some(path.clone()));
            }
        }

        debug!("No configuration file found, using defaults");
        Ok(None)
    }

    /// Expand ~ and other path variables
    fn expand_paths(&mut self) {
        self.storage.path = expand_path(&self.storage.path);

        if let Some(ref file) = self.logging.file {
            self.logging.file = Some(expand_path(file));
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        // Overlay keys end up as attribute names; keep them plain
        let prefix = &self.overlay.key_prefix;
        if prefix.is_empty() {
            return Err(Error::config_field_invalid(
                "overlay.key_prefix",
                "key_prefix cannot be empty",
            ));
        }
        if !prefix
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(Error::config_field_invalid(
                "overlay.key_prefix",
                format!(
                    "key_prefix '{}' may only contain ASCII letters, digits, '_' and '-'",
                    prefix
                ),
            ));
        }
        if self.overlay.nonce_action.trim().is_empty() {
            return Err(Error::config_field_invalid(
                "overlay.nonce_action",
                "nonce_action cannot be empty",
            ));
        }
        if self.overlay.nonce_field.trim().is_empty() {
            return Err(Error::config_field_invalid(
                "overlay.nonce_field",
                "nonce_field cannot be empty",
            ));
        }

        // Validate sites
        let mut seen = HashSet::new();
        for site in &self.network.sites {
            if site.id.get() == 0 {
                return Err(Error::config_field_invalid(
                    "network.sites",
                    "site id must be a positive integer",
                ));
            }
            if !seen.insert(site.id) {
                return Err(Error::config_field_invalid(
                    "network.sites",
                    format!("duplicate site id {}", site.id),
                ));
            }
            validate_base_url(site)?;
        }

        // Validate token lifetime
        if self.security.nonce_lifetime_secs < MIN_NONCE_LIFETIME_SECS {
            return Err(Error::config_field_invalid(
                "security.nonce_lifetime_secs",
                format!(
                    "nonce_lifetime_secs must be at least {}",
                    MIN_NONCE_LIFETIME_SECS
                ),
            ));
        }

        // Validate log level
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(Error::config_field_invalid(
                "logging.level",
                format!(
                    "Invalid log level '{}'. Must be one of: {}",
                    self.logging.level,
                    valid_levels.join(", ")
                ),
            ));
        }

        Ok(())
    }

    /// Look up a configured site
    pub fn site(&self, id: SiteId) -> Result<Site> {
        self.network
            .sites
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or(Error::SiteNotFound { site_id: id })
    }

    /// Get the attribute store path as a PathBuf
    pub fn storage_path(&self) -> PathBuf {
        PathBuf::from(&self.storage.path)
    }

    /// Token lifetime as a Duration
    pub fn nonce_lifetime(&self) -> Duration {
        Duration::from_secs(self.security.nonce_lifetime_secs)
    }

    /// Configured signing secret, if one was set
    pub fn nonce_secret(&self) -> Option<&str> {
        Some(self.security.nonce_secret.as_str()).filter(|s| !s.is_empty())
    }

    /// A copy safe to print: the signing secret is masked
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        if config.nonce_secret().is_some() {
            config.security.nonce_secret = REDACTED.to_string();
        }
        config
    }
}

fn validate_base_url(site: &Site) -> Result<()> {
    let parsed = url::Url::parse(&site.base_url).map_err(|e| {
        Error::config_field_invalid(
            "network.sites",
            format!("site {} has an invalid base_url '{}': {}", site.id, site.base_url, e),
        )
    })?;

    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(Error::config_field_invalid(
            "network.sites",
            format!(
                "site {} base_url must use http or https, not '{}'",
                site.id, other
            ),
        )),
    }
}

/// Expand ~ and environment variables in paths
fn expand_path(path: &str) -> String {
    shellexpand::full(path)
        .unwrap_or_else(|_| std::borrow::Cow::Borrowed(path))
        .into_owned()
}

/// Initialize a new configuration file
pub fn init_config(path: Option<&str>, force: bool) -> Result<PathBuf> {
    let config_path = path
        .map(|p| PathBuf::from(expand_path(p)))
        .unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".site-author")
                .join("config.toml")
        });

    // Check if file exists
    if config_path.exists() && !force {
        return Err(Error::config_validation(format!(
            "Configuration file already exists: {}. Use --force to overwrite.",
            config_path.display()
        )));
    }

    // Create parent directories
    if let Some(parent) = config_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| Error::IoWrite {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    fs::write(&config_path, generate_default_config()).map_err(|source| Error::IoWrite {
        path: config_path.clone(),
        source,
    })?;

    info!(path = %config_path.display(), "Configuration file created");
    Ok(config_path)
}

/// Generate default configuration content with comments
pub fn generate_default_config() -> String {
    r#"# site-author configuration

[network]
# Whether the host runs as a multisite network. When false every hook
# passes values through unchanged and an admin notice is shown.
multisite = true

# Sites in the network. The base URL only appears in form labels.
[[network.sites]]
id = 1
base_url = "http://localhost/"

[overlay]
# Per-site keys are <key_prefix>display_name_<site> and
# <key_prefix>description_<site>
key_prefix = "override_"

# Anti-forgery token action and hidden form field
nonce_action = "site_author_profile_update"
nonce_field = "site_author_profile_nonce"

[security]
# Token signing secret (leave empty for a random secret per process)
nonce_secret = ""

# Token lifetime in seconds (minimum 60)
nonce_lifetime_secs = 86400

[storage]
# Attribute document used by the admin CLI
path = "~/.site-author/attributes.toml"

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log file path (comment out to disable file logging)
# file = "~/.site-author/logs/site-author.log"

# Number of rotated log files to keep
max_files = 5

# Enable JSON formatted logging
json_format = false
"#
    .to_string()
}
