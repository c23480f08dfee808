//! Error types for site-author
//!
//! Provides structured error handling with:
//! - Numeric error codes for machine parsing
//! - User-friendly messages with suggestions
//! - Exit codes for the admin CLI
//!
//! Hook entry points never surface these to the host; they log and fall
//! back. The typed errors exist so the overlay itself stays testable.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::types::{OverrideField, SiteId, UserId};

/// Result type alias for site-author operations
pub type Result<T> = std::result::Result<T, Error>;

/// Numeric error codes for machine parsing and documentation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum ErrorCode {
    // Configuration errors (1xx)
    ConfigNotFound = 100,
    ConfigParseError = 101,
    ConfigValidation = 102,

    // IO errors (2xx)
    IoRead = 200,
    IoWrite = 201,
    IoPermission = 202,
    IoNotFound = 203,

    // Authorization errors (3xx)
    PermissionDenied = 300,
    InvalidRequest = 301,

    // Resolution errors (4xx)
    MissingSubject = 400,
    SiteNotFound = 401,
    InvalidIdentifier = 402,

    // Storage errors (5xx)
    StoreWrite = 501,
    StoreCorrupt = 502,

    // Rendering errors (6xx)
    RenderFailed = 600,

    // Network errors (7xx)
    NotMultisite = 700,

    // Internal errors (9xx)
    InternalError = 900,
}

impl ErrorCode {
    /// Get the string code (e.g., "E300")
    pub fn as_str(&self) -> String {
        format!("E{}", *self as u16)
    }

    /// Get the exit code for CLI (maps to 1-125 range)
    pub fn exit_code(&self) -> i32 {
        match *self as u16 {
            100..=199 => 10, // Config errors
            200..=299 => 20, // IO errors
            300..=399 => 30, // Authorization errors
            400..=499 => 40, // Resolution errors
            500..=599 => 50, // Storage errors
            600..=699 => 60, // Rendering errors
            700..=799 => 70, // Network errors
            900..=999 => 90, // Internal errors
            _ => 1,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Main error type
#[derive(Error, Debug)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────

    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Configuration parse error
    #[error("Failed to parse configuration: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<config::ConfigError>,
    },

    /// Configuration validation error
    #[error("Configuration validation failed: {message}")]
    ConfigValidation { message: String, field: Option<String> },

    // ─────────────────────────────────────────────────────────────
    // IO Errors
    // ─────────────────────────────────────────────────────────────

    /// File read error
    #[error("Failed to read file: {path}")]
    IoRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File write error
    #[error("Failed to write file: {path}")]
    IoWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    Toml(#[from] toml::ser::Error),

    // ─────────────────────────────────────────────────────────────
    // Authorization Errors
    // ─────────────────────────────────────────────────────────────

    /// Acting principal may not edit the target user
    #[error("Permission denied: cannot edit user {user_id}")]
    PermissionDenied { user_id: UserId },

    /// Anti-forgery token missing or invalid
    #[error("Invalid request: {reason}")]
    InvalidRequest { reason: String },

    // ─────────────────────────────────────────────────────────────
    // Resolution Errors
    // ─────────────────────────────────────────────────────────────

    /// No user id available for a lookup
    #[error("No subject user for {field} lookup")]
    MissingSubject { field: OverrideField },

    /// Site is not part of the configured network
    #[error("Site {site_id} is not configured in this network")]
    SiteNotFound { site_id: SiteId },

    /// Unparseable user/site/field identifier
    #[error("Invalid identifier '{value}': {reason}")]
    InvalidIdentifier { value: String, reason: String },

    // ─────────────────────────────────────────────────────────────
    // Storage Errors
    // ─────────────────────────────────────────────────────────────

    /// Attribute write failed
    #[error("Failed to write attribute '{key}' for user {user_id}: {message}")]
    StoreWrite {
        user_id: UserId,
        key: String,
        message: String,
    },

    /// Attribute document could not be decoded
    #[error("Attribute store {path} is corrupt: {message}")]
    StoreCorrupt { path: PathBuf, message: String },

    // ─────────────────────────────────────────────────────────────
    // Rendering / Network Errors
    // ─────────────────────────────────────────────────────────────

    /// Template rendering failed
    #[error("Failed to render profile fields: {0}")]
    Render(#[from] minijinja::Error),

    /// Host is not running as a multi-site network
    #[error("Site Author Overrides only works with a multisite installation.")]
    NotMultisite,

    // ─────────────────────────────────────────────────────────────
    // Internal Errors
    // ─────────────────────────────────────────────────────────────

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    // ─────────────────────────────────────────────────────────────
    // Error Classification
    // ─────────────────────────────────────────────────────────────

    /// Get the numeric error code
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::ConfigNotFound { .. } => ErrorCode::ConfigNotFound,
            Error::ConfigParse { .. } => ErrorCode::ConfigParseError,
            Error::ConfigValidation { .. } => ErrorCode::ConfigValidation,

            Error::IoRead { .. } => ErrorCode::IoRead,
            Error::IoWrite { .. } => ErrorCode::IoWrite,
            Error::Io(e) => match e.kind() {
                std::io::ErrorKind::NotFound => ErrorCode::IoNotFound,
                std::io::ErrorKind::PermissionDenied => ErrorCode::IoPermission,
                _ => ErrorCode::IoRead,
            },
            Error::Toml(_) => ErrorCode::StoreWrite,

            Error::PermissionDenied { .. } => ErrorCode::PermissionDenied,
            Error::InvalidRequest { .. } => ErrorCode::InvalidRequest,

            Error::MissingSubject { .. } => ErrorCode::MissingSubject,
            Error::SiteNotFound { .. } => ErrorCode::SiteNotFound,
            Error::InvalidIdentifier { .. } => ErrorCode::InvalidIdentifier,

            Error::StoreWrite { .. } => ErrorCode::StoreWrite,
            Error::StoreCorrupt { .. } => ErrorCode::StoreCorrupt,

            Error::Render(_) => ErrorCode::RenderFailed,
            Error::NotMultisite => ErrorCode::NotMultisite,

            Error::Internal(_) => ErrorCode::InternalError,
        }
    }

    /// Whether the host should treat this as a silent no-op
    ///
    /// Authorization and subject failures are expected during normal
    /// traffic and never reach the rendering pipeline.
    pub fn is_silent(&self) -> bool {
        matches!(
            self,
            Error::PermissionDenied { .. }
                | Error::InvalidRequest { .. }
                | Error::MissingSubject { .. }
        )
    }

    /// Get the exit code for CLI
    pub fn exit_code(&self) -> i32 {
        self.code().exit_code()
    }

    // ─────────────────────────────────────────────────────────────
    // User-Friendly Messages
    // ─────────────────────────────────────────────────────────────

    /// Get a user-friendly suggestion for how to fix this error
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Error::ConfigNotFound { .. } => Some(
                "Run 'site-author config init' to create a default configuration file."
            ),
            Error::ConfigParse { .. } => Some(
                "Check your configuration file syntax. Run 'site-author config validate' to see details."
            ),
            Error::ConfigValidation { .. } => Some(
                "Review the configuration file and fix the invalid values."
            ),
            Error::SiteNotFound { .. } => Some(
                "Add a [[network.sites]] entry with the site id and base_url to the configuration."
            ),
            Error::StoreCorrupt { .. } => Some(
                "The attribute store could not be parsed. Restore it from a backup or fix the TOML by hand."
            ),
            Error::NotMultisite => Some(
                "Set 'network.multisite = true' once the host runs as a multisite network."
            ),
            Error::InvalidRequest { .. } => Some(
                "Reload the profile form to obtain a fresh anti-forgery token."
            ),
            _ => None,
        }
    }

    /// Format the error for terminal display with colors
    pub fn format_for_terminal(&self) -> String {
        let code = self.code();
        let suggestion = self.suggestion();

        let mut output = format!(
            "\x1b[31mError [{}]\x1b[0m: {}\n",
            code.as_str(),
            self
        );

        if let Some(hint) = suggestion {
            output.push_str(&format!("\n\x1b[33mHint\x1b[0m: {}\n", hint));
        }

        output
    }

    /// Format the error for logging (no colors)
    pub fn format_for_log(&self) -> String {
        format!("[{}] {}", self.code().as_str(), self)
    }
}

// ─────────────────────────────────────────────────────────────────
// Error Constructors (for ergonomic error creation)
// ─────────────────────────────────────────────────────────────────

impl Error {
    /// Create a config not found error
    pub fn config_not_found(path: impl Into<PathBuf>) -> Self {
        Error::ConfigNotFound { path: path.into() }
    }

    /// Create a config parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Error::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create a config validation error
    pub fn config_validation(message: impl Into<String>) -> Self {
        Error::ConfigValidation {
            message: message.into(),
            field: None,
        }
    }

    /// Create a config validation error with field name
    pub fn config_field_invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::ConfigValidation {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create a permission denied error
    pub fn permission_denied(user_id: UserId) -> Self {
        Error::PermissionDenied { user_id }
    }

    /// Create an invalid request error
    pub fn invalid_request(reason: impl Into<String>) -> Self {
        Error::InvalidRequest {
            reason: reason.into(),
        }
    }

    /// Create an invalid identifier error
    pub fn invalid_identifier(value: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidIdentifier {
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a store write error
    pub fn store_write(user_id: UserId, key: impl Into<String>, message: impl Into<String>) -> Self {
        Error::StoreWrite {
            user_id,
            key: key.into(),
            message: message.into(),
        }
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Error::ConfigParse {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────
