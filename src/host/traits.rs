//! Host trait definitions
//!
//! Defines the outbound primitives the overlay calls into. Implementations
//! must be cheap to call from a request handler; none of them may block on
//! anything beyond a single synchronous read or write.

use std::sync::Arc;

use crate::error::Result;
use crate::types::{OverrideField, UserId};

// ─────────────────────────────────────────────────────────────────
// Attribute Storage
// ─────────────────────────────────────────────────────────────────

/// Key-value attribute storage attached to user records
///
/// The host owns persistence. Concurrent writes to the same key are
/// last-write-wins; the overlay adds no locking of its own.
pub trait AttributeStore: Send + Sync {
    /// Read one attribute. `Ok(None)` means the key was never written.
    fn read_attribute(&self, user: UserId, key: &str) -> Result<Option<String>>;

    /// Write one attribute, replacing any previous value.
    fn write_attribute(&self, user: UserId, key: &str, value: &str) -> Result<()>;
}

// ─────────────────────────────────────────────────────────────────
// Authorization
// ─────────────────────────────────────────────────────────────────

/// Permission check for the principal acting in the current request
pub trait Authorizer: Send + Sync {
    /// Whether the acting principal may edit `target`'s profile
    fn can_edit_user(&self, target: UserId) -> bool;
}

impl<F> Authorizer for F
where
    F: Fn(UserId) -> bool + Send + Sync,
{
    fn can_edit_user(&self, target: UserId) -> bool {
        self(target)
    }
}

// ─────────────────────────────────────────────────────────────────
// Anti-Forgery Tokens
// ─────────────────────────────────────────────────────────────────

/// Action-scoped anti-forgery tokens
pub trait NonceService: Send + Sync {
    /// Issue a token for `action`
    fn issue(&self, action: &str) -> String;

    /// Verify (and consume) a token for `action`
    fn verify(&self, action: &str, token: &str) -> bool;
}

// ─────────────────────────────────────────────────────────────────
// Sanitation
// ─────────────────────────────────────────────────────────────────

/// The host's user-field sanitation pipeline
///
/// Applied to submitted override values with the same rules the host
/// applies to the corresponding global field.
pub trait Sanitizer: Send + Sync {
    fn sanitize(&self, field: OverrideField, raw: &str) -> String;
}

// ─────────────────────────────────────────────────────────────────
// Host Services
// ─────────────────────────────────────────────────────────────────

/// Bundle of host seams bound to one request
///
/// Cloning is cheap; every seam is reference counted.
#[derive(Clone)]
pub struct HostServices {
    pub store: Arc<dyn AttributeStore>,
    pub authorizer: Arc<dyn Authorizer>,
    pub nonces: Arc<dyn NonceService>,
    pub sanitizer: Arc<dyn Sanitizer>,
}

impl HostServices {
    pub fn new(
        store: Arc<dyn AttributeStore>,
        authorizer: Arc<dyn Authorizer>,
        nonces: Arc<dyn NonceService>,
        sanitizer: Arc<dyn Sanitizer>,
    ) -> Self {
        Self {
            store,
            authorizer,
            nonces,
            sanitizer,
        }
    }

    /// Same host, different acting principal
    pub fn with_authorizer(&self, authorizer: Arc<dyn Authorizer>) -> Self {
        Self {
            authorizer,
            ..self.clone()
        }
    }
}

impl std::fmt::Debug for HostServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostServices").finish_non_exhaustive()
    }
}
