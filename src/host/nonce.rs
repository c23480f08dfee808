//! Signed, single-use anti-forgery tokens
//!
//! A token is `<salt>.<mac>` where `mac` is the hex HMAC-SHA256, keyed by
//! the secret, over the action, the acting principal, the current tick and
//! the salt. A tick
//! is half the configured lifetime, and a token verifies during the tick it
//! was issued in and the one after, so its real lifetime lies between half
//! and the full configured value. Each salt verifies at most once.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::debug;
use uuid::Uuid;

use crate::types::UserId;

use super::traits::NonceService;

type HmacSha256 = Hmac<Sha256>;

/// HMAC nonce issuer/verifier bound to one principal
#[derive(Clone)]
pub struct SignedNonceService {
    secret: Arc<Vec<u8>>,
    principal: Option<UserId>,
    tick_secs: i64,
    /// Consumed salts and the tick they were issued in
    consumed: Arc<Mutex<HashMap<String, i64>>>,
}

impl SignedNonceService {
    /// Create a service with an explicit secret
    pub fn new(secret: impl AsRef<[u8]>, lifetime: Duration, principal: Option<UserId>) -> Self {
        let tick_secs = (lifetime.as_secs() / 2).max(1) as i64;
        Self {
            secret: Arc::new(secret.as_ref().to_vec()),
            principal,
            tick_secs,
            consumed: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Create a service with a secret that lives only as long as the process
    pub fn with_random_secret(lifetime: Duration, principal: Option<UserId>) -> Self {
        let secret = format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple());
        Self::new(secret, lifetime, principal)
    }

    /// The same secret and consumed-token ledger, acting for another principal
    pub fn for_principal(&self, principal: Option<UserId>) -> Self {
        Self {
            principal,
            ..self.clone()
        }
    }

    fn tick_at(&self, now: DateTime<Utc>) -> i64 {
        now.timestamp().div_euclid(self.tick_secs)
    }

    fn mac(&self, action: &str, tick: i64, salt: &str) -> Option<HmacSha256> {
        let principal = self
            .principal
            .map(|p| p.to_string())
            .unwrap_or_else(|| "0".to_string());
        let tick = tick.to_string();

        let mut mac = HmacSha256::new_from_slice(self.secret.as_slice()).ok()?;
        for part in [action, principal.as_str(), tick.as_str(), salt] {
            mac.update(b"|");
            mac.update(part.as_bytes());
        }
        Some(mac)
    }

    /// Issue a token as of `now`
    pub fn issue_at(&self, action: &str, now: DateTime<Utc>) -> String {
        let salt = Uuid::new_v4().simple().to_string();
        let tick = self.tick_at(now);
        let tag = self
            .mac(action, tick, &salt)
            .map(|mac| hex::encode(mac.finalize().into_bytes()))
            .unwrap_or_default();
        format!("{}.{}", salt, tag)
    }

    /// Verify and consume a token as of `now`
    pub fn verify_at(&self, action: &str, token: &str, now: DateTime<Utc>) -> bool {
        let Some((salt, mac)) = token.trim().split_once('.') else {
            debug!(action, "Malformed anti-forgery token");
            return false;
        };
        if salt.is_empty() || mac.is_empty() {
            return false;
        }

        let Ok(tag) = hex::decode(mac) else {
            debug!(action, "Anti-forgery token is not hex encoded");
            return false;
        };

        let tick = self.tick_at(now);
        let issued_tick = [tick, tick - 1].into_iter().find(|t| {
            self.mac(action, *t, salt)
                .is_some_and(|expected| expected.verify_slice(&tag).is_ok())
        });
        let Some(issued_tick) = issued_tick else {
            debug!(action, "Anti-forgery token signature mismatch or expired");
            return false;
        };

        let mut consumed = self.consumed.lock();
        // Anything issued before the previous tick can no longer verify.
        consumed.retain(|_, t| *t >= tick - 1);
        if consumed.contains_key(salt) {
            debug!(action, "Anti-forgery token already used");
            return false;
        }
        consumed.insert(salt.to_string(), issued_tick);
        true
    }
}

impl NonceService for SignedNonceService {
    fn issue(&self, action: &str) -> String {
        self.issue_at(action, Utc::now())
    }

    fn verify(&self, action: &str, token: &str) -> bool {
        self.verify_at(action, token, Utc::now())
    }
}

impl std::fmt::Debug for SignedNonceService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignedNonceService")
            .field("principal", &self.principal)
            .field("tick_secs", &self.tick_secs)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const ACTION: &str = "site_author_profile_update";

    fn service() -> SignedNonceService {
        SignedNonceService::new("test-secret", Duration::from_secs(3600), Some(UserId::new(1)))
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn test_issue_then_verify() {
        let nonces = service();
        let token = nonces.issue_at(ACTION, at(10_000));
        assert!(nonces.verify_at(ACTION, &token, at(10_010)));
    }

    #[test]
    fn test_token_is_single_use() {
        let nonces = service();
        let token = nonces.issue_at(ACTION, at(10_000));
        assert!(nonces.verify_at(ACTION, &token, at(10_001)));
        assert!(!nonces.verify_at(ACTION, &token, at(10_002)));
    }

    #[test]
    fn test_wrong_action_rejected() {
        let nonces = service();
        let token = nonces.issue_at(ACTION, at(10_000));
        assert!(!nonces.verify_at("delete_user", &token, at(10_000)));
    }

    #[test]
    fn test_token_bound_to_principal() {
        let nonces = service();
        let token = nonces.issue_at(ACTION, at(10_000));
        let other = nonces.for_principal(Some(UserId::new(2)));
        assert!(!other.verify_at(ACTION, &token, at(10_000)));
    }

    #[test]
    fn test_token_expires_after_two_ticks() {
        let nonces = service();
        // tick = 1800s; issued at start of tick 10
        let token = nonces.issue_at(ACTION, at(18_000));
        assert!(!nonces.clone().verify_at(ACTION, &token, at(18_000 + 2 * 1800)));
        assert!(nonces.verify_at(ACTION, &token, at(18_000 + 1800)));
    }

    #[test]
    fn test_malformed_tokens_rejected() {
        let nonces = service();
        assert!(!nonces.verify_at(ACTION, "", at(0)));
        assert!(!nonces.verify_at(ACTION, "no-dot", at(0)));
        assert!(!nonces.verify_at(ACTION, ".abc", at(0)));
        assert!(!nonces.verify_at(ACTION, "abc.", at(0)));
    }

    #[test]
    fn test_tampered_signature_rejected() {
        let nonces = service();
        let token = nonces.issue_at(ACTION, at(10_000));
        let (salt, mac) = token.split_once('.').unwrap();

        let flipped = if mac.starts_with('0') { "1" } else { "0" };
        let tampered = format!("{}.{}{}", salt, flipped, &mac[1..]);
        assert!(!nonces.verify_at(ACTION, &tampered, at(10_000)));

        let truncated = format!("{}.{}", salt, &mac[..mac.len() - 2]);
        assert!(!nonces.verify_at(ACTION, &truncated, at(10_000)));
        assert!(!nonces.verify_at(ACTION, &format!("{}.zz", salt), at(10_000)));

        // The untouched token still works afterwards.
        assert!(nonces.verify_at(ACTION, &token, at(10_000)));
    }

    #[test]
    fn test_different_secrets_do_not_verify() {
        let a = service();
        let b = SignedNonceService::new("other", Duration::from_secs(3600), Some(UserId::new(1)));
        let token = a.issue_at(ACTION, at(500));
        assert!(!b.verify_at(ACTION, &token, at(500)));
    }
}
