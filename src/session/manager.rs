//! Session token lifecycle.
//!
//! The stored token is the only session state. Every validity check
//! re-reads storage, and a check that finds an expired or malformed token
//! removes it, so "authenticated" is always derived from what is stored.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use super::{AnyStore, TokenStore};
use crate::ocsf;
use crate::token::decode_expiry;

/// Decoded expiry remembered for the last token seen.
struct CachedExpiry {
    token: String,
    expires_at_ms: i64,
}

/// Owns the canonical copy of the session token.
pub struct SessionManager {
    store: Arc<AnyStore>,
    key: String,
    cache: Mutex<Option<CachedExpiry>>,
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

impl SessionManager {
    pub fn new(store: Arc<AnyStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
            cache: Mutex::new(None),
        }
    }

    pub fn store(&self) -> &Arc<AnyStore> {
        &self.store
    }

    /// Storage key the token is kept under.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Persist `token` verbatim. `None` and empty tokens are ignored.
    pub fn set_token(&self, token: Option<&str>) {
        let Some(token) = token.filter(|t| !t.is_empty()) else {
            tracing::debug!("Ignoring empty session token");
            return;
        };
        *self.cache.lock() = None;
        self.store.set(&self.key, token);
    }

    /// The stored token if it is present, decodable, and not yet expired.
    ///
    /// A malformed or expired token is removed from storage before
    /// returning `None`.
    pub fn valid_token(&self) -> Option<String> {
        self.valid_token_at(now_millis())
    }

    fn valid_token_at(&self, now_ms: i64) -> Option<String> {
        let Some(token) = self.store.get(&self.key) else {
            *self.cache.lock() = None;
            return None;
        };

        let expires_at_ms = match self.cached_expiry(&token) {
            Some(ms) => ms,
            None => match decode_expiry(&token) {
                Ok(ms) => {
                    *self.cache.lock() = Some(CachedExpiry {
                        token: token.clone(),
                        expires_at_ms: ms,
                    });
                    ms
                }
                Err(e) => {
                    tracing::warn!("Discarding malformed session token: {}", e);
                    self.clear();
                    return None;
                }
            },
        };

        if now_ms >= expires_at_ms {
            ocsf::authentication_event(
                ocsf::ACTIVITY_OTHER,
                "Other",
                ocsf::STATUS_SUCCESS,
                ocsf::SEVERITY_INFORMATIONAL,
                ocsf::subject_from_token(&token).as_deref(),
                "Session token expired",
            );
            self.clear();
            return None;
        }

        Some(token)
    }

    /// Whether a usable session token is stored.
    pub fn is_authenticated(&self) -> bool {
        self.valid_token().is_some_and(|t| !t.is_empty())
    }

    /// Remove the stored token.
    pub fn logout(&self) {
        let user = self
            .store
            .get(&self.key)
            .and_then(|t| ocsf::subject_from_token(&t));
        self.clear();

        ocsf::authentication_event(
            ocsf::ACTIVITY_LOGOFF,
            "Logoff",
            ocsf::STATUS_SUCCESS,
            ocsf::SEVERITY_INFORMATIONAL,
            user.as_deref(),
            "User logged out",
        );
    }

    /// Remove the stored token, then run `on_complete`.
    pub fn logout_and(&self, on_complete: impl FnOnce()) {
        self.logout();
        on_complete();
    }

    fn cached_expiry(&self, token: &str) -> Option<i64> {
        self.cache
            .lock()
            .as_ref()
            .filter(|c| c.token == token)
            .map(|c| c.expires_at_ms)
    }

    fn clear(&self) {
        *self.cache.lock() = None;
        self.store.remove(&self.key);
    }
}
