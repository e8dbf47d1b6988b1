/*
[INPUT]:  Session tokens and an optional backing key-value store
[OUTPUT]: Cached session lookup with eager expiry purge
[POS]:    Session layer - short-lived credential cache keyed by wallet
[UPDATE]: When storage keys or expiry semantics change
*/

use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use tracing::{debug, warn};

use crate::session::storage::{KeyValueStore, MemoryStore};
use crate::types::SessionToken;
use crate::types::models::serde_helpers::parse_timestamp;

/// Namespace prefix for persisted session entries
pub const DEFAULT_NAMESPACE: &str = "smart_money";

/// The three persisted entry names of one cached session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionKeys {
    pub token: String,
    pub wallet: String,
    pub expires: String,
}

impl SessionKeys {
    pub fn new(namespace: &str) -> Self {
        Self {
            token: format!("{namespace}_session_token"),
            wallet: format!("{namespace}_session_wallet"),
            expires: format!("{namespace}_session_token_expires"),
        }
    }
}

impl Default for SessionKeys {
    fn default() -> Self {
        Self::new(DEFAULT_NAMESPACE)
    }
}

/// Session store injected into the broker.
///
/// All operations are synchronous and never fail: without a backing store
/// (no execution context) they no-op, and storage errors are logged and
/// swallowed. Expired entries are purged by `load` itself.
#[derive(Debug, Clone)]
pub struct SessionCache {
    store: Option<Arc<dyn KeyValueStore>>,
    keys: SessionKeys,
}

impl SessionCache {
    /// Create a cache over `store` using the entry names for `namespace`
    pub fn new(store: Arc<dyn KeyValueStore>, namespace: &str) -> Self {
        Self {
            store: Some(store),
            keys: SessionKeys::new(namespace),
        }
    }

    /// Process-local cache with the default namespace
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()), DEFAULT_NAMESPACE)
    }

    /// Cache with no backing store; loads are absent and writes are dropped
    pub fn detached() -> Self {
        Self {
            store: None,
            keys: SessionKeys::default(),
        }
    }

    pub fn keys(&self) -> &SessionKeys {
        &self.keys
    }

    pub fn is_detached(&self) -> bool {
        self.store.is_none()
    }

    /// Load the cached session, purging it if expired or incomplete
    pub fn load(&self) -> Option<SessionToken> {
        self.load_at(Utc::now())
    }

    /// Same as [`load`](Self::load) with an explicit notion of "now"
    pub fn load_at(&self, now: DateTime<Utc>) -> Option<SessionToken> {
        let store = self.store.as_ref()?;

        let token = read_entry(store.as_ref(), &self.keys.token);
        let wallet = read_entry(store.as_ref(), &self.keys.wallet);
        let expires = read_entry(store.as_ref(), &self.keys.expires);

        let (token, wallet_address, expires) = match (token, wallet, expires) {
            (None, None, None) => return None,
            (Some(token), Some(wallet), Some(expires)) => (token, wallet, expires),
            _ => {
                debug!("incomplete cached session, clearing");
                self.clear();
                return None;
            }
        };

        let Some(expires_at) = parse_timestamp(&expires) else {
            warn!(expires = %expires, "unparseable cached session expiry, clearing");
            self.clear();
            return None;
        };

        let session = SessionToken {
            token,
            wallet_address,
            expires_at,
        };
        if session.is_expired_at(now) {
            debug!(wallet = %session.wallet_address, "cached session expired, clearing");
            self.clear();
            return None;
        }

        Some(session)
    }

    /// Persist `session`, replacing any previous one (last write wins)
    pub fn store(&self, session: &SessionToken) {
        let Some(store) = self.store.as_ref() else {
            return;
        };

        let expires = session
            .expires_at
            .to_rfc3339_opts(SecondsFormat::Millis, true);
        let writes = [
            (&self.keys.token, session.token.as_str()),
            (&self.keys.wallet, session.wallet_address.as_str()),
            (&self.keys.expires, expires.as_str()),
        ];
        for (key, value) in writes {
            if let Err(err) = store.set(key, value) {
                warn!(key = %key, error = %err, "failed to persist session entry");
                self.clear();
                return;
            }
        }
    }

    /// Remove all persisted session entries
    pub fn clear(&self) {
        let Some(store) = self.store.as_ref() else {
            return;
        };

        for key in [&self.keys.token, &self.keys.wallet, &self.keys.expires] {
            if let Err(err) = store.remove(key) {
                warn!(key = %key, error = %err, "failed to remove session entry");
            }
        }
    }
}

fn read_entry(store: &dyn KeyValueStore, key: &str) -> Option<String> {
    match store.get(key) {
        Ok(value) => value.filter(|value| !value.is_empty()),
        Err(err) => {
            warn!(key = %key, error = %err, "failed to read session entry");
            None
        }
    }
}
