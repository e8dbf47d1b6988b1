/*
[INPUT]:  Verified wallet addresses, session TTL, consumed challenges
[OUTPUT]: Issued session tokens, lookups, revocations
[POS]:    Verifier layer - server-side session storage with expiry
[UPDATE]: When token format or revocation rules change
*/

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use rand::rngs::OsRng;

use crate::types::SessionToken;

const TOKEN_BYTES: usize = 32;

/// Server-side record of an issued session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub wallet_address: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct RegistryState {
    sessions: HashMap<String, SessionRecord>,
    // (wallet, message) -> instant after which the entry can be forgotten
    consumed_challenges: HashMap<(String, String), DateTime<Utc>>,
}

/// Thread-safe store of issued sessions and consumed challenges
#[derive(Debug, Clone, Default)]
pub struct SessionRegistry {
    state: Arc<RwLock<RegistryState>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a fresh token for `wallet_address` valid for `ttl`
    pub fn issue(&self, wallet_address: &str, ttl: Duration) -> SessionToken {
        self.issue_at(wallet_address, ttl, Utc::now())
    }

    pub fn issue_at(&self, wallet_address: &str, ttl: Duration, now: DateTime<Utc>) -> SessionToken {
        let token = generate_session_token();
        let record = SessionRecord {
            wallet_address: wallet_address.to_string(),
            issued_at: now,
            expires_at: now + ttl,
        };

        let mut guard = self.state.write().unwrap_or_else(PoisonError::into_inner);
        guard.sessions.retain(|_, existing| existing.expires_at > now);
        guard.sessions.insert(token.clone(), record.clone());

        SessionToken {
            token,
            wallet_address: record.wallet_address,
            expires_at: record.expires_at,
        }
    }

    /// Look up a live session; expired entries are removed and reported absent
    pub fn lookup(&self, token: &str) -> Option<SessionRecord> {
        self.lookup_at(token, Utc::now())
    }

    pub fn lookup_at(&self, token: &str, now: DateTime<Utc>) -> Option<SessionRecord> {
        let mut guard = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let expired = match guard.sessions.get(token) {
            Some(record) if record.expires_at > now => return Some(record.clone()),
            Some(_) => true,
            None => false,
        };
        if expired {
            guard.sessions.remove(token);
        }
        None
    }

    /// Revoke one token, returning whether it existed
    pub fn revoke(&self, token: &str) -> bool {
        let mut guard = self.state.write().unwrap_or_else(PoisonError::into_inner);
        guard.sessions.remove(token).is_some()
    }

    /// Revoke every session of a wallet, returning how many were removed
    pub fn revoke_wallet(&self, wallet_address: &str) -> usize {
        let mut guard = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let before = guard.sessions.len();
        guard
            .sessions
            .retain(|_, record| record.wallet_address != wallet_address);
        before - guard.sessions.len()
    }

    /// Drop expired sessions and forgettable challenges
    pub fn purge_expired(&self) -> usize {
        self.purge_expired_at(Utc::now())
    }

    pub fn purge_expired_at(&self, now: DateTime<Utc>) -> usize {
        let mut guard = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let before = guard.sessions.len();
        guard.sessions.retain(|_, record| record.expires_at > now);
        guard.consumed_challenges.retain(|_, forget_after| *forget_after > now);
        before - guard.sessions.len()
    }

    /// Record a signed challenge as used.
    ///
    /// Returns `false` if the same wallet already presented this exact message
    /// and the entry has not been forgotten yet. Forgettable entries are
    /// dropped on the way.
    pub fn consume_challenge(
        &self,
        wallet_address: &str,
        message: &str,
        forget_after: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> bool {
        let mut guard = self.state.write().unwrap_or_else(PoisonError::into_inner);
        guard
            .consumed_challenges
            .retain(|_, existing| *existing > now);

        let key = (wallet_address.to_string(), message.to_string());
        if guard.consumed_challenges.contains_key(&key) {
            return false;
        }
        guard.consumed_challenges.insert(key, forget_after);
        true
    }

    /// Number of remembered challenges, including ones not yet forgettable
    pub fn consumed_challenges(&self) -> usize {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .consumed_challenges
            .len()
    }

    pub fn active_sessions(&self) -> usize {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .sessions
            .len()
    }
}

/// Random base58 bearer token
pub fn generate_session_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    bs58::encode(bytes).into_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_session_token() {
        let a = generate_session_token();
        let b = generate_session_token();
        assert_ne!(a, b);
        assert_eq!(bs58::decode(&a).into_vec().unwrap().len(), TOKEN_BYTES);
    }

    #[test]
    fn test_issue_and_lookup() {
        let registry = SessionRegistry::new();
        let session = registry.issue("Wabc", Duration::hours(1));

        let record = registry.lookup(&session.token).unwrap();
        assert_eq!(record.wallet_address, "Wabc");
        assert_eq!(record.expires_at, session.expires_at);
        assert!(registry.lookup("unknown").is_none());
    }

    #[test]
    fn test_expired_lookup_purges() {
        let registry = SessionRegistry::new();
        let now = Utc::now();
        let session = registry.issue_at("Wabc", Duration::hours(1), now);

        assert!(registry.lookup_at(&session.token, now + Duration::hours(1)).is_none());
        assert_eq!(registry.active_sessions(), 0);
    }

    #[test]
    fn test_revoke() {
        let registry = SessionRegistry::new();
        let first = registry.issue("Wabc", Duration::hours(1));
        let second = registry.issue("Wabc", Duration::hours(1));
        let other = registry.issue("Wxyz", Duration::hours(1));

        assert!(registry.revoke(&first.token));
        assert!(!registry.revoke(&first.token));
        assert!(registry.lookup(&second.token).is_some());

        assert_eq!(registry.revoke_wallet("Wabc"), 1);
        assert!(registry.lookup(&second.token).is_none());
        assert!(registry.lookup(&other.token).is_some());
    }

    #[test]
    fn test_purge_expired() {
        let registry = SessionRegistry::new();
        let now = Utc::now();
        registry.issue_at("Wabc", Duration::minutes(5), now);
        registry.issue_at("Wxyz", Duration::hours(1), now);

        assert_eq!(registry.purge_expired_at(now + Duration::minutes(10)), 1);
        assert_eq!(registry.active_sessions(), 1);
    }

    #[test]
    fn test_consume_challenge_once() {
        let registry = SessionRegistry::new();
        let now = Utc::now();
        let forget_after = now + Duration::minutes(5);

        assert!(registry.consume_challenge("Wabc", "msg", forget_after, now));
        assert!(!registry.consume_challenge("Wabc", "msg", forget_after, now));
        assert!(registry.consume_challenge("Wxyz", "msg", forget_after, now));
        assert!(registry.consume_challenge("Wabc", "msg", forget_after, forget_after));
    }

    #[test]
    fn test_maps_shrink_as_time_moves_on() {
        let registry = SessionRegistry::new();
        let start = Utc::now();
        for i in 0..1000 {
            let message = format!("msg-{i}");
            let forget_after = start + Duration::minutes(5);
            assert!(registry.consume_challenge("Wabc", &message, forget_after, start));
            registry.issue_at("Wabc", Duration::hours(1), start);
        }
        assert_eq!(registry.consumed_challenges(), 1000);
        assert_eq!(registry.active_sessions(), 1000);

        let later = start + Duration::days(1);
        let forget_after = later + Duration::minutes(5);
        assert!(registry.consume_challenge("Wabc", "msg-late", forget_after, later));
        registry.issue_at("Wabc", Duration::hours(1), later);

        assert_eq!(registry.consumed_challenges(), 1);
        assert_eq!(registry.active_sessions(), 1);
    }

    #[test]
    fn test_unforgettable_challenge_survives_pruning() {
        let registry = SessionRegistry::new();
        let now = Utc::now();

        assert!(registry.consume_challenge("Wabc", "msg", DateTime::<Utc>::MAX_UTC, now));
        assert_eq!(registry.purge_expired_at(now + Duration::days(3650)), 0);
        let much_later = now + Duration::days(3650);
        assert!(!registry.consume_challenge("Wabc", "msg", DateTime::<Utc>::MAX_UTC, much_later));
    }
}
