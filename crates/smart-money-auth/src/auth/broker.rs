/*
[INPUT]:  Wallet adapter, session cache and verifier exchange
[OUTPUT]: Reusable session tokens or a tagged fallback/fatal outcome
[POS]:    Auth layer - orchestrates cached reuse vs. sign-and-mint
[UPDATE]: When the session flow, fallback rules or wallet events change
*/

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::auth::challenge::{DEFAULT_APP_LABEL, MessageBuilder};
use crate::auth::signer::sign_challenge;
use crate::auth::wallet::WalletAdapter;
use crate::http::{AuthError, Result, SessionExchange};
use crate::session::SessionCache;
use crate::types::{SessionToken, WalletEvent};

/// Broker behavior switches
#[derive(Debug, Clone)]
pub struct BrokerConfig {
    /// Label embedded in every challenge
    pub app_label: String,
    /// Serialize mints so concurrent misses sign at most once
    pub dedupe_in_flight: bool,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            app_label: DEFAULT_APP_LABEL.to_string(),
            dedupe_in_flight: false,
        }
    }
}

/// Result of asking the broker for a session
#[derive(Debug)]
pub enum SessionOutcome {
    /// A live session for the current wallet
    Ready(SessionToken),
    /// Minting failed but the wallet is still connected; address-only auth is possible
    NeedsFallback(AuthError),
    /// No identity to fall back to
    Fatal(AuthError),
}

/// Decides between reusing a cached session and signing a new one
pub struct SessionBroker {
    exchange: Arc<dyn SessionExchange>,
    cache: SessionCache,
    messages: MessageBuilder,
    mint_guard: Option<Mutex<()>>,
}

impl std::fmt::Debug for SessionBroker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionBroker")
            .field("cache", &self.cache)
            .field("messages", &self.messages)
            .field("dedupe_in_flight", &self.mint_guard.is_some())
            .finish()
    }
}

impl SessionBroker {
    /// Create a broker with default configuration
    pub fn new(exchange: Arc<dyn SessionExchange>, cache: SessionCache) -> Self {
        Self {
            exchange,
            cache,
            messages: MessageBuilder::default(),
            mint_guard: None,
        }
    }

    /// Create a broker with explicit configuration
    pub fn with_config(
        exchange: Arc<dyn SessionExchange>,
        cache: SessionCache,
        config: BrokerConfig,
    ) -> Result<Self> {
        Ok(Self {
            exchange,
            cache,
            messages: MessageBuilder::new(config.app_label)?,
            mint_guard: config.dedupe_in_flight.then(|| Mutex::new(())),
        })
    }

    /// Get the session cache
    pub fn cache(&self) -> &SessionCache {
        &self.cache
    }

    /// Return a session token for the connected wallet, signing only on a miss
    pub async fn get_or_create_session(&self, wallet: &dyn WalletAdapter) -> Result<String> {
        self.session(wallet).await.map(|session| session.token)
    }

    /// Same as [`get_or_create_session`](Self::get_or_create_session) with full token data
    ///
    /// 1. Require a connected wallet
    /// 2. Reuse a cached session minted for the same address
    /// 3. Otherwise build a challenge, sign it and exchange it with the verifier
    /// 4. Store and return the new session
    pub async fn session(&self, wallet: &dyn WalletAdapter) -> Result<SessionToken> {
        let address = connected_address(wallet)?;

        if let Some(session) = self.cached_for(&address) {
            return Ok(session);
        }

        match &self.mint_guard {
            Some(guard) => {
                let _in_flight = guard.lock().await;
                if let Some(session) = self.cached_for(&address) {
                    debug!(wallet = %address, "session minted by concurrent caller");
                    return Ok(session);
                }
                self.mint(wallet, &address).await
            }
            None => self.mint(wallet, &address).await,
        }
    }

    /// Classify the session attempt for the header assembler
    pub async fn resolve(&self, wallet: &dyn WalletAdapter) -> SessionOutcome {
        match self.session(wallet).await {
            Ok(session) => SessionOutcome::Ready(session),
            Err(err) if err.is_fatal() => SessionOutcome::Fatal(err),
            Err(err) => {
                if connected_address(wallet).is_ok() {
                    SessionOutcome::NeedsFallback(err)
                } else {
                    SessionOutcome::Fatal(err)
                }
            }
        }
    }

    /// Forget the cached session; call on every wallet disconnect
    pub fn disconnect(&self) {
        info!("wallet disconnected, clearing cached session");
        self.cache.clear();
    }

    /// React to wallet lifecycle notifications
    pub fn on_wallet_event(&self, event: &WalletEvent) {
        match event {
            WalletEvent::Disconnected => self.disconnect(),
            WalletEvent::Connected(address) => {
                if let Some(session) = self.cache.load() {
                    if !session.belongs_to(address) {
                        info!(
                            previous = %session.wallet_address,
                            wallet = %address,
                            "different wallet connected, clearing cached session"
                        );
                        self.cache.clear();
                    }
                }
            }
        }
    }

    fn cached_for(&self, address: &str) -> Option<SessionToken> {
        match self.cache.load() {
            Some(session) if session.belongs_to(address) => {
                debug!(wallet = %address, "reusing cached session");
                Some(session)
            }
            Some(session) => {
                debug!(
                    cached = %session.wallet_address,
                    wallet = %address,
                    "cached session belongs to another wallet"
                );
                None
            }
            None => None,
        }
    }

    async fn mint(&self, wallet: &dyn WalletAdapter, address: &str) -> Result<SessionToken> {
        info!(wallet = %address, "creating new session (signing required)");

        let challenge = self.messages.build();
        let credential = sign_challenge(wallet, &challenge).await?;
        let session = self.exchange.create_session(&credential).await?;

        if !session.belongs_to(&credential.wallet_address) {
            return Err(AuthError::SessionExchangeFailed {
                status: None,
                message: format!(
                    "verifier issued a session for {} instead of {}",
                    session.wallet_address, credential.wallet_address
                ),
            });
        }

        match connected_address(wallet) {
            Ok(current) if current == session.wallet_address => {
                self.cache.store(&session);
                info!(wallet = %address, expires_at = %session.expires_at, "session created");
            }
            _ => {
                warn!(
                    wallet = %address,
                    "wallet changed while session was minted, not caching"
                );
            }
        }

        Ok(session)
    }
}

fn connected_address(wallet: &dyn WalletAdapter) -> Result<String> {
    if !wallet.capabilities().connected {
        return Err(AuthError::NotConnected);
    }
    wallet.public_key().ok_or(AuthError::NotConnected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::wallet::MockWallet;
    use crate::types::SignedCredential;
    use async_trait::async_trait;
    use chrono::{Duration, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;

    /// Issues `tok-{n}` for whichever wallet signed
    #[derive(Default)]
    struct CountingExchange {
        calls: AtomicUsize,
        fail: bool,
        issue_for: StdMutex<Option<String>>,
    }

    impl CountingExchange {
        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SessionExchange for CountingExchange {
        async fn create_session(&self, credential: &SignedCredential) -> Result<SessionToken> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            tokio::task::yield_now().await;
            if self.fail {
                return Err(AuthError::exchange_unreachable("verifier offline"));
            }
            let wallet_address = self
                .issue_for
                .lock()
                .unwrap()
                .clone()
                .unwrap_or_else(|| credential.wallet_address.clone());
            Ok(SessionToken {
                token: format!("tok-{n}"),
                wallet_address,
                expires_at: Utc::now() + Duration::hours(1),
            })
        }
    }

    fn broker_with(exchange: Arc<CountingExchange>) -> SessionBroker {
        SessionBroker::new(exchange, SessionCache::in_memory())
    }

    #[tokio::test]
    async fn test_signs_once_and_reuses() {
        let exchange = Arc::new(CountingExchange::default());
        let broker = broker_with(exchange.clone());
        let wallet = MockWallet::connected("Wabc", &[1u8; 64]);

        let first = broker.get_or_create_session(&wallet).await.unwrap();
        let second = broker.get_or_create_session(&wallet).await.unwrap();
        let third = broker.get_or_create_session(&wallet).await.unwrap();

        assert_eq!(first, "tok-1");
        assert_eq!(second, first);
        assert_eq!(third, first);
        assert_eq!(exchange.calls(), 1);
        assert_eq!(wallet.sign_calls(), 1);
    }

    #[tokio::test]
    async fn test_not_connected() {
        let exchange = Arc::new(CountingExchange::default());
        let broker = broker_with(exchange.clone());
        let wallet = MockWallet::disconnected();

        let err = broker.get_or_create_session(&wallet).await.unwrap_err();
        assert!(matches!(err, AuthError::NotConnected));
        assert_eq!(exchange.calls(), 0);
    }

    #[tokio::test]
    async fn test_wallet_switch_mints_new_session() {
        let exchange = Arc::new(CountingExchange::default());
        let broker = broker_with(exchange.clone());
        let wallet = MockWallet::connected("WalletA", &[1u8; 64]);

        let token_a = broker.get_or_create_session(&wallet).await.unwrap();
        wallet.connect("WalletB");
        let token_b = broker.get_or_create_session(&wallet).await.unwrap();

        assert_ne!(token_a, token_b);
        assert_eq!(broker.cache().load().unwrap().wallet_address, "WalletB");
        assert_eq!(exchange.calls(), 2);
    }

    #[tokio::test]
    async fn test_expired_session_is_reminted() {
        let exchange = Arc::new(CountingExchange::default());
        let broker = broker_with(exchange.clone());
        let wallet = MockWallet::connected("Wabc", &[1u8; 64]);

        broker.cache().store(&SessionToken {
            token: "stale".to_string(),
            wallet_address: "Wabc".to_string(),
            expires_at: Utc::now() - Duration::minutes(1),
        });

        let token = broker.get_or_create_session(&wallet).await.unwrap();
        assert_eq!(token, "tok-1");
        assert_eq!(wallet.sign_calls(), 1);
    }

    #[tokio::test]
    async fn test_exchange_failure_propagates_without_retry() {
        let exchange = Arc::new(CountingExchange::failing());
        let broker = broker_with(exchange.clone());
        let wallet = MockWallet::connected("Wabc", &[1u8; 64]);

        let err = broker.get_or_create_session(&wallet).await.unwrap_err();
        assert!(matches!(err, AuthError::SessionExchangeFailed { .. }));
        assert_eq!(exchange.calls(), 1);
        assert!(broker.cache().load().is_none());
    }

    #[tokio::test]
    async fn test_mismatched_wallet_in_response_is_rejected() {
        let exchange = Arc::new(CountingExchange::default());
        *exchange.issue_for.lock().unwrap() = Some("Wother".to_string());
        let broker = broker_with(exchange.clone());
        let wallet = MockWallet::connected("Wabc", &[1u8; 64]);

        let err = broker.get_or_create_session(&wallet).await.unwrap_err();
        assert!(matches!(err, AuthError::SessionExchangeFailed { .. }));
        assert!(broker.cache().load().is_none());
    }

    #[tokio::test]
    async fn test_resolve_classification() {
        let broker = broker_with(Arc::new(CountingExchange::failing()));

        let connected = MockWallet::connected("Wabc", &[1u8; 64]);
        assert!(matches!(
            broker.resolve(&connected).await,
            SessionOutcome::NeedsFallback(AuthError::SessionExchangeFailed { .. })
        ));

        let rejecting = MockWallet::connected("Wabc", &[1u8; 64]).rejecting();
        assert!(matches!(
            broker.resolve(&rejecting).await,
            SessionOutcome::NeedsFallback(AuthError::SigningFailed { .. })
        ));

        let unsupported = MockWallet::connected("Wabc", &[1u8; 64]).without_signing();
        assert!(matches!(
            broker.resolve(&unsupported).await,
            SessionOutcome::NeedsFallback(AuthError::SigningUnsupported)
        ));

        let disconnected = MockWallet::disconnected();
        assert!(matches!(
            broker.resolve(&disconnected).await,
            SessionOutcome::Fatal(AuthError::NotConnected)
        ));
    }

    #[tokio::test]
    async fn test_resolve_ready() {
        let broker = broker_with(Arc::new(CountingExchange::default()));
        let wallet = MockWallet::connected("Wabc", &[1u8; 64]);

        match broker.resolve(&wallet).await {
            SessionOutcome::Ready(session) => assert_eq!(session.wallet_address, "Wabc"),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_disconnect_clears_cache() {
        let broker = broker_with(Arc::new(CountingExchange::default()));
        let wallet = MockWallet::connected("WalletA", &[1u8; 64]);
        let token_a = broker.get_or_create_session(&wallet).await.unwrap();

        wallet.disconnect();
        broker.on_wallet_event(&WalletEvent::Disconnected);
        assert!(broker.cache().load().is_none());

        wallet.connect("WalletB");
        broker.on_wallet_event(&WalletEvent::Connected("WalletB".to_string()));
        let token_b = broker.get_or_create_session(&wallet).await.unwrap();
        assert_ne!(token_a, token_b);
    }

    #[tokio::test]
    async fn test_connect_event_clears_other_wallets_session() {
        let broker = broker_with(Arc::new(CountingExchange::default()));
        let wallet = MockWallet::connected("WalletA", &[1u8; 64]);
        broker.get_or_create_session(&wallet).await.unwrap();

        broker.on_wallet_event(&WalletEvent::Connected("WalletA".to_string()));
        assert!(broker.cache().load().is_some());

        broker.on_wallet_event(&WalletEvent::Connected("WalletB".to_string()));
        assert!(broker.cache().load().is_none());
    }

    #[tokio::test]
    async fn test_concurrent_misses_without_guard_mint_twice() {
        let exchange = Arc::new(CountingExchange::default());
        let broker = broker_with(exchange.clone());
        let wallet = MockWallet::connected("Wabc", &[1u8; 64]);

        let (first, second) = tokio::join!(
            broker.get_or_create_session(&wallet),
            broker.get_or_create_session(&wallet)
        );

        assert!(first.is_ok() && second.is_ok());
        assert_eq!(exchange.calls(), 2);
        let cached = broker.cache().load().unwrap();
        assert!(cached.token == "tok-1" || cached.token == "tok-2");
    }

    #[tokio::test]
    async fn test_concurrent_misses_with_guard_mint_once() {
        let exchange = Arc::new(CountingExchange::default());
        let broker = SessionBroker::with_config(
            exchange.clone(),
            SessionCache::in_memory(),
            BrokerConfig {
                dedupe_in_flight: true,
                ..BrokerConfig::default()
            },
        )
        .unwrap();
        let wallet = MockWallet::connected("Wabc", &[1u8; 64]);

        let (first, second) = tokio::join!(
            broker.get_or_create_session(&wallet),
            broker.get_or_create_session(&wallet)
        );

        assert_eq!(first.unwrap(), second.unwrap());
        assert_eq!(exchange.calls(), 1);
        assert_eq!(wallet.sign_calls(), 1);
    }

    #[test]
    fn test_invalid_label_rejected() {
        let result = SessionBroker::with_config(
            Arc::new(CountingExchange::default()),
            SessionCache::in_memory(),
            BrokerConfig {
                app_label: "bad\nlabel".to_string(),
                ..BrokerConfig::default()
            },
        );
        assert!(matches!(result, Err(AuthError::Config(_))));
    }
}
