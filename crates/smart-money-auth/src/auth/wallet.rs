/*
[INPUT]:  Message bytes to sign and wallet connection state
[OUTPUT]: Capability flags, base58 address, raw signature bytes
[POS]:    Auth layer - wallet integration abstraction
[UPDATE]: When adding new wallet types or capability flags
*/

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use thiserror::Error;

/// Capabilities a wallet adapter reports before any signing attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WalletCapabilities {
    pub connected: bool,
    pub sign_message: bool,
}

impl WalletCapabilities {
    pub fn full() -> Self {
        Self {
            connected: true,
            sign_message: true,
        }
    }

    pub fn disconnected() -> Self {
        Self::default()
    }
}

/// Failure reported by the wallet while signing
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WalletError {
    #[error("user rejected the signing request")]
    Rejected,
    #[error("wallet does not implement message signing")]
    Unsupported,
    #[error("wallet error: {0}")]
    Failed(String),
}

/// Trait for wallet integrations
///
/// Implement this trait for your wallet type (browser bridge, hardware wallet,
/// local keypair). Signing is async because it may wait on user approval.
#[async_trait]
pub trait WalletAdapter: Send + Sync {
    /// Report connection state and signing support
    fn capabilities(&self) -> WalletCapabilities;

    /// Base58 public key of the active account, if connected
    fn public_key(&self) -> Option<String>;

    /// Sign raw message bytes and return the detached signature bytes
    async fn sign_message(&self, message: &[u8]) -> Result<Vec<u8>, WalletError>;
}

#[derive(Debug, Clone)]
struct MockState {
    address: Option<String>,
    sign_message: bool,
    reject: bool,
}

/// Scriptable wallet for tests
#[derive(Debug)]
pub struct MockWallet {
    state: RwLock<MockState>,
    signature: Vec<u8>,
    sign_calls: AtomicUsize,
}

impl MockWallet {
    /// A connected wallet that returns `signature` for every request
    pub fn connected(address: &str, signature: &[u8]) -> Self {
        Self {
            state: RwLock::new(MockState {
                address: Some(address.to_string()),
                sign_message: true,
                reject: false,
            }),
            signature: signature.to_vec(),
            sign_calls: AtomicUsize::new(0),
        }
    }

    /// A wallet with no active account
    pub fn disconnected() -> Self {
        let wallet = Self::connected("", &[]);
        wallet.disconnect();
        wallet
    }

    /// Builder-style toggle for the signing capability
    pub fn without_signing(self) -> Self {
        self.write_state(|state| state.sign_message = false);
        self
    }

    /// Builder-style toggle making every signing request fail as rejected
    pub fn rejecting(self) -> Self {
        self.set_rejecting(true);
        self
    }

    pub fn set_rejecting(&self, reject: bool) {
        self.write_state(|state| state.reject = reject);
    }

    /// Switch the active account
    pub fn connect(&self, address: &str) {
        self.write_state(|state| state.address = Some(address.to_string()));
    }

    pub fn disconnect(&self) {
        self.write_state(|state| state.address = None);
    }

    /// Number of signing prompts shown so far
    pub fn sign_calls(&self) -> usize {
        self.sign_calls.load(Ordering::SeqCst)
    }

    fn write_state(&self, update: impl FnOnce(&mut MockState)) {
        let mut guard = self.state.write().unwrap_or_else(PoisonError::into_inner);
        update(&mut guard);
    }

    fn read_state(&self) -> MockState {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl WalletAdapter for MockWallet {
    fn capabilities(&self) -> WalletCapabilities {
        let state = self.read_state();
        WalletCapabilities {
            connected: state.address.is_some(),
            sign_message: state.sign_message,
        }
    }

    fn public_key(&self) -> Option<String> {
        self.read_state().address
    }

    async fn sign_message(&self, _message: &[u8]) -> Result<Vec<u8>, WalletError> {
        self.sign_calls.fetch_add(1, Ordering::SeqCst);
        let state = self.read_state();
        if !state.sign_message {
            return Err(WalletError::Unsupported);
        }
        if state.reject {
            return Err(WalletError::Rejected);
        }
        Ok(self.signature.clone())
    }
}
