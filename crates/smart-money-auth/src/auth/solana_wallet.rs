/*
[INPUT]:  Solana private key (base58 or CLI keypair file) and message bytes
[OUTPUT]: Ed25519 detached signatures from a local keypair
[POS]:    Auth layer - Solana keypair wallet implementation
[UPDATE]: When Solana key formats or SDK version changes
*/

use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use ed25519_dalek::SigningKey;
use solana_keypair::Keypair;
use solana_signer::Signer;

use crate::auth::wallet::{WalletAdapter, WalletCapabilities, WalletError};
use crate::http::{AuthError, Result};

/// Local Solana keypair acting as an always-approving wallet
pub struct KeypairWallet {
    keypair: Keypair,
    address: String,
    connected: AtomicBool,
}

impl std::fmt::Debug for KeypairWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeypairWallet")
            .field("address", &self.address)
            .field("connected", &self.connected.load(Ordering::SeqCst))
            .finish()
    }
}

impl KeypairWallet {
    /// Generate a fresh random keypair
    pub fn generate() -> Self {
        Self::from_keypair(Keypair::new())
    }

    /// Create a wallet from a base58-encoded private key.
    /// Supports 64-byte keypair or 32-byte seed
    pub fn new(private_key_base58: &str) -> Result<Self> {
        let bytes = bs58::decode(private_key_base58.trim())
            .into_vec()
            .map_err(|e| AuthError::InvalidKey(format!("Invalid base58 private key: {e}")))?;
        Self::from_bytes(&bytes)
    }

    /// Load a Solana CLI keypair file (JSON array of 64 bytes)
    pub fn from_keypair_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            AuthError::InvalidKey(format!("Failed to read keypair file {}: {e}", path.display()))
        })?;
        let bytes: Vec<u8> = serde_json::from_str(&content)?;
        Self::from_bytes(&bytes)
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let keypair_bytes = match bytes.len() {
            64 => bytes.to_vec(),
            32 => {
                let mut seed = [0u8; 32];
                seed.copy_from_slice(bytes);
                let signing_key = SigningKey::from_bytes(&seed);
                signing_key.to_keypair_bytes().to_vec()
            }
            len => {
                return Err(AuthError::InvalidKey(format!(
                    "Invalid private key length: expected 32 or 64 bytes, got {len}"
                )));
            }
        };

        let keypair = Keypair::try_from(keypair_bytes.as_slice())
            .map_err(|e| AuthError::InvalidKey(format!("Invalid keypair bytes: {e}")))?;
        Ok(Self::from_keypair(keypair))
    }

    fn from_keypair(keypair: Keypair) -> Self {
        let address = keypair.pubkey().to_string();
        Self {
            keypair,
            address,
            connected: AtomicBool::new(true),
        }
    }

    /// Base58 public key
    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }

    pub fn reconnect(&self) {
        self.connected.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl WalletAdapter for KeypairWallet {
    fn capabilities(&self) -> WalletCapabilities {
        WalletCapabilities {
            connected: self.connected.load(Ordering::SeqCst),
            sign_message: true,
        }
    }

    fn public_key(&self) -> Option<String> {
        self.capabilities()
            .connected
            .then(|| self.address.clone())
    }

    async fn sign_message(&self, message: &[u8]) -> std::result::Result<Vec<u8>, WalletError> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(WalletError::Failed("keypair wallet is disconnected".to_string()));
        }
        let signature = self.keypair.sign_message(message);
        Ok(signature.as_ref().to_vec())
    }
}
