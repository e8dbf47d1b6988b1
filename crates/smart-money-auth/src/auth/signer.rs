/*
[INPUT]:  Wallet adapter and challenge to sign
[OUTPUT]: SignedCredential with base58 address and base58 signature
[POS]:    Auth layer - drives wallet signing and transport encoding
[UPDATE]: When changing signature encoding or capability checks
*/

use tracing::{debug, warn};

use crate::auth::wallet::{WalletAdapter, WalletError};
use crate::http::{AuthError, Result};
use crate::types::{AuthChallenge, SignedCredential};

/// Length of a detached Ed25519 signature
pub const SIGNATURE_LENGTH: usize = 64;

/// Encode raw signature bytes for transport in headers and JSON
pub fn encode_signature(signature: &[u8]) -> String {
    bs58::encode(signature).into_string()
}

/// Decode a transport-encoded signature back to raw bytes
pub fn decode_signature(encoded: &str) -> Result<Vec<u8>> {
    bs58::decode(encoded)
        .into_vec()
        .map_err(|e| AuthError::InvalidKey(format!("Invalid base58 signature: {e}")))
}

/// Ask the wallet to sign `challenge` and package the result.
///
/// Fails with `NotConnected` when the wallet has no active account and with
/// `SigningUnsupported` when it cannot sign messages. Nothing is retried here.
pub async fn sign_challenge(
    wallet: &dyn WalletAdapter,
    challenge: &AuthChallenge,
) -> Result<SignedCredential> {
    let capabilities = wallet.capabilities();
    let wallet_address = match wallet.public_key() {
        Some(address) if capabilities.connected => address,
        _ => return Err(AuthError::NotConnected),
    };
    if !capabilities.sign_message {
        return Err(AuthError::SigningUnsupported);
    }

    debug!(wallet = %wallet_address, "requesting challenge signature");
    let signature = wallet
        .sign_message(challenge.message.as_bytes())
        .await
        .map_err(|err| {
            warn!(wallet = %wallet_address, error = %err, "wallet failed to sign challenge");
            match err {
                WalletError::Unsupported => AuthError::SigningUnsupported,
                other => AuthError::SigningFailed {
                    reason: other.to_string(),
                },
            }
        })?;

    if signature.len() != SIGNATURE_LENGTH {
        return Err(AuthError::SigningFailed {
            reason: format!(
                "wallet returned {} signature bytes, expected {SIGNATURE_LENGTH}",
                signature.len()
            ),
        });
    }

    Ok(SignedCredential {
        wallet_address,
        signature: encode_signature(&signature),
        message: challenge.message.clone(),
    })
}
