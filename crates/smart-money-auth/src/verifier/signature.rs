/*
[INPUT]:  Base58 wallet address, base58 signature and signed message
[OUTPUT]: Verification result
[POS]:    Verifier layer - Ed25519 detached signature verification
[UPDATE]: When key or signature encodings change
*/

use ed25519_dalek::{Signature, Verifier, VerifyingKey};

use crate::verifier::VerifierError;

/// Verify that `signature` over the UTF-8 bytes of `message` was made by `wallet_address`
pub fn verify_wallet_signature(
    wallet_address: &str,
    signature: &str,
    message: &str,
) -> Result<(), VerifierError> {
    let verifying_key = decode_wallet_address(wallet_address)?;

    let signature_bytes = bs58::decode(signature)
        .into_vec()
        .map_err(|_| VerifierError::InvalidSignature)?;
    let signature =
        Signature::from_slice(&signature_bytes).map_err(|_| VerifierError::InvalidSignature)?;

    verifying_key
        .verify(message.as_bytes(), &signature)
        .map_err(|_| VerifierError::InvalidSignature)
}

/// Decode a base58 wallet address into an Ed25519 public key
pub fn decode_wallet_address(wallet_address: &str) -> Result<VerifyingKey, VerifierError> {
    let bytes = bs58::decode(wallet_address)
        .into_vec()
        .map_err(|e| VerifierError::InvalidAddress(e.to_string()))?;
    let bytes: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
        VerifierError::InvalidAddress(format!("expected 32 bytes, got {}", bytes.len()))
    })?;
    VerifyingKey::from_bytes(&bytes).map_err(|e| VerifierError::InvalidAddress(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::{Signer, SigningKey};
    use rand::rngs::OsRng;

    fn signed(message: &str) -> (String, String) {
        let signing_key = SigningKey::generate(&mut OsRng);
        let address = bs58::encode(signing_key.verifying_key().as_bytes()).into_string();
        let signature = bs58::encode(signing_key.sign(message.as_bytes()).to_bytes()).into_string();
        (address, signature)
    }

    #[test]
    fn test_valid_signature() {
        let message = "Smart Money Tinder Authentication | Timestamp: 1234567890";
        let (address, signature) = signed(message);
        assert!(verify_wallet_signature(&address, &signature, message).is_ok());
    }

    #[test]
    fn test_tampered_message() {
        let (address, signature) = signed("Smart Money Tinder Authentication | Timestamp: 1");
        let err = verify_wallet_signature(
            &address,
            &signature,
            "Smart Money Tinder Authentication | Timestamp: 2",
        )
        .unwrap_err();
        assert_eq!(err, VerifierError::InvalidSignature);
    }

    #[test]
    fn test_wrong_wallet() {
        let message = "hello";
        let (_, signature) = signed(message);
        let (other_address, _) = signed(message);
        assert_eq!(
            verify_wallet_signature(&other_address, &signature, message),
            Err(VerifierError::InvalidSignature)
        );
    }

    #[test]
    fn test_garbage_inputs() {
        let (address, _) = signed("hello");
        assert!(matches!(
            verify_wallet_signature("not-base58-0OIl", "sig", "hello"),
            Err(VerifierError::InvalidAddress(_))
        ));
        assert!(matches!(
            verify_wallet_signature("1111", "sig", "hello"),
            Err(VerifierError::InvalidAddress(_))
        ));
        assert_eq!(
            verify_wallet_signature(&address, "3yZe7d", "hello"),
            Err(VerifierError::InvalidSignature)
        );
    }
}
