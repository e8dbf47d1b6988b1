/*
[INPUT]:  Signed credentials
[OUTPUT]: Typed request bodies for the session verifier
[POS]:    Data layer - request definitions
[UPDATE]: When the verifier request schema changes
*/

use serde::{Deserialize, Serialize};

use super::models::SignedCredential;

/// Body of `POST /auth/session`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateSessionRequest {
    pub wallet_address: String,
    pub signature: String,
    pub message: String,
}

impl From<SignedCredential> for CreateSessionRequest {
    fn from(credential: SignedCredential) -> Self {
        Self {
            wallet_address: credential.wallet_address,
            signature: credential.signature,
            message: credential.message,
        }
    }
}

impl From<&SignedCredential> for CreateSessionRequest {
    fn from(credential: &SignedCredential) -> Self {
        credential.clone().into()
    }
}
