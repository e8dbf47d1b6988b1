/*
[INPUT]:  Verification, freshness and session lookup failures
[OUTPUT]: Server-side error types with HTTP status mapping
[POS]:    Verifier layer - error definitions
[UPDATE]: When adding verification rules
*/

use reqwest::StatusCode;
use thiserror::Error;

/// Server-side authentication failure
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerifierError {
    #[error("Missing authentication headers: {0}")]
    MissingCredentials(String),

    #[error("Invalid wallet address: {0}")]
    InvalidAddress(String),

    #[error("Invalid wallet signature")]
    InvalidSignature,

    #[error("Malformed authentication message")]
    MalformedChallenge,

    #[error("Authentication message is stale or from the future")]
    StaleChallenge,

    #[error("Authentication message was already used")]
    ChallengeReplayed,

    #[error("Invalid or expired session token")]
    InvalidSession,

    #[error("Wallet address authentication is disabled")]
    FallbackDisabled,

    #[error("You can only access your own resources")]
    WalletMismatch,
}

impl VerifierError {
    /// HTTP status the server should answer with
    pub fn status_code(&self) -> StatusCode {
        match self {
            VerifierError::InvalidAddress(_) | VerifierError::MalformedChallenge => {
                StatusCode::BAD_REQUEST
            }
            VerifierError::WalletMismatch => StatusCode::FORBIDDEN,
            _ => StatusCode::UNAUTHORIZED,
        }
    }
}
