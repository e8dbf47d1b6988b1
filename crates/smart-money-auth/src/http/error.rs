/*
[INPUT]:  Error sources (wallet, signing, verifier exchange, storage, serialization)
[OUTPUT]: Structured error types with retry and fallback hints
[POS]:    Error handling layer - unified error types for entire crate
[UPDATE]: When adding new error sources or improving error messages
*/

use reqwest::StatusCode;
use thiserror::Error;

/// Main error type for wallet-session authentication
#[derive(Error, Debug)]
pub enum AuthError {
    /// No connected wallet to anchor identity
    #[error("Wallet not connected")]
    NotConnected,

    /// Wallet cannot sign arbitrary messages
    #[error("Wallet does not support message signing")]
    SigningUnsupported,

    /// User rejected the signing prompt or the wallet failed internally
    #[error("Failed to sign authentication message: {reason}")]
    SigningFailed { reason: String },

    /// Verifier rejected the credential or could not be reached
    #[error("Session exchange failed{}: {message}", status_suffix(.status))]
    SessionExchangeFailed {
        status: Option<u16>,
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Header value could not be encoded
    #[error("Invalid header value: {0}")]
    InvalidHeader(String),

    /// Key material could not be decoded
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// URL parsing failed
    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),
}

fn status_suffix(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" (status {code})"),
        None => String::new(),
    }
}

impl AuthError {
    /// Check if the caller may reasonably retry the operation
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AuthError::SigningFailed { .. } | AuthError::SessionExchangeFailed { .. }
        )
    }

    /// Check if the error means there is no identity to fall back to
    pub fn is_fatal(&self) -> bool {
        matches!(self, AuthError::NotConnected)
    }

    /// Create an exchange error from a non-2xx verifier response
    pub fn exchange_rejected(status: StatusCode, message: impl Into<String>) -> Self {
        AuthError::SessionExchangeFailed {
            status: Some(status.as_u16()),
            message: message.into(),
        }
    }

    /// Create an exchange error for transport failures (no response received)
    pub fn exchange_unreachable(message: impl Into<String>) -> Self {
        AuthError::SessionExchangeFailed {
            status: None,
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for AuthError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => AuthError::exchange_rejected(status, err.to_string()),
            None => AuthError::exchange_unreachable(err.to_string()),
        }
    }
}

/// Result type alias for authentication operations
pub type Result<T> = std::result::Result<T, AuthError>;
