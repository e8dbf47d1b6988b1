/*
[INPUT]:  Session broker outcome and wallet connection state
[OUTPUT]: Request headers for authenticated API calls
[POS]:    Auth layer - header assembler with address-only fallback
[UPDATE]: When header names or fallback rules change
*/

use reqwest::RequestBuilder;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use tracing::warn;

use crate::auth::broker::{SessionBroker, SessionOutcome};
use crate::auth::wallet::WalletAdapter;
use crate::http::{AuthError, Result};
use crate::types::AuthMode;

pub const SESSION_TOKEN_HEADER: &str = "X-Session-Token";
pub const WALLET_ADDRESS_HEADER: &str = "X-Wallet-Address";
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Credential headers attached to every authenticated request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthHeaders {
    mode: AuthMode,
    credential: String,
}

impl AuthHeaders {
    pub fn session(token: impl Into<String>) -> Self {
        Self {
            mode: AuthMode::Session,
            credential: token.into(),
        }
    }

    pub fn wallet_address(address: impl Into<String>) -> Self {
        Self {
            mode: AuthMode::WalletAddress,
            credential: address.into(),
        }
    }

    pub fn mode(&self) -> AuthMode {
        self.mode
    }

    /// Session token or wallet address, depending on the mode
    pub fn credential(&self) -> &str {
        &self.credential
    }

    /// Header name/value pairs in a stable order
    pub fn pairs(&self) -> [(&'static str, &str); 2] {
        let credential_header = match self.mode {
            AuthMode::Session => SESSION_TOKEN_HEADER,
            AuthMode::WalletAddress => WALLET_ADDRESS_HEADER,
        };
        [
            ("Content-Type", JSON_CONTENT_TYPE),
            (credential_header, self.credential.as_str()),
        ]
    }

    pub fn to_header_map(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));

        let (name, value) = self.pairs()[1];
        let value = HeaderValue::from_str(value)
            .map_err(|e| AuthError::InvalidHeader(format!("{name}: {e}")))?;
        headers.insert(HeaderName::from_static(header_key(self.mode)), value);
        Ok(headers)
    }

    /// Attach these headers to an outgoing request
    pub fn apply(&self, builder: RequestBuilder) -> Result<RequestBuilder> {
        Ok(builder.headers(self.to_header_map()?))
    }
}

fn header_key(mode: AuthMode) -> &'static str {
    match mode {
        AuthMode::Session => "x-session-token",
        AuthMode::WalletAddress => "x-wallet-address",
    }
}

impl SessionBroker {
    /// Headers for an authenticated call.
    ///
    /// Uses the session token when one can be obtained. If minting fails while
    /// the wallet is still connected, falls back to the bare wallet address;
    /// otherwise the error is returned, there is no anonymous mode.
    pub async fn get_auth_headers(&self, wallet: &dyn WalletAdapter) -> Result<AuthHeaders> {
        match self.resolve(wallet).await {
            SessionOutcome::Ready(session) => Ok(AuthHeaders::session(session.token)),
            SessionOutcome::NeedsFallback(err) => {
                let address = wallet.public_key().ok_or(AuthError::NotConnected)?;
                warn!(
                    wallet = %address,
                    error = %err,
                    "session creation failed, falling back to wallet address header"
                );
                Ok(AuthHeaders::wallet_address(address))
            }
            SessionOutcome::Fatal(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::Method;

    #[test]
    fn test_session_header_pairs() {
        let headers = AuthHeaders::session("tok1");
        assert_eq!(headers.mode(), AuthMode::Session);
        assert_eq!(
            headers.pairs(),
            [("Content-Type", "application/json"), ("X-Session-Token", "tok1")]
        );
    }

    #[test]
    fn test_wallet_address_header_map() {
        let headers = AuthHeaders::wallet_address("Wabc").to_header_map().unwrap();

        assert_eq!(headers.len(), 2);
        assert_eq!(headers.get("content-type").unwrap(), "application/json");
        assert_eq!(headers.get("X-Wallet-Address").unwrap(), "Wabc");
        assert!(headers.get("X-Session-Token").is_none());
    }

    #[test]
    fn test_invalid_header_value() {
        let err = AuthHeaders::session("tok\n1").to_header_map().unwrap_err();
        assert!(matches!(err, AuthError::InvalidHeader(_)));
    }

    #[test]
    fn test_apply_to_request() {
        let client = reqwest::Client::new();
        let builder = client.request(Method::GET, "http://localhost/api/profiles");

        let request = AuthHeaders::session("tok1")
            .apply(builder)
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(request.headers().get("x-session-token").unwrap(), "tok1");
        assert_eq!(request.headers().get("content-type").unwrap(), "application/json");
    }
}
