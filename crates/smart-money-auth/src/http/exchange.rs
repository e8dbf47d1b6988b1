/*
[INPUT]:  Signed credentials
[OUTPUT]: Verifier-issued session tokens
[POS]:    HTTP layer - session exchange with the verifier
[UPDATE]: When the session endpoint or payload changes
*/

use async_trait::async_trait;
use reqwest::Method;
use tracing::info;

use crate::http::{AuthClient, Result};
use crate::types::{CreateSessionRequest, CreateSessionResponse, SessionToken, SignedCredential};

/// Session endpoint, relative to the API base
pub const SESSION_ENDPOINT: &str = "auth/session";

/// Exchanges a signed credential for a session token
///
/// Implemented by the HTTP client and by the in-process verifier.
#[async_trait]
pub trait SessionExchange: Send + Sync {
    async fn create_session(&self, credential: &SignedCredential) -> Result<SessionToken>;
}

impl AuthClient {
    /// Request a session token from the verifier
    ///
    /// POST /auth/session
    pub async fn request_session(&self, credential: &SignedCredential) -> Result<SessionToken> {
        let body = CreateSessionRequest::from(credential);
        let builder = self.request(Method::POST, SESSION_ENDPOINT)?.json(&body);
        let response: CreateSessionResponse = self.send_json(builder).await?;

        info!(
            wallet = %response.wallet_address,
            expires_at = %response.expires_at,
            "session issued"
        );
        Ok(response.into())
    }
}

#[async_trait]
impl SessionExchange for AuthClient {
    async fn create_session(&self, credential: &SignedCredential) -> Result<SessionToken> {
        self.request_session(credential).await
    }
}
