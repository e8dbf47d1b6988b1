/*
[INPUT]:  Session requests and authenticated request headers
[OUTPUT]: Issued sessions and resolved wallet identities
[POS]:    Verifier layer - reference server-side contract
[UPDATE]: When verification policy or header handling changes
*/

pub mod error;
pub mod registry;
pub mod signature;

pub use error::VerifierError;
pub use registry::{SessionRecord, SessionRegistry, generate_session_token};
pub use signature::{decode_wallet_address, verify_wallet_signature};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::header::HeaderMap;
use tracing::{debug, info, warn};

use crate::auth::challenge::parse_challenge_timestamp;
use crate::auth::headers::{SESSION_TOKEN_HEADER, WALLET_ADDRESS_HEADER};
use crate::http::{AuthError, SessionExchange};
use crate::types::{AuthMode, CreateSessionRequest, CreateSessionResponse, SessionToken, SignedCredential};

/// Server-side verification policy
#[derive(Debug, Clone)]
pub struct VerifierConfig {
    /// Lifetime of issued sessions
    pub session_ttl: Duration,
    /// Reject challenges older than this; `None` disables the freshness check
    pub max_challenge_age: Option<Duration>,
    /// Tolerated client clock lead for challenge timestamps
    pub max_clock_skew: Duration,
    /// Accept address-only requests (no cryptographic proof)
    pub allow_address_fallback: bool,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            session_ttl: Duration::hours(1),
            max_challenge_age: Some(Duration::minutes(5)),
            max_clock_skew: Duration::seconds(30),
            allow_address_fallback: true,
        }
    }
}

/// Identity resolved from request headers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedWallet {
    pub wallet_address: String,
    pub mode: AuthMode,
}

/// Validates signatures, issues and revokes session tokens
#[derive(Debug, Clone, Default)]
pub struct SessionVerifier {
    config: VerifierConfig,
    registry: SessionRegistry,
}

impl SessionVerifier {
    pub fn new(config: VerifierConfig) -> Self {
        Self {
            config,
            registry: SessionRegistry::new(),
        }
    }

    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Handle `POST /auth/session`
    pub fn create_session(
        &self,
        request: &CreateSessionRequest,
    ) -> Result<CreateSessionResponse, VerifierError> {
        self.create_session_at(request, Utc::now())
    }

    pub fn create_session_at(
        &self,
        request: &CreateSessionRequest,
        now: DateTime<Utc>,
    ) -> Result<CreateSessionResponse, VerifierError> {
        let issued_at =
            parse_challenge_timestamp(&request.message).ok_or(VerifierError::MalformedChallenge)?;

        if let Some(max_age) = self.config.max_challenge_age {
            if issued_at < now - max_age || issued_at > now + self.config.max_clock_skew {
                debug!(wallet = %request.wallet_address, issued_at = %issued_at, "stale challenge");
                return Err(VerifierError::StaleChallenge);
            }
        }

        verify_wallet_signature(&request.wallet_address, &request.signature, &request.message)
            .inspect_err(|err| {
                warn!(wallet = %request.wallet_address, error = %err, "signature verification failed");
            })?;

        // with no freshness window the entry is kept forever
        let forget_after = match self.config.max_challenge_age {
            Some(max_age) => issued_at + max_age + self.config.max_clock_skew,
            None => DateTime::<Utc>::MAX_UTC,
        };
        if !self
            .registry
            .consume_challenge(&request.wallet_address, &request.message, forget_after, now)
        {
            warn!(wallet = %request.wallet_address, "challenge replayed");
            return Err(VerifierError::ChallengeReplayed);
        }

        let session = self
            .registry
            .issue_at(&request.wallet_address, self.config.session_ttl, now);
        info!(wallet = %session.wallet_address, expires_at = %session.expires_at, "session issued");

        Ok(CreateSessionResponse {
            session_token: session.token,
            wallet_address: session.wallet_address,
            expires_at: session.expires_at,
        })
    }

    /// Resolve the caller of an authenticated request
    ///
    /// A session token takes precedence; the bare address header is accepted
    /// only when fallback is allowed.
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<AuthenticatedWallet, VerifierError> {
        if let Some(token) = header_str(headers, SESSION_TOKEN_HEADER)? {
            let record = self
                .registry
                .lookup(token)
                .ok_or(VerifierError::InvalidSession)?;
            return Ok(AuthenticatedWallet {
                wallet_address: record.wallet_address,
                mode: AuthMode::Session,
            });
        }

        if let Some(address) = header_str(headers, WALLET_ADDRESS_HEADER)? {
            if !self.config.allow_address_fallback {
                return Err(VerifierError::FallbackDisabled);
            }
            decode_wallet_address(address)?;
            return Ok(AuthenticatedWallet {
                wallet_address: address.to_string(),
                mode: AuthMode::WalletAddress,
            });
        }

        Err(VerifierError::MissingCredentials(format!(
            "{SESSION_TOKEN_HEADER} or {WALLET_ADDRESS_HEADER}"
        )))
    }

    /// Revoke a session token, e.g. on logout
    pub fn revoke(&self, token: &str) -> bool {
        self.registry.revoke(token)
    }
}

/// Ensure the authenticated wallet only touches its own resources
pub fn verify_wallet_match(
    requested_wallet: &str,
    authenticated: &AuthenticatedWallet,
) -> Result<(), VerifierError> {
    if requested_wallet == authenticated.wallet_address {
        Ok(())
    } else {
        Err(VerifierError::WalletMismatch)
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Result<Option<&'a str>, VerifierError> {
    match headers.get(name) {
        None => Ok(None),
        Some(value) => {
            let value = value
                .to_str()
                .map_err(|_| VerifierError::MissingCredentials(format!("{name} is not valid text")))?
                .trim();
            Ok((!value.is_empty()).then_some(value))
        }
    }
}

#[async_trait]
impl SessionExchange for SessionVerifier {
    async fn create_session(&self, credential: &SignedCredential) -> crate::http::Result<SessionToken> {
        SessionVerifier::create_session(self, &CreateSessionRequest::from(credential))
            .map(SessionToken::from)
            .map_err(|err| AuthError::exchange_rejected(err.status_code(), err.to_string()))
    }
}
