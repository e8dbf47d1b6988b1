/*
[INPUT]:  Test configuration and mock server requirements
[OUTPUT]: Shared test utilities, fixtures, and mock helpers
[POS]:    Test infrastructure - shared across all test modules
[UPDATE]: When adding new test patterns or fixtures
*/

//! Common test utilities for smart-money-auth tests

#![allow(dead_code)]

use std::sync::Arc;

use serde_json::json;
use smart_money_auth::{
    AuthClient, ClientConfig, CreateSessionRequest, SessionBroker, SessionCache, SessionVerifier,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

/// Setup a mock HTTP server for testing
pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

/// Client pointed at the mock server's `/api/` prefix
pub fn client_for(server: &MockServer) -> AuthClient {
    AuthClient::with_config_and_base_url(ClientConfig::default(), &format!("{}/api/", server.uri()))
        .expect("client should build")
}

/// Broker with an in-memory cache talking to the mock server
pub fn broker_for(server: &MockServer) -> SessionBroker {
    SessionBroker::new(Arc::new(client_for(server)), SessionCache::in_memory())
}

/// Canned verifier response for `wallet`
pub fn session_body(token: &str, wallet: &str) -> serde_json::Value {
    json!({
        "session_token": token,
        "wallet_address": wallet,
        "expires_at": (chrono::Utc::now() + chrono::Duration::hours(1)).to_rfc3339(),
    })
}

/// Answers `POST /api/auth/session` with a real verifier
#[derive(Clone, Default)]
pub struct VerifierResponder {
    pub verifier: SessionVerifier,
}

impl Respond for VerifierResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: CreateSessionRequest = match serde_json::from_slice(&request.body) {
            Ok(body) => body,
            Err(err) => {
                return ResponseTemplate::new(400).set_body_json(json!({ "detail": err.to_string() }));
            }
        };
        match self.verifier.create_session(&body) {
            Ok(response) => ResponseTemplate::new(200).set_body_json(response),
            Err(err) => ResponseTemplate::new(err.status_code().as_u16())
                .set_body_json(json!({ "detail": err.to_string() })),
        }
    }
}

/// Protected endpoint echoing the authenticated wallet
#[derive(Clone, Default)]
pub struct ProtectedResponder {
    pub verifier: SessionVerifier,
}

impl Respond for ProtectedResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        match self.verifier.authenticate(&request.headers) {
            Ok(wallet) => ResponseTemplate::new(200).set_body_json(json!({
                "wallet_address": wallet.wallet_address,
                "mode": wallet.mode,
            })),
            Err(err) => ResponseTemplate::new(err.status_code().as_u16())
                .set_body_json(json!({ "detail": err.to_string() })),
        }
    }
}

/// Mount a verifier-backed session endpoint and a protected `/api/me`
pub async fn mount_verifier(server: &MockServer) -> SessionVerifier {
    let verifier = SessionVerifier::default();
    Mock::given(method("POST"))
        .and(path("/api/auth/session"))
        .respond_with(VerifierResponder {
            verifier: verifier.clone(),
        })
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/me"))
        .respond_with(ProtectedResponder {
            verifier: verifier.clone(),
        })
        .mount(server)
        .await;
    verifier
}
