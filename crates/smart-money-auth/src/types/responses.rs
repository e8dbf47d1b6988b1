/*
[INPUT]:  Verifier response payloads
[OUTPUT]: Typed response structs convertible into cached sessions
[POS]:    Data layer - response definitions
[UPDATE]: When the verifier response schema changes
*/

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::models::{SessionToken, serde_helpers};

/// Response of `POST /auth/session`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateSessionResponse {
    pub session_token: String,
    pub wallet_address: String,
    #[serde(deserialize_with = "serde_helpers::deserialize_timestamp")]
    pub expires_at: DateTime<Utc>,
}

impl From<CreateSessionResponse> for SessionToken {
    fn from(response: CreateSessionResponse) -> Self {
        Self {
            token: response.session_token,
            wallet_address: response.wallet_address,
            expires_at: response.expires_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn create_session_response_into_token() {
        let value = json!({
            "session_token": "tok1",
            "wallet_address": "Wabc",
            "expires_at": "2025-01-01T13:00:00Z",
        });

        let response: CreateSessionResponse = serde_json::from_value(value).unwrap();
        let token = SessionToken::from(response);

        assert_eq!(token.token, "tok1");
        assert_eq!(token.wallet_address, "Wabc");
        assert_eq!(token.expires_at, Utc.with_ymd_and_hms(2025, 1, 1, 13, 0, 0).unwrap());
    }

    #[test]
    fn create_session_response_requires_expiry() {
        let value = json!({
            "session_token": "tok1",
            "wallet_address": "Wabc",
        });

        assert!(serde_json::from_value::<CreateSessionResponse>(value).is_err());
    }
}
