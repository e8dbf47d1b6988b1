/*
[INPUT]:  Challenge text, wallet signatures and verifier-issued tokens
[OUTPUT]: Typed authentication models with serialization support
[POS]:    Data layer - core authentication data model
[UPDATE]: When the challenge, credential or session shape changes
*/

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Single-use text challenge a wallet signs to prove key ownership.
///
/// Never persisted; lives only for the duration of one signing operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthChallenge {
    pub message: String,
    pub issued_at_ms: i64,
}

/// Detached signature over a challenge, ready to be exchanged for a session.
///
/// Both `wallet_address` and `signature` are base58 encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedCredential {
    pub wallet_address: String,
    pub signature: String,
    pub message: String,
}

/// Opaque bearer credential issued by the verifier for exactly one wallet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionToken {
    pub token: String,
    pub wallet_address: String,
    #[serde(deserialize_with = "serde_helpers::deserialize_timestamp")]
    pub expires_at: DateTime<Utc>,
}

impl SessionToken {
    /// A token is expired once `expires_at` is at or before `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Check whether this token was minted for `wallet_address`
    pub fn belongs_to(&self, wallet_address: &str) -> bool {
        self.wallet_address == wallet_address
    }
}

pub(crate) mod serde_helpers {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer};

    /// Parse an ISO-8601 timestamp.
    ///
    /// Accepts RFC 3339 (with offset) and naive date-times, which are read as UTC.
    pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
        let raw = raw.trim();
        if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
            return Some(parsed.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
            .ok()
            .map(|naive| naive.and_utc())
    }

    pub fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse_timestamp(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid ISO-8601 timestamp: {raw}")))
    }
}
