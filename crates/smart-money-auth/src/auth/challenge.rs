/*
[INPUT]:  Application label and the current clock
[OUTPUT]: Replay-resistant challenge strings and their parsed timestamps
[POS]:    Auth layer - message builder for wallet signing
[UPDATE]: When the challenge wire format changes
*/

use std::sync::OnceLock;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Utc};

use crate::http::{AuthError, Result};
use crate::types::AuthChallenge;

/// Label embedded in every challenge unless configured otherwise
pub const DEFAULT_APP_LABEL: &str = "Smart Money Tinder Authentication";

const TIMESTAMP_SEPARATOR: &str = " | Timestamp: ";

/// Builds challenge strings of the form `"{label} | Timestamp: {unix_ms}"`.
///
/// Timestamps are strictly increasing per builder: when the clock has not moved
/// past the previously issued challenge the timestamp is bumped by one
/// millisecond, so two challenges from one builder never collide.
#[derive(Debug)]
pub struct MessageBuilder {
    label: String,
    last_issued_ms: AtomicI64,
}

impl MessageBuilder {
    /// Create a builder with a custom application label.
    ///
    /// The label travels inside HTTP headers in some call sites, so line breaks
    /// are rejected, as is the separator the verifier uses to find the timestamp.
    pub fn new(label: impl Into<String>) -> Result<Self> {
        let label = label.into();
        if label.trim().is_empty() {
            return Err(AuthError::Config("challenge label cannot be empty".to_string()));
        }
        if label.contains(['\r', '\n']) {
            return Err(AuthError::Config(
                "challenge label cannot contain line breaks".to_string(),
            ));
        }
        if label.contains(TIMESTAMP_SEPARATOR.trim_end()) {
            return Err(AuthError::Config(format!(
                "challenge label cannot contain {:?}",
                TIMESTAMP_SEPARATOR.trim()
            )));
        }

        Ok(Self {
            label,
            last_issued_ms: AtomicI64::new(i64::MIN),
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Build a challenge stamped with the current time
    pub fn build(&self) -> AuthChallenge {
        self.build_at(Utc::now())
    }

    /// Build a challenge stamped with `now` (bumped forward if needed)
    pub fn build_at(&self, now: DateTime<Utc>) -> AuthChallenge {
        let now_ms = now.timestamp_millis();
        let previous = self
            .last_issued_ms
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |last| {
                Some(next_timestamp(last, now_ms))
            })
            .unwrap_or_else(|last| last);
        let issued_at_ms = next_timestamp(previous, now_ms);

        AuthChallenge {
            message: format!("{}{}{}", self.label, TIMESTAMP_SEPARATOR, issued_at_ms),
            issued_at_ms,
        }
    }
}

impl Default for MessageBuilder {
    fn default() -> Self {
        Self {
            label: DEFAULT_APP_LABEL.to_string(),
            last_issued_ms: AtomicI64::new(i64::MIN),
        }
    }
}

fn next_timestamp(last: i64, now_ms: i64) -> i64 {
    if now_ms > last { now_ms } else { last.saturating_add(1) }
}

/// Build a challenge from the process-wide default builder
pub fn build_challenge() -> AuthChallenge {
    static DEFAULT_BUILDER: OnceLock<MessageBuilder> = OnceLock::new();
    DEFAULT_BUILDER.get_or_init(MessageBuilder::default).build()
}

/// Split a challenge into its label and embedded timestamp
pub fn parse_challenge(message: &str) -> Option<(&str, DateTime<Utc>)> {
    if message.contains(['\r', '\n']) {
        return None;
    }
    let (label, raw_ms) = message.rsplit_once(TIMESTAMP_SEPARATOR)?;
    if label.is_empty() || raw_ms.is_empty() || !raw_ms.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let millis: i64 = raw_ms.parse().ok()?;
    let issued_at = DateTime::<Utc>::from_timestamp_millis(millis)?;
    Some((label, issued_at))
}

/// Recover the timestamp embedded in a challenge, for freshness checks
pub fn parse_challenge_timestamp(message: &str) -> Option<DateTime<Utc>> {
    parse_challenge(message).map(|(_, issued_at)| issued_at)
}
