/*
[INPUT]:  Header mode selection and wallet lifecycle notifications
[OUTPUT]: Typed Rust enums shared across auth layers
[POS]:    Data layer - enum definitions
[UPDATE]: When new auth modes or wallet events are added
*/

use serde::{Deserialize, Serialize};

/// Which credential an authenticated request carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMode {
    /// `X-Session-Token` bearer credential
    Session,
    /// `X-Wallet-Address` only, no cryptographic proof
    WalletAddress,
}

/// Wallet lifecycle notifications forwarded by the wallet integration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletEvent {
    Connected(String),
    Disconnected,
}
