/*
[INPUT]:  Wallet adapters, verifier exchange and session cache
[OUTPUT]: Challenges, signed credentials, sessions and request headers
[POS]:    Auth layer - client-side wallet authentication flow
[UPDATE]: When the auth flow or wallet integration changes
*/

pub mod broker;
pub mod challenge;
pub mod headers;
pub mod signer;
pub mod solana_wallet;
pub mod wallet;

pub use broker::{BrokerConfig, SessionBroker, SessionOutcome};
pub use challenge::{DEFAULT_APP_LABEL, MessageBuilder, build_challenge, parse_challenge};
pub use headers::{AuthHeaders, JSON_CONTENT_TYPE, SESSION_TOKEN_HEADER, WALLET_ADDRESS_HEADER};
pub use signer::{decode_signature, encode_signature, sign_challenge};
pub use solana_wallet::KeypairWallet;
pub use wallet::{MockWallet, WalletAdapter, WalletCapabilities, WalletError};
