/*
[INPUT]:  Crate modules and public type definitions
[OUTPUT]: Public wallet authentication crate surface
[POS]:    Crate root - module wiring
[UPDATE]: When public modules or exports change
*/

pub mod auth;
pub mod http;
pub mod session;
pub mod types;
pub mod verifier;

// Re-export commonly used types from auth
pub use auth::{
    AuthHeaders,
    BrokerConfig,
    KeypairWallet,
    MessageBuilder,
    MockWallet,
    SessionBroker,
    SessionOutcome,
    WalletAdapter,
    WalletCapabilities,
    WalletError,
};

// Re-export commonly used types from http
pub use http::{
    AuthClient,
    AuthError,
    ClientConfig,
    Result,
    SessionExchange,
};

// Re-export session storage
pub use session::{FileStore, KeyValueStore, MemoryStore, SessionCache};

// Re-export all types
pub use types::*;

pub use verifier::{AuthenticatedWallet, SessionVerifier, VerifierConfig, VerifierError};
