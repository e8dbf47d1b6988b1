/*
[INPUT]:  HTTP client configuration and verifier endpoints
[OUTPUT]: HTTP responses and typed session results
[POS]:    HTTP layer - REST communication with the verifier
[UPDATE]: When adding new endpoints or changing client behavior
*/

pub mod client;
pub mod error;
pub mod exchange;

pub use error::{AuthError, Result};

pub use client::{AuthClient, ClientConfig, DEFAULT_API_BASE_URL};
pub use exchange::{SESSION_ENDPOINT, SessionExchange};
