/*
[INPUT]:  Authentication schema definitions and serde requirements
[OUTPUT]: Typed Rust structs/enums with serialization support
[POS]:    Data layer - type definitions for verifier communication
[UPDATE]: When the wire schema changes or new types added
*/

pub mod enums;
pub mod models;
pub mod requests;
pub mod responses;

pub use enums::*;
pub use models::{AuthChallenge, SessionToken, SignedCredential};
pub use requests::*;
pub use responses::*;
