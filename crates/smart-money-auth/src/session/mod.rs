/*
[INPUT]:  Session tokens and storage backends
[OUTPUT]: Cached sessions scoped per origin
[POS]:    Session layer - client-side credential persistence
[UPDATE]: When adding storage backends or changing cache semantics
*/

pub mod cache;
pub mod storage;

pub use cache::{DEFAULT_NAMESPACE, SessionCache, SessionKeys};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
