//! Key-Value Cache
//! Mission: Namespaced, TTL-aware storage behind a swappable backend

mod backend;
mod brain;

pub use backend::{CacheBackend, MemoryBackend};
pub use brain::{Brain, CachePrefix};
