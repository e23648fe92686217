//! Cache Module
//!
//! Policy-driven caching over a process-local map or a shared Redis hash.
//! Eviction is lazy: records are re-checked against the policy whenever a
//! read touches them, never on a timer.

mod batch;
mod engine;
mod key;
mod memory;
mod policy;
mod shared;
mod stats;
mod storage;


// Re-export public types
pub use batch::{Batch, IntoBatch};
pub use engine::{CacheEngine, MemCache, PolicyCache, RedisCache};
pub use key::{CacheKey, KeyHint};
pub use memory::MemoryStorage;
pub use policy::{Policy, Record, Snapshot};
pub use shared::{encode_payload, HashFieldStore, SharedStorage};
pub use stats::CacheStats;
pub use storage::Storage;
