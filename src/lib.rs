//! Policy Cache - A pluggable, policy-driven cache engine
//!
//! Keeps a transient snapshot of data either in process memory or in one hash
//! of a shared Redis store, with eviction and refresh decided by a
//! caller-supplied policy.

pub mod cache;
pub mod config;
pub mod error;

pub use cache::{
    Batch, CacheEngine, CacheKey, CacheStats, HashFieldStore, IntoBatch, KeyHint, MemCache,
    Policy, PolicyCache, Record, RedisCache, Snapshot,
};
pub use config::{BackendKind, Config};
pub use error::{CacheError, Result};
