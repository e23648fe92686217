//! Configuration Module
//!
//! Settings for the watch binary, loaded from environment variables. The
//! library itself takes everything it needs as constructor arguments.

use std::env;
use std::fmt;
use std::str::FromStr;

// == Backend Kind ==
/// Which storage the watch binary builds its engine on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Memory,
    Redis,
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "mem" => Ok(BackendKind::Memory),
            "redis" => Ok(BackendKind::Redis),
            other => Err(format!("unknown cache backend: {}", other)),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Memory => f.write_str("memory"),
            BackendKind::Redis => f.write_str("redis"),
        }
    }
}

/// Watch binary configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Storage backend for the engine
    pub backend: BackendKind,
    /// Connection URL for the redis backend
    pub redis_url: String,
    /// Name of the hash holding cached records
    pub hash_key: String,
    /// Interval between snapshot reads in milliseconds
    pub poll_interval_ms: u64,
    /// Age in seconds after which a record is evicted
    pub max_age_secs: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_BACKEND` - `memory` or `redis` (default: memory)
    /// - `REDIS_URL` - Redis connection URL (default: redis://127.0.0.1:6379)
    /// - `CACHE_HASH_KEY` - Hash holding the records (default: policy_cache)
    /// - `POLL_INTERVAL_MS` - Snapshot interval in milliseconds (default: 1000)
    /// - `MAX_AGE_SECS` - Record lifetime in seconds (default: 1)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            backend: env::var("CACHE_BACKEND")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.backend),
            redis_url: env::var("REDIS_URL").unwrap_or(defaults.redis_url),
            hash_key: env::var("CACHE_HASH_KEY").unwrap_or(defaults.hash_key),
            poll_interval_ms: env::var("POLL_INTERVAL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.poll_interval_ms),
            max_age_secs: env::var("MAX_AGE_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_age_secs),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendKind::Memory,
            redis_url: "redis://127.0.0.1:6379".to_string(),
            hash_key: "policy_cache".to_string(),
            poll_interval_ms: 1000,
            max_age_secs: 1,
        }
    }
}
