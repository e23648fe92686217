//! Cache Statistics Module
//!
//! Tracks engine activity: lookups, lazy evictions, rejected admissions and
//! poll-refresh passes.

use serde::Serialize;

// == Cache Stats ==
/// Tracks cache engine metrics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Point lookups that returned a live record
    pub hits: u64,
    /// Point lookups that found nothing or an evicted record
    pub misses: u64,
    /// Records removed because the policy flagged them on access
    pub evictions: u64,
    /// Adds refused by the policy at admission
    pub rejections: u64,
    /// Poll-refresh passes executed
    pub polls: u64,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    pub fn record_rejection(&mut self) {
        self.rejections += 1;
    }

    pub fn record_poll(&mut self) {
        self.polls += 1;
    }
}
