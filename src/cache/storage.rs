//! Storage Module
//!
//! The minimal storage capability the engine core runs on.

use std::collections::HashMap;

use crate::cache::{CacheKey, Record, Snapshot};
use crate::error::Result;

// == Storage Capability ==
/// A key/record store the engine core can drive.
///
/// Implementations do no policy work of their own: admission, eviction and
/// polling all happen in [`PolicyCache`](crate::cache::PolicyCache), which
/// serializes every call behind its lock.
pub trait Storage<V> {
    /// The form a payload takes once stored.
    type Stored;

    /// Converts an admitted payload into its stored form.
    fn encode(&self, payload: V) -> Result<Self::Stored>;

    fn read(&mut self, key: &CacheKey) -> Result<Option<Self::Stored>>;

    fn write(&mut self, key: CacheKey, value: Self::Stored) -> Result<()>;

    fn read_all(&mut self) -> Result<HashMap<CacheKey, Self::Stored>>;

    /// Removes `key` if present. Removing a missing key is not an error.
    fn remove(&mut self, key: &CacheKey) -> Result<()>;

    /// How a stored value is presented to [`Policy::should_evict`](crate::cache::Policy).
    fn record(stored: &Self::Stored) -> Record<'_, V>;

    /// How the full contents are presented to [`Policy::diff_on_poll`](crate::cache::Policy).
    fn snapshot(all: &HashMap<CacheKey, Self::Stored>) -> Snapshot<'_, V>;
}
