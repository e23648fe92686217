//! Policy Module
//!
//! The caller-supplied rules that drive key derivation, eviction and
//! poll-refresh, plus the views of stored data a policy gets to inspect.

use std::collections::HashMap;
use std::sync::Arc;

use crate::cache::{Batch, CacheKey, KeyHint};
use crate::error::Result;

// == Record View ==
/// A record as seen by [`Policy::should_evict`].
///
/// The in-memory backend always hands out `Native` records. The shared-store
/// backend hands out `Native` at admission time (before the payload is
/// encoded) and `Text` for everything it reads back from the store.
#[derive(Debug)]
pub enum Record<'a, V> {
    /// The payload as the caller supplied it
    Native(&'a V),
    /// The textual form held by the shared store
    Text(&'a str),
}

impl<'a, V> Record<'a, V> {
    /// Returns the native payload, if this record carries one.
    pub fn as_native(&self) -> Option<&'a V> {
        match *self {
            Record::Native(payload) => Some(payload),
            Record::Text(_) => None,
        }
    }

    /// Returns the stored text, if this record was read from the shared store.
    pub fn as_text(&self) -> Option<&'a str> {
        match *self {
            Record::Text(text) => Some(text),
            Record::Native(_) => None,
        }
    }
}

impl<V> Clone for Record<'_, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<V> Copy for Record<'_, V> {}

// == Snapshot View ==
/// The full store contents as seen by [`Policy::diff_on_poll`].
///
/// Same asymmetry as [`Record`]: native payloads for the in-memory backend,
/// raw field values for the shared-store backend.
#[derive(Debug)]
pub enum Snapshot<'a, V> {
    Native(&'a HashMap<CacheKey, Arc<V>>),
    Text(&'a HashMap<CacheKey, String>),
}

impl<'a, V> Snapshot<'a, V> {
    pub fn len(&self) -> usize {
        match self {
            Snapshot::Native(map) => map.len(),
            Snapshot::Text(map) => map.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Checks whether the store already holds `key`.
    pub fn contains_key(&self, key: &str) -> bool {
        match self {
            Snapshot::Native(map) => map.contains_key(key),
            Snapshot::Text(map) => map.contains_key(key),
        }
    }

    /// Looks up a single record.
    pub fn get(&self, key: &str) -> Option<Record<'a, V>> {
        match *self {
            Snapshot::Native(map) => map.get(key).map(|payload| Record::Native(&**payload)),
            Snapshot::Text(map) => map.get(key).map(|text| Record::Text(text.as_str())),
        }
    }

    /// Iterates over the keys currently held.
    pub fn keys(&self) -> Box<dyn Iterator<Item = &'a CacheKey> + 'a> {
        match *self {
            Snapshot::Native(map) => Box::new(map.keys()),
            Snapshot::Text(map) => Box::new(map.keys()),
        }
    }
}

impl<V> Clone for Snapshot<'_, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<V> Copy for Snapshot<'_, V> {}

// == Policy Contract ==
/// Caller-supplied rules governing one cache engine.
///
/// All three functions must be pure and non-blocking: the engine calls them
/// while holding its lock.
pub trait Policy<V> {
    /// Derives the cache key for a batch element.
    ///
    /// Return [`CacheError::KeyDerivationFailed`](crate::error::CacheError)
    /// when the payload does not have the shape this policy expects.
    fn key_of(&self, hint: KeyHint<'_>, payload: &V) -> Result<CacheKey>;

    /// Decides whether a record must not be (or no longer be) cached.
    fn should_evict(&self, key: &CacheKey, record: Record<'_, V>) -> bool;

    /// Returns the items that should be ingested given the current contents.
    fn diff_on_poll(&self, snapshot: Snapshot<'_, V>) -> Batch<V>;
}

impl<V, P: Policy<V> + ?Sized> Policy<V> for Arc<P> {
    fn key_of(&self, hint: KeyHint<'_>, payload: &V) -> Result<CacheKey> {
        (**self).key_of(hint, payload)
    }

    fn should_evict(&self, key: &CacheKey, record: Record<'_, V>) -> bool {
        (**self).should_evict(key, record)
    }

    fn diff_on_poll(&self, snapshot: Snapshot<'_, V>) -> Batch<V> {
        (**self).diff_on_poll(snapshot)
    }
}
