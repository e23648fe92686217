//! Cache Engine Module
//!
//! The engine contract and its single implementation, generic over the
//! storage capability. Admission, lazy eviction, batch ingestion and
//! poll-refresh are implemented here once for every backend.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::debug;

use crate::cache::{
    Batch, CacheKey, CacheStats, HashFieldStore, IntoBatch, KeyHint, MemoryStorage, Policy,
    Record, SharedStorage, Storage,
};
use crate::error::Result;

// == Engine Contract ==
/// Operations every cache engine offers.
pub trait CacheEngine<V> {
    /// What reads hand back: `Arc<V>` in memory, the stored text for the
    /// shared store.
    type Stored;

    /// Stores `payload` under `key` unless the policy evicts it on arrival.
    ///
    /// Returns `Ok(false)` when the policy refuses the payload; the store is
    /// left untouched. Overwriting an existing key returns `Ok(true)`.
    fn add_cache_data(&self, key: CacheKey, payload: V) -> Result<bool>;

    /// Derives a key for each element and adds it.
    ///
    /// Stops at the first failure; elements admitted before it stay cached.
    fn batch_add_cache_data<B: IntoBatch<V>>(&self, batch: B) -> Result<()>;

    /// Looks up one record, polling first unless `ignore_poll` is set.
    ///
    /// A record the policy now evicts is removed and reported as absent.
    fn get_cache_info(&self, key: &CacheKey, ignore_poll: bool) -> Result<Option<Self::Stored>>;

    /// Returns every live record, polling first unless `ignore_poll` is set.
    ///
    /// Records the policy now evicts are removed along the way.
    fn get_cache_data(&self, ignore_poll: bool) -> Result<HashMap<CacheKey, Self::Stored>>;

    /// Runs a poll-refresh regardless of any read.
    fn must_poll_update(&self) -> Result<()>;

    /// Removes `key` if present.
    fn del_cache(&self, key: &CacheKey) -> Result<()>;
}

// == Engine State ==
/// Everything guarded by the engine lock.
#[derive(Debug)]
struct EngineState<S> {
    storage: S,
    stats: CacheStats,
}

// == Policy Cache ==
/// A cache engine driven by a [`Policy`] on top of a [`Storage`].
///
/// A single exclusive lock serializes every operation, reads included, for
/// its full duration. A poll-refresh (and, for the shared store, its network
/// round trips) therefore stalls every other caller of the same engine.
pub struct PolicyCache<S, P, V> {
    state: Mutex<EngineState<S>>,
    policy: Arc<P>,
    _payload: PhantomData<fn(V)>,
}

/// Engine over process-local storage.
pub type MemCache<P, V> = PolicyCache<MemoryStorage<V>, P, V>;

/// Engine over one hash of a shared Redis store.
pub type RedisCache<C, P, V> = PolicyCache<SharedStorage<C>, P, V>;

impl<P, V> PolicyCache<MemoryStorage<V>, P, V>
where
    P: Policy<V>,
{
    // == Constructor ==
    /// Creates an empty in-memory engine.
    pub fn in_memory(policy: Arc<P>) -> Self {
        Self::with_storage(policy, MemoryStorage::new())
    }
}

impl<C, P, V> PolicyCache<SharedStorage<C>, P, V>
where
    C: HashFieldStore,
    P: Policy<V>,
    V: Serialize,
{
    // == Constructor ==
    /// Creates an engine over the hash `hash_key`, reusing `conn` for every
    /// command. Whatever the hash already holds becomes part of the cache.
    pub fn shared(policy: Arc<P>, conn: C, hash_key: impl Into<String>) -> Self {
        Self::with_storage(policy, SharedStorage::new(conn, hash_key))
    }
}

impl<S, P, V> PolicyCache<S, P, V>
where
    S: Storage<V>,
    P: Policy<V>,
{
    /// Creates an engine over any storage implementation.
    pub fn with_storage(policy: Arc<P>, storage: S) -> Self {
        Self {
            state: Mutex::new(EngineState {
                storage,
                stats: CacheStats::new(),
            }),
            policy,
            _payload: PhantomData,
        }
    }

    /// Returns the policy driving this engine.
    pub fn policy(&self) -> &Arc<P> {
        &self.policy
    }

    // == Stats ==
    /// Returns a copy of the current statistics.
    pub fn stats(&self) -> CacheStats {
        self.state.lock().stats.clone()
    }

    /// Batch-adds a sequence; each element gets its index as key hint.
    pub fn batch_add_sequence(&self, items: impl IntoIterator<Item = V>) -> Result<()> {
        self.batch_add_cache_data(Batch::sequence(items))
    }

    /// Batch-adds key/payload pairs; each element gets its own key as hint.
    pub fn batch_add_keyed<K: Into<String>>(
        &self,
        items: impl IntoIterator<Item = (K, V)>,
    ) -> Result<()> {
        self.batch_add_cache_data(Batch::keyed(items))
    }

    /// Consumes the engine and returns its storage.
    pub fn into_storage(self) -> S {
        self.state.into_inner().storage
    }

    // == Admission ==
    fn admit(&self, state: &mut EngineState<S>, key: CacheKey, payload: V) -> Result<bool> {
        if self.policy.should_evict(&key, Record::Native(&payload)) {
            state.stats.record_rejection();
            debug!("Admission rejected by policy for key {}", key);
            return Ok(false);
        }

        let stored = state.storage.encode(payload)?;
        state.storage.write(key, stored)?;
        Ok(true)
    }

    // == Batch Ingestion ==
    fn ingest(&self, state: &mut EngineState<S>, batch: Batch<V>) -> Result<()> {
        match batch {
            Batch::Sequence(items) => {
                for (index, payload) in items.into_iter().enumerate() {
                    let key = self.policy.key_of(KeyHint::Index(index), &payload)?;
                    self.admit(state, key, payload)?;
                }
            }
            Batch::Keyed(items) => {
                for (hint, payload) in items {
                    let key = self.policy.key_of(KeyHint::Key(&hint), &payload)?;
                    self.admit(state, key, payload)?;
                }
            }
        }
        Ok(())
    }

    // == Poll Refresh ==
    /// Asks the policy for new data against the current contents and merges
    /// it. Never removes anything.
    fn poll(&self, state: &mut EngineState<S>) -> Result<()> {
        let current = state.storage.read_all()?;
        let diff = self.policy.diff_on_poll(S::snapshot(&current));
        state.stats.record_poll();

        if diff.is_empty() {
            return Ok(());
        }

        let count = diff.len();
        self.ingest(state, diff)?;
        debug!("Poll refresh: merged {} items", count);
        Ok(())
    }

    // == Lazy Eviction ==
    /// Removes `key` if the policy now evicts it. Returns whether it did.
    fn evict_if_stale(
        &self,
        state: &mut EngineState<S>,
        key: &CacheKey,
        stored: &S::Stored,
    ) -> Result<bool> {
        if !self.policy.should_evict(key, S::record(stored)) {
            return Ok(false);
        }

        state.storage.remove(key)?;
        state.stats.record_eviction();
        debug!("Evicted stale entry {}", key);
        Ok(true)
    }
}

impl<S, P, V> CacheEngine<V> for PolicyCache<S, P, V>
where
    S: Storage<V>,
    P: Policy<V>,
{
    type Stored = S::Stored;

    fn add_cache_data(&self, key: CacheKey, payload: V) -> Result<bool> {
        let mut state = self.state.lock();
        self.admit(&mut state, key, payload)
    }

    fn batch_add_cache_data<B: IntoBatch<V>>(&self, batch: B) -> Result<()> {
        let batch = batch.into_batch()?;
        let mut state = self.state.lock();
        self.ingest(&mut state, batch)
    }

    fn get_cache_info(&self, key: &CacheKey, ignore_poll: bool) -> Result<Option<S::Stored>> {
        let mut state = self.state.lock();
        if !ignore_poll {
            self.poll(&mut state)?;
        }

        let Some(stored) = state.storage.read(key)? else {
            state.stats.record_miss();
            return Ok(None);
        };

        if self.evict_if_stale(&mut state, key, &stored)? {
            state.stats.record_miss();
            return Ok(None);
        }

        state.stats.record_hit();
        Ok(Some(stored))
    }

    fn get_cache_data(&self, ignore_poll: bool) -> Result<HashMap<CacheKey, S::Stored>> {
        let mut state = self.state.lock();
        if !ignore_poll {
            self.poll(&mut state)?;
        }

        let all = state.storage.read_all()?;
        let mut live = HashMap::with_capacity(all.len());
        for (key, stored) in all {
            if !self.evict_if_stale(&mut state, &key, &stored)? {
                live.insert(key, stored);
            }
        }
        Ok(live)
    }

    fn must_poll_update(&self) -> Result<()> {
        let mut state = self.state.lock();
        self.poll(&mut state)
    }

    fn del_cache(&self, key: &CacheKey) -> Result<()> {
        let mut state = self.state.lock();
        state.storage.remove(key)
    }
}
