//! Shared fixtures for the integration tests: an in-process hash store and a
//! few policies.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use parking_lot::Mutex;
use policy_cache::{Batch, CacheError, CacheKey, HashFieldStore, KeyHint, Policy, Record, Snapshot};
use redis::{ErrorKind, RedisError, RedisResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// == Fake Hash Store ==
type Hashes = HashMap<String, HashMap<String, String>>;
type Hook = Box<dyn FnOnce(&mut Hashes) + Send>;

/// In-process stand-in for a Redis connection.
///
/// Clones share state, so a test keeps one clone to inspect or tamper with the
/// hash while the engine drives the other.
#[derive(Clone, Default)]
pub struct FakeHashStore {
    hashes: Arc<Mutex<Hashes>>,
    failing: Arc<AtomicBool>,
    after_next_get: Arc<Mutex<Option<Hook>>>,
    commands: Arc<Mutex<Vec<String>>>,
}

impl FakeHashStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(&self, hash: &str, field: &str) -> Option<String> {
        self.hashes.lock().get(hash).and_then(|h| h.get(field).cloned())
    }

    pub fn fields(&self, hash: &str) -> HashMap<String, String> {
        self.hashes.lock().get(hash).cloned().unwrap_or_default()
    }

    /// Writes a field directly, as another process sharing the store would.
    pub fn put_field(&self, hash: &str, field: &str, value: &str) {
        self.hashes
            .lock()
            .entry(hash.to_string())
            .or_default()
            .insert(field.to_string(), value.to_string());
    }

    /// Makes every following command fail like a dropped connection.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Runs `hook` right after the next HGET has been answered.
    pub fn after_next_get(&self, hook: impl FnOnce(&mut Hashes) + Send + 'static) {
        *self.after_next_get.lock() = Some(Box::new(hook));
    }

    /// Verbs received so far, in order.
    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().clone()
    }

    fn command(&self, verb: &str) -> RedisResult<()> {
        self.commands.lock().push(verb.to_string());
        if self.failing.load(Ordering::SeqCst) {
            return Err(RedisError::from((ErrorKind::IoError, "connection refused")));
        }
        Ok(())
    }
}

impl HashFieldStore for FakeHashStore {
    fn set_field(&mut self, hash: &str, field: &str, value: &str) -> RedisResult<()> {
        self.command("HSET")?;
        self.put_field(hash, field, value);
        Ok(())
    }

    fn get_field(&mut self, hash: &str, field: &str) -> RedisResult<Option<String>> {
        self.command("HGET")?;
        let value = self.field(hash, field);
        if let Some(hook) = self.after_next_get.lock().take() {
            hook(&mut self.hashes.lock());
        }
        Ok(value)
    }

    fn get_all_fields(&mut self, hash: &str) -> RedisResult<HashMap<String, String>> {
        self.command("HGETALL")?;
        Ok(self.fields(hash))
    }

    fn delete_field(&mut self, hash: &str, field: &str) -> RedisResult<()> {
        self.command("HDEL")?;
        if let Some(h) = self.hashes.lock().get_mut(hash) {
            h.remove(field);
        }
        Ok(())
    }
}

// == Manual Clock ==
/// A clock that only moves when told to.
#[derive(Clone)]
pub struct ManualClock(Arc<Mutex<DateTime<Utc>>>);

impl ManualClock {
    pub fn new() -> Self {
        let start = Utc
            .with_ymd_and_hms(2024, 1, 1, 12, 0, 0)
            .single()
            .expect("valid start time");
        Self(Arc::new(Mutex::new(start)))
    }

    pub fn now(&self) -> DateTime<Utc> {
        *self.0.lock()
    }

    pub fn advance_ms(&self, ms: i64) {
        *self.0.lock() += TimeDelta::milliseconds(ms);
    }
}

// == Age Policy ==
/// A payload stamped with its creation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stamped {
    pub value: String,
    pub at: DateTime<Utc>,
}

/// Keys by hint (or by value for sequences), evicts anything older than
/// `max_age`, and injects one record keyed by the current time per poll.
pub struct AgePolicy {
    pub clock: ManualClock,
    pub max_age: TimeDelta,
    pub inject_on_poll: AtomicBool,
}

impl AgePolicy {
    pub fn new(clock: ManualClock, max_age_ms: i64) -> Self {
        Self {
            clock,
            max_age: TimeDelta::milliseconds(max_age_ms),
            inject_on_poll: AtomicBool::new(true),
        }
    }

    pub fn stamp(&self, value: &str) -> Stamped {
        Stamped {
            value: value.to_string(),
            at: self.clock.now(),
        }
    }

    pub fn timestamp_key(&self) -> String {
        self.clock.now().format("%Y-%m-%dT%H:%M:%S%.3f").to_string()
    }
}

impl Policy<Stamped> for AgePolicy {
    fn key_of(&self, hint: KeyHint<'_>, payload: &Stamped) -> policy_cache::Result<CacheKey> {
        match hint {
            KeyHint::Key(key) => Ok(CacheKey::from(key)),
            KeyHint::Index(_) => Ok(CacheKey::from(payload.value.as_str())),
        }
    }

    fn should_evict(&self, _key: &CacheKey, record: Record<'_, Stamped>) -> bool {
        let at = match record {
            Record::Native(stamped) => stamped.at,
            Record::Text(text) => match serde_json::from_str::<Stamped>(text) {
                Ok(stamped) => stamped.at,
                Err(_) => return true,
            },
        };
        self.clock.now() - at > self.max_age
    }

    fn diff_on_poll(&self, snapshot: Snapshot<'_, Stamped>) -> Batch<Stamped> {
        if !self.inject_on_poll.load(Ordering::SeqCst) {
            return Batch::empty();
        }
        let key = self.timestamp_key();
        if snapshot.contains_key(&key) {
            return Batch::empty();
        }
        let record = self.stamp(&key);
        Batch::keyed([(key, record)])
    }
}

// == Queue Policy ==
/// Works on JSON documents: keys by hint or by the `id` field, evicts the
/// string "stale", and hands out queued documents on poll.
#[derive(Default)]
pub struct QueuePolicy {
    queued: Mutex<Vec<(String, Value)>>,
    seen_snapshots: Mutex<Vec<&'static str>>,
}

impl QueuePolicy {
    pub fn queue(&self, key: &str, value: Value) {
        self.queued.lock().push((key.to_string(), value));
    }

    /// Which snapshot view each poll received: "native" or "text".
    pub fn seen_snapshots(&self) -> Vec<&'static str> {
        self.seen_snapshots.lock().clone()
    }
}

impl Policy<Value> for QueuePolicy {
    fn key_of(&self, hint: KeyHint<'_>, payload: &Value) -> policy_cache::Result<CacheKey> {
        if let Some(key) = hint.as_key() {
            return Ok(CacheKey::from(key));
        }
        payload
            .get("id")
            .and_then(Value::as_str)
            .map(CacheKey::from)
            .ok_or_else(|| CacheError::key_derivation(format!("no id in element {}", hint)))
    }

    fn should_evict(&self, _key: &CacheKey, record: Record<'_, Value>) -> bool {
        match record {
            Record::Native(value) => value.as_str() == Some("stale"),
            Record::Text(text) => text == "stale",
        }
    }

    fn diff_on_poll(&self, snapshot: Snapshot<'_, Value>) -> Batch<Value> {
        self.seen_snapshots.lock().push(match snapshot {
            Snapshot::Native(_) => "native",
            Snapshot::Text(_) => "text",
        });
        let queued = std::mem::take(&mut *self.queued.lock());
        Batch::keyed(
            queued
                .into_iter()
                .filter(|(key, _)| !snapshot.contains_key(key)),
        )
    }
}

// == Accept All Policy ==
/// Keys by hint, never evicts, never polls anything in.
pub struct AcceptAll;

impl<V> Policy<V> for AcceptAll {
    fn key_of(&self, hint: KeyHint<'_>, _payload: &V) -> policy_cache::Result<CacheKey> {
        Ok(CacheKey::from(hint.to_string()))
    }

    fn should_evict(&self, _key: &CacheKey, _record: Record<'_, V>) -> bool {
        false
    }

    fn diff_on_poll(&self, _snapshot: Snapshot<'_, V>) -> Batch<V> {
        Batch::empty()
    }
}
