//! Shared Store Module
//!
//! Maps the cache store onto a single Redis hash. Every storage call is one
//! remote command against that hash: HSET, HGET, HGETALL or HDEL.
//!
//! Payloads are stored as text. Structured payloads become JSON documents,
//! scalars are written as their literal text, and reads return the stored text
//! without deserializing it.

use std::collections::HashMap;

use redis::RedisResult;
use serde::Serialize;
use serde_json::Value;

use crate::cache::{CacheKey, Record, Snapshot, Storage};
use crate::error::Result;

// == Hash Field Store ==
/// The four hash commands the shared backend needs from a live connection.
///
/// Implemented for [`redis::Connection`]; the engine never connects,
/// reconnects or retries on its own.
pub trait HashFieldStore {
    /// HSET `hash` `field` `value`
    fn set_field(&mut self, hash: &str, field: &str, value: &str) -> RedisResult<()>;

    /// HGET `hash` `field`, None when the field does not exist
    fn get_field(&mut self, hash: &str, field: &str) -> RedisResult<Option<String>>;

    /// HGETALL `hash`
    fn get_all_fields(&mut self, hash: &str) -> RedisResult<HashMap<String, String>>;

    /// HDEL `hash` `field`
    fn delete_field(&mut self, hash: &str, field: &str) -> RedisResult<()>;
}

impl HashFieldStore for redis::Connection {
    fn set_field(&mut self, hash: &str, field: &str, value: &str) -> RedisResult<()> {
        redis::cmd("HSET").arg(hash).arg(field).arg(value).query(self)
    }

    fn get_field(&mut self, hash: &str, field: &str) -> RedisResult<Option<String>> {
        redis::cmd("HGET").arg(hash).arg(field).query(self)
    }

    fn get_all_fields(&mut self, hash: &str) -> RedisResult<HashMap<String, String>> {
        redis::cmd("HGETALL").arg(hash).query(self)
    }

    fn delete_field(&mut self, hash: &str, field: &str) -> RedisResult<()> {
        redis::cmd("HDEL").arg(hash).arg(field).query(self)
    }
}

// == Shared Storage ==
/// Storage backed by one named hash in a shared key-value store.
#[derive(Debug)]
pub struct SharedStorage<C> {
    /// Live connection supplied by the caller
    conn: C,
    /// Name of the hash holding every record
    hash_key: String,
}

impl<C: HashFieldStore> SharedStorage<C> {
    // == Constructor ==
    /// Wraps an already-connected handle and the hash to store records in.
    pub fn new(conn: C, hash_key: impl Into<String>) -> Self {
        Self {
            conn,
            hash_key: hash_key.into(),
        }
    }

    /// Returns the name of the backing hash.
    pub fn hash_key(&self) -> &str {
        &self.hash_key
    }

    /// Gives the connection back to the caller.
    pub fn into_connection(self) -> C {
        self.conn
    }
}

impl<C, V> Storage<V> for SharedStorage<C>
where
    C: HashFieldStore,
    V: Serialize,
{
    type Stored = String;

    fn encode(&self, payload: V) -> Result<String> {
        encode_payload(&payload)
    }

    fn read(&mut self, key: &CacheKey) -> Result<Option<String>> {
        Ok(self.conn.get_field(&self.hash_key, key.as_str())?)
    }

    fn write(&mut self, key: CacheKey, value: String) -> Result<()> {
        Ok(self.conn.set_field(&self.hash_key, key.as_str(), &value)?)
    }

    fn read_all(&mut self) -> Result<HashMap<CacheKey, String>> {
        let fields = self.conn.get_all_fields(&self.hash_key)?;
        Ok(fields
            .into_iter()
            .map(|(field, value)| (CacheKey::from(field), value))
            .collect())
    }

    fn remove(&mut self, key: &CacheKey) -> Result<()> {
        Ok(self.conn.delete_field(&self.hash_key, key.as_str())?)
    }

    fn record(stored: &String) -> Record<'_, V> {
        Record::Text(stored.as_str())
    }

    fn snapshot(all: &HashMap<CacheKey, String>) -> Snapshot<'_, V> {
        Snapshot::Text(all)
    }
}

// == Payload Encoding ==
/// Renders a payload as the text written to a hash field.
///
/// Strings are written without quotes, numbers and booleans as their literal
/// text, null as the empty string, everything else as a JSON document.
pub fn encode_payload<V: Serialize + ?Sized>(payload: &V) -> Result<String> {
    match serde_json::to_value(payload)? {
        Value::String(text) => Ok(text),
        Value::Null => Ok(String::new()),
        scalar @ (Value::Bool(_) | Value::Number(_)) => Ok(scalar.to_string()),
        Value::Array(_) | Value::Object(_) => Ok(serde_json::to_string(payload)?),
    }
}
