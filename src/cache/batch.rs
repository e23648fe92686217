//! Batch Module
//!
//! Input shapes accepted by batch ingestion and the conversion into them.

use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

use serde_json::Value;

use crate::error::{CacheError, Result};

// == Batch ==
/// A collection of payloads waiting to be ingested.
///
/// Sequence elements get their index as key hint, keyed elements get their
/// own key.
#[derive(Debug, Clone, PartialEq)]
pub enum Batch<V> {
    Sequence(Vec<V>),
    Keyed(Vec<(String, V)>),
}

impl<V> Batch<V> {
    /// An empty batch; ingesting it is a no-op.
    pub fn empty() -> Self {
        Batch::Sequence(Vec::new())
    }

    /// Builds a sequence batch from any iterator of payloads.
    pub fn sequence(items: impl IntoIterator<Item = V>) -> Self {
        Batch::Sequence(items.into_iter().collect())
    }

    /// Builds a keyed batch from any iterator of key/payload pairs.
    pub fn keyed<K: Into<String>>(items: impl IntoIterator<Item = (K, V)>) -> Self {
        Batch::Keyed(items.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn len(&self) -> usize {
        match self {
            Batch::Sequence(items) => items.len(),
            Batch::Keyed(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<V> Default for Batch<V> {
    fn default() -> Self {
        Self::empty()
    }
}

// == Into Batch ==
/// Anything batch ingestion accepts.
///
/// Statically shaped collections always convert. Dynamically shaped JSON
/// documents are inspected at runtime and fail with
/// [`CacheError::TypeMismatch`] unless they hold an array or an object.
pub trait IntoBatch<V> {
    fn into_batch(self) -> Result<Batch<V>>;
}

impl<V> IntoBatch<V> for Batch<V> {
    fn into_batch(self) -> Result<Batch<V>> {
        Ok(self)
    }
}

impl<V> IntoBatch<V> for Vec<V> {
    fn into_batch(self) -> Result<Batch<V>> {
        Ok(Batch::Sequence(self))
    }
}

impl<V, const N: usize> IntoBatch<V> for [V; N] {
    fn into_batch(self) -> Result<Batch<V>> {
        Ok(Batch::sequence(self))
    }
}

impl<K: Into<String>, V, S: BuildHasher> IntoBatch<V> for HashMap<K, V, S> {
    fn into_batch(self) -> Result<Batch<V>> {
        Ok(Batch::keyed(self))
    }
}

impl<K: Into<String>, V> IntoBatch<V> for BTreeMap<K, V> {
    fn into_batch(self) -> Result<Batch<V>> {
        Ok(Batch::keyed(self))
    }
}

impl<V, B: IntoBatch<V>> IntoBatch<V> for Option<B> {
    fn into_batch(self) -> Result<Batch<V>> {
        match self {
            Some(inner) => inner.into_batch(),
            None => Ok(Batch::empty()),
        }
    }
}

impl IntoBatch<Value> for Value {
    fn into_batch(self) -> Result<Batch<Value>> {
        match self {
            Value::Array(items) => Ok(Batch::Sequence(items)),
            Value::Object(map) => Ok(Batch::keyed(map)),
            Value::Null => Ok(Batch::empty()),
            other => Err(CacheError::TypeMismatch(format!(
                "batch input must be an array or an object, got {}",
                json_kind(&other)
            ))),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
