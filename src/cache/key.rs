//! Cache Key Module
//!
//! Defines the textual cache identifier and the hints handed to key derivation.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

// == Cache Key ==
/// Unique textual identifier for a cached record.
///
/// Only equality and hashing are meaningful; keys carry no ordering.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    /// Creates a key from any string-like value.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Returns the key text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the key and returns the owned text.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CacheKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

impl From<String> for CacheKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl From<CacheKey> for String {
    fn from(key: CacheKey) -> Self {
        key.0
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for CacheKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// == Key Hint ==
/// Position of an element inside a batch, passed to key derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyHint<'a> {
    /// Index of the element in a sequence
    Index(usize),
    /// The element's own key in a keyed collection
    Key(&'a str),
}

impl<'a> KeyHint<'a> {
    /// Returns the hint text for keyed input, None for sequence indices.
    pub fn as_key(&self) -> Option<&'a str> {
        match *self {
            KeyHint::Key(key) => Some(key),
            KeyHint::Index(_) => None,
        }
    }
}

impl fmt::Display for KeyHint<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyHint::Index(index) => write!(f, "#{}", index),
            KeyHint::Key(key) => f.write_str(key),
        }
    }
}
