//! Error types for the cache engine
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for every cache engine operation.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Batch input was neither a sequence nor a keyed collection
    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    /// The policy could not derive a key for a hint/payload pair
    #[error("Key derivation failed: {0}")]
    KeyDerivationFailed(String),

    /// The shared store rejected or could not serve a command
    #[error(transparent)]
    BackendUnavailable(#[from] redis::RedisError),

    /// A structured payload could not be marshaled for the shared store
    #[error("Serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

impl CacheError {
    /// Shorthand for policies rejecting a payload shape.
    pub fn key_derivation(msg: impl Into<String>) -> Self {
        CacheError::KeyDerivationFailed(msg.into())
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache engine.
pub type Result<T> = std::result::Result<T, CacheError>;
