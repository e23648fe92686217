//! In-Memory Storage Module
//!
//! Process-local HashMap storage. Payloads are held behind `Arc` so reads
//! share them with callers instead of copying.

use std::collections::HashMap;
use std::sync::Arc;

use crate::cache::{CacheKey, Record, Snapshot, Storage};
use crate::error::Result;

// == Memory Storage ==
/// HashMap-backed storage owned by a single engine.
#[derive(Debug)]
pub struct MemoryStorage<V> {
    /// Key-value storage
    entries: HashMap<CacheKey, Arc<V>>,
}

impl<V> MemoryStorage<V> {
    // == Constructor ==
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    // == Length ==
    /// Returns the current number of entries, evicted or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V> Default for MemoryStorage<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> Storage<V> for MemoryStorage<V> {
    type Stored = Arc<V>;

    fn encode(&self, payload: V) -> Result<Arc<V>> {
        Ok(Arc::new(payload))
    }

    fn read(&mut self, key: &CacheKey) -> Result<Option<Arc<V>>> {
        Ok(self.entries.get(key).cloned())
    }

    fn write(&mut self, key: CacheKey, value: Arc<V>) -> Result<()> {
        self.entries.insert(key, value);
        Ok(())
    }

    fn read_all(&mut self) -> Result<HashMap<CacheKey, Arc<V>>> {
        Ok(self.entries.clone())
    }

    fn remove(&mut self, key: &CacheKey) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }

    fn record(stored: &Arc<V>) -> Record<'_, V> {
        Record::Native(&**stored)
    }

    fn snapshot(all: &HashMap<CacheKey, Arc<V>>) -> Snapshot<'_, V> {
        Snapshot::Native(all)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_new() {
        let storage: MemoryStorage<String> = MemoryStorage::new();
        assert_eq!(storage.len(), 0);
        assert!(storage.is_empty());
    }

    #[test]
    fn test_memory_write_and_read_share_payload() {
        let mut storage = MemoryStorage::new();
        let payload = storage.encode("value1".to_string()).unwrap();

        storage.write(CacheKey::from("key1"), payload.clone()).unwrap();
        let read = storage.read(&CacheKey::from("key1")).unwrap().unwrap();

        assert!(Arc::ptr_eq(&payload, &read));
    }

    #[test]
    fn test_memory_overwrite() {
        let mut storage = MemoryStorage::new();
        storage.write(CacheKey::from("key1"), Arc::new(1)).unwrap();
        storage.write(CacheKey::from("key1"), Arc::new(2)).unwrap();

        assert_eq!(storage.len(), 1);
        assert_eq!(*storage.read(&CacheKey::from("key1")).unwrap().unwrap(), 2);
    }

    #[test]
    fn test_memory_remove_missing_is_ok() {
        let mut storage: MemoryStorage<u8> = MemoryStorage::new();
        assert!(storage.remove(&CacheKey::from("nonexistent")).is_ok());
    }

    #[test]
    fn test_memory_read_all_is_detached() {
        let mut storage = MemoryStorage::new();
        storage.write(CacheKey::from("a"), Arc::new(1)).unwrap();

        let all = storage.read_all().unwrap();
        storage.remove(&CacheKey::from("a")).unwrap();

        assert_eq!(all.len(), 1);
        assert!(storage.is_empty());
    }
}
