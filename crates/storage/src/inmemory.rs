//! In-memory ordered storage backend.
//!
//! Backed by a `BTreeMap` rather than a hash map so range and prefix scans
//! are native iteration rather than collect-then-sort — this is what lets
//! the identifier service and predicate index treat it the same way as the
//! on-disk backends.

use crate::{StorageBackend, StorageResult, StorageStats};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

/// In-memory ordered key-value store.
#[derive(Clone)]
pub struct InMemoryBackend {
    data: Arc<RwLock<BTreeMap<Vec<u8>, Vec<u8>>>>,
    stats: Arc<RwLock<StorageStats>>,
}

impl InMemoryBackend {
    /// Create a new, empty in-memory backend.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(BTreeMap::new())),
            stats: Arc::new(RwLock::new(StorageStats::default())),
        }
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// True if no keys are stored.
    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    /// Drop all stored data and reset statistics.
    pub fn clear(&mut self) {
        self.data.write().clear();
        *self.stats.write() = StorageStats::default();
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageBackend for InMemoryBackend {
    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        let value = self.data.read().get(key).cloned();
        self.stats.write().reads += 1;
        Ok(value)
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> StorageResult<()> {
        self.data.write().insert(key.to_vec(), value.to_vec());
        let mut stats = self.stats.write();
        stats.writes += 1;
        stats.key_count = self.data.read().len() as u64;
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> StorageResult<()> {
        self.data.write().remove(key);
        let mut stats = self.stats.write();
        stats.deletes += 1;
        stats.key_count = self.data.read().len() as u64;
        Ok(())
    }

    fn contains(&self, key: &[u8]) -> StorageResult<bool> {
        Ok(self.data.read().contains_key(key))
    }

    fn range_scan<'a>(
        &'a self,
        start: &[u8],
        end: &[u8],
    ) -> StorageResult<Box<dyn Iterator<Item = (Vec<u8>, Vec<u8>)> + 'a>> {
        let snapshot: Vec<_> = self
            .data
            .read()
            .range(start.to_vec()..end.to_vec())
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Ok(Box::new(snapshot.into_iter()))
    }

    fn prefix_scan<'a>(
        &'a self,
        prefix: &[u8],
    ) -> StorageResult<Box<dyn Iterator<Item = (Vec<u8>, Vec<u8>)> + 'a>> {
        let prefix = prefix.to_vec();
        let snapshot: Vec<_> = self
            .data
            .read()
            .range(prefix.clone()..)
            .take_while(|(k, _)| k.starts_with(&prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Ok(Box::new(snapshot.into_iter()))
    }

    fn batch_put(&mut self, pairs: Vec<(Vec<u8>, Vec<u8>)>) -> StorageResult<()> {
        let mut data = self.data.write();
        for (k, v) in pairs {
            data.insert(k, v);
        }
        let mut stats = self.stats.write();
        stats.writes += 1;
        stats.key_count = data.len() as u64;
        Ok(())
    }

    fn stats(&self) -> StorageStats {
        self.stats.read().clone()
    }
}
