//! Batched, all-or-nothing writes against a [`StorageBackend`].
//!
//! The loader and link-updater never write a backend directly: they
//! accumulate puts/deletes into a [`Batch`] and either `commit` it (applied
//! atomically via `batch_put`, then deletes) or `discard` it, mirroring the
//! per-store transactions the on-disk backends provide natively.

use crate::{StorageBackend, StorageResult};

/// A buffered set of writes, applied together or not at all.
#[derive(Default)]
pub struct Batch {
    puts: Vec<(Vec<u8>, Vec<u8>)>,
    deletes: Vec<Vec<u8>>,
}

impl Batch {
    /// Start an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer a put.
    pub fn put(&mut self, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) {
        self.puts.push((key.into(), value.into()));
    }

    /// Buffer a delete.
    pub fn delete(&mut self, key: impl Into<Vec<u8>>) {
        self.deletes.push(key.into());
    }

    /// Number of buffered writes.
    pub fn len(&self) -> usize {
        self.puts.len() + self.deletes.len()
    }

    /// True if nothing has been buffered.
    pub fn is_empty(&self) -> bool {
        self.puts.is_empty() && self.deletes.is_empty()
    }

    /// Apply every buffered write to `backend`. Puts are applied before
    /// deletes so a key that is both re-pointed and removed in the same
    /// batch ends up absent.
    pub fn commit(self, backend: &mut dyn StorageBackend) -> StorageResult<()> {
        if !self.puts.is_empty() {
            backend.batch_put(self.puts)?;
        }
        for key in self.deletes {
            backend.delete(&key)?;
        }
        Ok(())
    }

    /// Drop the batch without applying it. Exists to make discard sites in
    /// the loader explicit rather than relying on an implicit `Drop`.
    pub fn discard(self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InMemoryBackend;

    #[test]
    fn commit_applies_puts_then_deletes() {
        let mut backend = InMemoryBackend::new();
        backend.put(b"a", b"stale").unwrap();

        let mut batch = Batch::new();
        batch.put(b"a".to_vec(), b"fresh".to_vec());
        batch.put(b"b".to_vec(), b"1".to_vec());
        batch.delete(b"b".to_vec());
        batch.commit(&mut backend).unwrap();

        assert_eq!(backend.get(b"a").unwrap(), Some(b"fresh".to_vec()));
        assert_eq!(backend.get(b"b").unwrap(), None);
    }

    #[test]
    fn discard_applies_nothing() {
        let mut backend = InMemoryBackend::new();
        let mut batch = Batch::new();
        batch.put(b"a".to_vec(), b"1".to_vec());
        batch.discard();

        assert_eq!(backend.get(b"a").unwrap(), None);
    }
}
