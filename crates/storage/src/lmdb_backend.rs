//! LMDB persistent storage backend
//!
//! Memory-mapped B+tree storage with MVCC and zero-copy reads.
//! Optimized for read-heavy workloads with consistent read performance.

use crate::{StorageBackend, StorageError, StorageResult, StorageStats};
use heed::types::*;
use heed::{Database, Env, EnvOpenOptions};
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// LMDB storage backend
///
/// Persistent storage using LMDB (Lightning Memory-Mapped Database).
/// Features:
/// - Memory-mapped I/O for zero-copy reads
/// - MVCC (Multi-Version Concurrency Control)
/// - B+tree ordered storage
/// - Excellent read performance
/// - ACID transactions
#[derive(Clone)]
pub struct LmdbBackend {
    /// LMDB environment handle (thread-safe)
    env: Arc<Env>,

    /// Main database (key-value pairs)
    db: Database<Bytes, Bytes>,

    /// Database path on disk
    path: PathBuf,

    /// Statistics
    stats: Arc<RwLock<StorageStats>>,
}

impl LmdbBackend {
    /// Create a new LMDB backend at the specified path
    ///
    /// # Arguments
    /// * `path` - Directory where LMDB will store data
    ///
    /// # Errors
    /// Returns `StorageError::Backend` if database cannot be opened
    pub fn new<P: AsRef<Path>>(path: P) -> StorageResult<Self> {
        Self::with_map_size(path, 10 * 1024 * 1024 * 1024) // 10 GB default
    }

    /// Create LMDB backend with custom map size
    ///
    /// # Arguments
    /// * `path` - Directory where LMDB will store data
    /// * `map_size` - Maximum size of the memory map in bytes
    ///
    /// # Errors
    /// Returns `StorageError::Backend` if database cannot be opened
    pub fn with_map_size<P: AsRef<Path>>(path: P, map_size: usize) -> StorageResult<Self> {
        let path = path.as_ref().to_path_buf();

        // Create directory if it doesn't exist
        std::fs::create_dir_all(&path).map_err(|e| {
            StorageError::Backend(format!("Failed to create LMDB directory: {}", e))
        })?;

        // Open LMDB environment
        // SAFETY: LMDB requires unsafe to open environment. We ensure:
        // 1. Path is valid and accessible
        // 2. Only one environment per process for this path
        // 3. All operations through safe API after this point
        #[allow(unsafe_code)]
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(1)
                .open(&path)
                .map_err(|e| StorageError::Backend(format!("Failed to open LMDB: {}", e)))?
        };

        // Open/create main database
        let mut wtxn = env.write_txn().map_err(|e| {
            StorageError::Backend(format!("Failed to create write transaction: {}", e))
        })?;

        let db: Database<Bytes, Bytes> = env
            .create_database(&mut wtxn, Some("main"))
            .map_err(|e| StorageError::Backend(format!("Failed to create database: {}", e)))?;

        wtxn.commit().map_err(|e| {
            StorageError::Backend(format!("Failed to commit database creation: {}", e))
        })?;

        Ok(Self {
            env: Arc::new(env),
            db,
            path,
            stats: Arc::new(RwLock::new(StorageStats::default())),
        })
    }

    /// Get database path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get approximate size on disk in bytes
    pub fn disk_size(&self) -> StorageResult<u64> {
        // Get the data.mdb file size
        let data_path = self.path.join("data.mdb");
        match std::fs::metadata(&data_path) {
            Ok(metadata) => Ok(metadata.len()),
            Err(_) => Ok(0), // File doesn't exist yet
        }
    }

    /// Get number of keys (exact count via iteration)
    pub fn key_count(&self) -> StorageResult<u64> {
        let rtxn = self
            .env
            .read_txn()
            .map_err(|e| StorageError::Backend(format!("Failed to open read transaction: {}", e)))?;

        let count = self
            .db
            .len(&rtxn)
            .map_err(|e| StorageError::Backend(format!("Failed to get key count: {}", e)))?;

        Ok(count)
    }

    /// Sync data to disk (force flush)
    pub fn sync(&self) -> StorageResult<()> {
        self.env
            .force_sync()
            .map_err(|e| StorageError::Backend(format!("LMDB sync error: {}", e)))?;
        Ok(())
    }

    /// Get LMDB statistics
    pub fn lmdb_stats(&self) -> StorageResult<String> {
        let rtxn = self
            .env
            .read_txn()
            .map_err(|e| StorageError::Backend(format!("Failed to open read transaction: {}", e)))?;

        let stat = self
            .db
            .stat(&rtxn)
            .map_err(|e| StorageError::Backend(format!("Failed to get LMDB stats: {}", e)))?;

        Ok(format!(
            "LMDB Stats - Page size: {}, Depth: {}, Branch pages: {}, Leaf pages: {}, Overflow pages: {}, Entries: {}",
            stat.page_size,
            stat.depth,
            stat.branch_pages,
            stat.leaf_pages,
            stat.overflow_pages,
            stat.entries
        ))
    }
}

impl StorageBackend for LmdbBackend {
    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        let rtxn = self
            .env
            .read_txn()
            .map_err(|e| StorageError::Backend(format!("Failed to open read transaction: {}", e)))?;

        let result = self
            .db
            .get(&rtxn, key)
            .map_err(|e| StorageError::Backend(format!("LMDB get error: {}", e)))?
            .map(|v| v.to_vec());

        // Update stats
        self.stats.write().reads += 1;

        Ok(result)
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> StorageResult<()> {
        let mut wtxn = self
            .env
            .write_txn()
            .map_err(|e| StorageError::Backend(format!("Failed to open write transaction: {}", e)))?;

        self.db
            .put(&mut wtxn, key, value)
            .map_err(|e| StorageError::Backend(format!("LMDB put error: {}", e)))?;

        wtxn.commit()
            .map_err(|e| StorageError::Backend(format!("Failed to commit write transaction: {}", e)))?;

        // Update stats
        let mut stats = self.stats.write();
        stats.writes += 1;
        stats.key_count = self.key_count().unwrap_or(stats.key_count);

        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> StorageResult<()> {
        let mut wtxn = self
            .env
            .write_txn()
            .map_err(|e| StorageError::Backend(format!("Failed to open write transaction: {}", e)))?;

        let existed = self
            .db
            .delete(&mut wtxn, key)
            .map_err(|e| StorageError::Backend(format!("LMDB delete error: {}", e)))?;

        wtxn.commit()
            .map_err(|e| StorageError::Backend(format!("Failed to commit delete transaction: {}", e)))?;

        // Update stats only if key existed
        if existed {
            let mut stats = self.stats.write();
            stats.deletes += 1;
            stats.key_count = self.key_count().unwrap_or(stats.key_count);
        }

        Ok(())
    }

    fn contains(&self, key: &[u8]) -> StorageResult<bool> {
        Ok(self.get(key)?.is_some())
    }

    fn range_scan<'a>(
        &'a self,
        start: &[u8],
        end: &[u8],
    ) -> StorageResult<Box<dyn Iterator<Item = (Vec<u8>, Vec<u8>)> + 'a>> {
        // Create read-only transaction
        let rtxn = self
            .env
            .read_txn()
            .map_err(|e| StorageError::Backend(format!("Failed to open read transaction: {}", e)))?;

        // LMDB iterators require owned transactions, so we collect results
        let end_vec = end.to_vec();
        let mut results = Vec::new();

        // Iterate over all entries and filter by range
        let iter = self
            .db
            .iter(&rtxn)
            .map_err(|e| StorageError::Backend(format!("LMDB range error: {}", e)))?;

        // Collect entries within [start, end)
        for result in iter {
            let (key, value) = result
                .map_err(|e| StorageError::Backend(format!("LMDB iterator error: {}", e)))?;

            // Skip keys before start
            if key < start {
                continue;
            }

            // Stop at end
            if key >= end_vec.as_slice() {
                break;
            }

            results.push((key.to_vec(), value.to_vec()));
        }

        Ok(Box::new(results.into_iter()))
    }

    fn prefix_scan<'a>(
        &'a self,
        prefix: &[u8],
    ) -> StorageResult<Box<dyn Iterator<Item = (Vec<u8>, Vec<u8>)> + 'a>> {
        // Create read-only transaction
        let rtxn = self
            .env
            .read_txn()
            .map_err(|e| StorageError::Backend(format!("Failed to open read transaction: {}", e)))?;

        let prefix_vec = prefix.to_vec();
        let mut results = Vec::new();

        // Iterate over all entries and filter by prefix
        let iter = self
            .db
            .iter(&rtxn)
            .map_err(|e| StorageError::Backend(format!("LMDB prefix error: {}", e)))?;

        // Collect all matching entries
        for result in iter {
            let (key, value) = result
                .map_err(|e| StorageError::Backend(format!("LMDB iterator error: {}", e)))?;

            if key.starts_with(&prefix_vec) {
                results.push((key.to_vec(), value.to_vec()));
            } else if !results.is_empty() {
                // If we've already found prefix matches and now found a non-match,
                // we can stop (assuming keys are sorted)
                break;
            }
        }

        Ok(Box::new(results.into_iter()))
    }

    fn batch_put(&mut self, pairs: Vec<(Vec<u8>, Vec<u8>)>) -> StorageResult<()> {
        if pairs.is_empty() {
            return Ok(());
        }

        // Single write transaction for all pairs
        let mut wtxn = self
            .env
            .write_txn()
            .map_err(|e| StorageError::Backend(format!("Failed to open write transaction: {}", e)))?;

        for (key, value) in &pairs {
            self.db
                .put(&mut wtxn, key, value)
                .map_err(|e| StorageError::Backend(format!("LMDB batch put error: {}", e)))?;
        }

        wtxn.commit()
            .map_err(|e| StorageError::Backend(format!("Failed to commit batch transaction: {}", e)))?;

        // Update stats
        let mut stats = self.stats.write();
        stats.writes += pairs.len() as u64;
        stats.key_count = self.key_count().unwrap_or(stats.key_count);

        Ok(())
    }

    fn flush(&mut self) -> StorageResult<()> {
        // Force sync to disk
        self.sync()
    }

    fn stats(&self) -> StorageStats {
        let mut stats = self.stats.read().clone();

        // Update with LMDB internal stats
        if let Ok(count) = self.key_count() {
            stats.key_count = count;
        }

        if let Ok(size) = self.disk_size() {
            stats.total_bytes = size;
        }

        stats
    }
}

// Implement Drop to clean up resources
impl Drop for LmdbBackend {
    fn drop(&mut self) {
        // LMDB handles cleanup automatically when Arc<Env> is dropped
        // No explicit cleanup needed
    }
}
