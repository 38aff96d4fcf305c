//! A small LRU of normalised-query-text to [`QueryOutcome`], gated by the
//! `query_cache_enabled` configuration knob. Keyed on a fast non-cryptographic
//! hash (the workspace already depends on `ahash` for exactly this kind of
//! in-process lookup table) rather than the query text itself, to keep the
//! cache's memory footprint independent of query length.

use ahash::AHasher;
use parking_lot::Mutex;
use sparql::QueryOutcome;
use std::hash::{Hash, Hasher};
use std::num::NonZeroUsize;

const DEFAULT_CAPACITY: usize = 256;

fn cache_key(query_text: &str) -> u64 {
    let mut hasher = AHasher::default();
    query_text.hash(&mut hasher);
    hasher.finish()
}

/// Thread-safe LRU cache of query outcomes, keyed by query text hash.
pub struct QueryCache {
    inner: Mutex<lru::LruCache<u64, QueryOutcome>>,
}

impl QueryCache {
    /// A cache with the default capacity.
    pub fn new() -> Self {
        QueryCache {
            inner: Mutex::new(lru::LruCache::new(
                NonZeroUsize::new(DEFAULT_CAPACITY).expect("default capacity is nonzero"),
            )),
        }
    }

    /// Look up the outcome previously cached for this exact query text.
    pub fn get(&self, query_text: &str) -> Option<QueryOutcome> {
        self.inner.lock().get(&cache_key(query_text)).cloned()
    }

    /// Cache `outcome` under `query_text`.
    pub fn put(&self, query_text: &str, outcome: QueryOutcome) {
        self.inner.lock().put(cache_key(query_text), outcome);
    }

    /// Drop every cached outcome. Called after any mutation (`load`,
    /// `update_links`, `declare_transitive`) since those can change which
    /// rows a previously-cached query would return.
    pub fn clear(&self) {
        self.inner.lock().clear();
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        QueryCache::new()
    }
}
