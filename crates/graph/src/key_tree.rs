//! An ordered in-memory set of keys with min/max and delete-max access.
//!
//! Used as the scratch structure for BFS/DFS traversal results and frontier
//! sets, so a single call site (e.g. closure materialisation) can both
//! accumulate discovered keys and drain them in descending order without a
//! separate sort pass.

use rdf_model::Key;
use std::collections::BTreeSet;

/// Ordered set of [`Key`] values.
#[derive(Debug, Default, Clone)]
pub struct KeyTree {
    keys: BTreeSet<Key>,
}

impl KeyTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a key. Returns `true` if it was not already present.
    pub fn add(&mut self, key: Key) -> bool {
        self.keys.insert(key)
    }

    /// True if `key` is present.
    pub fn has(&self, key: &Key) -> bool {
        self.keys.contains(key)
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// True if empty.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// The largest key, if any.
    pub fn max(&self) -> Option<Key> {
        self.keys.iter().next_back().copied()
    }

    /// The smallest key, if any.
    pub fn min(&self) -> Option<Key> {
        self.keys.iter().next().copied()
    }

    /// Remove and return the largest key.
    pub fn delete_max(&mut self) -> Option<Key> {
        let max = self.max()?;
        self.keys.remove(&max);
        Some(max)
    }

    /// Remove a specific key.
    pub fn delete(&mut self, key: &Key) -> bool {
        self.keys.remove(key)
    }

    /// Ascending iterator over all keys.
    pub fn iter(&self) -> impl Iterator<Item = Key> + '_ {
        self.keys.iter().copied()
    }

    /// Drain every key in descending order.
    pub fn into_sorted_vec_desc(mut self) -> Vec<Key> {
        let mut out = Vec::with_capacity(self.keys.len());
        while let Some(k) = self.delete_max() {
            out.push(k);
        }
        out
    }
}

impl FromIterator<Key> for KeyTree {
    fn from_iter<T: IntoIterator<Item = Key>>(iter: T) -> Self {
        KeyTree {
            keys: iter.into_iter().collect(),
        }
    }
}
