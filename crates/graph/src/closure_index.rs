//! Precomputed transitive-closure ("one-or-more hops") index.

use rdf_model::Key;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// `{pk, out_plus: Map<predicate, OrderedSet<reachable>>, in_plus: Map<predicate, OrderedSet<reachable>>}`
///
/// `out_plus[p]` is the set of keys reachable from `pk` via one-or-more
/// `p`-edges in the out-adjacency; `in_plus[p]` is the symmetric reverse.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClosureIndexEntry {
    pk: Key,
    out_plus: BTreeMap<Key, BTreeSet<Key>>,
    in_plus: BTreeMap<Key, BTreeSet<Key>>,
}

impl ClosureIndexEntry {
    /// A fresh, empty closure entry for entity `pk`.
    pub fn new(pk: Key) -> Self {
        ClosureIndexEntry {
            pk,
            out_plus: BTreeMap::new(),
            in_plus: BTreeMap::new(),
        }
    }

    /// This entity's own key.
    pub fn pk(&self) -> Key {
        self.pk
    }

    /// Record that `reachable` is reachable from `pk` via one-or-more
    /// `predicate`-edges.
    pub fn add_out_plus(&mut self, predicate: Key, reachable: Key) {
        self.out_plus.entry(predicate).or_default().insert(reachable);
    }

    /// Record that `pk` is reachable from `reachable` via one-or-more
    /// `predicate`-edges.
    pub fn add_in_plus(&mut self, predicate: Key, reachable: Key) {
        self.in_plus.entry(predicate).or_default().insert(reachable);
    }

    /// Discard every closure entry for `predicate`, e.g. because the
    /// underlying adjacency changed and the closure must be rematerialised.
    pub fn invalidate_predicate(&mut self, predicate: Key) {
        self.out_plus.remove(&predicate);
        self.in_plus.remove(&predicate);
    }

    /// The materialised forward closure under `predicate`, if present.
    pub fn out_plus(&self, predicate: Key) -> Option<impl Iterator<Item = Key> + '_> {
        self.out_plus.get(&predicate).map(|s| s.iter().copied())
    }

    /// The materialised reverse closure under `predicate`, if present.
    pub fn in_plus(&self, predicate: Key) -> Option<impl Iterator<Item = Key> + '_> {
        self.in_plus.get(&predicate).map(|s| s.iter().copied())
    }

    /// Serialise to this engine's tagged record format.
    pub fn to_bytes(&self) -> Vec<u8> {
        serde_json::to_vec(self).expect("ClosureIndexEntry serialization is infallible")
    }

    /// Deserialise from bytes produced by [`ClosureIndexEntry::to_bytes`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_plus_absent_until_populated() {
        let mut e = ClosureIndexEntry::new(Key::from_u32(1));
        assert!(e.out_plus(Key::from_u32(2)).is_none());
        e.add_out_plus(Key::from_u32(2), Key::from_u32(3));
        assert_eq!(e.out_plus(Key::from_u32(2)).unwrap().collect::<Vec<_>>(), vec![Key::from_u32(3)]);
    }

    #[test]
    fn invalidate_predicate_clears_both_directions() {
        let mut e = ClosureIndexEntry::new(Key::from_u32(1));
        e.add_out_plus(Key::from_u32(2), Key::from_u32(3));
        e.add_in_plus(Key::from_u32(2), Key::from_u32(4));
        e.invalidate_predicate(Key::from_u32(2));
        assert!(e.out_plus(Key::from_u32(2)).is_none());
        assert!(e.in_plus(Key::from_u32(2)).is_none());
    }
}
