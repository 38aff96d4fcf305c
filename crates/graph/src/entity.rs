//! Per-entity adjacency records.

use rdf_model::Key;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// `{pk, in: Map<predicate, OrderedSet<neighbour>>, out: Map<predicate, OrderedSet<neighbour>>}`
///
/// Every entity — subject, object, *and* predicate — gets one of these,
/// since predicates are themselves addressable nodes (their key is used as
/// the map key in adjacency and predicate-index records).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Entity {
    pk: Key,
    #[serde(rename = "in")]
    in_edges: BTreeMap<Key, BTreeSet<Key>>,
    out_edges: BTreeMap<Key, BTreeSet<Key>>,
}

impl Entity {
    /// A fresh entity with no edges.
    pub fn new(pk: Key) -> Self {
        Entity {
            pk,
            in_edges: BTreeMap::new(),
            out_edges: BTreeMap::new(),
        }
    }

    /// This entity's own key.
    pub fn pk(&self) -> Key {
        self.pk
    }

    /// Add an out-edge `pk --predicate--> endpoint`. A no-op if already
    /// present (invariant I2 is additive, never duplicating).
    pub fn add_out_edge(&mut self, predicate: Key, endpoint: Key) -> bool {
        self.out_edges.entry(predicate).or_default().insert(endpoint)
    }

    /// Add an in-edge `endpoint --predicate--> pk`.
    pub fn add_in_edge(&mut self, predicate: Key, endpoint: Key) -> bool {
        self.in_edges.entry(predicate).or_default().insert(endpoint)
    }

    /// Remove an out-edge, if present.
    pub fn remove_out_edge(&mut self, predicate: Key, endpoint: Key) -> bool {
        match self.out_edges.get_mut(&predicate) {
            Some(set) => {
                let removed = set.remove(&endpoint);
                if set.is_empty() {
                    self.out_edges.remove(&predicate);
                }
                removed
            }
            None => false,
        }
    }

    /// Remove an in-edge, if present.
    pub fn remove_in_edge(&mut self, predicate: Key, endpoint: Key) -> bool {
        match self.in_edges.get_mut(&predicate) {
            Some(set) => {
                let removed = set.remove(&endpoint);
                if set.is_empty() {
                    self.in_edges.remove(&predicate);
                }
                removed
            }
            None => false,
        }
    }

    /// Out-neighbours reachable by exactly one `predicate` hop.
    pub fn out_neighbors(&self, predicate: Key) -> impl Iterator<Item = Key> + '_ {
        self.out_edges.get(&predicate).into_iter().flatten().copied()
    }

    /// In-neighbours reachable by exactly one `predicate` hop.
    pub fn in_neighbors(&self, predicate: Key) -> impl Iterator<Item = Key> + '_ {
        self.in_edges.get(&predicate).into_iter().flatten().copied()
    }

    /// Every out-edge, across all predicates, as `(predicate, neighbour)`.
    pub fn out_edges(&self) -> impl Iterator<Item = (Key, Key)> + '_ {
        self.out_edges
            .iter()
            .flat_map(|(p, set)| set.iter().map(move |n| (*p, *n)))
    }

    /// Every in-edge, across all predicates, as `(predicate, neighbour)`.
    pub fn in_edges(&self) -> impl Iterator<Item = (Key, Key)> + '_ {
        self.in_edges
            .iter()
            .flat_map(|(p, set)| set.iter().map(move |n| (*p, *n)))
    }

    /// Predicates under which this entity has at least one out-edge.
    pub fn out_predicates(&self) -> impl Iterator<Item = Key> + '_ {
        self.out_edges.keys().copied()
    }

    /// Predicates under which this entity has at least one in-edge.
    pub fn in_predicates(&self) -> impl Iterator<Item = Key> + '_ {
        self.in_edges.keys().copied()
    }

    /// Serialise to this engine's tagged record format.
    pub fn to_bytes(&self) -> Vec<u8> {
        serde_json::to_vec(self).expect("Entity serialization is infallible")
    }

    /// Deserialise from bytes produced by [`Entity::to_bytes`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_out_edge_is_idempotent() {
        let mut e = Entity::new(Key::from_u32(1));
        let p = Key::from_u32(2);
        let o = Key::from_u32(3);
        assert!(e.add_out_edge(p, o));
        assert!(!e.add_out_edge(p, o));
        assert_eq!(e.out_neighbors(p).count(), 1);
    }

    #[test]
    fn remove_out_edge_drops_empty_predicate_bucket() {
        let mut e = Entity::new(Key::from_u32(1));
        let p = Key::from_u32(2);
        let o = Key::from_u32(3);
        e.add_out_edge(p, o);
        assert!(e.remove_out_edge(p, o));
        assert_eq!(e.out_predicates().count(), 0);
    }

    #[test]
    fn round_trips_through_bytes() {
        let mut e = Entity::new(Key::from_u32(1));
        e.add_out_edge(Key::from_u32(2), Key::from_u32(3));
        e.add_in_edge(Key::from_u32(4), Key::from_u32(5));

        let bytes = e.to_bytes();
        let back = Entity::from_bytes(&bytes).unwrap();
        assert_eq!(e, back);
    }
}
