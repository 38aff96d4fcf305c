//! The inverse-predicate table and the set of predicates whose closure is
//! materialised.

use rdf_model::Key;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// `Map<predicate, inverse-predicate>` plus the transitive-edge set.
///
/// Every predicate in the inverse table is transitive (populated together
/// by the ontology bootstrap); additional predicates may be declared
/// transitive externally without an inverse.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelationshipTable {
    inverses: HashMap<Key, Key>,
    transitive: HashSet<Key>,
}

impl RelationshipTable {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare `a` and `b` as mutual inverses, marking both transitive.
    /// Symmetric: registers `a → b` and `b → a`.
    pub fn declare_inverse(&mut self, a: Key, b: Key) {
        self.inverses.insert(a, b);
        self.inverses.insert(b, a);
        self.transitive.insert(a);
        self.transitive.insert(b);
    }

    /// Mark `predicate` transitive without an inverse.
    pub fn declare_transitive(&mut self, predicate: Key) {
        self.transitive.insert(predicate);
    }

    /// The inverse of `predicate`, if declared.
    pub fn inverse_of(&self, predicate: Key) -> Option<Key> {
        self.inverses.get(&predicate).copied()
    }

    /// True if `predicate`'s closure index is materialised.
    pub fn is_transitive(&self, predicate: Key) -> bool {
        self.transitive.contains(&predicate)
    }

    /// Every predicate whose closure is materialised.
    pub fn transitive_predicates(&self) -> impl Iterator<Item = Key> + '_ {
        self.transitive.iter().copied()
    }

    /// Serialise to this engine's tagged record format.
    pub fn to_bytes(&self) -> Vec<u8> {
        serde_json::to_vec(self).expect("RelationshipTable serialization is infallible")
    }

    /// Deserialise from bytes produced by [`RelationshipTable::to_bytes`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}
