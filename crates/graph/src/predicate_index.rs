//! Per-predicate (subject, object) index, maintained in lock-step with
//! entity adjacency.

use rdf_model::Key;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// `{pk, subjects: Map<subject, Set<object>>, objects: Map<object, Set<subject>>}`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PredicateIndexEntry {
    pk: Key,
    subjects: BTreeMap<Key, BTreeSet<Key>>,
    objects: BTreeMap<Key, BTreeSet<Key>>,
}

impl PredicateIndexEntry {
    /// A fresh, empty index entry for predicate `pk`.
    pub fn new(pk: Key) -> Self {
        PredicateIndexEntry {
            pk,
            subjects: BTreeMap::new(),
            objects: BTreeMap::new(),
        }
    }

    /// This predicate's own key.
    pub fn pk(&self) -> Key {
        self.pk
    }

    /// Record `(subject, object)` as connected by this predicate. Updates
    /// both maps symmetrically (invariant I4).
    pub fn add_subject_object(&mut self, subject: Key, object: Key) {
        self.subjects.entry(subject).or_default().insert(object);
        self.objects.entry(object).or_default().insert(subject);
    }

    /// Remove `(subject, object)`, if present.
    pub fn remove_subject_object(&mut self, subject: Key, object: Key) {
        if let Some(set) = self.subjects.get_mut(&subject) {
            set.remove(&object);
            if set.is_empty() {
                self.subjects.remove(&subject);
            }
        }
        if let Some(set) = self.objects.get_mut(&object) {
            set.remove(&subject);
            if set.is_empty() {
                self.objects.remove(&object);
            }
        }
    }

    /// Objects reached from `subject` by this predicate.
    pub fn objects_for_subject(&self, subject: Key) -> impl Iterator<Item = Key> + '_ {
        self.subjects.get(&subject).into_iter().flatten().copied()
    }

    /// Subjects that reach `object` by this predicate.
    pub fn subjects_for_object(&self, object: Key) -> impl Iterator<Item = Key> + '_ {
        self.objects.get(&object).into_iter().flatten().copied()
    }

    /// Every `(subject, object)` pair this predicate connects.
    pub fn all_pairs(&self) -> impl Iterator<Item = (Key, Key)> + '_ {
        self.subjects
            .iter()
            .flat_map(|(s, set)| set.iter().map(move |o| (*s, *o)))
    }

    /// All subjects with at least one outgoing edge under this predicate.
    pub fn subjects(&self) -> impl Iterator<Item = Key> + '_ {
        self.subjects.keys().copied()
    }

    /// All objects with at least one incoming edge under this predicate.
    pub fn objects(&self) -> impl Iterator<Item = Key> + '_ {
        self.objects.keys().copied()
    }

    /// Serialise to this engine's tagged record format.
    pub fn to_bytes(&self) -> Vec<u8> {
        serde_json::to_vec(self).expect("PredicateIndexEntry serialization is infallible")
    }

    /// Deserialise from bytes produced by [`PredicateIndexEntry::to_bytes`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}
