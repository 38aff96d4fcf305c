//! Per-query mutable state shared by every physical operator: the growing
//! relation, each variable's candidate set, and which variables have been
//! joined into the relation already.

use crate::relation::Relation;
use rdf_model::Key;
use std::collections::{BTreeSet, HashMap, HashSet};

/// Owns the per-query state: (a) the relation, (b) `definitions`, (c)
/// `joined`.
#[derive(Debug, Default)]
pub struct QueryContext {
    relation: Relation,
    definitions: HashMap<String, BTreeSet<Key>>,
    joined: HashSet<String>,
}

impl QueryContext {
    /// A fresh context with an empty relation.
    pub fn new() -> Self {
        Self::default()
    }

    /// The relation as it stands after every operator run so far.
    pub fn relation(&self) -> &Relation {
        &self.relation
    }

    /// True if `var` has already participated in a join.
    pub fn is_joined(&self, var: &str) -> bool {
        self.joined.contains(var)
    }

    /// The current candidate set for `var`, if it has one.
    pub fn definition(&self, var: &str) -> Option<&BTreeSet<Key>> {
        self.definitions.get(var)
    }

    /// Join `delta` into the relation and refresh the candidate set and
    /// joined-flag for every column it introduced or constrained.
    pub fn join_relation(&mut self, delta: Relation) {
        self.relation = self.relation.join(&delta);
        for column in self.relation.columns().to_vec() {
            let values = self.relation.column_values(&column);
            self.definitions.insert(column.clone(), values);
            self.joined.insert(column);
        }
    }
}
