//! The executor's single growing result relation: an N-column table of keys
//! supporting definition, 1/2-column append, and inner equi-join on shared
//! columns.

use rdf_model::Key;
use std::collections::BTreeSet;

/// A set of key-tuples with named columns.
///
/// An empty relation (no columns) is the join identity: joining it with
/// anything adopts the other side unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Relation {
    columns: Vec<String>,
    rows: Vec<Vec<Key>>,
}

impl Relation {
    /// The empty relation (no columns, no rows).
    pub fn empty() -> Self {
        Relation::default()
    }

    /// A one-column relation, one row per value.
    pub fn single_column(name: impl Into<String>, values: impl IntoIterator<Item = Key>) -> Self {
        Relation {
            columns: vec![name.into()],
            rows: values.into_iter().map(|k| vec![k]).collect(),
        }
    }

    /// A two-column relation, one row per pair.
    pub fn two_column(
        a: impl Into<String>,
        b: impl Into<String>,
        pairs: impl IntoIterator<Item = (Key, Key)>,
    ) -> Self {
        Relation {
            columns: vec![a.into(), b.into()],
            rows: pairs.into_iter().map(|(x, y)| vec![x, y]).collect(),
        }
    }

    /// An arbitrary-width relation built directly from columns and rows.
    /// Used by operators that bind three variables in one step (e.g.
    /// enumerating `(subject, predicate, object)` edges at once).
    pub fn with_rows(columns: Vec<String>, rows: Vec<Vec<Key>>) -> Self {
        debug_assert!(rows.iter().all(|r| r.len() == columns.len()));
        Relation { columns, rows }
    }

    /// Column names, in the order they were introduced.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// True if this relation has no columns (the join identity).
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Row count.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True if `name` is one of this relation's columns.
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// The distinct values currently bound to column `name`, or empty if the
    /// column does not exist.
    pub fn column_values(&self, name: &str) -> BTreeSet<Key> {
        match self.columns.iter().position(|c| c == name) {
            Some(i) => self.rows.iter().map(|r| r[i]).collect(),
            None => BTreeSet::new(),
        }
    }

    /// Inner equi-join on every column name shared with `other`; columns
    /// unique to either side are unioned into the result. A side with no
    /// columns is the identity and the other side passes through unchanged.
    pub fn join(&self, other: &Relation) -> Relation {
        if self.is_empty() {
            return other.clone();
        }
        if other.is_empty() {
            return self.clone();
        }

        let shared: Vec<(usize, usize)> = self
            .columns
            .iter()
            .enumerate()
            .filter_map(|(i, c)| other.columns.iter().position(|o| o == c).map(|j| (i, j)))
            .collect();
        let other_only: Vec<usize> = (0..other.columns.len())
            .filter(|j| !shared.iter().any(|&(_, oj)| oj == *j))
            .collect();

        let mut columns = self.columns.clone();
        for &j in &other_only {
            columns.push(other.columns[j].clone());
        }

        let mut rows = Vec::new();
        for lrow in &self.rows {
            for rrow in &other.rows {
                if shared.iter().all(|&(li, rj)| lrow[li] == rrow[rj]) {
                    let mut row = lrow.clone();
                    for &j in &other_only {
                        row.push(rrow[j]);
                    }
                    rows.push(row);
                }
            }
        }

        Relation { columns, rows }
    }

    /// Project onto `vars`, deduplicating rows. Panics if a name in `vars`
    /// is not a column — callers only project SELECT variables the planner
    /// has already guaranteed are bound.
    pub fn project(&self, vars: &[String]) -> Vec<Vec<Key>> {
        let idx: Vec<usize> = vars
            .iter()
            .map(|v| {
                self.columns
                    .iter()
                    .position(|c| c == v)
                    .unwrap_or_else(|| panic!("projected variable '{v}' was never bound"))
            })
            .collect();

        let mut seen = BTreeSet::new();
        let mut out = Vec::new();
        for row in &self.rows {
            let projected: Vec<Key> = idx.iter().map(|&i| row[i]).collect();
            if seen.insert(projected.clone()) {
                out.push(projected);
            }
        }
        out
    }

    /// Union two relations that already share the same column set,
    /// deduplicating rows. Used to combine `OR`-branch results.
    pub fn union(branches: impl IntoIterator<Item = Relation>) -> Relation {
        let mut iter = branches.into_iter();
        let Some(first) = iter.next() else {
            return Relation::empty();
        };
        let columns = first.columns.clone();
        let mut rows: Vec<Vec<Key>> = first.rows;
        for branch in iter {
            debug_assert_eq!(branch.columns, columns, "union branches must share a column set");
            rows.extend(branch.rows);
        }
        let mut seen = BTreeSet::new();
        rows.retain(|r| seen.insert(r.clone()));
        Relation { columns, rows }
    }
}
