//! Property-path patterns: a predicate annotated with a quantifier.

use rdf_model::Key;

/// How many hops of a given predicate a path element consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathPattern {
    /// Exactly one hop.
    Single,
    /// Zero hops (identity) or one hop.
    ZeroOne,
    /// One or more hops.
    OnePlus,
    /// Zero or more hops.
    ZeroPlus,
}

/// A single step of a property path: a predicate with its quantifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathElement {
    /// The predicate's key.
    pub predicate: Key,
    /// The quantifier applied to `predicate`.
    pub pattern: PathPattern,
}

impl PathElement {
    /// Build a path element.
    pub fn new(predicate: Key, pattern: PathPattern) -> Self {
        PathElement { predicate, pattern }
    }
}

/// A sequence of path elements, composed with `/`.
pub type Path = Vec<PathElement>;
