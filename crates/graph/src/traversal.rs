//! Path-pattern traversal primitives: pure functions of the store that walk
//! adjacency (falling back to online DFS when no closure entry is cached)
//! and back the planner's physical operators.

use crate::closure_index::ClosureIndexEntry;
use crate::entity::Entity;
use crate::error::Result;
use crate::path::{PathElement, PathPattern};
use crate::predicate_index::PredicateIndexEntry;
use rdf_model::Key;
use rustc_hash::FxHashSet;
use std::collections::BTreeSet;

/// Read-only access to the persisted graph, as needed by traversal. The
/// loader's [`crate::store::TripleStore`] is the production implementation;
/// tests may supply a lighter in-memory stand-in.
pub trait GraphView {
    /// The entity record for `key`, if one has been created.
    fn entity(&self, key: Key) -> Result<Option<Entity>>;

    /// The closure-index record for `key`, if materialised.
    fn closure(&self, key: Key) -> Result<Option<ClosureIndexEntry>>;

    /// The predicate-index record for `predicate`, if materialised.
    fn predicate_index(&self, predicate: Key) -> Result<Option<PredicateIndexEntry>>;
}

/// Which adjacency direction a step walks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Out,
    In,
}

/// One or more hops of `predicate`, starting from (but not including, unless
/// reached again via a cycle) `start`. Uses the closure index when present;
/// otherwise runs an online DFS with a visited-set, which always terminates
/// even on cyclic adjacency.
fn one_plus_reachable<V: GraphView>(
    view: &V,
    start: Key,
    predicate: Key,
    direction: Direction,
) -> Result<BTreeSet<Key>> {
    if let Some(closure) = view.closure(start)? {
        let cached = match direction {
            Direction::Out => closure.out_plus(predicate).map(|it| it.collect()),
            Direction::In => closure.in_plus(predicate).map(|it| it.collect()),
        };
        if let Some(reachable) = cached {
            return Ok(reachable);
        }
    }

    let mut seen: FxHashSet<Key> = FxHashSet::default();
    seen.insert(start);
    let mut stack = vec![start];
    let mut reachable = BTreeSet::new();

    while let Some(current) = stack.pop() {
        let Some(entity) = view.entity(current)? else {
            continue;
        };
        let neighbors: Vec<Key> = match direction {
            Direction::Out => entity.out_neighbors(predicate).collect(),
            Direction::In => entity.in_neighbors(predicate).collect(),
        };
        for neighbor in neighbors {
            reachable.insert(neighbor);
            if seen.insert(neighbor) {
                stack.push(neighbor);
            }
        }
    }

    Ok(reachable)
}

/// One step of a path: given the current frontier, returns the frontier
/// after consuming `element` in `direction`.
fn step<V: GraphView>(
    view: &V,
    frontier: &BTreeSet<Key>,
    element: &PathElement,
    direction: Direction,
) -> Result<BTreeSet<Key>> {
    let direct_neighbors = |key: Key| -> Result<Vec<Key>> {
        Ok(match view.entity(key)? {
            Some(entity) => match direction {
                Direction::Out => entity.out_neighbors(element.predicate).collect(),
                Direction::In => entity.in_neighbors(element.predicate).collect(),
            },
            None => Vec::new(),
        })
    };

    match element.pattern {
        PathPattern::Single => {
            let mut next = BTreeSet::new();
            for &key in frontier {
                next.extend(direct_neighbors(key)?);
            }
            Ok(next)
        }
        PathPattern::ZeroOne => {
            let mut next = frontier.clone();
            for &key in frontier {
                next.extend(direct_neighbors(key)?);
            }
            Ok(next)
        }
        PathPattern::OnePlus => {
            let mut next = BTreeSet::new();
            for &key in frontier {
                next.extend(one_plus_reachable(view, key, element.predicate, direction)?);
            }
            Ok(next)
        }
        PathPattern::ZeroPlus => {
            let mut next = frontier.clone();
            for &key in frontier {
                next.extend(one_plus_reachable(view, key, element.predicate, direction)?);
            }
            Ok(next)
        }
    }
}

/// Run `path` from `start` in `direction`, threading the frontier through
/// each element in sequence (`/`-composition).
fn follow_path<V: GraphView>(
    view: &V,
    start: Key,
    path: &[PathElement],
    direction: Direction,
) -> Result<BTreeSet<Key>> {
    let mut frontier = BTreeSet::new();
    frontier.insert(start);
    for element in path {
        frontier = step(view, &frontier, element, direction)?;
    }
    Ok(frontier)
}

/// Object keys reachable from `subject` by following `path` over the
/// out-adjacency.
pub fn get_objects_from_subject_pred<V: GraphView>(
    view: &V,
    subject: Key,
    path: &[PathElement],
) -> Result<BTreeSet<Key>> {
    follow_path(view, subject, path, Direction::Out)
}

/// Subject keys that reach `object` by following `path` over the
/// in-adjacency (the symmetric reverse of
/// [`get_objects_from_subject_pred`]).
pub fn get_subjects_from_pred_object<V: GraphView>(
    view: &V,
    object: Key,
    path: &[PathElement],
) -> Result<BTreeSet<Key>> {
    follow_path(view, object, path, Direction::In)
}

/// Every `(subject, object)` pair connected by `path`. For a single
/// `single`-patterned predicate this reads the predicate index directly;
/// otherwise it expands the path from every subject with at least one edge
/// under the path's first predicate.
pub fn get_subject_object_from_pred<V: GraphView>(
    view: &V,
    path: &[PathElement],
) -> Result<Vec<(Key, Key)>> {
    if let [element] = path {
        if element.pattern == PathPattern::Single {
            return Ok(match view.predicate_index(element.predicate)? {
                Some(index) => index.all_pairs().collect(),
                None => Vec::new(),
            });
        }
    }

    let Some(first) = path.first() else {
        return Ok(Vec::new());
    };
    let candidate_subjects: Vec<Key> = match view.predicate_index(first.predicate)? {
        Some(index) => index.subjects().collect(),
        None => Vec::new(),
    };

    let mut pairs = Vec::new();
    for subject in candidate_subjects {
        for object in get_objects_from_subject_pred(view, subject, path)? {
            pairs.push((subject, object));
        }
    }
    Ok(pairs)
}

/// Predicate keys under which `subject` reaches `object` directly.
pub fn get_predicates_from_subject_object<V: GraphView>(
    view: &V,
    subject: Key,
    object: Key,
) -> Result<Vec<Key>> {
    Ok(match view.entity(subject)? {
        Some(entity) => entity
            .out_edges()
            .filter(|(_, neighbor)| *neighbor == object)
            .map(|(predicate, _)| predicate)
            .collect(),
        None => Vec::new(),
    })
}

/// Predicate keys under which `subject` has at least one out-edge.
pub fn get_predicates_from_subject<V: GraphView>(view: &V, subject: Key) -> Result<Vec<Key>> {
    Ok(match view.entity(subject)? {
        Some(entity) => entity.out_predicates().collect(),
        None => Vec::new(),
    })
}

/// Predicate keys under which `object` has at least one in-edge.
pub fn get_predicates_from_object<V: GraphView>(view: &V, object: Key) -> Result<Vec<Key>> {
    Ok(match view.entity(object)? {
        Some(entity) => entity.in_predicates().collect(),
        None => Vec::new(),
    })
}
