//! Chooses a physical operator for each triple pattern in dependency order.
//!
//! Hod-style query planners describe twelve named operators (resolve-subject,
//! sub-from-var-obj, var-triple-from-predicate, and so on), distinguishing
//! "the value came from the query text" against "the value came from an
//! earlier join". Both cases need the exact same traversal once a candidate
//! key set is in hand, so this planner collapses them to the seven shapes
//! below, each parameterised by a [`Bound`] slot that is either a literal
//! constant or a variable already carrying a candidate set.

use crate::dependency::{DependencyGraph, ResolvedStep, ResolvedTerm, ResolvedTriple};
use crate::error::{QueryError, Result};
use graph::{PathElement, PathPattern};
use rdf_model::Key;
use std::collections::HashSet;

/// A subject/object/predicate slot whose value (or candidate set) is
/// already available when this step runs: either a literal constant from
/// the query text, or a variable bound by an earlier step.
#[derive(Debug, Clone, Copy)]
pub enum Bound {
    /// A literal constant.
    Const(Key),
    /// A variable with an existing candidate set in the query context.
    Var(usize),
}

/// One physical step the executor runs in order.
#[derive(Debug, Clone)]
pub enum PlanStep {
    /// Subject known; walk `path` forward to bind the object.
    Forward { subject: Bound, path: Vec<PathElement>, object_var: usize },
    /// Object known; walk `path` backward to bind the subject.
    Backward { subject_var: usize, path: Vec<PathElement>, object: Bound },
    /// Both subject and object already carry candidate sets; restrict by
    /// walking `path` from the subject side and intersecting with the
    /// object's existing candidates.
    RestrictPair {
        subject: Bound,
        path: Vec<PathElement>,
        object: Bound,
        subject_var: Option<usize>,
        object_var: Option<usize>,
    },
    /// Subject and object both known (single-hop only); bind the connecting
    /// predicate.
    PredicateBetween { subject: Bound, object: Bound, predicate_var: usize },
    /// Neither subject nor object has a prior candidate set: enumerate
    /// every pair the predicate(s) connect — either by walking a ground
    /// path directly, or, when the predicate is itself a bound variable, by
    /// reading the predicate index for each of its candidates.
    PairsFromPredicate {
        predicate: Option<Bound>,
        path_if_ground: Option<Vec<PathElement>>,
        subject_var: usize,
        object_var: usize,
    },
    /// Subject known, predicate and object free: enumerate the subject's
    /// out-edges.
    EdgesFromSubject { subject: Bound, predicate_var: usize, object_var: usize },
    /// Object known, predicate and subject free: enumerate the object's
    /// in-edges.
    EdgesFromObject { object: Bound, predicate_var: usize, subject_var: usize },
}

/// The ordered physical steps for one conjunction of triples.
#[derive(Debug, Clone, Default)]
pub struct Plan {
    /// Steps, in execution order.
    pub steps: Vec<PlanStep>,
}

/// Choose an operator for every triple in `graph.order`. `already_bound`
/// seeds which variables already carry a candidate set — e.g. joined in by
/// an earlier sibling conjunction in the same OR branch.
pub fn plan(
    triples: &[ResolvedTriple],
    graph: &DependencyGraph,
    already_bound: &HashSet<usize>,
) -> Result<Plan> {
    let mut bound = already_bound.clone();
    let mut steps = Vec::with_capacity(graph.order.len());

    for &idx in &graph.order {
        let triple = &triples[idx];
        steps.push(plan_one(triple, &bound)?);

        if let ResolvedTerm::Var(v) = triple.subject {
            bound.insert(v);
        }
        if let ResolvedTerm::Var(v) = triple.object {
            bound.insert(v);
        }
        for s in &triple.path {
            if let ResolvedTerm::Var(v) = s.predicate {
                bound.insert(v);
            }
        }
    }

    Ok(Plan { steps })
}

enum Slot {
    Known(Bound, Option<usize>),
    Free(usize),
}

fn slot(term: ResolvedTerm, bound: &HashSet<usize>) -> Slot {
    match term {
        ResolvedTerm::Const(k) => Slot::Known(Bound::Const(k), None),
        ResolvedTerm::Var(v) if bound.contains(&v) => Slot::Known(Bound::Var(v), Some(v)),
        ResolvedTerm::Var(v) => Slot::Free(v),
    }
}

fn path_elements(path: &[ResolvedStep]) -> Vec<PathElement> {
    path.iter()
        .map(|s| {
            let predicate = match s.predicate {
                ResolvedTerm::Const(k) => k,
                ResolvedTerm::Var(_) => unreachable!("ground path required by resolve_triples"),
            };
            let pattern = match s.quantifier {
                crate::ast::Quantifier::Single => PathPattern::Single,
                crate::ast::Quantifier::ZeroOne => PathPattern::ZeroOne,
                crate::ast::Quantifier::OnePlus => PathPattern::OnePlus,
                crate::ast::Quantifier::ZeroPlus => PathPattern::ZeroPlus,
            };
            PathElement::new(predicate, pattern)
        })
        .collect()
}

/// Whether every step of `path` has a ground (constant) predicate.
fn path_is_ground(path: &[ResolvedStep]) -> bool {
    path.iter().all(|s| matches!(s.predicate, ResolvedTerm::Const(_)))
}

fn plan_one(triple: &ResolvedTriple, bound: &HashSet<usize>) -> Result<PlanStep> {
    let subject_slot = slot(triple.subject, bound);
    let object_slot = slot(triple.object, bound);

    if path_is_ground(&triple.path) {
        let path = path_elements(&triple.path);
        return Ok(match (subject_slot, object_slot) {
            (Slot::Known(subject, _), Slot::Free(object_var)) => PlanStep::Forward { subject, path, object_var },
            (Slot::Free(subject_var), Slot::Known(object, _)) => PlanStep::Backward { subject_var, path, object },
            (Slot::Known(subject, subject_var), Slot::Known(object, object_var)) => PlanStep::RestrictPair {
                subject,
                path,
                object,
                subject_var,
                object_var,
            },
            (Slot::Free(subject_var), Slot::Free(object_var)) => PlanStep::PairsFromPredicate {
                predicate: None,
                path_if_ground: Some(path),
                subject_var,
                object_var,
            },
        });
    }

    // Exactly one path step, with a variable predicate (enforced upstream).
    let predicate_term = triple.path[0].predicate;
    let predicate_slot = slot(predicate_term, bound);

    match (subject_slot, object_slot, predicate_slot) {
        (Slot::Known(subject, _), Slot::Known(object, _), Slot::Free(predicate_var)) => {
            Ok(PlanStep::PredicateBetween { subject, object, predicate_var })
        }
        (Slot::Free(subject_var), Slot::Free(object_var), Slot::Known(predicate, _)) => {
            Ok(PlanStep::PairsFromPredicate { predicate: Some(predicate), path_if_ground: None, subject_var, object_var })
        }
        (Slot::Known(subject, _), Slot::Free(object_var), Slot::Free(predicate_var)) => {
            Ok(PlanStep::EdgesFromSubject { subject, predicate_var, object_var })
        }
        (Slot::Free(subject_var), Slot::Known(object, _), Slot::Free(predicate_var)) => {
            Ok(PlanStep::EdgesFromObject { object, predicate_var, subject_var })
        }
        (Slot::Free(_), Slot::Free(_), Slot::Free(_)) => Err(QueryError::InvalidQuery(
            "unconstrained triple pattern requires at least one bound position".into(),
        )),
        _ => Err(QueryError::InvalidQuery(
            "unsupported combination of bindings for a variable-predicate triple".into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dependency::{self, VariableTable};
    use crate::parser::parse;
    use graph::Dataset;
    use std::collections::HashMap;
    use storage::InMemoryBackend;

    /// `<s> ?p ?o .` must plan to `EdgesFromSubject` with `?p` bound to the
    /// predicate column and `?o` bound to the object column, not transposed.
    #[test]
    fn edges_from_subject_does_not_transpose_predicate_and_object() {
        let store = graph::TripleStore::open(
            InMemoryBackend::new(),
            InMemoryBackend::new(),
            InMemoryBackend::new(),
            InMemoryBackend::new(),
            InMemoryBackend::new(),
        )
        .unwrap();
        let dataset = Dataset::from_full_iri_triples([(
            "http://bldg#ahu_1".to_string(),
            "http://brickschema.org/schema/Brick#feeds".to_string(),
            "http://bldg#vav_1".to_string(),
        )]);
        store.load(&dataset).unwrap();

        let mut namespaces = HashMap::new();
        namespaces.insert("bldg".to_string(), "http://bldg#".to_string());

        let query = parse("SELECT ?p ?o WHERE { bldg:ahu_1 ?p ?o . }").unwrap();
        let mut vars = VariableTable::default();
        for v in &query.select.vars {
            vars.intern(v);
        }
        let resolved = dependency::resolve_triples(
            &query.where_clause.triples,
            &namespaces,
            &mut vars,
            &store,
        )
        .unwrap()
        .unwrap();
        let graph = dependency::build(&resolved);
        let plan = plan(&resolved, &graph, &HashSet::new()).unwrap();

        assert_eq!(plan.steps.len(), 1);
        match &plan.steps[0] {
            PlanStep::EdgesFromSubject { predicate_var, object_var, .. } => {
                assert_eq!(vars.name(*predicate_var), "p");
                assert_eq!(vars.name(*object_var), "o");
            }
            other => panic!("expected EdgesFromSubject, got {other:?}"),
        }
    }
}
