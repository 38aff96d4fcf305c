//! Physical operators: each [`PlanStep`] executed against a [`GraphView`]
//! and folded into a [`QueryContext`].

use crate::context::QueryContext;
use crate::dependency::VariableTable;
use crate::error::Result;
use crate::planner::{Bound, PlanStep};
use crate::relation::Relation;
use graph::{
    get_objects_from_subject_pred, get_predicates_from_subject_object, get_subject_object_from_pred,
    get_subjects_from_pred_object, GraphView,
};
use rdf_model::Key;
use std::collections::BTreeSet;

fn candidates(ctx: &QueryContext, vars: &VariableTable, bound: Bound) -> Vec<Key> {
    match bound {
        Bound::Const(k) => vec![k],
        Bound::Var(idx) => ctx
            .definition(vars.name(idx))
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default(),
    }
}

/// Run one physical step against `view`, folding its output into `ctx`.
/// Returns `false` when the step proves the whole conjunction has no
/// possible bindings (a fully ground pattern that does not hold).
pub fn execute<V: GraphView>(
    view: &V,
    vars: &VariableTable,
    ctx: &mut QueryContext,
    step: &PlanStep,
) -> Result<bool> {
    match step {
        PlanStep::Forward { subject, path, object_var } => {
            let subjects = candidates(ctx, vars, *subject);
            let mut pairs = Vec::new();
            for &s in &subjects {
                for o in get_objects_from_subject_pred(view, s, path)? {
                    pairs.push((s, o));
                }
            }
            let relation = match subject {
                Bound::Const(_) => {
                    Relation::single_column(vars.name(*object_var), pairs.into_iter().map(|(_, o)| o))
                }
                Bound::Var(sv) => Relation::two_column(vars.name(*sv), vars.name(*object_var), pairs),
            };
            ctx.join_relation(relation);
            Ok(true)
        }

        PlanStep::Backward { subject_var, path, object } => {
            let objects = candidates(ctx, vars, *object);
            let mut pairs = Vec::new();
            for &o in &objects {
                for s in get_subjects_from_pred_object(view, o, path)? {
                    pairs.push((s, o));
                }
            }
            let relation = match object {
                Bound::Const(_) => {
                    Relation::single_column(vars.name(*subject_var), pairs.into_iter().map(|(s, _)| s))
                }
                Bound::Var(ov) => Relation::two_column(vars.name(*subject_var), vars.name(*ov), pairs),
            };
            ctx.join_relation(relation);
            Ok(true)
        }

        PlanStep::RestrictPair { subject, path, object, subject_var, object_var } => {
            let subjects = candidates(ctx, vars, *subject);
            let object_set: BTreeSet<Key> = candidates(ctx, vars, *object).into_iter().collect();
            let mut pairs = Vec::new();
            for &s in &subjects {
                for o in get_objects_from_subject_pred(view, s, path)? {
                    if object_set.contains(&o) {
                        pairs.push((s, o));
                    }
                }
            }
            match (subject_var, object_var) {
                (Some(sv), Some(ov)) => {
                    ctx.join_relation(Relation::two_column(vars.name(*sv), vars.name(*ov), pairs));
                }
                (Some(sv), None) => {
                    ctx.join_relation(Relation::single_column(vars.name(*sv), pairs.into_iter().map(|(s, _)| s)));
                }
                (None, Some(ov)) => {
                    ctx.join_relation(Relation::single_column(vars.name(*ov), pairs.into_iter().map(|(_, o)| o)));
                }
                (None, None) => {
                    if pairs.is_empty() {
                        return Ok(false);
                    }
                }
            }
            Ok(true)
        }

        PlanStep::PredicateBetween { subject, object, predicate_var } => {
            let subjects = candidates(ctx, vars, *subject);
            let objects = candidates(ctx, vars, *object);
            let mut predicates = Vec::new();
            for &s in &subjects {
                for &o in &objects {
                    predicates.extend(get_predicates_from_subject_object(view, s, o)?);
                }
            }
            ctx.join_relation(Relation::single_column(vars.name(*predicate_var), predicates));
            Ok(true)
        }

        PlanStep::PairsFromPredicate { predicate, path_if_ground, subject_var, object_var } => {
            let pairs = match path_if_ground {
                Some(path) => get_subject_object_from_pred(view, path)?,
                None => {
                    let predicate = predicate.expect("non-ground predicate steps always carry a Bound");
                    let mut pairs = Vec::new();
                    for p in candidates(ctx, vars, predicate) {
                        if let Some(index) = view.predicate_index(p)? {
                            pairs.extend(index.all_pairs());
                        }
                    }
                    pairs
                }
            };
            ctx.join_relation(Relation::two_column(vars.name(*subject_var), vars.name(*object_var), pairs));
            Ok(true)
        }

        PlanStep::EdgesFromSubject { subject, predicate_var, object_var } => {
            let subjects = candidates(ctx, vars, *subject);
            let mut rows = Vec::new();
            for &s in &subjects {
                if let Some(entity) = view.entity(s)? {
                    for (p, o) in entity.out_edges() {
                        rows.push(match subject {
                            Bound::Const(_) => vec![p, o],
                            Bound::Var(_) => vec![s, p, o],
                        });
                    }
                }
            }
            let columns = match subject {
                Bound::Const(_) => vec![vars.name(*predicate_var).to_string(), vars.name(*object_var).to_string()],
                Bound::Var(sv) => vec![
                    vars.name(*sv).to_string(),
                    vars.name(*predicate_var).to_string(),
                    vars.name(*object_var).to_string(),
                ],
            };
            ctx.join_relation(Relation::with_rows(columns, rows));
            Ok(true)
        }

        PlanStep::EdgesFromObject { object, predicate_var, subject_var } => {
            let objects = candidates(ctx, vars, *object);
            let mut rows = Vec::new();
            for &o in &objects {
                if let Some(entity) = view.entity(o)? {
                    for (p, s) in entity.in_edges() {
                        rows.push(match object {
                            Bound::Const(_) => vec![s, p],
                            Bound::Var(_) => vec![s, p, o],
                        });
                    }
                }
            }
            let columns = match object {
                Bound::Const(_) => vec![vars.name(*subject_var).to_string(), vars.name(*predicate_var).to_string()],
                Bound::Var(ov) => vec![
                    vars.name(*subject_var).to_string(),
                    vars.name(*predicate_var).to_string(),
                    vars.name(*ov).to_string(),
                ],
            };
            ctx.join_relation(Relation::with_rows(columns, rows));
            Ok(true)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graph::{ClosureIndexEntry, Entity, PathElement, PathPattern, PredicateIndexEntry};
    use std::collections::HashMap;

    #[derive(Default)]
    struct FakeGraph {
        entities: HashMap<Key, Entity>,
        predicate_indexes: HashMap<Key, PredicateIndexEntry>,
    }

    impl FakeGraph {
        fn link(&mut self, s: Key, p: Key, o: Key) {
            self.entities.entry(s).or_insert_with(|| Entity::new(s)).add_out_edge(p, o);
            self.entities.entry(o).or_insert_with(|| Entity::new(o)).add_in_edge(p, s);
            self.predicate_indexes
                .entry(p)
                .or_insert_with(|| PredicateIndexEntry::new(p))
                .add_subject_object(s, o);
        }
    }

    impl GraphView for FakeGraph {
        fn entity(&self, key: Key) -> graph::Result<Option<Entity>> {
            Ok(self.entities.get(&key).cloned())
        }
        fn closure(&self, _key: Key) -> graph::Result<Option<ClosureIndexEntry>> {
            Ok(None)
        }
        fn predicate_index(&self, predicate: Key) -> graph::Result<Option<PredicateIndexEntry>> {
            Ok(self.predicate_indexes.get(&predicate).cloned())
        }
    }

    fn k(n: u32) -> Key {
        Key::from_u32(n)
    }

    #[test]
    fn forward_from_constant_subject_binds_object() {
        let mut g = FakeGraph::default();
        g.link(k(1), k(10), k(2));
        let mut vars = VariableTable::default();
        let ov = vars.intern("o");

        let mut ctx = QueryContext::new();
        let step = PlanStep::Forward {
            subject: Bound::Const(k(1)),
            path: vec![PathElement::new(k(10), PathPattern::Single)],
            object_var: ov,
        };
        assert!(execute(&g, &vars, &mut ctx, &step).unwrap());
        assert_eq!(ctx.definition("o"), Some(&BTreeSet::from([k(2)])));
    }

    #[test]
    fn restrict_pair_with_no_variables_signals_unsatisfiable_when_absent() {
        let g = FakeGraph::default();
        let vars = VariableTable::default();
        let mut ctx = QueryContext::new();
        let step = PlanStep::RestrictPair {
            subject: Bound::Const(k(1)),
            path: vec![PathElement::new(k(10), PathPattern::Single)],
            object: Bound::Const(k(2)),
            subject_var: None,
            object_var: None,
        };
        assert!(!execute(&g, &vars, &mut ctx, &step).unwrap());
    }

    #[test]
    fn edges_from_subject_binds_predicate_and_object() {
        let mut g = FakeGraph::default();
        g.link(k(1), k(10), k(2));
        g.link(k(1), k(11), k(3));
        let mut vars = VariableTable::default();
        let pv = vars.intern("p");
        let ov = vars.intern("o");

        let mut ctx = QueryContext::new();
        let step = PlanStep::EdgesFromSubject {
            subject: Bound::Const(k(1)),
            predicate_var: pv,
            object_var: ov,
        };
        assert!(execute(&g, &vars, &mut ctx, &step).unwrap());
        assert_eq!(ctx.definition("p"), Some(&BTreeSet::from([k(10), k(11)])));
        assert_eq!(ctx.definition("o"), Some(&BTreeSet::from([k(2), k(3)])));
    }
}
