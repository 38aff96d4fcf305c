//! Prefix expansion, constant resolution, and the dependency graph that
//! orders a conjunction's triple patterns for evaluation.

use crate::ast::{self, Quantifier};
use crate::error::{QueryError, Result};
use graph::Store;
use rdf_model::{Key, Uri};
use std::collections::{BTreeSet, HashMap};

/// A subject/predicate/object slot after prefix expansion and constant
/// lookup: either still a free variable, or a concrete key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedTerm {
    /// `?name`, resolved to a position in `variables`.
    Var(usize),
    /// A constant already resolved to its key.
    Const(Key),
}

/// One step of a resolved property path.
#[derive(Debug, Clone)]
pub struct ResolvedStep {
    /// The predicate occupying this step.
    pub predicate: ResolvedTerm,
    /// Its quantifier.
    pub quantifier: Quantifier,
}

/// A triple pattern with every position resolved.
#[derive(Debug, Clone)]
pub struct ResolvedTriple {
    /// The subject slot.
    pub subject: ResolvedTerm,
    /// One or more path steps.
    pub path: Vec<ResolvedStep>,
    /// The object slot.
    pub object: ResolvedTerm,
}

impl ResolvedTriple {
    /// Every variable this triple pattern mentions, by index.
    fn variables(&self) -> impl Iterator<Item = usize> + '_ {
        let subj = matches!(self.subject, ResolvedTerm::Var(_)).then_some(self.subject);
        let obj = matches!(self.object, ResolvedTerm::Var(_)).then_some(self.object);
        let preds = self.path.iter().filter_map(|s| {
            matches!(s.predicate, ResolvedTerm::Var(_)).then_some(s.predicate)
        });
        subj.into_iter()
            .chain(obj)
            .chain(preds)
            .map(|t| match t {
                ResolvedTerm::Var(i) => i,
                ResolvedTerm::Const(_) => unreachable!(),
            })
    }
}

/// Interns the name of every `?var` in `triples` to a stable index, in
/// first-appearance order.
#[derive(Debug, Default)]
pub struct VariableTable {
    names: Vec<String>,
    index: HashMap<String, usize>,
}

impl VariableTable {
    /// The index assigned to `name`, interning it if new.
    pub fn intern(&mut self, name: &str) -> usize {
        if let Some(&i) = self.index.get(name) {
            return i;
        }
        let i = self.names.len();
        self.names.push(name.to_string());
        self.index.insert(name.to_string(), i);
        i
    }

    /// The name assigned to `index`.
    pub fn name(&self, index: usize) -> &str {
        &self.names[index]
    }

    /// The index already assigned to `name`, if any.
    pub fn get(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }
}

/// Expand prefixes and resolve every constant in `triples` against `store`.
/// Returns `Ok(None)` when a constant never resolves to an interned key —
/// the whole conjunction is then vacuously empty rather than an error.
pub fn resolve_triples(
    triples: &[ast::Triple],
    namespaces: &HashMap<String, String>,
    variables: &mut VariableTable,
    store: &impl Store,
) -> Result<Option<Vec<ResolvedTriple>>> {
    let mut out = Vec::with_capacity(triples.len());
    for triple in triples {
        let Some(subject) = resolve_term(&triple.subject, namespaces, variables, store)? else {
            return Ok(None);
        };
        let Some(object) = resolve_term(&triple.object, namespaces, variables, store)? else {
            return Ok(None);
        };

        if triple.path.is_empty() {
            return Err(QueryError::InvalidQuery("triple pattern has no path".into()));
        }
        let needs_ground_predicate = triple.path.len() > 1
            || triple.path.iter().any(|s| s.quantifier != Quantifier::Single);
        if needs_ground_predicate {
            for step in &triple.path {
                if matches!(step.predicate, ast::Term::Var(_)) {
                    return Err(QueryError::InvalidQuery(
                        "a variable predicate must be a single unquantified step".into(),
                    ));
                }
            }
        }

        let mut path = Vec::with_capacity(triple.path.len());
        for step in &triple.path {
            let Some(predicate) = resolve_term(&step.predicate, namespaces, variables, store)? else {
                return Ok(None);
            };
            path.push(ResolvedStep {
                predicate,
                quantifier: step.quantifier,
            });
        }

        out.push(ResolvedTriple { subject, path, object });
    }
    Ok(Some(out))
}

fn resolve_term(
    term: &ast::Term,
    namespaces: &HashMap<String, String>,
    variables: &mut VariableTable,
    store: &impl Store,
) -> Result<Option<ResolvedTerm>> {
    match term {
        ast::Term::Var(name) => Ok(Some(ResolvedTerm::Var(variables.intern(name)))),
        ast::Term::Iri(iri) => match store.lookup(&Uri::from_full_iri(iri))? {
            Some(key) => Ok(Some(ResolvedTerm::Const(key))),
            None => Ok(None),
        },
        ast::Term::Prefixed { prefix, local } => {
            let ns = namespaces
                .get(prefix)
                .ok_or_else(|| QueryError::InvalidQuery(format!("undefined prefix '{prefix}'")))?;
            match store.lookup(&Uri::new(ns.clone(), local.clone()))? {
                Some(key) => Ok(Some(ResolvedTerm::Const(key))),
                None => Ok(None),
            }
        }
    }
}

/// A legal evaluation order over a set of resolved triple patterns: terms
/// with at most one still-unresolved variable are placed first; the rest
/// wait until earlier placements bind enough of their variables.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    /// Indices into the original triple list, in evaluation order.
    pub order: Vec<usize>,
}

/// Build the dependency graph over `triples`' variables.
pub fn build(triples: &[ResolvedTriple]) -> DependencyGraph {
    let n = triples.len();
    let mut remaining: Vec<usize> = (0..n).collect();
    let mut bound: BTreeSet<usize> = BTreeSet::new();
    let mut order = Vec::with_capacity(n);

    while !remaining.is_empty() {
        let unresolved_count = |idx: usize| -> usize {
            triples[idx].variables().filter(|v| !bound.contains(v)).count()
        };

        let mut ready: Vec<usize> = remaining.iter().copied().filter(|&i| unresolved_count(i) <= 1).collect();
        if ready.is_empty() {
            // No term is independently plannable (every remaining term has
            // 2+ unresolved variables with no prior term binding any of
            // them). Fall back to the term with the fewest unresolved
            // variables to make progress; this only arises for genuinely
            // disconnected or fully unconstrained WHERE blocks.
            let pick = *remaining
                .iter()
                .min_by_key(|&&i| unresolved_count(i))
                .expect("remaining is non-empty");
            ready.push(pick);
        }

        for &idx in &ready {
            for v in triples[idx].variables() {
                bound.insert(v);
            }
        }
        order.extend(ready.iter().copied());
        remaining.retain(|i| !ready.contains(i));
    }

    DependencyGraph { order }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(i: usize) -> ResolvedTerm {
        ResolvedTerm::Var(i)
    }
    fn konst(n: u32) -> ResolvedTerm {
        ResolvedTerm::Const(Key::from_u32(n))
    }
    fn single(predicate: ResolvedTerm) -> Vec<ResolvedStep> {
        vec![ResolvedStep {
            predicate,
            quantifier: Quantifier::Single,
        }]
    }

    #[test]
    fn roots_before_dependents() {
        // t0: ?a rdf:type brick:AHU   -> 1 unresolved var (a)
        // t1: ?a bf:feeds+ ?x         -> 2 unresolved vars until a is bound
        let t0 = ResolvedTriple {
            subject: var(0),
            path: single(konst(1)),
            object: konst(2),
        };
        let t1 = ResolvedTriple {
            subject: var(0),
            path: single(konst(3)),
            object: var(1),
        };
        let graph = build(&[t0, t1]);
        assert_eq!(graph.order, vec![0, 1]);
    }

    #[test]
    fn independent_roots_keep_declared_order() {
        let t0 = ResolvedTriple {
            subject: var(0),
            path: single(konst(1)),
            object: konst(2),
        };
        let t1 = ResolvedTriple {
            subject: var(1),
            path: single(konst(1)),
            object: konst(3),
        };
        let graph = build(&[t0, t1]);
        assert_eq!(graph.order, vec![0, 1]);
    }
}
