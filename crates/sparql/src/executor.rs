//! Drives a parsed [`ast::Query`] end to end: prefix expansion, dependency
//! ordering, operator selection, and result materialisation.

use crate::ast::{self, Query};
use crate::context::QueryContext;
use crate::dependency::{self, VariableTable};
use crate::error::{QueryError, Result};
use crate::relation::Relation;
use crate::{operators, planner};
use graph::Store;
use rdf_model::Key;
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::instrument;

/// The materialised result of running a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutcome {
    /// `SELECT` rows, keyed by the projected variable names in declared
    /// order. Still store-internal [`Key`]s; resolving them back to URIs is
    /// the caller's job (it owns the [`Store`] needed to do so).
    Rows { vars: Vec<String>, rows: Vec<Vec<Key>> },
    /// `COUNT`'s distinct-row cardinality.
    Count(usize),
}

/// Run `query` against `store`, expanding `prefix:local` terms against
/// `namespaces`.
#[instrument(skip(store, query, namespaces))]
pub fn execute_query<S: Store>(
    store: &S,
    query: &Query,
    namespaces: &HashMap<String, String>,
) -> Result<QueryOutcome> {
    validate_select_vars(query)?;

    let mut vars = VariableTable::default();
    for v in &query.select.vars {
        vars.intern(v);
    }

    let base = run_conjunction(
        store,
        &query.where_clause.triples,
        namespaces,
        &mut vars,
        QueryContext::new(),
    )?;

    let rows: BTreeSet<Vec<Key>> = match base {
        None => BTreeSet::new(),
        Some(base_ctx) => {
            if query.where_clause.unions.is_empty() {
                project_selected(&base_ctx, &query.select.vars)?.into_iter().collect()
            } else {
                let mut combined = BTreeSet::new();
                for branch in &query.where_clause.unions {
                    let mut seed = QueryContext::new();
                    seed.join_relation(base_ctx.relation().clone());
                    if let Some(ctx) = run_conjunction(store, branch, namespaces, &mut vars, seed)? {
                        combined.extend(project_selected(&ctx, &query.select.vars)?);
                    }
                }
                combined
            }
        }
    };

    if query.select.count {
        return Ok(QueryOutcome::Count(rows.len()));
    }
    Ok(QueryOutcome::Rows {
        vars: query.select.vars.clone(),
        rows: rows.into_iter().collect(),
    })
}

/// Run one conjunction of triples (the shared prefix, or one `OR` branch)
/// against a context that may already carry bindings (`ctx`, e.g. the
/// shared prefix's result when planning a branch). Returns `None` if any
/// ground term failed to resolve, or a fully-ground restriction turned out
/// false — either way the conjunction is vacuously empty.
fn run_conjunction<S: Store>(
    store: &S,
    triples: &[ast::Triple],
    namespaces: &HashMap<String, String>,
    vars: &mut VariableTable,
    mut ctx: QueryContext,
) -> Result<Option<QueryContext>> {
    if triples.is_empty() {
        return Ok(Some(ctx));
    }

    let Some(resolved) = dependency::resolve_triples(triples, namespaces, vars, store)? else {
        return Ok(None);
    };

    let already_bound = bound_var_indices(ctx.relation(), vars);
    let graph = dependency::build(&resolved);
    let plan = planner::plan(&resolved, &graph, &already_bound)?;

    for step in &plan.steps {
        if !operators::execute(store, vars, &mut ctx, step)? {
            return Ok(None);
        }
    }
    Ok(Some(ctx))
}

fn bound_var_indices(relation: &Relation, vars: &VariableTable) -> HashSet<usize> {
    relation.columns().iter().filter_map(|c| vars.get(c)).collect()
}

fn project_selected(ctx: &QueryContext, select_vars: &[String]) -> Result<Vec<Vec<Key>>> {
    for v in select_vars {
        if !ctx.relation().has_column(v) {
            return Err(QueryError::InvalidQuery(format!(
                "selected variable '{v}' is never bound by this branch of the WHERE clause"
            )));
        }
    }
    Ok(ctx.relation().project(select_vars))
}

fn validate_select_vars(query: &Query) -> Result<()> {
    if query.select.vars.is_empty() {
        return Err(QueryError::InvalidQuery("SELECT/COUNT needs at least one variable".into()));
    }
    let mentioned: HashSet<String> = query
        .where_clause
        .triples
        .iter()
        .chain(query.where_clause.unions.iter().flatten())
        .flat_map(triple_var_names)
        .collect();
    for v in &query.select.vars {
        if !mentioned.contains(v) {
            return Err(QueryError::InvalidQuery(format!(
                "selected variable '{v}' does not appear in any WHERE pattern"
            )));
        }
    }
    Ok(())
}

fn triple_var_names(triple: &ast::Triple) -> Vec<String> {
    let mut out = Vec::new();
    if let ast::Term::Var(v) = &triple.subject {
        out.push(v.clone());
    }
    if let ast::Term::Var(v) = &triple.object {
        out.push(v.clone());
    }
    for step in &triple.path {
        if let ast::Term::Var(v) = &step.predicate {
            out.push(v.clone());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use graph::Dataset;
    use storage::InMemoryBackend;

    fn store_with_chain() -> (graph::TripleStore<InMemoryBackend>, HashMap<String, String>) {
        let store = graph::TripleStore::open(
            InMemoryBackend::new(),
            InMemoryBackend::new(),
            InMemoryBackend::new(),
            InMemoryBackend::new(),
            InMemoryBackend::new(),
        )
        .unwrap();

        let dataset = Dataset::from_full_iri_triples([
            (
                "http://bldg#ahu_1".to_string(),
                "http://brickschema.org/schema/Brick#feeds".to_string(),
                "http://bldg#vav_1".to_string(),
            ),
            (
                "http://bldg#vav_1".to_string(),
                "http://brickschema.org/schema/Brick#feeds".to_string(),
                "http://bldg#hvaczone_1".to_string(),
            ),
            (
                "http://bldg#ahu_1".to_string(),
                "http://www.w3.org/1999/02/22-rdf-syntax-ns#type".to_string(),
                "http://brickschema.org/schema/Brick#AHU".to_string(),
            ),
        ]);
        store.load(&dataset).unwrap();

        let mut namespaces = HashMap::new();
        namespaces.insert("bldg".to_string(), "http://bldg#".to_string());
        namespaces.insert("bf".to_string(), "http://brickschema.org/schema/Brick#".to_string());
        namespaces.insert("rdf".to_string(), "http://www.w3.org/1999/02/22-rdf-syntax-ns#".to_string());
        (store, namespaces)
    }

    #[test]
    fn single_hop_select_returns_direct_object() {
        let (store, ns) = store_with_chain();
        let query = parse("SELECT ?x WHERE { bldg:ahu_1 bf:feeds ?x . }").unwrap();
        let outcome = execute_query(&store, &query, &ns).unwrap();
        match outcome {
            QueryOutcome::Rows { rows, .. } => assert_eq!(rows.len(), 1),
            other => panic!("expected Rows, got {other:?}"),
        }
    }

    #[test]
    fn transitive_path_reaches_two_hops() {
        let (store, ns) = store_with_chain();
        let query = parse("SELECT ?x WHERE { bldg:ahu_1 bf:feeds+ ?x . }").unwrap();
        let outcome = execute_query(&store, &query, &ns).unwrap();
        match outcome {
            QueryOutcome::Rows { rows, .. } => assert_eq!(rows.len(), 2),
            other => panic!("expected Rows, got {other:?}"),
        }
    }

    #[test]
    fn count_matches_row_count() {
        let (store, ns) = store_with_chain();
        let query = parse("COUNT ?x WHERE { bldg:ahu_1 bf:feeds+ ?x . }").unwrap();
        let outcome = execute_query(&store, &query, &ns).unwrap();
        assert_eq!(outcome, QueryOutcome::Count(2));
    }

    #[test]
    fn unresolved_constant_yields_empty_result() {
        let (store, ns) = store_with_chain();
        let query = parse("SELECT ?x WHERE { bldg:nonexistent bf:feeds ?x . }").unwrap();
        let outcome = execute_query(&store, &query, &ns).unwrap();
        assert_eq!(outcome, QueryOutcome::Rows { vars: vec!["x".into()], rows: vec![] });
    }

    #[test]
    fn rejects_select_var_never_mentioned() {
        let (store, ns) = store_with_chain();
        let query = parse("SELECT ?z WHERE { bldg:ahu_1 bf:feeds ?x . }").unwrap();
        assert!(execute_query(&store, &query, &ns).is_err());
    }

    #[test]
    fn or_group_unions_both_branches() {
        let (store, ns) = store_with_chain();
        let query = parse(
            "SELECT ?x WHERE { { bldg:ahu_1 bf:feeds ?x . } OR { bldg:vav_1 bf:feeds ?x . } }",
        )
        .unwrap();
        let outcome = execute_query(&store, &query, &ns).unwrap();
        match outcome {
            QueryOutcome::Rows { rows, .. } => assert_eq!(rows.len(), 2),
            other => panic!("expected Rows, got {other:?}"),
        }
    }
}
