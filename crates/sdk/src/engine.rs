//! [`Engine`]: the facade a caller embeds. Wraps a [`graph::TripleStore`]
//! with the configuration knobs and the optional query-result cache,
//! and is the only type transport code (this workspace's `cli` crate, or any
//! future HTTP/message-bus shell) needs to know about.

use crate::cache::QueryCache;
use crate::config::Config;
use crate::error::{EngineError, Result};
use crate::output::QueryResult;
use graph::{Dataset, LinkUpdate, Store, TripleStore};
use rdf_model::Uri;
use sparql::{Bound, PlanStep, VariableTable};
use storage::{InMemoryBackend, StorageBackend};
use tracing::instrument;

#[cfg(feature = "rocksdb-backend")]
use storage::RocksDbBackend;
#[cfg(feature = "lmdb-backend")]
use storage::LmdbBackend;

/// The embedded query engine: a [`graph::TripleStore`] over backend `B`,
/// plus the ambient configuration and query cache every public operation
/// consults.
pub struct Engine<B: StorageBackend> {
    store: TripleStore<B>,
    config: Config,
    cache: QueryCache,
}

impl Engine<InMemoryBackend> {
    /// An engine backed entirely by in-memory stores, with default
    /// configuration. The common case for tests and short-lived processes.
    pub fn in_memory() -> Self {
        Engine::with_config_in_memory(Config::default())
    }

    /// An in-memory engine with caller-supplied configuration (e.g. to
    /// exercise `show_namespaces` or `query_plan_debug` without touching
    /// disk).
    pub fn with_config_in_memory(config: Config) -> Self {
        let store = TripleStore::open(
            InMemoryBackend::new(),
            InMemoryBackend::new(),
            InMemoryBackend::new(),
            InMemoryBackend::new(),
            InMemoryBackend::new(),
        )
        .expect("opening in-memory backends cannot fail");
        Engine { store, config, cache: QueryCache::new() }
    }
}

#[cfg(feature = "rocksdb-backend")]
impl Engine<RocksDbBackend> {
    /// Open (or create) a RocksDB-backed engine under `config.db_path`, one
    /// subdirectory per persisted store.
    pub fn open(config: Config) -> Result<Self> {
        let entities = RocksDbBackend::new(config.db_path.join("entities")).map_err(graph::GraphError::from)?;
        let keys = RocksDbBackend::new(config.db_path.join("keys")).map_err(graph::GraphError::from)?;
        let graph_store = RocksDbBackend::new(config.db_path.join("graph")).map_err(graph::GraphError::from)?;
        let closure = RocksDbBackend::new(config.db_path.join("closure")).map_err(graph::GraphError::from)?;
        let side = RocksDbBackend::new(config.db_path.join("side")).map_err(graph::GraphError::from)?;
        let store = TripleStore::open(entities, keys, graph_store, closure, side)?;
        Ok(Engine { store, config, cache: QueryCache::new() })
    }
}

#[cfg(feature = "lmdb-backend")]
impl Engine<LmdbBackend> {
    /// Open (or create) an LMDB-backed engine under `config.db_path`, one
    /// subdirectory per persisted store.
    pub fn open_lmdb(config: Config) -> Result<Self> {
        let entities = LmdbBackend::new(config.db_path.join("entities")).map_err(graph::GraphError::from)?;
        let keys = LmdbBackend::new(config.db_path.join("keys")).map_err(graph::GraphError::from)?;
        let graph_store = LmdbBackend::new(config.db_path.join("graph")).map_err(graph::GraphError::from)?;
        let closure = LmdbBackend::new(config.db_path.join("closure")).map_err(graph::GraphError::from)?;
        let side = LmdbBackend::new(config.db_path.join("side")).map_err(graph::GraphError::from)?;
        let store = TripleStore::open(entities, keys, graph_store, closure, side)?;
        Ok(Engine { store, config, cache: QueryCache::new() })
    }
}

impl<B: StorageBackend> Engine<B> {
    /// The configuration this engine was opened with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The merged namespace table (every prefix declared by a loaded dataset).
    pub fn namespaces(&self) -> std::collections::BTreeMap<String, String> {
        self.store.namespaces()
    }

    /// Load a dataset: ontology bootstrap, adjacency, predicate index, and
    /// closure rematerialisation, all under one call. Invalidates the query
    /// cache, since newly loaded triples can change any cached result.
    #[instrument(skip(self, dataset))]
    pub fn load(&self, dataset: &Dataset) -> Result<()> {
        self.store.load(dataset)?;
        self.cache.clear();
        Ok(())
    }

    /// Apply an incremental links-update batch. Invalidates the query cache.
    #[instrument(skip(self, update))]
    pub fn update_links(&self, update: &LinkUpdate) -> Result<()> {
        self.store.update_links(update)?;
        self.cache.clear();
        Ok(())
    }

    /// Declare a predicate transitive outside of `owl:inverseOf` detection
    /// (e.g. from a standalone ontology-files declaration). Invalidates the
    /// query cache.
    pub fn declare_transitive(&self, predicate: &Uri) -> Result<()> {
        self.store.declare_transitive(predicate)?;
        self.cache.clear();
        Ok(())
    }

    /// Parse and run a query, resolving the result back to display strings
    /// per `config.show_namespaces`. Serves from the query cache when
    /// `config.query_cache_enabled` is set and an identical query text has
    /// already run since the last mutation.
    #[instrument(skip(self, query_text))]
    pub fn run_query(&self, query_text: &str) -> Result<QueryResult> {
        let query = sparql::parse(query_text)?;
        let namespaces = self.store.namespaces();
        let namespaces_map: std::collections::HashMap<String, String> =
            namespaces.iter().map(|(k, v)| (k.clone(), v.clone())).collect();

        let outcome = if self.config.query_cache_enabled {
            match self.cache.get(query_text) {
                Some(cached) => cached,
                None => {
                    let outcome = sparql::execute_query(&self.store, &query, &namespaces_map)?;
                    self.cache.put(query_text, outcome.clone());
                    outcome
                }
            }
        } else {
            sparql::execute_query(&self.store, &query, &namespaces_map)?
        };

        let mut result =
            QueryResult::resolve(&self.store, outcome, &namespaces, self.config.show_namespaces)?;

        if self.config.query_plan_debug {
            result = result.with_plan(self.explain(&query, &namespaces_map)?);
        }

        Ok(result)
    }

    /// Describe the physical plan for `query`'s base conjunction, one line
    /// per step, without executing it. Backs the `query_plan_debug`
    /// configuration knob and the `repl` subcommand's `:explain` command.
    pub fn explain(
        &self,
        query: &sparql::Query,
        namespaces: &std::collections::HashMap<String, String>,
    ) -> Result<Vec<String>> {
        let mut vars = VariableTable::default();
        for v in &query.select.vars {
            vars.intern(v);
        }
        let Some(resolved) =
            sparql::resolve_triples(&query.where_clause.triples, namespaces, &mut vars, &self.store)?
        else {
            return Ok(vec!["unresolved ground term: conjunction is vacuously empty".to_string()]);
        };
        let dependency_graph = sparql::build(&resolved);
        let plan = sparql::plan(&resolved, &dependency_graph, &std::collections::HashSet::new())?;
        Ok(plan.steps.iter().map(describe_step).collect())
    }
}

fn describe_step(step: &PlanStep) -> String {
    fn describe_bound(bound: &Bound) -> String {
        match bound {
            Bound::Const(key) => format!("const({key})"),
            Bound::Var(idx) => format!("var#{idx}"),
        }
    }
    match step {
        PlanStep::Forward { subject, object_var, .. } => {
            format!("forward {} -> var#{object_var}", describe_bound(subject))
        }
        PlanStep::Backward { subject_var, object, .. } => {
            format!("backward var#{subject_var} <- {}", describe_bound(object))
        }
        PlanStep::RestrictPair { subject, object, .. } => {
            format!("restrict-pair {} / {}", describe_bound(subject), describe_bound(object))
        }
        PlanStep::PredicateBetween { subject, object, predicate_var } => {
            format!(
                "predicate-between {} / {} -> var#{predicate_var}",
                describe_bound(subject),
                describe_bound(object)
            )
        }
        PlanStep::PairsFromPredicate { subject_var, object_var, .. } => {
            format!("pairs-from-predicate -> (var#{subject_var}, var#{object_var})")
        }
        PlanStep::EdgesFromSubject { subject, predicate_var, object_var } => {
            format!(
                "edges-from-subject {} -> (var#{predicate_var}, var#{object_var})",
                describe_bound(subject)
            )
        }
        PlanStep::EdgesFromObject { object, predicate_var, subject_var } => {
            format!(
                "edges-from-object {} -> (var#{subject_var}, var#{predicate_var})",
                describe_bound(object)
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loaded_engine() -> Engine<InMemoryBackend> {
        let engine = Engine::in_memory();
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
        ])
        .with_namespace("bldg", "http://bldg#")
        .with_namespace("bf", "http://brickschema.org/schema/Brick#");
        engine.load(&dataset).unwrap();
        engine
    }

    #[test]
    fn run_query_resolves_to_full_iris_by_default() {
        let engine = loaded_engine();
        let result = engine.run_query("SELECT ?x WHERE { bldg:ahu_1 bf:feeds ?x . }").unwrap();
        assert_eq!(result.rows, vec![vec!["http://bldg#vav_1".to_string()]]);
    }

    #[test]
    fn run_query_abbreviates_when_show_namespaces_is_set() {
        let engine = Engine::with_config_in_memory(Config { show_namespaces: true, ..Config::default() });
        let dataset = Dataset::from_full_iri_triples([(
            "http://bldg#ahu_1".to_string(),
            "http://brickschema.org/schema/Brick#feeds".to_string(),
            "http://bldg#vav_1".to_string(),
        )])
        .with_namespace("bldg", "http://bldg#")
        .with_namespace("bf", "http://brickschema.org/schema/Brick#");
        engine.load(&dataset).unwrap();

        let result = engine.run_query("SELECT ?x WHERE { bldg:ahu_1 bf:feeds ?x . }").unwrap();
        assert_eq!(result.rows, vec![vec!["bldg:vav_1".to_string()]]);
    }

    #[test]
    fn query_cache_serves_repeat_queries_after_load() {
        let engine = loaded_engine();
        let first = engine.run_query("COUNT ?x WHERE { bldg:ahu_1 bf:feeds+ ?x . }").unwrap();
        let second = engine.run_query("COUNT ?x WHERE { bldg:ahu_1 bf:feeds+ ?x . }").unwrap();
        assert_eq!(first, second);
        assert_eq!(first.count, Some(2));
    }

    #[test]
    fn update_links_invalidates_cached_transitive_result() {
        let engine = loaded_engine();
        let before = engine.run_query("COUNT ?x WHERE { bldg:ahu_1 bf:feeds+ ?x . }").unwrap();
        assert_eq!(before.count, Some(2));

        let vav = Uri::from_full_iri("http://bldg#vav_1");
        let zone = Uri::from_full_iri("http://bldg#hvaczone_1");
        let feeds = Uri::from_full_iri("http://brickschema.org/schema/Brick#feeds");
        engine
            .update_links(&LinkUpdate {
                adding: vec![],
                removing: vec![rdf_model::Triple::new(vav, feeds, zone)],
            })
            .unwrap();

        let after = engine.run_query("COUNT ?x WHERE { bldg:ahu_1 bf:feeds+ ?x . }").unwrap();
        assert_eq!(after.count, Some(1));
    }

    #[test]
    fn query_plan_debug_attaches_plan_lines() {
        let engine = Engine::with_config_in_memory(Config { query_plan_debug: true, ..Config::default() });
        let dataset = Dataset::from_full_iri_triples([(
            "http://bldg#ahu_1".to_string(),
            "http://brickschema.org/schema/Brick#feeds".to_string(),
            "http://bldg#vav_1".to_string(),
        )])
        .with_namespace("bldg", "http://bldg#")
        .with_namespace("bf", "http://brickschema.org/schema/Brick#");
        engine.load(&dataset).unwrap();

        let result = engine.run_query("SELECT ?x WHERE { bldg:ahu_1 bf:feeds ?x . }").unwrap();
        assert!(result.plan.is_some());
        assert!(!result.plan.unwrap().is_empty());
    }
}
