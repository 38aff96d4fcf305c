//! The six configuration knobs a deployment tunes (persistence location,
//! ontology reload behaviour, output verbosity, and the two debugging/
//! performance toggles), loaded from a JSON file via `serde`.

use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Engine-wide configuration, deserialisable from a JSON config file.
///
/// There is deliberately no builder: every field is public and every field
/// has a sensible default, so `Config { db_path: "...".into(), ..Default::default() }`
/// is the idiomatic way to override one or two knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory the persistent backends (RocksDB/LMDB) store their files
    /// under. Ignored by [`crate::Engine::in_memory`].
    pub db_path: PathBuf,
    /// Re-run ontology bootstrap (`rdf:type owl:ObjectProperty` /
    /// `owl:inverseOf` detection) against `ontology_files` on open, even if
    /// the store was already populated in a previous run.
    pub reload_ontology: bool,
    /// Dataset files (already in the `{namespaces, triples}` wire format —
    /// Turtle parsing is a caller concern, not this engine's) to bootstrap
    /// ontology declarations from when `reload_ontology` is set.
    pub ontology_files: Vec<PathBuf>,
    /// Render result columns as `prefix:local` using the store's namespace
    /// table instead of full IRIs.
    pub show_namespaces: bool,
    /// Attach the planner's per-step decisions to every [`crate::output::QueryResult`].
    pub query_plan_debug: bool,
    /// Cache `QueryOutcome`s behind an LRU keyed by the exact query text.
    pub query_cache_enabled: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            db_path: PathBuf::from("./hoddb-data"),
            reload_ontology: false,
            ontology_files: Vec::new(),
            show_namespaces: false,
            query_plan_debug: false,
            query_cache_enabled: true,
        }
    }
}

impl Config {
    /// Load configuration from a JSON file, falling back to [`Default`] for
    /// any field the file omits.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| EngineError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| EngineError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }
}
