//! # hoddb
//!
//! The embedded RDF/SPARQL-subset query engine this workspace builds,
//! specialised for Brick building-ontology graphs. [`Engine`] is the
//! "core" the top-level design describes: transport wrappers (a CLI, an
//! HTTP shell, a message-bus adapter — the `cli` crate in this workspace
//! is the one actually built) call only [`Engine::load`],
//! [`Engine::update_links`], and [`Engine::run_query`]. Everything below
//! this crate (`graph`'s triple store and traversal primitives, `sparql`'s
//! planner and executor) is already a complete implementation; this crate
//! only composes them behind a small, stable facade and adds the ambient
//! concerns a caller expects from an embedded database: configuration,
//! structured errors, CSV/JSON result formatting, and an optional
//! query-result cache.
//!
//! ```
//! use hoddb::Engine;
//! use graph::Dataset;
//!
//! let engine = Engine::in_memory();
//! let dataset = Dataset::from_full_iri_triples([(
//!     "http://bldg#ahu_1".to_string(),
//!     "http://brickschema.org/schema/Brick#feeds".to_string(),
//!     "http://bldg#vav_1".to_string(),
//! )])
//! .with_namespace("bldg", "http://bldg#")
//! .with_namespace("bf", "http://brickschema.org/schema/Brick#");
//!
//! engine.load(&dataset).unwrap();
//! let result = engine.run_query("SELECT ?x WHERE { bldg:ahu_1 bf:feeds ?x . }").unwrap();
//! assert_eq!(result.row_count(), 1);
//! ```

#![warn(missing_docs, rust_2018_idioms)]

mod cache;
mod config;
mod engine;
mod error;
pub mod output;

pub use config::Config;
pub use engine::Engine;
pub use error::{EngineError, Result};

// Re-exports so a caller can build `Dataset`/`LinkUpdate` values and parse
// query text without depending on `graph`/`sparql` directly.
pub use graph::{Dataset, LinkUpdate};
pub use output::QueryResult;
pub use sparql::QueryOutcome;

/// SDK version, matching the crate's own `Cargo.toml`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Convenience re-exports for a `use hoddb::prelude::*;` import.
pub mod prelude {
    pub use crate::{Config, Engine, EngineError, QueryResult, Result};
    pub use graph::{Dataset, LinkUpdate};
}
