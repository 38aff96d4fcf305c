//! The engine-level error type every public [`crate::Engine`] method
//! returns, composed from the layers below it the same way `graph::GraphError`
//! composes `storage::StorageError` and `sparql::QueryError` composes
//! `graph::GraphError`.

use std::path::PathBuf;

/// Errors an [`crate::Engine`] can return.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A graph-layer failure (storage I/O, corrupt records, unknown keys).
    #[error("graph error: {0}")]
    Graph(#[from] graph::GraphError),
    /// A query-layer failure (parse error, unbound SELECT variable).
    #[error("query error: {0}")]
    Query(#[from] sparql::QueryError),
    /// Could not read a configuration file.
    #[error("failed to read config file {path}: {source}")]
    ConfigIo {
        /// The path that could not be read.
        path: PathBuf,
        /// The underlying I/O failure.
        source: std::io::Error,
    },
    /// A configuration file was not valid JSON, or had fields of the wrong shape.
    #[error("failed to parse config file {path}: {source}")]
    ConfigParse {
        /// The path whose contents failed to parse.
        path: PathBuf,
        /// The underlying deserialisation failure.
        source: serde_json::Error,
    },
    /// A links-update payload was not valid JSON, or had fields of the wrong shape.
    #[error("invalid links-update payload: {0}")]
    InvalidLinkUpdate(String),
    /// `Engine::open` was asked for a backend this build was not compiled with.
    #[error("storage backend '{0}' is not available in this build")]
    UnknownBackend(String),
}

/// Result type for every [`crate::Engine`] operation.
pub type Result<T> = std::result::Result<T, EngineError>;
