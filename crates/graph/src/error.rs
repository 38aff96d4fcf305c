//! Error kinds raised by the identifier service, loader, and graph index.

use storage::StorageError;

/// Errors the graph layer raises. These map 1:1 onto the core error kinds
/// the engine surfaces to callers; the kind string in each variant's
/// `Display` output is what transport wrappers key protocol statuses off.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// Lookup miss resolving a URI that was never interned.
    #[error("UnknownURI: {0}")]
    UnknownUri(String),

    /// Lookup miss resolving a key that was never bound.
    #[error("UnknownKey: {0}")]
    UnknownKey(rdf_model::Key),

    /// The underlying key-value store failed.
    #[error("StorageError: {0}")]
    Storage(#[from] StorageError),

    /// A structural invariant would be violated, e.g. salt exhaustion on a
    /// collision that can never resolve to a free key.
    #[error("IntegrityError: {0}")]
    Integrity(String),
}

/// Result type for graph-layer operations.
pub type Result<T> = std::result::Result<T, GraphError>;
