//! Errors raised while expanding, planning, or executing a query.

use graph::GraphError;

/// Errors the query layer raises, composed on top of [`GraphError`] so a
/// storage failure surfaces with its kind string intact.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// A parse failure, an undefined prefix, or a pattern shape the planner
    /// cannot place (e.g. a quantified variable predicate).
    #[error("InvalidQuery: {0}")]
    InvalidQuery(String),

    /// Propagated from the graph layer unmodified in kind.
    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Result type for query-layer operations.
pub type Result<T> = std::result::Result<T, QueryError>;
