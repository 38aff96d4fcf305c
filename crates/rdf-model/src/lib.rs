//! URI, key, and hashing primitives shared by every HodDB component.
//!
//! This crate deliberately knows nothing about graphs, predicates, or
//! queries — it is the vocabulary the rest of the engine is built from:
//! [`Uri`] (namespace + value, doubling as a query variable when the value
//! starts with `?`), [`Key`] (the fixed-width identifier a `Uri` hashes to),
//! [`hash`] (the salted hash function behind the identifier service), and
//! [`Vocabulary`] (well-known RDF/OWL IRIs the ontology bootstrap matches
//! against).

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod hash;
mod key;
mod triple;
mod uri;
mod vocab;

pub use hash::hash;
pub use key::Key;
pub use triple::Triple;
pub use uri::Uri;
pub use vocab::Vocabulary;

/// Errors raised while constructing or interning model-level values.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// A URI string could not be parsed.
    #[error("invalid URI: {0}")]
    InvalidUri(String),
}

/// Result type for model-level operations.
pub type Result<T> = std::result::Result<T, ModelError>;
