//! Pluggable ordered key-value storage backends.
//!
//! HodDB's four logical stores (`entities/`, `keys/`, `graph/`, `closure/`)
//! and three side files are all just byte-string maps; this crate supplies
//! the [`StorageBackend`] trait each one is opened against, an in-memory
//! implementation for tests and transient engines, and optional persistent
//! backends (RocksDB, LMDB) behind feature flags. [`Batch`] gives callers
//! the all-or-nothing write semantics the loader needs without requiring a
//! backend-native transaction type.

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod backend;
mod inmemory;
mod transaction;

#[cfg(feature = "rocksdb-backend")]
mod rocksdb_backend;

#[cfg(feature = "lmdb-backend")]
mod lmdb_backend;

pub use backend::{StorageBackend, StorageError, StorageResult, StorageStats};
pub use inmemory::InMemoryBackend;
pub use transaction::Batch;

#[cfg(feature = "rocksdb-backend")]
pub use rocksdb_backend::RocksDbBackend;

#[cfg(feature = "lmdb-backend")]
pub use lmdb_backend::LmdbBackend;
