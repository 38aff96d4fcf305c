//! The identifier service: hashes URIs to fixed-width keys, maintains the
//! key↔URI bijection, and resolves hash collisions by salting.

use crate::error::{GraphError, Result};
use lru::LruCache;
use parking_lot::{Mutex, RwLock};
use rdf_model::{hash, Key, Uri};
use rustc_hash::FxHashMap;
use std::num::NonZeroUsize;
use storage::StorageBackend;

/// Default capacity of the bounded uri→key cache (entry count, not bytes —
/// a fixed entry cap is the simplest way to bound the ~16 MiB budget
/// described for typical URI lengths).
const DEFAULT_URI_CACHE_CAPACITY: usize = 65_536;

/// Bidirectional URI↔Key mapping backed by two ordered stores: `entities`
/// (URI bytes → key) and `keys` (key → URI bytes). Satisfies invariant I1:
/// every stored key has exactly one URI and vice versa.
pub struct IdentifierService<B: StorageBackend> {
    entities: RwLock<B>,
    keys: RwLock<B>,
    uri_cache: Mutex<LruCache<Vec<u8>, Key>>,
    key_cache: RwLock<FxHashMap<Key, Uri>>,
}

impl<B: StorageBackend> IdentifierService<B> {
    /// Wrap the two backing stores. `entities` maps canonical URI bytes to
    /// keys; `keys` maps keys back to canonical URI bytes.
    pub fn new(entities: B, keys: B) -> Self {
        Self::with_cache_capacity(entities, keys, DEFAULT_URI_CACHE_CAPACITY)
    }

    /// Same as [`IdentifierService::new`] with an explicit uri→key cache
    /// capacity (entry count).
    pub fn with_cache_capacity(entities: B, keys: B, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap();
        Self {
            entities: RwLock::new(entities),
            keys: RwLock::new(keys),
            uri_cache: Mutex::new(LruCache::new(capacity)),
            key_cache: RwLock::new(FxHashMap::default()),
        }
    }

    /// Pure hash of a URI's canonical bytes with salt 0. Does not touch the
    /// store or caches; use [`IdentifierService::intern`] to get a key that
    /// is actually bound to this URI.
    pub fn hash(&self, uri: &Uri) -> Key {
        hash(&uri.canonical_bytes(), 0)
    }

    /// Idempotently bind `uri` to a key, resolving any collision by
    /// incrementing the salt until a free (or matching) key is found.
    /// Writes the forward map (uri→key) before the reverse map (key→uri),
    /// per the identifier service's write-ordering invariant.
    pub fn intern(&self, uri: &Uri) -> Result<Key> {
        let canonical = uri.canonical_bytes();

        if let Some(key) = self.uri_cache.lock().get(&canonical).copied() {
            return Ok(key);
        }
        if let Some(bytes) = self.entities.read().get(&canonical)? {
            let key = Key::from_slice(&bytes);
            self.cache_both(canonical, key, uri.clone());
            return Ok(key);
        }

        let mut salt: u32 = 0;
        let key = loop {
            let candidate = hash(&canonical, salt);
            if candidate.is_invalid() {
                salt = salt.checked_add(1).ok_or_else(|| {
                    GraphError::Integrity(format!(
                        "salt exhausted interning {:?} without finding a free key",
                        uri
                    ))
                })?;
                continue;
            }
            match self.keys.read().get(candidate.as_bytes())? {
                None => break candidate,
                Some(existing) if existing == canonical => break candidate,
                Some(_) => {
                    salt = salt.checked_add(1).ok_or_else(|| {
                        GraphError::Integrity(format!(
                            "salt exhausted interning {:?} without finding a free key",
                            uri
                        ))
                    })?;
                }
            }
        };

        self.entities.write().put(&canonical, key.as_bytes())?;
        self.keys.write().put(key.as_bytes(), &canonical)?;
        self.cache_both(canonical, key, uri.clone());
        Ok(key)
    }

    /// Look up an already-interned URI without creating one. Unlike
    /// [`IdentifierService::intern`] this never writes to the store; a URI
    /// that was never loaded resolves to `None` rather than a fresh key.
    pub fn lookup(&self, uri: &Uri) -> Result<Option<Key>> {
        let canonical = uri.canonical_bytes();
        if let Some(key) = self.uri_cache.lock().get(&canonical).copied() {
            return Ok(Some(key));
        }
        match self.entities.read().get(&canonical)? {
            Some(bytes) => {
                let key = Key::from_slice(&bytes);
                self.cache_both(canonical, key, uri.clone());
                Ok(Some(key))
            }
            None => Ok(None),
        }
    }

    /// Resolve a key back to the URI it was interned from.
    pub fn resolve(&self, key: Key) -> Result<Uri> {
        if let Some(uri) = self.key_cache.read().get(&key) {
            return Ok(uri.clone());
        }
        let bytes = self
            .keys
            .read()
            .get(key.as_bytes())?
            .ok_or_else(|| GraphError::UnknownKey(key))?;
        let full_iri = String::from_utf8_lossy(&bytes).into_owned();
        let uri = Uri::from_full_iri(&full_iri);
        self.key_cache.write().insert(key, uri.clone());
        Ok(uri)
    }

    fn cache_both(&self, canonical: Vec<u8>, key: Key, uri: Uri) {
        self.uri_cache.lock().put(canonical, key);
        self.key_cache.write().insert(key, uri);
    }
}
