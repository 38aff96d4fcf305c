//! The triple store: orchestrates ingestion (intern → adjacency →
//! predicate-index → closure-index) and the links-update protocol over a set
//! of [`StorageBackend`]s, and implements [`GraphView`] / [`Store`] so the
//! planner and executor can traverse what it persists.

use crate::bootstrap::bootstrap_ontology;
use crate::closure_index::ClosureIndexEntry;
use crate::dataset::Dataset;
use crate::entity::Entity;
use crate::error::{GraphError, Result};
use crate::identifier::IdentifierService;
use crate::predicate_index::PredicateIndexEntry;
use crate::relationship::RelationshipTable;
use crate::traversal::GraphView;
use crate::Store;
use parking_lot::RwLock;
use rdf_model::{Key, Triple, Uri};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use storage::{Batch, StorageBackend};
use tracing::{info, instrument};

const PRED_INDEX_KEY: &[u8] = b"predIndex";
const RELSHIP_INDEX_KEY: &[u8] = b"relshipIndex";
const NAMESPACE_INDEX_KEY: &[u8] = b"namespaceIndex";

/// A batch of directed-edge additions and removals, already resolved to
/// [`Uri`] triples.
#[derive(Debug, Clone, Default)]
pub struct LinkUpdate {
    /// Edges to add, each applying the same rules as [`TripleStore::load`].
    pub adding: Vec<Triple>,
    /// Edges to remove from adjacency and the predicate index, in lock-step.
    pub removing: Vec<Triple>,
}

/// The persisted graph index: five ordered key-value stores (`entities`,
/// `keys` — owned by [`IdentifierService`] — plus `graph` and `closure`)
/// and the three small side blobs (`predIndex`, `relshipIndex`,
/// `namespaceIndex`).
pub struct TripleStore<B: StorageBackend> {
    identifiers: IdentifierService<B>,
    graph: RwLock<B>,
    closure: RwLock<B>,
    side: RwLock<B>,
    predicate_index: RwLock<BTreeMap<Key, PredicateIndexEntry>>,
    relationships: RwLock<RelationshipTable>,
    namespaces: RwLock<BTreeMap<String, String>>,
}

impl<B: StorageBackend> TripleStore<B> {
    /// Open a store over five backends, one per persisted store/side-blob
    /// group. Side blobs are hydrated from `side` if present, or start
    /// empty.
    pub fn open(entities: B, keys: B, graph: B, closure: B, side: B) -> Result<Self> {
        let predicate_index = match side.get(PRED_INDEX_KEY)? {
            Some(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| GraphError::Integrity(format!("corrupt predIndex: {e}")))?,
            None => BTreeMap::new(),
        };
        let relationships = match side.get(RELSHIP_INDEX_KEY)? {
            Some(bytes) => RelationshipTable::from_bytes(&bytes)
                .map_err(|e| GraphError::Integrity(format!("corrupt relshipIndex: {e}")))?,
            None => RelationshipTable::new(),
        };
        let namespaces = match side.get(NAMESPACE_INDEX_KEY)? {
            Some(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| GraphError::Integrity(format!("corrupt namespaceIndex: {e}")))?,
            None => BTreeMap::new(),
        };

        Ok(TripleStore {
            identifiers: IdentifierService::new(entities, keys),
            graph: RwLock::new(graph),
            closure: RwLock::new(closure),
            side: RwLock::new(side),
            predicate_index: RwLock::new(predicate_index),
            relationships: RwLock::new(relationships),
            namespaces: RwLock::new(namespaces),
        })
    }

    /// The identifier service backing this store, for callers (the query
    /// planner's constant resolution) that need `intern`/`hash` directly.
    pub fn identifiers(&self) -> &IdentifierService<B> {
        &self.identifiers
    }

    /// A snapshot of the merged namespace table.
    pub fn namespaces(&self) -> BTreeMap<String, String> {
        self.namespaces.read().clone()
    }

    /// Declare `predicate` transitive without an `owl:inverseOf` pair, e.g.
    /// from an external ontology-files declaration.
    pub fn declare_transitive(&self, predicate: &Uri) -> Result<()> {
        let key = self.identifiers.intern(predicate)?;
        self.relationships.write().declare_transitive(key);
        self.persist_relationships()?;
        Ok(())
    }

    /// Load a dataset: ontology bootstrap, then the three ingestion passes
    /// (intern, adjacency + predicate index, closure), under one commit per
    /// persisted store. Any failure aborts before any write lands — passes
    /// build fully in memory and only then call [`Batch::commit`].
    #[instrument(skip(self, dataset), fields(triples = dataset.triples.len()))]
    pub fn load(&self, dataset: &Dataset) -> Result<()> {
        {
            let mut relationships = self.relationships.read().clone();
            bootstrap_ontology(dataset, &self.identifiers, &mut relationships)?;
            *self.relationships.write() = relationships;
            self.persist_relationships()?;
        }

        self.merge_namespaces(&dataset.namespaces)?;

        // Pass 1: interning.
        let relationships = self.relationships.read().clone();
        let mut interned = Vec::with_capacity(dataset.triples.len());
        for triple in &dataset.triples {
            let s = self.identifiers.intern(&triple.subject)?;
            let p = self.identifiers.intern(&triple.predicate)?;
            let o = self.identifiers.intern(&triple.object)?;
            let inverse = relationships.inverse_of(p);
            interned.push((s, p, o, inverse));
        }
        info!(count = interned.len(), "interned triples");

        // Pass 2: adjacency + predicate index, staged in memory.
        let mut entities: HashMap<Key, Entity> = HashMap::new();
        let mut predicate_index = self.predicate_index.read().clone();
        let mut touched_predicates: BTreeSet<Key> = BTreeSet::new();

        for &(s, p, o, inverse) in &interned {
            entities
                .entry(s)
                .or_insert_with(|| self.loaded_entity(s).unwrap_or_else(|| Entity::new(s)))
                .add_out_edge(p, o);
            entities
                .entry(o)
                .or_insert_with(|| self.loaded_entity(o).unwrap_or_else(|| Entity::new(o)))
                .add_in_edge(p, s);
            predicate_index
                .entry(p)
                .or_insert_with(|| PredicateIndexEntry::new(p))
                .add_subject_object(s, o);
            touched_predicates.insert(p);

            if let Some(q) = inverse {
                entities
                    .entry(o)
                    .or_insert_with(|| self.loaded_entity(o).unwrap_or_else(|| Entity::new(o)))
                    .add_out_edge(q, s);
                entities
                    .entry(s)
                    .or_insert_with(|| self.loaded_entity(s).unwrap_or_else(|| Entity::new(s)))
                    .add_in_edge(q, o);
                predicate_index
                    .entry(q)
                    .or_insert_with(|| PredicateIndexEntry::new(q))
                    .add_subject_object(o, s);
                touched_predicates.insert(q);
            }
        }

        let mut batch = Batch::new();
        for entity in entities.values() {
            batch.put(entity.pk().as_bytes().to_vec(), entity.to_bytes());
        }
        batch.commit(&mut *self.graph.write())?;
        *self.predicate_index.write() = predicate_index;
        self.persist_predicate_index()?;

        // Pass 3: closure, committed only after adjacency has landed.
        let transitive: Vec<Key> = touched_predicates
            .into_iter()
            .filter(|p| relationships.is_transitive(*p))
            .collect();
        if !transitive.is_empty() {
            self.rematerialize_closure(&transitive)?;
        }

        Ok(())
    }

    /// Apply a links-update batch: intern endpoints, add/remove edges in
    /// lock-step with the predicate index, then invalidate and
    /// rematerialise the closure for every transitive predicate touched.
    #[instrument(skip(self, update))]
    pub fn update_links(&self, update: &LinkUpdate) -> Result<()> {
        let relationships = self.relationships.read().clone();
        let mut entities: HashMap<Key, Entity> = HashMap::new();
        let mut predicate_index = self.predicate_index.read().clone();
        let mut touched_predicates: BTreeSet<Key> = BTreeSet::new();

        for triple in &update.adding {
            let s = self.identifiers.intern(&triple.subject)?;
            let p = self.identifiers.intern(&triple.predicate)?;
            let o = self.identifiers.intern(&triple.object)?;
            let inverse = relationships.inverse_of(p);

            entities
                .entry(s)
                .or_insert_with(|| self.loaded_entity(s).unwrap_or_else(|| Entity::new(s)))
                .add_out_edge(p, o);
            entities
                .entry(o)
                .or_insert_with(|| self.loaded_entity(o).unwrap_or_else(|| Entity::new(o)))
                .add_in_edge(p, s);
            predicate_index
                .entry(p)
                .or_insert_with(|| PredicateIndexEntry::new(p))
                .add_subject_object(s, o);
            touched_predicates.insert(p);

            if let Some(q) = inverse {
                entities
                    .entry(o)
                    .or_insert_with(|| self.loaded_entity(o).unwrap_or_else(|| Entity::new(o)))
                    .add_out_edge(q, s);
                entities
                    .entry(s)
                    .or_insert_with(|| self.loaded_entity(s).unwrap_or_else(|| Entity::new(s)))
                    .add_in_edge(q, o);
                predicate_index
                    .entry(q)
                    .or_insert_with(|| PredicateIndexEntry::new(q))
                    .add_subject_object(o, s);
                touched_predicates.insert(q);
            }
        }

        for triple in &update.removing {
            let Some(s) = self.identifiers.lookup(&triple.subject)? else {
                continue;
            };
            let Some(p) = self.identifiers.lookup(&triple.predicate)? else {
                continue;
            };
            let Some(o) = self.identifiers.lookup(&triple.object)? else {
                continue;
            };
            let inverse = relationships.inverse_of(p);

            entities
                .entry(s)
                .or_insert_with(|| self.loaded_entity(s).unwrap_or_else(|| Entity::new(s)))
                .remove_out_edge(p, o);
            entities
                .entry(o)
                .or_insert_with(|| self.loaded_entity(o).unwrap_or_else(|| Entity::new(o)))
                .remove_in_edge(p, s);
            if let Some(entry) = predicate_index.get_mut(&p) {
                entry.remove_subject_object(s, o);
            }
            touched_predicates.insert(p);

            if let Some(q) = inverse {
                entities
                    .entry(o)
                    .or_insert_with(|| self.loaded_entity(o).unwrap_or_else(|| Entity::new(o)))
                    .remove_out_edge(q, s);
                entities
                    .entry(s)
                    .or_insert_with(|| self.loaded_entity(s).unwrap_or_else(|| Entity::new(s)))
                    .remove_in_edge(q, o);
                if let Some(entry) = predicate_index.get_mut(&q) {
                    entry.remove_subject_object(o, s);
                }
                touched_predicates.insert(q);
            }
        }

        let mut batch = Batch::new();
        for entity in entities.values() {
            batch.put(entity.pk().as_bytes().to_vec(), entity.to_bytes());
        }
        batch.commit(&mut *self.graph.write())?;
        *self.predicate_index.write() = predicate_index;
        self.persist_predicate_index()?;

        let transitive: Vec<Key> = touched_predicates
            .into_iter()
            .filter(|p| relationships.is_transitive(*p))
            .collect();
        if !transitive.is_empty() {
            self.invalidate_closure(&transitive)?;
            self.rematerialize_closure(&transitive)?;
        }

        Ok(())
    }

    fn loaded_entity(&self, key: Key) -> Option<Entity> {
        self.entity(key).ok().flatten()
    }

    fn persist_predicate_index(&self) -> Result<()> {
        let bytes = serde_json::to_vec(&*self.predicate_index.read())
            .expect("predicate index serialization is infallible");
        self.side.write().put(PRED_INDEX_KEY, &bytes)?;
        Ok(())
    }

    fn persist_relationships(&self) -> Result<()> {
        let bytes = self.relationships.read().to_bytes();
        self.side.write().put(RELSHIP_INDEX_KEY, &bytes)?;
        Ok(())
    }

    fn merge_namespaces(&self, namespaces: &HashMap<String, String>) -> Result<()> {
        if namespaces.is_empty() {
            return Ok(());
        }
        let mut table = self.namespaces.write();
        table.extend(namespaces.iter().map(|(k, v)| (k.clone(), v.clone())));
        let bytes = serde_json::to_vec(&*table).expect("namespace table serialization is infallible");
        drop(table);
        self.side.write().put(NAMESPACE_INDEX_KEY, &bytes)?;
        Ok(())
    }

    /// Discard every closure entry under `predicates`, in memory and on
    /// disk, before rematerialising. A conservative purge-then-rebuild, per
    /// the design note on closure invalidation.
    fn invalidate_closure(&self, predicates: &[Key]) -> Result<()> {
        let all_keys: Vec<Key> = self.all_entity_keys()?;
        let mut batch = Batch::new();
        for key in all_keys {
            if let Some(mut entry) = self.closure(key)? {
                for &p in predicates {
                    entry.invalidate_predicate(p);
                }
                batch.put(key.as_bytes().to_vec(), entry.to_bytes());
            }
        }
        batch.commit(&mut *self.closure.write())
            .map_err(GraphError::from)
    }

    /// Recompute the one-or-more-hop closure for every predicate in
    /// `predicates`, over the full current adjacency, and commit it
    /// atomically after (never before) the adjacency it was derived from.
    fn rematerialize_closure(&self, predicates: &[Key]) -> Result<()> {
        let all_keys = self.all_entity_keys()?;
        let mut entities: HashMap<Key, Entity> = HashMap::with_capacity(all_keys.len());
        for key in &all_keys {
            if let Some(entity) = self.entity(*key)? {
                entities.insert(*key, entity);
            }
        }

        let mut closures: HashMap<Key, ClosureIndexEntry> = HashMap::new();
        for &predicate in predicates {
            for (&key, entity) in &entities {
                let out_reach = reachable(&entities, key, predicate, true);
                if !out_reach.is_empty() {
                    let entry = closures
                        .entry(key)
                        .or_insert_with(|| ClosureIndexEntry::new(key));
                    for r in out_reach {
                        entry.add_out_plus(predicate, r);
                    }
                }
                let in_reach = reachable(&entities, key, predicate, false);
                if !in_reach.is_empty() {
                    let entry = closures
                        .entry(key)
                        .or_insert_with(|| ClosureIndexEntry::new(key));
                    for r in in_reach {
                        entry.add_in_plus(predicate, r);
                    }
                }
                let _ = entity;
            }
        }

        let mut batch = Batch::new();
        for (key, entry) in &closures {
            batch.put(key.as_bytes().to_vec(), entry.to_bytes());
        }
        batch.commit(&mut *self.closure.write()).map_err(GraphError::from)
    }

    fn all_entity_keys(&self) -> Result<Vec<Key>> {
        let guard = self.graph.read();
        let pairs = guard.prefix_scan(&[])?;
        Ok(pairs.map(|(k, _)| Key::from_slice(&k)).collect())
    }
}

/// Reachable set (one-or-more hops) from `start` under `predicate`, walking
/// `entities`' out-adjacency if `forward`, else in-adjacency.
fn reachable(entities: &HashMap<Key, Entity>, start: Key, predicate: Key, forward: bool) -> BTreeSet<Key> {
    let mut seen = BTreeSet::new();
    seen.insert(start);
    let mut stack = vec![start];
    let mut out = BTreeSet::new();
    while let Some(current) = stack.pop() {
        let Some(entity) = entities.get(&current) else {
            continue;
        };
        let neighbors: Vec<Key> = if forward {
            entity.out_neighbors(predicate).collect()
        } else {
            entity.in_neighbors(predicate).collect()
        };
        for neighbor in neighbors {
            out.insert(neighbor);
            if seen.insert(neighbor) {
                stack.push(neighbor);
            }
        }
    }
    out
}

impl<B: StorageBackend> GraphView for TripleStore<B> {
    fn entity(&self, key: Key) -> Result<Option<Entity>> {
        match self.graph.read().get(key.as_bytes())? {
            Some(bytes) => Ok(Some(
                Entity::from_bytes(&bytes).map_err(|e| GraphError::Integrity(format!("corrupt entity record: {e}")))?,
            )),
            None => Ok(None),
        }
    }

    fn closure(&self, key: Key) -> Result<Option<ClosureIndexEntry>> {
        match self.closure.read().get(key.as_bytes())? {
            Some(bytes) => Ok(Some(
                ClosureIndexEntry::from_bytes(&bytes)
                    .map_err(|e| GraphError::Integrity(format!("corrupt closure record: {e}")))?,
            )),
            None => Ok(None),
        }
    }

    fn predicate_index(&self, predicate: Key) -> Result<Option<PredicateIndexEntry>> {
        Ok(self.predicate_index.read().get(&predicate).cloned())
    }
}

impl<B: StorageBackend> Store for TripleStore<B> {
    fn lookup(&self, uri: &Uri) -> Result<Option<Key>> {
        self.identifiers.lookup(uri)
    }

    fn resolve(&self, key: Key) -> Result<Uri> {
        self.identifiers.resolve(key)
    }

    fn inverse_of(&self, predicate: Key) -> Option<Key> {
        self.relationships.read().inverse_of(predicate)
    }

    fn is_transitive(&self, predicate: Key) -> bool {
        self.relationships.read().is_transitive(predicate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::{PathElement, PathPattern};
    use crate::traversal::get_objects_from_subject_pred;
    use rdf_model::Vocabulary;
    use storage::InMemoryBackend;

    fn store() -> TripleStore<InMemoryBackend> {
        TripleStore::open(
            InMemoryBackend::new(),
            InMemoryBackend::new(),
            InMemoryBackend::new(),
            InMemoryBackend::new(),
            InMemoryBackend::new(),
        )
        .unwrap()
    }

    fn brick_fixture() -> Dataset {
        let bldg = "http://bldg#";
        Dataset::from_full_iri_triples([
            (
                format!("{bldg}ahu_1"),
                Vocabulary::RDF_TYPE.to_string(),
                format!("{bldg}AHU"),
            ),
            (
                format!("{bldg}ahu_1"),
                format!("{bldg}feeds"),
                format!("{bldg}vav_1"),
            ),
            (
                format!("{bldg}vav_1"),
                format!("{bldg}feeds"),
                format!("{bldg}hvaczone_1"),
            ),
        ])
        .with_namespace("bldg", bldg)
    }

    fn with_inverse(mut ds: Dataset) -> Dataset {
        let bldg = "http://bldg#";
        ds.triples.push(Triple::new(
            Uri::from_full_iri(&format!("{bldg}feeds")),
            Uri::from_full_iri(Vocabulary::RDF_TYPE),
            Uri::from_full_iri(Vocabulary::OWL_OBJECT_PROPERTY),
        ));
        ds.triples.push(Triple::new(
            Uri::from_full_iri(&format!("{bldg}isFedBy")),
            Uri::from_full_iri(Vocabulary::RDF_TYPE),
            Uri::from_full_iri(Vocabulary::OWL_OBJECT_PROPERTY),
        ));
        ds.triples.push(Triple::new(
            Uri::from_full_iri(&format!("{bldg}feeds")),
            Uri::from_full_iri(Vocabulary::OWL_INVERSE_OF),
            Uri::from_full_iri(&format!("{bldg}isFedBy")),
        ));
        ds
    }

    #[test]
    fn load_then_direct_edge_is_queryable() {
        let s = store();
        let ds = brick_fixture();
        s.load(&ds).unwrap();

        let ahu = s.lookup(&Uri::from_full_iri("http://bldg#ahu_1")).unwrap().unwrap();
        let feeds = s.lookup(&Uri::from_full_iri("http://bldg#feeds")).unwrap().unwrap();
        let vav = s.lookup(&Uri::from_full_iri("http://bldg#vav_1")).unwrap().unwrap();

        let path = [PathElement::new(feeds, PathPattern::Single)];
        let result = get_objects_from_subject_pred(&s, ahu, &path).unwrap();
        assert!(result.contains(&vav));
    }

    #[test]
    fn load_with_inverse_populates_both_directions() {
        let s = store();
        let ds = with_inverse(brick_fixture());
        s.load(&ds).unwrap();

        let ahu = s.lookup(&Uri::from_full_iri("http://bldg#ahu_1")).unwrap().unwrap();
        let vav = s.lookup(&Uri::from_full_iri("http://bldg#vav_1")).unwrap().unwrap();
        let is_fed_by = s
            .lookup(&Uri::from_full_iri("http://bldg#isFedBy"))
            .unwrap()
            .unwrap();

        let path = [PathElement::new(is_fed_by, PathPattern::Single)];
        let result = get_objects_from_subject_pred(&s, vav, &path).unwrap();
        assert!(result.contains(&ahu));
    }

    #[test]
    fn transitive_closure_reaches_two_hops() {
        let s = store();
        let ds = with_inverse(brick_fixture());
        s.load(&ds).unwrap();

        let ahu = s.lookup(&Uri::from_full_iri("http://bldg#ahu_1")).unwrap().unwrap();
        let feeds = s.lookup(&Uri::from_full_iri("http://bldg#feeds")).unwrap().unwrap();
        let vav = s.lookup(&Uri::from_full_iri("http://bldg#vav_1")).unwrap().unwrap();
        let zone = s
            .lookup(&Uri::from_full_iri("http://bldg#hvaczone_1"))
            .unwrap()
            .unwrap();

        let path = [PathElement::new(feeds, PathPattern::OnePlus)];
        let result = get_objects_from_subject_pred(&s, ahu, &path).unwrap();
        assert_eq!(result, BTreeSet::from([vav, zone]));

        // The closure index, not just the online DFS fallback, should have
        // this materialised.
        let closure = s.closure(ahu).unwrap().unwrap();
        assert_eq!(
            closure.out_plus(feeds).unwrap().collect::<BTreeSet<_>>(),
            BTreeSet::from([vav, zone])
        );
    }

    #[test]
    fn update_links_removal_invalidates_closure() {
        let s = store();
        let ds = with_inverse(brick_fixture());
        s.load(&ds).unwrap();

        let vav = Uri::from_full_iri("http://bldg#vav_1");
        let zone = Uri::from_full_iri("http://bldg#hvaczone_1");
        let feeds = Uri::from_full_iri("http://bldg#feeds");

        s.update_links(&LinkUpdate {
            adding: vec![],
            removing: vec![Triple::new(vav.clone(), feeds.clone(), zone.clone())],
        })
        .unwrap();

        let ahu = s.lookup(&Uri::from_full_iri("http://bldg#ahu_1")).unwrap().unwrap();
        let feeds_key = s.lookup(&feeds).unwrap().unwrap();
        let vav_key = s.lookup(&vav).unwrap().unwrap();

        let path = [PathElement::new(feeds_key, PathPattern::OnePlus)];
        let result = get_objects_from_subject_pred(&s, ahu, &path).unwrap();
        assert_eq!(result, BTreeSet::from([vav_key]));
    }

    #[test]
    fn reload_same_dataset_is_idempotent() {
        let s = store();
        let ds = brick_fixture();
        s.load(&ds).unwrap();
        s.load(&ds).unwrap();

        let ahu = s.lookup(&Uri::from_full_iri("http://bldg#ahu_1")).unwrap().unwrap();
        let feeds = s.lookup(&Uri::from_full_iri("http://bldg#feeds")).unwrap().unwrap();
        let entity = s.entity(ahu).unwrap().unwrap();
        assert_eq!(entity.out_neighbors(feeds).count(), 1);
    }
}
