//! Ontology bootstrap: populate the inverse-predicate table from
//! `rdf:type owl:ObjectProperty` + `owl:inverseOf` declarations.

use crate::dataset::Dataset;
use crate::error::Result;
use crate::identifier::IdentifierService;
use crate::relationship::RelationshipTable;
use rdf_model::{Uri, Vocabulary};
use std::collections::HashSet;
use storage::StorageBackend;

/// Run once per load, before [`crate::store::TripleStore::load`].
///
/// 1. Collects every subject declared `rdf:type owl:ObjectProperty`.
/// 2. For every `(a, owl:inverseOf, b)` where both `a` and `b` are in that
///    set, records `a ↔ b` symmetrically and marks both transitive.
pub fn bootstrap_ontology<B: StorageBackend>(
    dataset: &Dataset,
    identifiers: &IdentifierService<B>,
    relationships: &mut RelationshipTable,
) -> Result<()> {
    let object_properties: HashSet<&Uri> = dataset
        .triples
        .iter()
        .filter(|t| {
            t.predicate.to_full_iri() == Vocabulary::RDF_TYPE
                && t.object.to_full_iri() == Vocabulary::OWL_OBJECT_PROPERTY
        })
        .map(|t| &t.subject)
        .collect();

    for triple in &dataset.triples {
        if triple.predicate.to_full_iri() != Vocabulary::OWL_INVERSE_OF {
            continue;
        }
        if !object_properties.contains(&triple.subject) || !object_properties.contains(&triple.object) {
            continue;
        }
        let a = identifiers.intern(&triple.subject)?;
        let b = identifiers.intern(&triple.object)?;
        relationships.declare_inverse(a, b);
    }

    Ok(())
}
