//! The dataset contract handed to the loader by an external RDF parser.

use rdf_model::{Triple, Uri};
use std::collections::HashMap;

/// `{namespaces: prefix→IRI, triples: [(s,p,o)]}` — the only shape the
/// loader depends on from whatever parsed the source RDF.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    /// Prefix-to-IRI bindings declared by the source document.
    pub namespaces: HashMap<String, String>,
    /// The triples to load.
    pub triples: Vec<Triple>,
}

impl Dataset {
    /// An empty dataset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a dataset from full-IRI triples, splitting each into
    /// namespace + local value.
    pub fn from_full_iri_triples(triples: impl IntoIterator<Item = (String, String, String)>) -> Self {
        let triples = triples
            .into_iter()
            .map(|(s, p, o)| {
                Triple::new(
                    Uri::from_full_iri(&s),
                    Uri::from_full_iri(&p),
                    Uri::from_full_iri(&o),
                )
            })
            .collect();
        Dataset {
            namespaces: HashMap::new(),
            triples,
        }
    }

    /// Declare a prefix binding.
    pub fn with_namespace(mut self, prefix: impl Into<String>, iri: impl Into<String>) -> Self {
        self.namespaces.insert(prefix.into(), iri.into());
        self
    }
}
