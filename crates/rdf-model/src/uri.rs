//! URIs: the only node type this data model knows about.
//!
//! A [`Uri`] is a `(namespace, value)` pair. Query variables are URIs whose
//! `value` carries a leading `?` and whose `namespace` is empty — they are
//! never interned or hashed, only matched structurally by the planner.

use std::fmt;
use std::sync::Arc;

/// A namespace-qualified name, or a query variable.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Uri {
    namespace: Arc<str>,
    value: Arc<str>,
}

impl Uri {
    /// Build a `Uri` from an explicit namespace and local value.
    pub fn new(namespace: impl Into<Arc<str>>, value: impl Into<Arc<str>>) -> Self {
        Uri {
            namespace: namespace.into(),
            value: value.into(),
        }
    }

    /// Build a query variable (e.g. for `?x`, pass `"x"` or `"?x"`).
    pub fn variable(name: impl AsRef<str>) -> Self {
        let name = name.as_ref();
        let value = if let Some(stripped) = name.strip_prefix('?') {
            stripped
        } else {
            name
        };
        Uri {
            namespace: Arc::from(""),
            value: Arc::from(format!("?{value}")),
        }
    }

    /// Split a full IRI on the last `#` or `/` into namespace and local value.
    pub fn from_full_iri(iri: &str) -> Self {
        let split_at = iri.rfind(['#', '/']).map(|i| i + 1);
        match split_at {
            Some(i) if i < iri.len() => Uri::new(&iri[..i], &iri[i..]),
            _ => Uri::new("", iri),
        }
    }

    /// The namespace component (empty for variables).
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The local value component. Carries a leading `?` for variables.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// True if this URI denotes a query variable rather than a concrete name.
    pub fn is_variable(&self) -> bool {
        self.value.starts_with('?')
    }

    /// The variable name without its leading `?`, if this is a variable.
    pub fn variable_name(&self) -> Option<&str> {
        self.is_variable().then(|| &self.value[1..])
    }

    /// Concatenate namespace and value into the full IRI string.
    pub fn to_full_iri(&self) -> String {
        format!("{}{}", self.namespace, self.value)
    }

    /// Canonical byte form used as input to the identifier hash.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        self.to_full_iri().into_bytes()
    }
}

impl fmt::Debug for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_variable() {
            write!(f, "{}", self.value)
        } else {
            write!(f, "<{}{}>", self.namespace, self.value)
        }
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
