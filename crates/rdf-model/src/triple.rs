//! An RDF triple over this model's only node type, [`Uri`].

use crate::Uri;
use std::fmt;

/// Subject-predicate-object triple. All three positions are URIs; literals
/// are out of scope for this data model.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Triple {
    /// Subject.
    pub subject: Uri,
    /// Predicate.
    pub predicate: Uri,
    /// Object.
    pub object: Uri,
}

impl Triple {
    /// Build a new triple.
    pub fn new(subject: Uri, predicate: Uri, object: Uri) -> Self {
        Triple {
            subject,
            predicate,
            object,
        }
    }

    /// True if this triple matches a pattern; `None` is a wildcard.
    pub fn matches(&self, subject: Option<&Uri>, predicate: Option<&Uri>, object: Option<&Uri>) -> bool {
        subject.map_or(true, |s| s == &self.subject)
            && predicate.map_or(true, |p| p == &self.predicate)
            && object.map_or(true, |o| o == &self.object)
    }
}

impl fmt::Debug for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} {:?} {:?}", self.subject, self.predicate, self.object)
    }
}

impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
