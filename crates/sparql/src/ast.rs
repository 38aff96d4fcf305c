//! The query AST the parser produces: the contract handed to the planner.
//!
//! ```text
//! query       := (SELECT | COUNT) varlist WHERE '{' patterns '}' ';'
//! patterns    := pattern (pattern)*
//! pattern     := term '.' | '{' patterns (OR patterns)* '}'
//! term        := val path val
//! path        := path_elem ('/' path_elem)*
//! path_elem   := name ('?' | '+' | '*')?
//! val         := '?' ident | ident ':' ident | '<' IRI '>'
//! ```

/// A value occupying a subject, predicate, or object slot, before prefix
/// expansion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Term {
    /// `?name`.
    Var(String),
    /// `prefix:local`, resolved against the namespace table at plan time.
    Prefixed {
        /// The declared prefix.
        prefix: String,
        /// The local name.
        local: String,
    },
    /// `<full IRI>`, already fully qualified.
    Iri(String),
}

/// How many hops of a path element's predicate a pattern consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantifier {
    /// Exactly one hop (bare name).
    Single,
    /// Zero or one hop (`?`).
    ZeroOne,
    /// One or more hops (`+`).
    OnePlus,
    /// Zero or more hops (`*`).
    ZeroPlus,
}

/// One segment of a `/`-composed property path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathStep {
    /// The predicate occupying this segment.
    pub predicate: Term,
    /// Its quantifier.
    pub quantifier: Quantifier,
}

/// `subject path object`, i.e. one `term` production.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Triple {
    /// The subject slot.
    pub subject: Term,
    /// One or more `/`-composed path segments.
    pub path: Vec<PathStep>,
    /// The object slot.
    pub object: Term,
}

/// `{ patterns (OR patterns)* }`, flattened to its branches: everything in
/// `triples` is a conjunction; each entry of `unions` is an alternative
/// conjunction joined with the others by union of projected rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WhereClause {
    /// Triple patterns every row of the result must satisfy.
    pub triples: Vec<Triple>,
    /// Alternative branches; each is itself a list of triple patterns
    /// conjoined together. An empty list means no `OR` was present.
    pub unions: Vec<Vec<Triple>>,
}

/// The SELECT/COUNT clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Select {
    /// Projected variable names, in declared order.
    pub vars: Vec<String>,
    /// Whether duplicate rows are suppressed (always true for this subset;
    /// kept explicit since the grammar's `SELECT` always deduplicates at
    /// result-materialisation time).
    pub distinct: bool,
    /// True for `COUNT`, in which case `vars` names the columns whose
    /// distinct-row cardinality is returned, not materialised as URIs.
    pub count: bool,
}

/// A full parsed query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    /// The projection clause.
    pub select: Select,
    /// The WHERE block.
    pub where_clause: WhereClause,
}
