//! Result materialisation: resolving a [`sparql::QueryOutcome`]'s raw
//! [`rdf_model::Key`] columns back to display strings, optionally abbreviated
//! to `prefix:local` form, and rendering the result as CSV or JSON.

use graph::Store;
use rdf_model::{Key, Uri};
use sparql::QueryOutcome;
use std::collections::BTreeMap;
use std::fmt::Write as _;

/// A query's materialised, display-ready result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryResult {
    /// Projected variable names, in SELECT-clause order. Empty for `COUNT`.
    pub vars: Vec<String>,
    /// Resolved rows, one string per column, in the same order as `vars`.
    pub rows: Vec<Vec<String>>,
    /// `COUNT`'s cardinality, if this outcome came from a `COUNT` query.
    pub count: Option<usize>,
    /// Per-step planner decisions, attached only when `query_plan_debug` is set.
    pub plan: Option<Vec<String>>,
}

impl QueryResult {
    /// Resolve a raw [`QueryOutcome`] against `store`, abbreviating IRIs to
    /// `prefix:local` using `namespaces` when `show_namespaces` is set.
    pub fn resolve<S: Store>(
        store: &S,
        outcome: QueryOutcome,
        namespaces: &BTreeMap<String, String>,
        show_namespaces: bool,
    ) -> graph::Result<Self> {
        match outcome {
            QueryOutcome::Count(n) => Ok(QueryResult {
                vars: Vec::new(),
                rows: Vec::new(),
                count: Some(n),
                plan: None,
            }),
            QueryOutcome::Rows { vars, rows } => {
                let mut resolved_rows = Vec::with_capacity(rows.len());
                for row in rows {
                    let mut resolved = Vec::with_capacity(row.len());
                    for key in row {
                        let uri = store.resolve(key)?;
                        resolved.push(render_uri(&uri, namespaces, show_namespaces));
                    }
                    resolved_rows.push(resolved);
                }
                Ok(QueryResult { vars, rows: resolved_rows, count: None, plan: None })
            }
        }
    }

    /// Number of result rows (`1` for a `COUNT` outcome, since it is a single
    /// scalar row).
    pub fn row_count(&self) -> usize {
        if self.count.is_some() {
            1
        } else {
            self.rows.len()
        }
    }

    /// Attach planner debug lines (only meaningful when produced under the
    /// `query_plan_debug` knob).
    pub fn with_plan(mut self, plan: Vec<String>) -> Self {
        self.plan = Some(plan);
        self
    }

    /// Render as CSV: a header row of variable names (or `count` for a
    /// `COUNT` outcome) followed by one line per row. Fields are quoted only
    /// when they contain a comma, quote, or newline.
    pub fn to_csv(&self) -> String {
        let mut out = String::new();
        if let Some(n) = self.count {
            out.push_str("count\n");
            let _ = writeln!(out, "{n}");
            return out;
        }

        out.push_str(&self.vars.join(","));
        out.push('\n');
        for row in &self.rows {
            let fields: Vec<String> = row.iter().map(|f| csv_quote(f)).collect();
            out.push_str(&fields.join(","));
            out.push('\n');
        }
        out
    }

    /// Render as a JSON object: `{"vars": [...], "rows": [[...], ...]}` for
    /// row results, or `{"count": n}` for a `COUNT` outcome.
    pub fn to_json(&self) -> serde_json::Value {
        if let Some(n) = self.count {
            return serde_json::json!({ "count": n });
        }
        serde_json::json!({ "vars": self.vars, "rows": self.rows })
    }
}

fn csv_quote(field: &str) -> String {
    if field.contains([',', '"', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Render `uri` as `prefix:local` if `show_namespaces` is set and a prefix
/// matching its namespace exists, else as a full IRI.
fn render_uri(uri: &Uri, namespaces: &BTreeMap<String, String>, show_namespaces: bool) -> String {
    if show_namespaces {
        if let Some(prefix) = namespaces.iter().find(|(_, iri)| iri.as_str() == uri.namespace()).map(|(p, _)| p) {
            return format!("{prefix}:{}", uri.value());
        }
    }
    uri.to_full_iri()
}

/// Resolve a single [`Key`] to its display string, using the same
/// abbreviation rule as [`QueryResult::resolve`]. Exposed for callers (the
/// `repl` and `update-links` CLI commands) that print individual keys
/// outside of a full query result.
pub fn render_key<S: Store>(
    store: &S,
    key: Key,
    namespaces: &BTreeMap<String, String>,
    show_namespaces: bool,
) -> graph::Result<String> {
    let uri = store.resolve(key)?;
    Ok(render_uri(&uri, namespaces, show_namespaces))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_quotes_fields_with_commas() {
        let result = QueryResult {
            vars: vec!["x".into()],
            rows: vec![vec!["has,comma".into()]],
            count: None,
            plan: None,
        };
        assert_eq!(result.to_csv(), "x\n\"has,comma\"\n");
    }

    #[test]
    fn count_outcome_renders_single_row() {
        let result = QueryResult { vars: vec![], rows: vec![], count: Some(4), plan: None };
        assert_eq!(result.row_count(), 1);
        assert_eq!(result.to_csv(), "count\n4\n");
        assert_eq!(result.to_json(), serde_json::json!({ "count": 4 }));
    }

    #[test]
    fn render_uri_abbreviates_when_prefix_matches() {
        let mut ns = BTreeMap::new();
        ns.insert("bf".to_string(), "http://brickschema.org/schema/Brick#".to_string());
        let uri = Uri::from_full_iri("http://brickschema.org/schema/Brick#AHU");
        assert_eq!(render_uri(&uri, &ns, true), "bf:AHU");
        assert_eq!(
            render_uri(&uri, &ns, false),
            "http://brickschema.org/schema/Brick#AHU"
        );
    }

    #[test]
    fn render_uri_falls_back_to_full_iri_without_matching_prefix() {
        let ns = BTreeMap::new();
        let uri = Uri::from_full_iri("http://example.org/Thing");
        assert_eq!(render_uri(&uri, &ns, true), "http://example.org/Thing");
    }
}
