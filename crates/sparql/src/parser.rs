//! Turns query text into the [`crate::ast::Query`] contract via a `pest`
//! grammar rather than a hand-rolled recursive-descent parser.

use crate::ast::{PathStep, Quantifier, Query, Select, Term, Triple, WhereClause};
use crate::error::QueryError;
use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;

#[derive(Parser)]
#[grammar = "grammar.pest"]
struct SparqlParser;

/// Parse query text into a [`Query`] AST. Grammar or shape errors surface as
/// `InvalidQuery`.
pub fn parse(input: &str) -> Result<Query, QueryError> {
    let mut pairs = SparqlParser::parse(Rule::query, input)
        .map_err(|e| QueryError::InvalidQuery(format!("parse error: {e}")))?;
    let query_pair = pairs.next().expect("query rule always present on success");
    parse_query(query_pair)
}

fn parse_query(pair: Pair<Rule>) -> Result<Query, QueryError> {
    let mut inner = pair.into_inner();
    let select_or_count = inner.next().expect("select_or_count");
    let count = matches!(
        select_or_count.into_inner().next().expect("select|count").as_rule(),
        Rule::count_kw
    );

    let varlist_pair = inner.next().expect("varlist");
    let vars: Vec<String> = varlist_pair
        .into_inner()
        .map(|p| var_name(p.as_str()))
        .collect();

    let patterns_pair = inner
        .find(|p| p.as_rule() == Rule::patterns)
        .expect("patterns");
    let where_clause = parse_patterns(patterns_pair)?;

    Ok(Query {
        select: Select {
            vars,
            distinct: true,
            count,
        },
        where_clause,
    })
}

fn parse_patterns(pair: Pair<Rule>) -> Result<WhereClause, QueryError> {
    let mut triples = Vec::new();
    let mut unions = Vec::new();

    for pattern in pair.into_inner() {
        debug_assert_eq!(pattern.as_rule(), Rule::pattern);
        let inner = pattern.into_inner().next().expect("term or group");
        match inner.as_rule() {
            Rule::term => triples.push(parse_term(inner)?),
            Rule::group => {
                if !unions.is_empty() {
                    return Err(QueryError::InvalidQuery(
                        "at most one OR-group is supported per WHERE block".into(),
                    ));
                }
                unions = parse_group(inner)?;
            }
            other => unreachable!("unexpected pattern child {other:?}"),
        }
    }

    Ok(WhereClause { triples, unions })
}

fn parse_group(pair: Pair<Rule>) -> Result<Vec<Vec<Triple>>, QueryError> {
    let mut branches = Vec::new();
    for patterns in pair.into_inner() {
        debug_assert_eq!(patterns.as_rule(), Rule::patterns);
        let branch = parse_patterns(patterns)?;
        if !branch.unions.is_empty() {
            return Err(QueryError::InvalidQuery(
                "nested OR-groups inside an OR branch are not supported".into(),
            ));
        }
        branches.push(branch.triples);
    }
    Ok(branches)
}

fn parse_term(pair: Pair<Rule>) -> Result<Triple, QueryError> {
    let mut inner = pair.into_inner();
    let subject = parse_val(inner.next().expect("subject val"));
    let path_pair = inner.next().expect("path");
    let object = parse_val(inner.next().expect("object val"));

    let path = path_pair
        .into_inner()
        .map(parse_path_elem)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Triple { subject, path, object })
}

fn parse_path_elem(pair: Pair<Rule>) -> Result<PathStep, QueryError> {
    let mut inner = pair.into_inner();
    let name = parse_val(inner.next().expect("name"));
    let quantifier = match inner.next() {
        None => Quantifier::Single,
        Some(q) => match q.as_str() {
            "?" => Quantifier::ZeroOne,
            "+" => Quantifier::OnePlus,
            "*" => Quantifier::ZeroPlus,
            other => return Err(QueryError::InvalidQuery(format!("unknown quantifier '{other}'"))),
        },
    };
    Ok(PathStep {
        predicate: name,
        quantifier,
    })
}

fn parse_val(pair: Pair<Rule>) -> Term {
    let inner = pair.into_inner().next().expect("var|prefixed|iri");
    match inner.as_rule() {
        Rule::var => Term::Var(var_name(inner.as_str())),
        Rule::prefixed => {
            let s = inner.as_str();
            let (prefix, local) = s.split_once(':').expect("prefixed name has a colon");
            Term::Prefixed {
                prefix: prefix.to_string(),
                local: local.to_string(),
            }
        }
        Rule::iri => {
            let s = inner.as_str();
            Term::Iri(s[1..s.len() - 1].to_string())
        }
        other => unreachable!("unexpected val child {other:?}"),
    }
}

fn var_name(raw: &str) -> String {
    raw.trim_start_matches('?').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_select() {
        let q = parse("SELECT ?x WHERE { ?x rdf:type brick:Room . }").unwrap();
        assert!(!q.select.count);
        assert_eq!(q.select.vars, vec!["x"]);
        assert_eq!(q.where_clause.triples.len(), 1);
        assert_eq!(q.where_clause.triples[0].path.len(), 1);
    }

    #[test]
    fn parses_count_and_sequence_path() {
        let q = parse("COUNT ?x WHERE { ?a rdf:type brick:AHU . ?a bf:feeds/bf:feeds ?x . }").unwrap();
        assert!(q.select.count);
        assert_eq!(q.where_clause.triples.len(), 2);
        assert_eq!(q.where_clause.triples[1].path.len(), 2);
    }

    #[test]
    fn parses_quantifiers() {
        let q = parse("SELECT ?x WHERE { ?a bf:feeds+ ?x . }").unwrap();
        assert_eq!(q.where_clause.triples[0].path[0].quantifier, Quantifier::OnePlus);

        let q = parse("SELECT ?x WHERE { ?a bf:feeds* ?x . }").unwrap();
        assert_eq!(q.where_clause.triples[0].path[0].quantifier, Quantifier::ZeroPlus);
    }

    #[test]
    fn parses_full_iri() {
        let q = parse("SELECT ?x WHERE { <http://bldg#ahu_1> <http://bldg#feeds> ?x . }").unwrap();
        match &q.where_clause.triples[0].subject {
            Term::Iri(iri) => assert_eq!(iri, "http://bldg#ahu_1"),
            other => panic!("expected Iri, got {other:?}"),
        }
    }

    #[test]
    fn parses_or_group() {
        let q = parse(
            "SELECT ?x WHERE { { ?x rdf:type brick:Room . } OR { ?x rdf:type brick:Office . } }",
        )
        .unwrap();
        assert_eq!(q.where_clause.unions.len(), 2);
        assert!(q.where_clause.triples.is_empty());
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse("not a query").is_err());
    }
}
