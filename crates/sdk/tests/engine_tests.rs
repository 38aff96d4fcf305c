//! Integration tests against the public [`hoddb::Engine`] facade: load,
//! update-links, and query round-trips, plus the load/idempotence/
//! determinism properties a caller can rely on.

use hoddb::{Config, Dataset, Engine};

fn sample_dataset() -> Dataset {
    Dataset::from_full_iri_triples([
        (
            "http://bldg#room_1".to_string(),
            "http://www.w3.org/1999/02/22-rdf-syntax-ns#type".to_string(),
            "http://brickschema.org/schema/Brick#Room".to_string(),
        ),
        (
            "http://bldg#room_1".to_string(),
            "http://brickschema.org/schema/BrickFrame#isPartOf".to_string(),
            "http://bldg#hvaczone_1".to_string(),
        ),
        (
            "http://bldg#vav_1".to_string(),
            "http://brickschema.org/schema/BrickFrame#feeds".to_string(),
            "http://bldg#hvaczone_1".to_string(),
        ),
    ])
    .with_namespace("bldg", "http://bldg#")
    .with_namespace("rdf", "http://www.w3.org/1999/02/22-rdf-syntax-ns#")
    .with_namespace("brick", "http://brickschema.org/schema/Brick#")
    .with_namespace("bf", "http://brickschema.org/schema/BrickFrame#")
}

#[test]
fn direct_edge_is_queryable_after_load() {
    let engine = Engine::in_memory();
    engine.load(&sample_dataset()).unwrap();

    let result = engine
        .run_query("SELECT ?z WHERE { bldg:vav_1 bf:feeds ?z . }")
        .unwrap();
    assert_eq!(result.rows, vec![vec!["http://bldg#hvaczone_1".to_string()]]);
}

#[test]
fn update_links_adds_a_queryable_edge() {
    let engine = Engine::in_memory();
    engine.load(&sample_dataset()).unwrap();

    let adding = rdf_model::Triple::new(
        rdf_model::Uri::from_full_iri("http://bldg#vav_1"),
        rdf_model::Uri::from_full_iri("http://brickschema.org/schema/BrickFrame#feeds"),
        rdf_model::Uri::from_full_iri("http://bldg#ztemp_1"),
    );
    engine
        .update_links(&hoddb::LinkUpdate { adding: vec![adding], removing: vec![] })
        .unwrap();

    let result = engine
        .run_query("SELECT ?z WHERE { bldg:vav_1 bf:feeds ?z . }")
        .unwrap();
    assert_eq!(result.rows.len(), 2);
}

#[test]
fn update_links_removes_an_edge() {
    let engine = Engine::in_memory();
    engine.load(&sample_dataset()).unwrap();

    let removing = rdf_model::Triple::new(
        rdf_model::Uri::from_full_iri("http://bldg#vav_1"),
        rdf_model::Uri::from_full_iri("http://brickschema.org/schema/BrickFrame#feeds"),
        rdf_model::Uri::from_full_iri("http://bldg#hvaczone_1"),
    );
    engine
        .update_links(&hoddb::LinkUpdate { adding: vec![], removing: vec![removing] })
        .unwrap();

    let result = engine
        .run_query("SELECT ?z WHERE { bldg:vav_1 bf:feeds ?z . }")
        .unwrap();
    assert!(result.rows.is_empty());
}

#[test]
fn count_query_reports_cardinality() {
    let engine = Engine::in_memory();
    engine.load(&sample_dataset()).unwrap();

    let result = engine
        .run_query("COUNT ?x WHERE { ?x rdf:type brick:Room . }")
        .unwrap();
    assert_eq!(result.count, Some(1));
}

#[test]
fn dataset_reload_is_idempotent() {
    let engine = Engine::in_memory();
    let dataset = sample_dataset();
    engine.load(&dataset).unwrap();
    engine.load(&dataset).unwrap();

    let result = engine
        .run_query("COUNT ?z WHERE { bldg:vav_1 bf:feeds ?z . }")
        .unwrap();
    assert_eq!(result.count, Some(1));
}

#[test]
fn repeated_queries_are_deterministic() {
    let engine = Engine::in_memory();
    engine.load(&sample_dataset()).unwrap();

    let first = engine
        .run_query("SELECT ?z WHERE { bldg:vav_1 bf:feeds ?z . }")
        .unwrap();
    let second = engine
        .run_query("SELECT ?z WHERE { bldg:vav_1 bf:feeds ?z . }")
        .unwrap();
    assert_eq!(first, second);
}

#[test]
fn show_namespaces_config_abbreviates_output() {
    let engine = Engine::with_config_in_memory(Config { show_namespaces: true, ..Config::default() });
    engine.load(&sample_dataset()).unwrap();

    let result = engine
        .run_query("SELECT ?z WHERE { bldg:vav_1 bf:feeds ?z . }")
        .unwrap();
    assert_eq!(result.rows, vec![vec!["bldg:hvaczone_1".to_string()]]);
}

#[test]
fn query_cache_disabled_still_returns_correct_results() {
    let engine = Engine::with_config_in_memory(Config { query_cache_enabled: false, ..Config::default() });
    engine.load(&sample_dataset()).unwrap();

    let result = engine
        .run_query("SELECT ?z WHERE { bldg:vav_1 bf:feeds ?z . }")
        .unwrap();
    assert_eq!(result.rows, vec![vec!["http://bldg#hvaczone_1".to_string()]]);
}

#[test]
fn rejects_a_query_referencing_an_undefined_prefix() {
    let engine = Engine::in_memory();
    engine.load(&sample_dataset()).unwrap();

    let err = engine.run_query("SELECT ?x WHERE { nope:thing rdf:type ?x . }");
    assert!(err.is_err());
}

#[test]
fn to_csv_and_to_json_render_select_rows() {
    let engine = Engine::in_memory();
    engine.load(&sample_dataset()).unwrap();

    let result = engine
        .run_query("SELECT ?z WHERE { bldg:vav_1 bf:feeds ?z . }")
        .unwrap();
    assert_eq!(result.to_csv(), "z\nhttp://bldg#hvaczone_1\n");
    assert_eq!(
        result.to_json(),
        serde_json::json!({ "vars": ["z"], "rows": [["http://bldg#hvaczone_1"]] })
    );
}
