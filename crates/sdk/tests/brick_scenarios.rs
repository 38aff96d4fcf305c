//! Six end-to-end Brick building-ontology scenarios, run against one
//! shared dataset with `bf:feeds`/`bf:isFedBy` declared inverse and
//! transitive.

use hoddb::{Config, Dataset, Engine};
use std::collections::BTreeSet;

fn brick_engine() -> Engine<storage::InMemoryBackend> {
    let engine = Engine::with_config_in_memory(Config { show_namespaces: true, ..Config::default() });

    let bldg = "http://bldg#";
    let brick = "http://brickschema.org/schema/Brick#";
    let bf = "http://brickschema.org/schema/BrickFrame#";
    let rdf = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
    let owl = "http://www.w3.org/2002/07/owl#";

    let dataset = Dataset::from_full_iri_triples([
        (format!("{bldg}room_1"), format!("{rdf}type"), format!("{brick}Room")),
        (format!("{bldg}room_1"), format!("{bf}isPartOf"), format!("{bldg}hvaczone_1")),
        (format!("{bldg}hvaczone_1"), format!("{rdf}type"), format!("{brick}HVAC_Zone")),
        (format!("{bldg}vav_1"), format!("{rdf}type"), format!("{brick}VAV")),
        (format!("{bldg}vav_1"), format!("{bf}feeds"), format!("{bldg}hvaczone_1")),
        (format!("{bldg}ahu_1"), format!("{rdf}type"), format!("{brick}AHU")),
        (format!("{bldg}ahu_1"), format!("{bf}feeds"), format!("{bldg}vav_1")),
        (format!("{bldg}ztemp_1"), format!("{rdf}type"), format!("{brick}Zone_Temperature_Sensor")),
        // Ontology declarations: bf:feeds and bf:isFedBy are both
        // owl:ObjectProperty, and inverses of each other.
        (format!("{bf}feeds"), format!("{rdf}type"), format!("{owl}ObjectProperty")),
        (format!("{bf}isFedBy"), format!("{rdf}type"), format!("{owl}ObjectProperty")),
        (format!("{bf}feeds"), format!("{owl}inverseOf"), format!("{bf}isFedBy")),
    ])
    .with_namespace("bldg", bldg)
    .with_namespace("brick", brick)
    .with_namespace("bf", bf)
    .with_namespace("rdf", rdf)
    .with_namespace("owl", owl);

    engine.load(&dataset).unwrap();
    engine
}

fn rows_as_set(rows: Vec<Vec<String>>) -> BTreeSet<String> {
    rows.into_iter().map(|row| row.join(",")).collect()
}

#[test]
fn scenario_1_select_rooms() {
    let engine = brick_engine();
    let result = engine.run_query("SELECT ?x WHERE { ?x rdf:type brick:Room . }").unwrap();
    assert_eq!(result.rows, vec![vec!["bldg:room_1".to_string()]]);
}

#[test]
fn scenario_2_transitive_feeds_from_ahu() {
    let engine = brick_engine();
    let result = engine
        .run_query("SELECT ?x WHERE { ?a rdf:type brick:AHU . ?a bf:feeds+ ?x . }")
        .unwrap();
    assert_eq!(
        rows_as_set(result.rows),
        BTreeSet::from(["bldg:vav_1".to_string(), "bldg:hvaczone_1".to_string()])
    );
}

#[test]
fn scenario_3_transitive_is_fed_by_matches_scenario_2() {
    let engine = brick_engine();
    let result = engine
        .run_query("SELECT ?x WHERE { ?a rdf:type brick:AHU . ?x bf:isFedBy+ ?a . }")
        .unwrap();
    assert_eq!(
        rows_as_set(result.rows),
        BTreeSet::from(["bldg:vav_1".to_string(), "bldg:hvaczone_1".to_string()])
    );
}

#[test]
fn scenario_4_two_hop_sequence_path() {
    let engine = brick_engine();
    let result = engine
        .run_query("SELECT ?x WHERE { ?a rdf:type brick:AHU . ?a bf:feeds/bf:feeds ?x . }")
        .unwrap();
    assert_eq!(result.rows, vec![vec!["bldg:hvaczone_1".to_string()]]);
}

#[test]
fn scenario_5_joins_vav_feeding_the_room_zone() {
    let engine = brick_engine();
    let result = engine
        .run_query(
            "SELECT ?v ?r WHERE { \
                ?v rdf:type brick:VAV . \
                ?r rdf:type brick:Room . \
                ?z rdf:type brick:HVAC_Zone . \
                ?v bf:feeds+ ?z . \
                ?r bf:isPartOf ?z . \
            }",
        )
        .unwrap();
    assert_eq!(result.rows, vec![vec!["bldg:vav_1".to_string(), "bldg:room_1".to_string()]]);
}

#[test]
fn scenario_6_count_includes_zero_plus_self() {
    let engine = brick_engine();
    let result = engine
        .run_query("COUNT ?x WHERE { ?a rdf:type brick:AHU . ?a bf:feeds* ?x . }")
        .unwrap();
    assert_eq!(result.count, Some(3));
}
