//! Quick start example for hoddb.

use hoddb::{Dataset, Engine};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("hoddb quick start");
    println!("==================\n");

    let engine = Engine::in_memory();
    println!("created in-memory engine");

    let dataset = Dataset::from_full_iri_triples([
        (
            "http://bldg#ahu_1".to_string(),
            "http://brickschema.org/schema/Brick#feeds".to_string(),
            "http://bldg#vav_1".to_string(),
        ),
        (
            "http://bldg#vav_1".to_string(),
            "http://brickschema.org/schema/Brick#feeds".to_string(),
            "http://bldg#hvaczone_1".to_string(),
        ),
    ])
    .with_namespace("bldg", "http://bldg#")
    .with_namespace("bf", "http://brickschema.org/schema/Brick#");

    engine.load(&dataset)?;
    println!("loaded {} triples", dataset.triples.len());

    println!("\nquerying what the AHU feeds, transitively:");
    let result = engine.run_query("SELECT ?x WHERE { bldg:ahu_1 bf:feeds+ ?x . }")?;
    for row in &result.rows {
        println!("  ?x = {}", row[0]);
    }
    println!("\n{} row(s) returned", result.row_count());

    Ok(())
}
