//! End-to-end throughput of the facade a caller actually drives: load a
//! dataset, then run point and transitive-path queries against it.
//!
//! Run with: cargo bench --bench engine_benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use hoddb::{Config, Dataset, Engine};

fn chain_dataset(length: u32) -> Dataset {
    let bldg = "http://bldg#";
    let bf = "http://brickschema.org/schema/BrickFrame#";
    let triples = (0..length).map(|i| {
        (
            format!("{bldg}node_{i}"),
            format!("{bf}feeds"),
            format!("{bldg}node_{}", i + 1),
        )
    });
    Dataset::from_full_iri_triples(triples)
        .with_namespace("bldg", bldg)
        .with_namespace("bf", bf)
}

fn benchmark_load(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine_load");
    for size in [100, 1_000, 10_000] {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            let dataset = chain_dataset(size);
            b.iter(|| {
                let engine = Engine::in_memory();
                engine.load(black_box(&dataset)).unwrap();
                black_box(engine);
            });
        });
    }
    group.finish();
}

fn benchmark_single_hop_query(c: &mut Criterion) {
    let engine = Engine::in_memory();
    engine.load(&chain_dataset(1_000)).unwrap();

    c.bench_function("single_hop_query", |b| {
        b.iter(|| {
            black_box(
                engine
                    .run_query("SELECT ?x WHERE { bldg:node_0 bf:feeds ?x . }")
                    .unwrap(),
            )
        });
    });
}

fn benchmark_transitive_query(c: &mut Criterion) {
    let engine = Engine::with_config_in_memory(Config { query_cache_enabled: false, ..Config::default() });
    engine.load(&chain_dataset(1_000)).unwrap();

    c.bench_function("transitive_closure_query", |b| {
        b.iter(|| {
            black_box(
                engine
                    .run_query("SELECT ?x WHERE { bldg:node_0 bf:feeds+ ?x . }")
                    .unwrap(),
            )
        });
    });
}

fn benchmark_cached_vs_uncached(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_cache");
    let dataset = chain_dataset(1_000);
    let query = "COUNT ?x WHERE { bldg:node_0 bf:feeds+ ?x . }";

    let cached = Engine::in_memory();
    cached.load(&dataset).unwrap();
    cached.run_query(query).unwrap();
    group.bench_function("cache_hit", |b| {
        b.iter(|| black_box(cached.run_query(query).unwrap()));
    });

    let uncached = Engine::with_config_in_memory(Config { query_cache_enabled: false, ..Config::default() });
    uncached.load(&dataset).unwrap();
    group.bench_function("cache_disabled", |b| {
        b.iter(|| black_box(uncached.run_query(query).unwrap()));
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_load,
    benchmark_single_hop_query,
    benchmark_transitive_query,
    benchmark_cached_vs_uncached,
);
criterion_main!(benches);
