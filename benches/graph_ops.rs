//! Benchmarks for graph queries and mutations.

use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use rand::{Rng, SeedableRng};

use akh_memory::graph::index::GraphIndex;
use akh_memory::graph::{Entity, Relation};
use akh_memory::{mutation, query};

const ENTITIES: usize = 10_000;
const RELATIONS: usize = 30_000;

fn random_graph() -> GraphIndex {
    let mut rng = rand::rngs::StdRng::seed_from_u64(0);
    let entities: Vec<_> = (0..ENTITIES)
        .map(|i| {
            Entity::new(format!("entity-{i}"), format!("type-{}", i % 16))
                .with_observations([format!("observation {}", rng.gen_range(0..1_000))])
        })
        .collect();
    let relations: Vec<_> = (0..RELATIONS)
        .map(|_| {
            Relation::new(
                format!("entity-{}", rng.gen_range(0..ENTITIES)),
                format!("entity-{}", rng.gen_range(0..ENTITIES)),
                "links",
            )
        })
        .collect();
    GraphIndex::from_records(entities, relations).0
}

fn bench_search(c: &mut Criterion) {
    let graph = random_graph();

    c.bench_function("search_10k_hit", |bench| {
        bench.iter(|| black_box(query::search_nodes(&graph, "OBSERVATION 42")))
    });
    c.bench_function("search_10k_miss", |bench| {
        bench.iter(|| black_box(query::search_nodes(&graph, "nothing matches this")))
    });
}

fn bench_open(c: &mut Criterion) {
    let graph = random_graph();
    let names: Vec<String> = (0..100).map(|i| format!("entity-{}", i * 97)).collect();

    c.bench_function("open_100_of_10k", |bench| {
        bench.iter(|| black_box(query::open_nodes(&graph, &names)))
    });
}

fn bench_create(c: &mut Criterion) {
    let graph = random_graph();
    let batch: Vec<_> = (0..100)
        .map(|i| Entity::new(format!("new-{i}"), "fresh"))
        .collect();

    c.bench_function("create_100_into_10k", |bench| {
        bench.iter_batched(
            || (graph.clone(), batch.clone()),
            |(mut g, b)| black_box(mutation::create_entities(&mut g, b).unwrap()),
            BatchSize::LargeInput,
        )
    });
}

fn bench_cascade(c: &mut Criterion) {
    let graph = random_graph();
    let names: Vec<String> = (0..100).map(|i| format!("entity-{i}")).collect();

    c.bench_function("delete_100_cascade", |bench| {
        bench.iter_batched(
            || graph.clone(),
            |mut g| black_box(mutation::delete_entities(&mut g, &names)),
            BatchSize::LargeInput,
        )
    });
}

criterion_group!(benches, bench_search, bench_open, bench_create, bench_cascade);
criterion_main!(benches);
