//! Concurrency tests: many threads sharing one engine must not lose updates.

use std::sync::{Arc, Barrier};
use std::thread;

use akh_memory::config::MemoryConfig;
use akh_memory::engine::MemoryEngine;
use akh_memory::graph::{Entity, ObservationInput, Relation};
use akh_memory::registry::StoreRegistry;

const THREADS: usize = 8;
const ROUNDS: usize = 25;

fn shared_engine(dir: &std::path::Path) -> Arc<MemoryEngine> {
    Arc::new(
        MemoryEngine::open(&MemoryConfig::with_memory_file(dir.join("memory.jsonl"))).unwrap(),
    )
}

#[test]
fn disjoint_add_observations_all_persist() {
    let dir = tempfile::TempDir::new().unwrap();
    let engine = shared_engine(dir.path());
    engine
        .create_entities(
            (0..THREADS)
                .map(|t| Entity::new(format!("entity-{t}"), "Worker"))
                .collect(),
        )
        .unwrap();

    let barrier = Arc::new(Barrier::new(THREADS));
    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let engine = Arc::clone(&engine);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for round in 0..ROUNDS {
                    let outcomes = engine
                        .add_observations(vec![ObservationInput::new(
                            format!("entity-{t}"),
                            [format!("fact {round}")],
                        )])
                        .unwrap();
                    assert!(!outcomes[0].is_failure());
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    // Reopen from disk: the saved state holds every observation.
    let reopened = shared_engine(dir.path());
    let graph = reopened.read_graph().unwrap();
    assert_eq!(graph.entities.len(), THREADS);
    for t in 0..THREADS {
        let entity = graph.entity(&format!("entity-{t}")).unwrap();
        let expected: Vec<String> = (0..ROUNDS).map(|r| format!("fact {r}")).collect();
        assert_eq!(entity.observations, expected);
    }
}

#[test]
fn concurrent_creates_of_the_same_name_create_once() {
    let engine = Arc::new(MemoryEngine::memory_only());
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let engine = Arc::clone(&engine);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                engine
                    .create_entities(vec![
                        Entity::new("Shared", "Node"),
                        Entity::new(format!("own-{t}"), "Node"),
                    ])
                    .unwrap()
            })
        })
        .collect();

    let shared_created: usize = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .map(|created| created.iter().filter(|e| e.name == "Shared").count())
        .sum();
    assert_eq!(shared_created, 1);
    assert_eq!(engine.info().unwrap().entity_count, THREADS + 1);
}

#[test]
fn readers_run_alongside_writers() {
    let dir = tempfile::TempDir::new().unwrap();
    let engine = shared_engine(dir.path());
    engine
        .create_entities(vec![Entity::new("hub", "Hub")])
        .unwrap();

    let writer = {
        let engine = Arc::clone(&engine);
        thread::spawn(move || {
            for i in 0..ROUNDS {
                let name = format!("spoke-{i}");
                engine
                    .create_entities(vec![Entity::new(&name, "Spoke")])
                    .unwrap();
                engine
                    .create_relations(vec![Relation::new("hub", &name, "links")])
                    .unwrap();
            }
        })
    };
    let readers: Vec<_> = (0..4)
        .map(|_| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                for _ in 0..ROUNDS {
                    // Every snapshot is internally consistent.
                    let graph = engine.search_nodes("").unwrap();
                    for r in &graph.relations {
                        assert!(graph.entity(&r.to).is_some());
                    }
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for r in readers {
        r.join().unwrap();
    }
    let graph = engine.read_graph().unwrap();
    assert_eq!(graph.entities.len(), ROUNDS + 1);
    assert_eq!(graph.relations.len(), ROUNDS);
}

#[test]
fn registry_hands_threads_the_same_engine() {
    let dir = tempfile::TempDir::new().unwrap();
    let registry = Arc::new(StoreRegistry::new());
    let path = dir.path().join("memory.jsonl");

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let registry = Arc::clone(&registry);
            let path = path.clone();
            thread::spawn(move || {
                let engine = registry
                    .open(&MemoryConfig::with_memory_file(&path))
                    .unwrap();
                engine
                    .create_entities(vec![Entity::new(format!("from-{t}"), "Thread")])
                    .unwrap();
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(registry.len(), 1);
    registry.close_all().unwrap();

    let reopened = shared_engine(dir.path());
    assert_eq!(reopened.info().unwrap().entity_count, THREADS);
}
