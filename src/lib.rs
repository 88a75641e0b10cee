// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # akh-memory
//!
//! A persistent knowledge graph memory: named entities with typed observations,
//! connected by typed relations, stored as a JSON Lines file.
//!
//! ## Architecture
//!
//! - **Data model** (`graph`): entities, relations and the indexed in-memory graph
//! - **Storage** (`store`): JSON Lines file backend with atomic replace, plus an
//!   in-memory backend
//! - **Mutations** (`mutation`) and **queries** (`query`): pure functions over the graph
//! - **Engine** (`engine`): lazy load, serialized read-modify-write, lock-free reads
//! - **Dispatch** (`dispatch`): named operations with JSON arguments
//!
//! ## Library usage
//!
//! ```no_run
//! use akh_memory::config::MemoryConfig;
//! use akh_memory::engine::MemoryEngine;
//! use akh_memory::graph::{Entity, Relation};
//!
//! let engine = MemoryEngine::open(&MemoryConfig::with_memory_file("memory.jsonl")).unwrap();
//! engine.create_entities(vec![
//!     Entity::new("Alice", "Person").with_observations(["Likes coding"]),
//!     Entity::new("Bob", "Person"),
//! ]).unwrap();
//! engine.create_relations(vec![Relation::new("Alice", "Bob", "knows")]).unwrap();
//! let hits = engine.search_nodes("coding").unwrap();
//! assert_eq!(hits.entities[0].name, "Alice");
//! ```

pub mod config;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod graph;
pub mod mutation;
pub mod paths;
pub mod query;
pub mod registry;
pub mod store;
