//! Query engine: full export, name lookup, and substring search.
//!
//! Lookups and searches return the subgraph induced by the selected entities:
//! the entities themselves plus every relation whose endpoints are both selected.

use rayon::prelude::*;

use crate::graph::KnowledgeGraph;
use crate::graph::index::GraphIndex;

/// Graphs smaller than this are scanned on the calling thread.
const PARALLEL_SCAN_THRESHOLD: usize = 4_096;

/// The complete graph, in store order.
pub fn read_graph(graph: &GraphIndex) -> KnowledgeGraph {
    graph.to_knowledge_graph()
}

/// Entities named in `names` plus the relations among them.
pub fn open_nodes<S: AsRef<str>>(graph: &GraphIndex, names: &[S]) -> KnowledgeGraph {
    graph.induced_subgraph(names.iter().map(AsRef::as_ref))
}

/// Entities whose name, type, or any observation contains `query`, ignoring case,
/// plus the relations among them. An empty query matches everything.
pub fn search_nodes(graph: &GraphIndex, query: &str) -> KnowledgeGraph {
    let needle = query.to_lowercase();
    let entities = graph.entities();

    let matched: Vec<&str> = if entities.len() >= PARALLEL_SCAN_THRESHOLD {
        entities
            .par_iter()
            .filter(|e| matches(e, &needle))
            .map(|e| e.name.as_str())
            .collect()
    } else {
        entities
            .iter()
            .filter(|e| matches(e, &needle))
            .map(|e| e.name.as_str())
            .collect()
    };

    graph.induced_subgraph(matched)
}

fn matches(entity: &crate::graph::Entity, needle: &str) -> bool {
    contains_folded(&entity.name, needle)
        || contains_folded(&entity.entity_type, needle)
        || entity
            .observations
            .iter()
            .any(|obs| contains_folded(obs, needle))
}

fn contains_folded(haystack: &str, needle: &str) -> bool {
    needle.is_empty() || haystack.to_lowercase().contains(needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Entity, Relation};

    fn sample() -> GraphIndex {
        GraphIndex::from_records(
            [
                Entity::new("Alice", "Person").with_observations(["Likes coding"]),
                Entity::new("Bob", "Person").with_observations(["Plays chess"]),
                Entity::new("Rust", "Language"),
            ],
            [
                Relation::new("Alice", "Bob", "knows"),
                Relation::new("Alice", "Rust", "uses"),
                Relation::new("Alice", "Ghost", "haunted_by"),
            ],
        )
        .0
    }

    #[test]
    fn read_graph_returns_everything() {
        let graph = sample();
        let all = read_graph(&graph);
        assert_eq!(all.entities.len(), 3);
        assert_eq!(all.relations.len(), 3);
    }

    #[test]
    fn search_matches_observations() {
        let result = search_nodes(&sample(), "coding");
        assert_eq!(result.entities.len(), 1);
        assert_eq!(result.entities[0].name, "Alice");
        assert!(result.relations.is_empty());
    }

    #[test]
    fn search_is_case_insensitive_across_fields() {
        let graph = sample();
        let by_type = search_nodes(&graph, "PERSON");
        assert_eq!(by_type.entities.len(), 2);
        assert_eq!(by_type.relations, vec![Relation::new("Alice", "Bob", "knows")]);

        let by_name = search_nodes(&graph, "rUsT");
        assert_eq!(by_name.entities[0].name, "Rust");
    }

    #[test]
    fn search_with_no_hits_is_empty() {
        assert!(search_nodes(&sample(), "quantum").is_empty());
    }

    #[test]
    fn empty_query_matches_all_entities() {
        let result = search_nodes(&sample(), "");
        assert_eq!(result.entities.len(), 3);
        // The dangling relation has an endpoint outside the entity set.
        assert_eq!(result.relations.len(), 2);
    }

    #[test]
    fn open_nodes_induces_subgraph() {
        let graph = sample();
        let result = open_nodes(&graph, &["Rust", "Alice", "Nobody"]);
        assert_eq!(result.entities.len(), 2);
        assert_eq!(result.relations, vec![Relation::new("Alice", "Rust", "uses")]);

        let none = open_nodes::<&str>(&graph, &[]);
        assert!(none.is_empty());
    }

    #[test]
    fn parallel_scan_preserves_order() {
        let entities: Vec<_> = (0..PARALLEL_SCAN_THRESHOLD + 10)
            .map(|i| Entity::new(format!("node-{i}"), if i % 2 == 0 { "even" } else { "odd" }))
            .collect();
        let graph = GraphIndex::from_records(entities, Vec::<Relation>::new()).0;
        let result = search_nodes(&graph, "EVEN");
        assert_eq!(result.entities.len(), (PARALLEL_SCAN_THRESHOLD + 10) / 2);
        assert_eq!(result.entities[0].name, "node-0");
        assert_eq!(result.entities[1].name, "node-2");
    }
}
