//! In-memory knowledge graph with name and adjacency indexes.
//!
//! Entities and relations are kept in insertion order (which is also the
//! persisted order). Three secondary indexes are rebuilt on load and kept in
//! sync on every mutation:
//!
//! - name → entity position, for O(1) lookups and uniqueness checks
//! - triple set, for O(1) duplicate-relation checks
//! - name → positions of every relation touching that name, so cascades and
//!   induced subgraphs cost time proportional to the affected entities

use std::collections::{BTreeSet, HashMap, HashSet};

use super::{DeleteSummary, Entity, KnowledgeGraph, Relation};

/// The authoritative in-memory graph.
#[derive(Debug, Clone, Default)]
pub struct GraphIndex {
    entities: Vec<Entity>,
    positions: HashMap<String, usize>,
    relations: Vec<Relation>,
    triples: HashSet<Relation>,
    /// Entity name → positions in `relations` (outgoing and incoming).
    adjacency: HashMap<String, Vec<usize>>,
}

impl GraphIndex {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from records, keeping the first occurrence of each name
    /// and triple. Returns the graph and the number of ignored duplicates.
    pub fn from_records(
        entities: impl IntoIterator<Item = Entity>,
        relations: impl IntoIterator<Item = Relation>,
    ) -> (Self, usize) {
        let mut graph = Self::new();
        let mut duplicates = 0;
        for entity in entities {
            if !graph.insert_entity(entity) {
                duplicates += 1;
            }
        }
        for relation in relations {
            if !graph.insert_relation(relation) {
                duplicates += 1;
            }
        }
        (graph, duplicates)
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn relation_count(&self) -> usize {
        self.relations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty() && self.relations.is_empty()
    }

    /// All entities in insertion order.
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// All relations in insertion order.
    pub fn relations(&self) -> &[Relation] {
        &self.relations
    }

    pub fn entity(&self, name: &str) -> Option<&Entity> {
        self.positions.get(name).map(|&pos| &self.entities[pos])
    }

    pub fn entity_mut(&mut self, name: &str) -> Option<&mut Entity> {
        match self.positions.get(name) {
            Some(&pos) => Some(&mut self.entities[pos]),
            None => None,
        }
    }

    pub fn contains_entity(&self, name: &str) -> bool {
        self.positions.contains_key(name)
    }

    pub fn contains_relation(&self, relation: &Relation) -> bool {
        self.triples.contains(relation)
    }

    /// Insert an entity unless its name is taken. Returns whether it was inserted.
    pub fn insert_entity(&mut self, entity: Entity) -> bool {
        if self.positions.contains_key(&entity.name) {
            return false;
        }
        self.positions
            .insert(entity.name.clone(), self.entities.len());
        self.entities.push(entity);
        true
    }

    /// Insert a relation unless its triple exists. Returns whether it was inserted.
    pub fn insert_relation(&mut self, relation: Relation) -> bool {
        if self.triples.contains(&relation) {
            return false;
        }
        let pos = self.relations.len();
        self.link(&relation, pos);
        self.triples.insert(relation.clone());
        self.relations.push(relation);
        true
    }

    /// Remove the named entities and, in one pass afterwards, every relation
    /// with an endpoint among the names. A name with no entity still takes its
    /// dangling relations with it.
    pub fn remove_entities<'a>(&mut self, names: impl IntoIterator<Item = &'a str>) -> DeleteSummary {
        let requested: HashSet<&str> = names.into_iter().collect();

        let doomed: HashSet<usize> = requested
            .iter()
            .filter_map(|name| self.adjacency.get(*name))
            .flatten()
            .copied()
            .collect();

        let before = self.entities.len();
        self.entities.retain(|e| !requested.contains(e.name.as_str()));
        let entities_removed = before - self.entities.len();
        if entities_removed > 0 {
            self.reindex_entities();
        }

        let relations_removed = doomed.len();
        if relations_removed > 0 {
            self.drop_relations(&doomed);
        }

        DeleteSummary {
            entities_removed,
            relations_removed,
        }
    }

    /// Remove relations exactly matching the given triples. Returns how many were removed.
    pub fn remove_relations<'a>(&mut self, relations: impl IntoIterator<Item = &'a Relation>) -> usize {
        let mut doomed = HashSet::new();
        for relation in relations {
            if !self.triples.contains(relation) {
                continue;
            }
            let pos = self.adjacency.get(&relation.from).and_then(|positions| {
                positions
                    .iter()
                    .copied()
                    .find(|&p| &self.relations[p] == relation)
            });
            if let Some(pos) = pos {
                doomed.insert(pos);
            }
        }
        let count = doomed.len();
        if count > 0 {
            self.drop_relations(&doomed);
        }
        count
    }

    /// The subgraph induced by `names`: entities in request order (unknown
    /// names skipped, repeats collapsed) plus every relation whose endpoints
    /// are both in the returned set, in store order.
    pub fn induced_subgraph<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> KnowledgeGraph {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut entities = Vec::new();
        for name in names {
            if let Some(&pos) = self.positions.get(name) {
                let entity = &self.entities[pos];
                if seen.insert(entity.name.as_str()) {
                    entities.push(entity.clone());
                }
            }
        }

        let relation_positions: BTreeSet<usize> = seen
            .iter()
            .filter_map(|name| self.adjacency.get(*name))
            .flatten()
            .copied()
            .filter(|&p| {
                let r = &self.relations[p];
                seen.contains(r.from.as_str()) && seen.contains(r.to.as_str())
            })
            .collect();

        KnowledgeGraph {
            entities,
            relations: relation_positions
                .into_iter()
                .map(|p| self.relations[p].clone())
                .collect(),
        }
    }

    /// Export the whole graph.
    pub fn to_knowledge_graph(&self) -> KnowledgeGraph {
        KnowledgeGraph {
            entities: self.entities.clone(),
            relations: self.relations.clone(),
        }
    }

    fn link(&mut self, relation: &Relation, pos: usize) {
        self.adjacency
            .entry(relation.from.clone())
            .or_default()
            .push(pos);
        if relation.to != relation.from {
            self.adjacency
                .entry(relation.to.clone())
                .or_default()
                .push(pos);
        }
    }

    fn drop_relations(&mut self, doomed: &HashSet<usize>) {
        let old = std::mem::take(&mut self.relations);
        for (pos, relation) in old.into_iter().enumerate() {
            if doomed.contains(&pos) {
                self.triples.remove(&relation);
            } else {
                self.relations.push(relation);
            }
        }
        self.reindex_relations();
    }

    fn reindex_entities(&mut self) {
        self.positions.clear();
        for (pos, entity) in self.entities.iter().enumerate() {
            self.positions.insert(entity.name.clone(), pos);
        }
    }

    fn reindex_relations(&mut self) {
        self.adjacency.clear();
        let relations = std::mem::take(&mut self.relations);
        for (pos, relation) in relations.iter().enumerate() {
            self.link(relation, pos);
        }
        self.relations = relations;
    }
}

impl PartialEq for GraphIndex {
    fn eq(&self, other: &Self) -> bool {
        self.entities == other.entities && self.relations == other.relations
    }
}

impl Eq for GraphIndex {}
