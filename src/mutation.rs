//! Mutation engine: create and delete entities, relations, and observations.
//!
//! Every function works on a `&mut GraphIndex` that the caller owns. Create
//! batches are validated up front so a rejected call leaves the graph untouched;
//! persistence is the caller's job (see [`MemoryEngine`](crate::engine::MemoryEngine)).

use crate::error::GraphError;
use crate::graph::index::GraphIndex;
use crate::graph::{
    AddedObservations, DeleteSummary, Entity, ObservationDeletion, ObservationInput,
    ObservationOutcome, Relation,
};

/// Result of a mutation: the value to hand back plus whether the graph changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applied<T> {
    pub value: T,
    pub changed: bool,
}

impl<T> Applied<T> {
    fn new(value: T, changed: bool) -> Self {
        Self { value, changed }
    }
}

/// Insert entities whose names are not yet present. Returns the inserted subset.
pub fn create_entities(
    graph: &mut GraphIndex,
    entities: Vec<Entity>,
) -> Result<Applied<Vec<Entity>>, GraphError> {
    for entity in &entities {
        entity.validate()?;
    }

    let mut created = Vec::new();
    for entity in entities {
        if graph.contains_entity(&entity.name) {
            continue;
        }
        graph.insert_entity(entity.clone());
        created.push(entity);
    }
    let changed = !created.is_empty();
    Ok(Applied::new(created, changed))
}

/// Insert relations whose triples are not yet present. Endpoints need not exist.
pub fn create_relations(
    graph: &mut GraphIndex,
    relations: Vec<Relation>,
) -> Result<Applied<Vec<Relation>>, GraphError> {
    for relation in &relations {
        relation.validate()?;
    }

    let mut created = Vec::new();
    for relation in relations {
        if graph.contains_relation(&relation) {
            continue;
        }
        graph.insert_relation(relation.clone());
        created.push(relation);
    }
    let changed = !created.is_empty();
    Ok(Applied::new(created, changed))
}

/// Append observations as-is (no de-duplication).
///
/// A blank or unknown entity name fails only its own item; the rest of the
/// batch still applies.
pub fn add_observations(
    graph: &mut GraphIndex,
    inputs: Vec<ObservationInput>,
) -> Applied<Vec<ObservationOutcome>> {
    let mut changed = false;
    let mut outcomes = Vec::with_capacity(inputs.len());
    for input in inputs {
        if let Err(err) = crate::graph::require_entity_name(&input.entity_name) {
            outcomes.push(ObservationOutcome::failed(&err, &input.entity_name));
            continue;
        }
        match graph.entity_mut(&input.entity_name) {
            Some(entity) => {
                entity.observations.extend(input.contents.iter().cloned());
                changed |= !input.contents.is_empty();
                outcomes.push(ObservationOutcome::Added(AddedObservations {
                    entity_name: input.entity_name,
                    added_observations: input.contents,
                }));
            }
            None => {
                let err = GraphError::UnknownEntity {
                    name: input.entity_name.clone(),
                };
                tracing::debug!(entity = %input.entity_name, "observation target missing");
                outcomes.push(ObservationOutcome::failed(&err, &input.entity_name));
            }
        }
    }
    Applied::new(outcomes, changed)
}

/// Delete entities and cascade to every relation touching them.
pub fn delete_entities(graph: &mut GraphIndex, names: &[String]) -> Applied<DeleteSummary> {
    let summary = graph.remove_entities(names.iter().map(String::as_str));
    let changed = summary.entities_removed > 0 || summary.relations_removed > 0;
    Applied::new(summary, changed)
}

/// Delete relations matching the given triples exactly. Returns how many were removed.
pub fn delete_relations(graph: &mut GraphIndex, relations: &[Relation]) -> Applied<usize> {
    let removed = graph.remove_relations(relations);
    Applied::new(removed, removed > 0)
}

/// Remove every occurrence of each listed observation. Unknown entities are ignored.
/// Returns the number of observation strings removed.
pub fn delete_observations(
    graph: &mut GraphIndex,
    deletions: &[ObservationDeletion],
) -> Applied<usize> {
    let mut removed = 0;
    for deletion in deletions {
        let Some(entity) = graph.entity_mut(&deletion.entity_name) else {
            continue;
        };
        let before = entity.observations.len();
        entity
            .observations
            .retain(|obs| !deletion.observations.contains(obs));
        removed += before - entity.observations.len();
    }
    Applied::new(removed, removed > 0)
}
