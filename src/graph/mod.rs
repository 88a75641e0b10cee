//! Knowledge graph data model: entities, relations, and observation batches.
//!
//! The graph is a directed multigraph keyed by entity name:
//!
//! - **Entities** carry a free-form type and an ordered list of observations
//! - **Relations** connect two entity names with a typed predicate; the triple
//!   `(from, to, relationType)` is the identity of a relation
//!
//! [`index::GraphIndex`] owns the authoritative in-memory graph. The types in this
//! module are the wire shapes shared by the codec, the engines, and dispatch.

pub mod index;

use serde::{Deserialize, Serialize};

use crate::error::GraphError;

/// A named node with a type tag and an ordered list of free-text facts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    /// Unique identifier of the entity.
    pub name: String,
    /// Free-form classification, e.g. "person" or "project".
    pub entity_type: String,
    /// Facts about the entity, in insertion order. Duplicates are allowed.
    #[serde(default)]
    pub observations: Vec<String>,
}

impl Entity {
    /// Create an entity with no observations.
    pub fn new(name: impl Into<String>, entity_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entity_type: entity_type.into(),
            observations: Vec::new(),
        }
    }

    /// Append observations to the entity being built.
    pub fn with_observations<I, S>(mut self, observations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.observations
            .extend(observations.into_iter().map(Into::into));
        self
    }

    pub(crate) fn validate(&self) -> Result<(), GraphError> {
        require_non_empty("entity name", &self.name)?;
        require_non_empty("entity type", &self.entity_type)
    }
}

/// A directed, typed edge between two entity names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relation {
    /// Source entity name.
    pub from: String,
    /// Target entity name.
    pub to: String,
    /// The predicate, in active voice ("works_at", "knows").
    pub relation_type: String,
}

impl Relation {
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        relation_type: impl Into<String>,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            relation_type: relation_type.into(),
        }
    }

    pub(crate) fn validate(&self) -> Result<(), GraphError> {
        require_non_empty("relation source", &self.from)?;
        require_non_empty("relation target", &self.to)?;
        require_non_empty("relation type", &self.relation_type)
    }
}

/// Observations to append to one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservationInput {
    pub entity_name: String,
    pub contents: Vec<String>,
}

impl ObservationInput {
    pub fn new<I, S>(entity_name: impl Into<String>, contents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            entity_name: entity_name.into(),
            contents: contents.into_iter().map(Into::into).collect(),
        }
    }
}

/// Observations to remove from one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservationDeletion {
    pub entity_name: String,
    pub observations: Vec<String>,
}

impl ObservationDeletion {
    pub fn new<I, S>(entity_name: impl Into<String>, observations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            entity_name: entity_name.into(),
            observations: observations.into_iter().map(Into::into).collect(),
        }
    }
}

/// Observations actually appended to one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddedObservations {
    pub entity_name: String,
    pub added_observations: Vec<String>,
}

/// A per-item failure inside an observation batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservationFailure {
    pub entity_name: String,
    pub error: String,
}

/// Outcome of one item of an `addObservations` batch.
///
/// A missing entity fails only its own item; the rest of the batch still applies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ObservationOutcome {
    Added(AddedObservations),
    Failed(ObservationFailure),
}

impl ObservationOutcome {
    pub(crate) fn failed(err: &GraphError, entity_name: &str) -> Self {
        ObservationOutcome::Failed(ObservationFailure {
            entity_name: entity_name.to_string(),
            error: err.to_string(),
        })
    }

    pub fn entity_name(&self) -> &str {
        match self {
            ObservationOutcome::Added(a) => &a.entity_name,
            ObservationOutcome::Failed(f) => &f.entity_name,
        }
    }

    /// The appended observations, or `None` if this item failed.
    pub fn added(&self) -> Option<&[String]> {
        match self {
            ObservationOutcome::Added(a) => Some(&a.added_observations),
            ObservationOutcome::Failed(_) => None,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, ObservationOutcome::Failed(_))
    }
}

/// What a `deleteEntities` call removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteSummary {
    pub entities_removed: usize,
    pub relations_removed: usize,
}

/// A graph or subgraph as returned by queries: `{entities, relations}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeGraph {
    pub entities: Vec<Entity>,
    pub relations: Vec<Relation>,
}

impl KnowledgeGraph {
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty() && self.relations.is_empty()
    }

    /// Look up a returned entity by name.
    pub fn entity(&self, name: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.name == name)
    }
}

fn require_non_empty(field: &'static str, value: &str) -> Result<(), GraphError> {
    if value.trim().is_empty() {
        return Err(GraphError::InvalidName {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}

pub(crate) fn require_entity_name(value: &str) -> Result<(), GraphError> {
    require_non_empty("entity name", value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_serializes_camel_case() {
        let alice = Entity::new("Alice", "Person").with_observations(["Likes coding"]);
        let json = serde_json::to_value(&alice).unwrap();
        assert_eq!(json["entityType"], "Person");
        assert_eq!(json["observations"][0], "Likes coding");
    }

    #[test]
    fn entity_without_observations_decodes() {
        let e: Entity = serde_json::from_str(r#"{"name":"Bob","entityType":"Person"}"#).unwrap();
        assert!(e.observations.is_empty());
    }

    #[test]
    fn blank_names_are_rejected() {
        assert!(Entity::new("  ", "Person").validate().is_err());
        assert!(Entity::new("Alice", "").validate().is_err());
        assert!(Relation::new("Alice", "", "knows").validate().is_err());
        assert!(Relation::new("Alice", "Bob", "knows").validate().is_ok());
    }

    #[test]
    fn observation_outcome_shapes() {
        let ok = ObservationOutcome::Added(AddedObservations {
            entity_name: "Alice".into(),
            added_observations: vec!["x".into()],
        });
        let json = serde_json::to_value(&ok).unwrap();
        assert_eq!(json["entityName"], "Alice");
        assert_eq!(json["addedObservations"][0], "x");

        let err = ObservationOutcome::failed(
            &GraphError::UnknownEntity {
                name: "Zed".into(),
            },
            "Zed",
        );
        assert!(err.is_failure());
        assert_eq!(err.added(), None);
        assert_eq!(err.entity_name(), "Zed");
    }
}
