//! Named-operation dispatch: the JSON face of [`MemoryEngine`].
//!
//! Every operation has a wire name (`createEntities`, `searchNodes`, ...) and a
//! JSON argument object. [`Operation`] is the typed form of such a call and
//! [`execute`] runs it against an engine, encoding the result back to JSON.
//!
//! ```text
//! {"operation":"searchNodes","arguments":{"query":"coding"}}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::engine::MemoryEngine;
use crate::error::{DispatchError, MemoryResult};
use crate::graph::{Entity, ObservationDeletion, ObservationInput, Relation};

/// Wire names of every operation, in contract order.
pub const OPERATION_NAMES: [&str; 9] = [
    "createEntities",
    "createRelations",
    "addObservations",
    "deleteEntities",
    "deleteRelations",
    "deleteObservations",
    "readGraph",
    "searchNodes",
    "openNodes",
];

/// One call against the knowledge graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "operation",
    content = "arguments",
    rename_all = "camelCase",
    deny_unknown_fields
)]
pub enum Operation {
    CreateEntities {
        entities: Vec<Entity>,
    },
    CreateRelations {
        relations: Vec<Relation>,
    },
    AddObservations {
        observations: Vec<ObservationInput>,
    },
    #[serde(rename_all = "camelCase")]
    DeleteEntities {
        entity_names: Vec<String>,
    },
    DeleteRelations {
        relations: Vec<Relation>,
    },
    DeleteObservations {
        deletions: Vec<ObservationDeletion>,
    },
    ReadGraph,
    SearchNodes {
        query: String,
    },
    OpenNodes {
        names: Vec<String>,
    },
}

impl Operation {
    /// Build an operation from its wire name and argument object.
    ///
    /// Missing arguments are treated as `{}`. `readGraph` ignores its arguments.
    pub fn from_parts(name: &str, arguments: Option<Value>) -> Result<Self, DispatchError> {
        if !OPERATION_NAMES.contains(&name) {
            return Err(DispatchError::UnknownOperation {
                name: name.to_string(),
            });
        }
        if name == "readGraph" {
            return Ok(Operation::ReadGraph);
        }

        let arguments = match arguments {
            None | Some(Value::Null) => json!({}),
            Some(v @ Value::Object(_)) => v,
            Some(other) => {
                return Err(DispatchError::InvalidArguments {
                    operation: name.to_string(),
                    message: format!("expected a JSON object, got {}", kind_of(&other)),
                });
            }
        };

        serde_json::from_value(json!({ "operation": name, "arguments": arguments })).map_err(|e| {
            DispatchError::InvalidArguments {
                operation: name.to_string(),
                message: e.to_string(),
            }
        })
    }

    /// The wire name of this operation.
    pub fn name(&self) -> &'static str {
        match self {
            Operation::CreateEntities { .. } => "createEntities",
            Operation::CreateRelations { .. } => "createRelations",
            Operation::AddObservations { .. } => "addObservations",
            Operation::DeleteEntities { .. } => "deleteEntities",
            Operation::DeleteRelations { .. } => "deleteRelations",
            Operation::DeleteObservations { .. } => "deleteObservations",
            Operation::ReadGraph => "readGraph",
            Operation::SearchNodes { .. } => "searchNodes",
            Operation::OpenNodes { .. } => "openNodes",
        }
    }

    /// Whether this operation can change the stored graph.
    pub fn is_mutation(&self) -> bool {
        !matches!(
            self,
            Operation::ReadGraph | Operation::SearchNodes { .. } | Operation::OpenNodes { .. }
        )
    }
}

/// Run `op` against `engine` and encode the result.
///
/// Creation and query operations return their typed results; delete
/// operations return an acknowledgement with counts.
pub fn execute(engine: &MemoryEngine, op: Operation) -> MemoryResult<Value> {
    let name = op.name();
    tracing::debug!(operation = name, "dispatching");

    match op {
        Operation::CreateEntities { entities } => encode(name, &engine.create_entities(entities)?),
        Operation::CreateRelations { relations } => {
            encode(name, &engine.create_relations(relations)?)
        }
        Operation::AddObservations { observations } => {
            encode(name, &engine.add_observations(observations)?)
        }
        Operation::DeleteEntities { entity_names } => {
            let summary = engine.delete_entities(&entity_names)?;
            Ok(json!({
                "message": "Entities deleted successfully",
                "entitiesRemoved": summary.entities_removed,
                "relationsRemoved": summary.relations_removed,
            }))
        }
        Operation::DeleteRelations { relations } => {
            let removed = engine.delete_relations(&relations)?;
            Ok(json!({
                "message": "Relations deleted successfully",
                "relationsRemoved": removed,
            }))
        }
        Operation::DeleteObservations { deletions } => {
            let removed = engine.delete_observations(&deletions)?;
            Ok(json!({
                "message": "Observations deleted successfully",
                "observationsRemoved": removed,
            }))
        }
        Operation::ReadGraph => encode(name, &engine.read_graph()?),
        Operation::SearchNodes { query } => encode(name, &engine.search_nodes(&query)?),
        Operation::OpenNodes { names } => encode(name, &engine.open_nodes(&names)?),
    }
}

/// Parse and run a call given as wire name plus arguments.
pub fn call(engine: &MemoryEngine, name: &str, arguments: Option<Value>) -> MemoryResult<Value> {
    let op = Operation::from_parts(name, arguments)?;
    execute(engine, op)
}

fn encode<T: Serialize>(operation: &str, value: &T) -> MemoryResult<Value> {
    serde_json::to_value(value).map_err(|e| {
        DispatchError::Encode {
            operation: operation.to_string(),
            message: e.to_string(),
        }
        .into()
    })
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
