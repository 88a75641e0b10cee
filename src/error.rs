//! Rich diagnostic error types for the akh-memory graph store.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]` derives,
//! providing error codes, help text, and source chains so callers know exactly what
//! went wrong and how to fix it.

use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type for akh-memory.
///
/// Each variant wraps a subsystem-specific error, preserving the full diagnostic
/// chain (error codes, help text, sources) through to the user.
#[derive(Debug, Error, Diagnostic)]
pub enum MemoryError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Dispatch(#[from] DispatchError),
}

impl MemoryError {
    /// Whether this error means the backing store could not be read or written.
    ///
    /// These failures leave the resident graph and the file untouched.
    pub fn is_storage_unavailable(&self) -> bool {
        matches!(self, MemoryError::Store(_))
    }
}

// ---------------------------------------------------------------------------
// Store errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum StoreError {
    #[error("failed to read memory file: {path}")]
    #[diagnostic(
        code(akh::store::read),
        help(
            "The memory file exists but could not be read. Check file permissions \
             and that the path points to a regular file. No state was changed."
        )
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write memory file: {path}")]
    #[diagnostic(
        code(akh::store::write),
        help(
            "The atomic replace of the memory file failed, so the previous contents \
             are still in place. Check that the directory is writable and the disk \
             is not full, then retry the operation."
        )
    )]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {message}")]
    #[diagnostic(
        code(akh::store::serde),
        help("A record could not be serialized. This is a bug; please file a report.")
    )]
    Serialization { message: String },
}

// ---------------------------------------------------------------------------
// Codec errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum CodecError {
    #[error("malformed record on line {line}: {message}")]
    #[diagnostic(
        code(akh::codec::malformed),
        severity(Warning),
        help(
            "Each line of the memory file must be a JSON object with \"type\" set to \
             \"entity\" or \"relation\". The line was skipped; fix or remove it by hand."
        )
    )]
    MalformedRecord { line: usize, message: String },
}

// ---------------------------------------------------------------------------
// Graph errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum GraphError {
    #[error("entity not found: \"{name}\"")]
    #[diagnostic(
        code(akh::graph::unknown_entity),
        help("Create the entity with `createEntities` before adding observations to it.")
    )]
    UnknownEntity { name: String },

    #[error("invalid {field}: {value:?} must not be empty")]
    #[diagnostic(
        code(akh::graph::invalid_name),
        help("Entity names, entity types, relation endpoints and relation types are required.")
    )]
    InvalidName { field: &'static str, value: String },
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("failed to read config: {path}")]
    #[diagnostic(
        code(akh::config::read),
        help("Ensure the config file exists and is readable.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {path}: {message}")]
    #[diagnostic(
        code(akh::config::parse),
        help("Check the TOML syntax. The only recognized keys are `memory_file` and `migrate_legacy`.")
    )]
    Parse { path: String, message: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Path(#[from] crate::paths::PathError),
}

// ---------------------------------------------------------------------------
// Dispatch errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum DispatchError {
    #[error("unknown operation: {name}")]
    #[diagnostic(
        code(akh::dispatch::unknown_operation),
        help(
            "Valid operations are createEntities, createRelations, addObservations, \
             deleteEntities, deleteRelations, deleteObservations, readGraph, \
             searchNodes and openNodes."
        )
    )]
    UnknownOperation { name: String },

    #[error("invalid arguments for {operation}: {message}")]
    #[diagnostic(
        code(akh::dispatch::invalid_arguments),
        help("Arguments must be a JSON object matching the operation's input shape.")
    )]
    InvalidArguments { operation: String, message: String },

    #[error("failed to encode result of {operation}: {message}")]
    #[diagnostic(
        code(akh::dispatch::encode),
        help("The operation succeeded but its result could not be encoded as JSON. This is a bug.")
    )]
    Encode { operation: String, message: String },
}

/// Convenience alias for functions returning akh-memory results.
pub type MemoryResult<T> = std::result::Result<T, MemoryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_error_converts_to_memory_error() {
        let err = StoreError::Serialization {
            message: "bad".into(),
        };
        let mem: MemoryError = err.into();
        assert!(matches!(mem, MemoryError::Store(StoreError::Serialization { .. })));
        assert!(mem.is_storage_unavailable());
    }

    #[test]
    fn graph_error_is_not_storage_failure() {
        let mem: MemoryError = GraphError::UnknownEntity {
            name: "Bob".into(),
        }
        .into();
        assert!(!mem.is_storage_unavailable());
    }

    #[test]
    fn error_display_messages_are_descriptive() {
        let err = CodecError::MalformedRecord {
            line: 7,
            message: "missing field `name`".into(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("line 7"));
        assert!(msg.contains("missing field"));

        let err = GraphError::UnknownEntity {
            name: "Alice".into(),
        };
        assert!(format!("{err}").contains("\"Alice\""));
    }
}
