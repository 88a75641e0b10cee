//! Storage backends for the knowledge graph.
//!
//! Two backends implement [`GraphStore`]:
//!
//! - [`JsonlStore`]: durable JSON Lines file, replaced atomically on save
//! - [`MemStore`]: memory-only; contents are lost on process exit
//!
//! Backends only load and save whole graphs. They are owned by
//! [`MemoryEngine`](crate::engine::MemoryEngine), which serializes access.

pub mod codec;
pub mod jsonl;
pub mod mem;

pub use jsonl::JsonlStore;
pub use mem::MemStore;

use crate::error::{CodecError, StoreError};
use crate::graph::index::GraphIndex;

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// A graph read back from a backend, with anything skipped along the way.
#[derive(Debug, Default)]
pub struct LoadedGraph {
    pub graph: GraphIndex,
    /// Records that could not be decoded and were skipped.
    pub diagnostics: Vec<CodecError>,
    /// Records ignored because an earlier record had the same name or triple.
    pub duplicates: usize,
}

/// A backend that can load and atomically replace a whole graph.
pub trait GraphStore: Send + Sync {
    /// Read the current graph. A backend with nothing stored yields an empty graph.
    fn load(&self) -> StoreResult<LoadedGraph>;

    /// Replace the stored graph with `graph`. Either the whole graph is stored
    /// or the previous contents remain.
    fn save(&self, graph: &GraphIndex) -> StoreResult<()>;

    /// Human-readable location, for logs and `info`.
    fn describe(&self) -> String;
}
