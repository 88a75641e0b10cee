//! Memory-only backend.
//!
//! Keeps the last saved graph behind a lock. Used when no memory file is
//! configured and in tests. All data is lost on process exit.

use std::sync::RwLock;

use crate::graph::index::GraphIndex;

use super::{GraphStore, LoadedGraph, StoreResult};

#[derive(Debug, Default)]
pub struct MemStore {
    saved: RwLock<GraphIndex>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl GraphStore for MemStore {
    fn load(&self) -> StoreResult<LoadedGraph> {
        let graph = self.saved.read().expect("mem store lock poisoned").clone();
        Ok(LoadedGraph {
            graph,
            ..Default::default()
        })
    }

    fn save(&self, graph: &GraphIndex) -> StoreResult<()> {
        *self.saved.write().expect("mem store lock poisoned") = graph.clone();
        Ok(())
    }

    fn describe(&self) -> String {
        "<memory>".to_string()
    }
}
