//! Engine facade: the top-level API for akh-memory.
//!
//! [`MemoryEngine`] owns one [`GraphStore`] and coordinates every operation
//! against it:
//!
//! - mutations hold the writer lock across load → mutate → save, so no two
//!   read-modify-write sequences interleave
//! - the resident graph is an immutable `Arc<GraphIndex>` snapshot; mutations
//!   work on a private copy and publish it only after the save succeeds
//! - queries grab the current snapshot and run without holding any lock
//!
//! The graph is loaded lazily on first use and kept resident afterwards.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use crate::config::MemoryConfig;
use crate::error::{CodecError, GraphError, MemoryResult};
use crate::graph::index::GraphIndex;
use crate::graph::{
    DeleteSummary, Entity, KnowledgeGraph, ObservationDeletion, ObservationInput,
    ObservationOutcome, Relation,
};
use crate::mutation::{self, Applied};
use crate::paths;
use crate::query;
use crate::store::{GraphStore, JsonlStore, MemStore};

/// The akh-memory knowledge graph engine.
///
/// Share it between threads with `Arc<MemoryEngine>`.
pub struct MemoryEngine {
    store: Box<dyn GraphStore>,
    persistent: bool,
    /// Published graph; `None` until the first successful load.
    snapshot: RwLock<Option<Arc<GraphIndex>>>,
    /// Serializes loads and mutations.
    writer: Mutex<()>,
    /// Set when a save failed, cleared by the next successful one. The store
    /// may then not hold the resident graph.
    dirty: AtomicBool,
    diagnostics: RwLock<Vec<CodecError>>,
}

impl MemoryEngine {
    /// Create an engine for the given configuration.
    ///
    /// Nothing is read until the first operation. A legacy `memory.json` next to
    /// the configured file is migrated here when `migrate_legacy` is set.
    pub fn open(config: &MemoryConfig) -> MemoryResult<Self> {
        match &config.memory_file {
            Some(path) => {
                if config.migrate_legacy {
                    paths::migrate_legacy(path).map_err(crate::error::ConfigError::from)?;
                }
                tracing::info!(path = %path.display(), "opening memory store");
                Ok(Self::new(Box::new(JsonlStore::new(path)), true))
            }
            None => Ok(Self::memory_only()),
        }
    }

    /// An engine with no backing file.
    pub fn memory_only() -> Self {
        Self::new(Box::new(MemStore::new()), false)
    }

    /// An engine over a caller-supplied backend.
    pub fn with_store(store: impl GraphStore + 'static) -> Self {
        Self::new(Box::new(store), true)
    }

    fn new(store: Box<dyn GraphStore>, persistent: bool) -> Self {
        Self {
            store,
            persistent,
            snapshot: RwLock::new(None),
            writer: Mutex::new(()),
            dirty: AtomicBool::new(false),
            diagnostics: RwLock::new(Vec::new()),
        }
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Create entities whose names are new. Returns only those created.
    pub fn create_entities(&self, entities: Vec<Entity>) -> MemoryResult<Vec<Entity>> {
        self.mutate("createEntities", |g| mutation::create_entities(g, entities))
    }

    /// Create relations whose triples are new. Returns only those created.
    pub fn create_relations(&self, relations: Vec<Relation>) -> MemoryResult<Vec<Relation>> {
        self.mutate("createRelations", |g| mutation::create_relations(g, relations))
    }

    /// Append observations; blank or unknown entity names fail per item.
    pub fn add_observations(
        &self,
        inputs: Vec<ObservationInput>,
    ) -> MemoryResult<Vec<ObservationOutcome>> {
        self.mutate("addObservations", |g| Ok(mutation::add_observations(g, inputs)))
    }

    /// Delete entities and every relation touching them.
    pub fn delete_entities(&self, names: &[String]) -> MemoryResult<DeleteSummary> {
        self.mutate("deleteEntities", |g| Ok(mutation::delete_entities(g, names)))
    }

    /// Delete relations by exact triple. Returns how many were removed.
    pub fn delete_relations(&self, relations: &[Relation]) -> MemoryResult<usize> {
        self.mutate("deleteRelations", |g| Ok(mutation::delete_relations(g, relations)))
    }

    /// Remove all occurrences of the listed observations. Returns how many were removed.
    pub fn delete_observations(&self, deletions: &[ObservationDeletion]) -> MemoryResult<usize> {
        self.mutate("deleteObservations", |g| {
            Ok(mutation::delete_observations(g, deletions))
        })
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// The whole graph.
    pub fn read_graph(&self) -> MemoryResult<KnowledgeGraph> {
        let graph = self.snapshot()?;
        Ok(query::read_graph(&graph))
    }

    /// Case-insensitive substring search over names, types and observations.
    pub fn search_nodes(&self, query: &str) -> MemoryResult<KnowledgeGraph> {
        let graph = self.snapshot()?;
        Ok(query::search_nodes(&graph, query))
    }

    /// The named entities and the relations among them.
    pub fn open_nodes<S: AsRef<str>>(&self, names: &[S]) -> MemoryResult<KnowledgeGraph> {
        let graph = self.snapshot()?;
        Ok(query::open_nodes(&graph, names))
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// The current graph snapshot, loading it on first use.
    pub fn snapshot(&self) -> MemoryResult<Arc<GraphIndex>> {
        if let Some(graph) = self.published() {
            return Ok(graph);
        }
        let _guard = self.lock_writer();
        self.ensure_loaded()
    }

    /// Drop the resident graph and read the store again.
    pub fn reload(&self) -> MemoryResult<()> {
        let _guard = self.lock_writer();
        *self.snapshot.write().expect("snapshot lock poisoned") = None;
        self.ensure_loaded()?;
        self.dirty.store(false, Ordering::SeqCst);
        Ok(())
    }

    /// Write the resident graph to the store if the last save failed.
    ///
    /// Successful mutations are already saved, so after queries alone this
    /// leaves the store untouched.
    pub fn flush(&self) -> MemoryResult<()> {
        let _guard = self.lock_writer();
        if !self.is_dirty() {
            return Ok(());
        }
        if let Some(graph) = self.published() {
            self.save(&graph)?;
        }
        Ok(())
    }

    /// Whether a save failed since the last successful one.
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::SeqCst)
    }

    /// Flush and release the engine.
    pub fn close(self) -> MemoryResult<()> {
        self.flush()?;
        tracing::info!(location = %self.store.describe(), "closed memory store");
        Ok(())
    }

    /// Records skipped as malformed by the most recent load.
    pub fn load_diagnostics(&self) -> Vec<CodecError> {
        self.diagnostics
            .read()
            .expect("diagnostics lock poisoned")
            .clone()
    }

    /// Where the graph is stored.
    pub fn location(&self) -> String {
        self.store.describe()
    }

    /// Summary counts for the current graph.
    pub fn info(&self) -> MemoryResult<MemoryInfo> {
        let graph = self.snapshot()?;
        Ok(MemoryInfo {
            location: self.location(),
            persistent: self.persistent,
            entity_count: graph.entity_count(),
            relation_count: graph.relation_count(),
            observation_count: graph.entities().iter().map(|e| e.observations.len()).sum(),
            entity_types: graph.entities().iter().fold(BTreeMap::new(), |mut counts, e| {
                *counts.entry(e.entity_type.clone()).or_insert(0) += 1;
                counts
            }),
            skipped_records: self.load_diagnostics().len(),
        })
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    /// Run one mutation as a transaction. Must not be called with the writer held.
    fn mutate<T>(
        &self,
        operation: &'static str,
        apply: impl FnOnce(&mut GraphIndex) -> Result<Applied<T>, GraphError>,
    ) -> MemoryResult<T> {
        let _guard = self.lock_writer();
        let current = self.ensure_loaded()?;

        let mut next = GraphIndex::clone(&current);
        let applied = apply(&mut next)?;

        if applied.changed {
            self.save(&next)?;
            self.publish(Arc::new(next));
        }
        tracing::debug!(
            operation,
            changed = applied.changed,
            "applied mutation"
        );
        Ok(applied.value)
    }

    /// Load the graph if nothing is published yet. Caller holds the writer lock.
    fn ensure_loaded(&self) -> MemoryResult<Arc<GraphIndex>> {
        if let Some(graph) = self.published() {
            return Ok(graph);
        }

        let loaded = self.store.load()?;
        tracing::info!(
            location = %self.store.describe(),
            entities = loaded.graph.entity_count(),
            relations = loaded.graph.relation_count(),
            skipped = loaded.diagnostics.len(),
            duplicates = loaded.duplicates,
            "loaded knowledge graph"
        );
        *self.diagnostics.write().expect("diagnostics lock poisoned") = loaded.diagnostics;

        let graph = Arc::new(loaded.graph);
        self.publish(Arc::clone(&graph));
        Ok(graph)
    }

    fn save(&self, graph: &GraphIndex) -> MemoryResult<()> {
        match self.store.save(graph) {
            Ok(()) => {
                self.dirty.store(false, Ordering::SeqCst);
                Ok(())
            }
            Err(e) => {
                self.dirty.store(true, Ordering::SeqCst);
                Err(e.into())
            }
        }
    }

    fn published(&self) -> Option<Arc<GraphIndex>> {
        self.snapshot
            .read()
            .expect("snapshot lock poisoned")
            .as_ref()
            .map(Arc::clone)
    }

    fn publish(&self, graph: Arc<GraphIndex>) {
        *self.snapshot.write().expect("snapshot lock poisoned") = Some(graph);
    }

    fn lock_writer(&self) -> MutexGuard<'_, ()> {
        self.writer.lock().expect("writer lock poisoned")
    }
}

impl std::fmt::Debug for MemoryEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryEngine")
            .field("location", &self.store.describe())
            .field("persistent", &self.persistent)
            .field("loaded", &self.published().is_some())
            .finish()
    }
}

/// Summary information about the engine state.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryInfo {
    pub location: String,
    pub persistent: bool,
    pub entity_count: usize,
    pub relation_count: usize,
    pub observation_count: usize,
    /// Entity count per `entityType`.
    pub entity_types: BTreeMap<String, usize>,
    pub skipped_records: usize,
}

impl std::fmt::Display for MemoryInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "akh-memory info")?;
        writeln!(f, "  location:      {}", self.location)?;
        writeln!(f, "  persistent:    {}", self.persistent)?;
        writeln!(f, "  entities:      {}", self.entity_count)?;
        writeln!(f, "  relations:     {}", self.relation_count)?;
        writeln!(f, "  observations:  {}", self.observation_count)?;
        writeln!(f, "  skipped:       {}", self.skipped_records)?;
        if !self.entity_types.is_empty() {
            writeln!(f, "  by type:")?;
            for (entity_type, count) in &self.entity_types {
                writeln!(f, "    {entity_type}: {count}")?;
            }
        }
        Ok(())
    }
}
