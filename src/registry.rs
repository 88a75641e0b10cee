//! Store registry: exactly one [`MemoryEngine`] per backing file.
//!
//! Two callers that open the same memory file through one [`StoreRegistry`]
//! share a single engine, so their operations go through the same writer lock
//! instead of racing on the file. Keys are absolute, normalized paths.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;

use crate::config::MemoryConfig;
use crate::engine::MemoryEngine;
use crate::error::MemoryResult;

/// Process-wide map from backing file to its engine.
#[derive(Debug, Default)]
pub struct StoreRegistry {
    engines: DashMap<PathBuf, Arc<MemoryEngine>>,
}

impl StoreRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the engine for `config`, opening it on first use.
    ///
    /// Memory-only configs are never shared: each call gets a fresh engine.
    pub fn open(&self, config: &MemoryConfig) -> MemoryResult<Arc<MemoryEngine>> {
        let Some(path) = &config.memory_file else {
            return Ok(Arc::new(MemoryEngine::memory_only()));
        };
        let key = canonical_key(path);
        let engine = self
            .engines
            .entry(key)
            .or_try_insert_with(|| MemoryEngine::open(config).map(Arc::new))?;
        Ok(Arc::clone(engine.value()))
    }

    /// The engine already open for `path`, if any.
    pub fn get(&self, path: &Path) -> Option<Arc<MemoryEngine>> {
        self.engines
            .get(&canonical_key(path))
            .map(|r| Arc::clone(r.value()))
    }

    /// Flush and forget the engine for `path`. Returns whether one was open.
    ///
    /// Callers still holding an `Arc` to it keep a working engine.
    pub fn close(&self, path: &Path) -> MemoryResult<bool> {
        match self.engines.remove(&canonical_key(path)) {
            Some((_, engine)) => {
                engine.flush()?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Flush every open engine and empty the registry.
    pub fn close_all(&self) -> MemoryResult<()> {
        let keys: Vec<PathBuf> = self.engines.iter().map(|r| r.key().clone()).collect();
        for key in keys {
            if let Some((_, engine)) = self.engines.remove(&key) {
                engine.flush()?;
            }
        }
        Ok(())
    }

    /// Number of open engines.
    pub fn len(&self) -> usize {
        self.engines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }
}

/// Absolute path with symlinks in the existing prefix resolved.
fn canonical_key(path: &Path) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    match (absolute.parent(), absolute.file_name()) {
        (Some(parent), Some(name)) => parent
            .canonicalize()
            .map(|p| p.join(name))
            .unwrap_or(absolute),
        _ => absolute,
    }
}
