//! Durable JSON Lines backend.
//!
//! Saves write every entity then every relation to a temporary file in the
//! target's directory, fsync it, and rename it over the target. A crash at any
//! point leaves either the old file or the new one, never a mix.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::{CodecError, StoreError};
use crate::graph::index::GraphIndex;

use super::codec::{self, Record};
use super::{GraphStore, LoadedGraph, StoreResult};

/// Knowledge graph persisted as one JSON record per line.
#[derive(Debug, Clone)]
pub struct JsonlStore {
    path: PathBuf,
}

impl JsonlStore {
    /// Use `path` as the backing file. Nothing is touched until the first load or save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Read {
            path: self.path.display().to_string(),
            source,
        }
    }

    fn write_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Write {
            path: self.path.display().to_string(),
            source,
        }
    }

    fn write_records(&self, out: &mut impl Write, graph: &GraphIndex) -> StoreResult<()> {
        for entity in graph.entities() {
            let line = codec::encode_entity(entity)?;
            writeln!(out, "{line}").map_err(|e| self.write_error(e))?;
        }
        for relation in graph.relations() {
            let line = codec::encode_relation(relation)?;
            writeln!(out, "{line}").map_err(|e| self.write_error(e))?;
        }
        Ok(())
    }
}

impl GraphStore for JsonlStore {
    fn load(&self) -> StoreResult<LoadedGraph> {
        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "memory file absent, starting empty");
                return Ok(LoadedGraph::default());
            }
            Err(e) => return Err(self.read_error(e)),
        };

        let mut entities = Vec::new();
        let mut relations = Vec::new();
        let mut diagnostics = Vec::new();

        for (idx, line) in BufReader::new(file).split(b'\n').enumerate() {
            let line = line.map_err(|e| self.read_error(e))?;
            let text = match String::from_utf8(line) {
                Ok(text) => text,
                Err(e) => {
                    let err = CodecError::MalformedRecord {
                        line: idx + 1,
                        message: format!("invalid UTF-8: {}", e.utf8_error()),
                    };
                    tracing::warn!(path = %self.path.display(), error = %err, "skipping malformed record");
                    diagnostics.push(err);
                    continue;
                }
            };
            // CRLF files; any other whitespace is accepted by the JSON parser.
            let text = text.strip_suffix('\r').unwrap_or(&text);
            if text.trim().is_empty() {
                continue;
            }
            match codec::decode(idx + 1, text) {
                Ok(Record::Entity(e)) => entities.push(e),
                Ok(Record::Relation(r)) => relations.push(r),
                Err(err) => {
                    tracing::warn!(path = %self.path.display(), error = %err, "skipping malformed record");
                    diagnostics.push(err);
                }
            }
        }

        let (graph, duplicates) = GraphIndex::from_records(entities, relations);
        if duplicates > 0 {
            tracing::debug!(duplicates, "ignored duplicate records on load");
        }
        Ok(LoadedGraph {
            graph,
            diagnostics,
            duplicates,
        })
    }

    fn save(&self, graph: &GraphIndex) -> StoreResult<()> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir).map_err(|e| self.write_error(e))?;

        let tmp = NamedTempFile::new_in(&dir).map_err(|e| self.write_error(e))?;
        {
            let mut out = BufWriter::new(tmp.as_file());
            self.write_records(&mut out, graph)?;
            out.flush().map_err(|e| self.write_error(e))?;
        }
        tmp.as_file().sync_all().map_err(|e| self.write_error(e))?;
        tmp.persist(&self.path)
            .map_err(|e| self.write_error(e.error))?;

        tracing::debug!(
            path = %self.path.display(),
            entities = graph.entity_count(),
            relations = graph.relation_count(),
            "saved memory file"
        );
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
