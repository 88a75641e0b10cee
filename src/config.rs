//! Engine configuration, persisted as TOML.
//!
//! Resolution order for the memory file: explicit flag, then the
//! `MEMORY_FILE_PATH` environment variable, then `memory_file` in the config
//! file, then the XDG default (`$XDG_DATA_HOME/akh-memory/memory.jsonl`).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::paths::{self, MemoryPaths};

/// Environment variable overriding the memory file location.
pub const MEMORY_FILE_ENV: &str = "MEMORY_FILE_PATH";

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Configuration for a [`MemoryEngine`](crate::engine::MemoryEngine).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Backing JSON Lines file. `None` for memory-only mode.
    #[serde(default)]
    pub memory_file: Option<PathBuf>,
    /// Rename a sibling `memory.json` into place when the memory file is missing.
    #[serde(default = "default_migrate_legacy")]
    pub migrate_legacy: bool,
}

fn default_migrate_legacy() -> bool {
    true
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            memory_file: None,
            migrate_legacy: default_migrate_legacy(),
        }
    }
}

impl MemoryConfig {
    /// A config with no backing file.
    pub fn memory_only() -> Self {
        Self::default()
    }

    /// A config backed by `path`.
    pub fn with_memory_file(path: impl Into<PathBuf>) -> Self {
        Self {
            memory_file: Some(path.into()),
            ..Default::default()
        }
    }

    /// Load from a TOML file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::parse(&content, path)
    }

    fn parse(content: &str, path: &Path) -> ConfigResult<Self> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Resolve the effective config for a process.
    ///
    /// `config_file` is read if given; otherwise the XDG config file is read
    /// when it exists. `flag` and the environment then override `memory_file`,
    /// and the XDG data location fills it in if nothing else did.
    pub fn resolve(flag: Option<PathBuf>, config_file: Option<&Path>) -> ConfigResult<Self> {
        let xdg = MemoryPaths::resolve();
        let mut config = match config_file {
            Some(path) => Self::load(path)?,
            None => match &xdg {
                Ok(p) if p.config_file().is_file() => Self::load(&p.config_file())?,
                _ => Self::default(),
            },
        };

        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        config = config.with_overrides(flag, std::env::var(MEMORY_FILE_ENV).ok(), &cwd);

        if config.memory_file.is_none() {
            config.memory_file = Some(xdg?.default_memory_file());
        }
        Ok(config)
    }

    /// Apply the flag and environment overrides, flag first.
    pub fn with_overrides(mut self, flag: Option<PathBuf>, env: Option<String>, cwd: &Path) -> Self {
        if let Some(path) = flag {
            self.memory_file = Some(path);
        } else if let Some(raw) = env.filter(|v| !v.trim().is_empty()) {
            self.memory_file = Some(paths::resolve_memory_path(raw.trim(), cwd));
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_from_empty_toml() {
        let config = MemoryConfig::parse("", Path::new("config.toml")).unwrap();
        assert_eq!(config, MemoryConfig::default());
        assert!(config.migrate_legacy);
    }

    #[test]
    fn parses_memory_file() {
        let config = MemoryConfig::parse(
            "memory_file = \"/tmp/agent.jsonl\"\nmigrate_legacy = false\n",
            Path::new("config.toml"),
        )
        .unwrap();
        assert_eq!(config.memory_file, Some(PathBuf::from("/tmp/agent.jsonl")));
        assert!(!config.migrate_legacy);
    }

    #[test]
    fn bad_toml_is_parse_error() {
        let err = MemoryConfig::parse("memory_file = [", Path::new("c.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn flag_beats_env_beats_file() {
        let cwd = Path::new("/work");
        let base = MemoryConfig::with_memory_file("/from/file.jsonl");

        let env_only = base.clone().with_overrides(None, Some("rel.jsonl".into()), cwd);
        assert_eq!(env_only.memory_file, Some(PathBuf::from("/work/rel.jsonl")));

        let both = base
            .clone()
            .with_overrides(Some("/flag.jsonl".into()), Some("rel.jsonl".into()), cwd);
        assert_eq!(both.memory_file, Some(PathBuf::from("/flag.jsonl")));

        let blank_env = base.clone().with_overrides(None, Some("  ".into()), cwd);
        assert_eq!(blank_env.memory_file, base.memory_file);
    }

    #[test]
    fn load_reads_file_from_disk() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "memory_file = \"/data/memory.jsonl\"\n").unwrap();
        assert_eq!(
            MemoryConfig::load(&path).unwrap(),
            MemoryConfig::with_memory_file("/data/memory.jsonl")
        );
        assert!(matches!(
            MemoryConfig::load(&dir.path().join("missing.toml")),
            Err(ConfigError::Read { .. })
        ));
    }
}
