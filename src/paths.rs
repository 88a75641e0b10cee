//! XDG-compliant path resolution for akh-memory.
//!
//! Provides [`MemoryPaths`] (global config and data directories following the
//! XDG Base Directory Specification) and the one-time migration of a legacy
//! `memory.json` file to the JSON Lines location.

use std::path::{Path, PathBuf};

use miette::Diagnostic;
use thiserror::Error;

/// Errors from path resolution.
#[derive(Debug, Error, Diagnostic)]
pub enum PathError {
    #[error("cannot determine home directory")]
    #[diagnostic(
        code(akh::paths::no_home),
        help("Set the HOME environment variable, or pass --memory-file explicitly.")
    )]
    NoHome,

    #[error("failed to migrate legacy memory file {from} to {to}")]
    #[diagnostic(
        code(akh::paths::migrate),
        help("Move the legacy file by hand, or set `migrate_legacy = false` in the config.")
    )]
    Migrate {
        from: String,
        to: String,
        #[source]
        source: std::io::Error,
    },
}

pub type PathResult<T> = std::result::Result<T, PathError>;

/// File name of the default memory file.
pub const MEMORY_FILE_NAME: &str = "memory.jsonl";

/// File name of the pre-JSONL memory file that is migrated on open.
pub const LEGACY_FILE_NAME: &str = "memory.json";

/// Global XDG-compliant directories for akh-memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryPaths {
    /// `$XDG_CONFIG_HOME/akh-memory/`
    pub config_dir: PathBuf,
    /// `$XDG_DATA_HOME/akh-memory/`
    pub data_dir: PathBuf,
}

impl MemoryPaths {
    /// Resolve XDG directories from environment variables with standard fallbacks.
    pub fn resolve() -> PathResult<Self> {
        Self::from_vars(
            std::env::var("HOME").ok(),
            std::env::var("XDG_CONFIG_HOME").ok(),
            std::env::var("XDG_DATA_HOME").ok(),
        )
    }

    /// Resolve from explicit variable values. Empty values count as unset.
    pub fn from_vars(
        home: Option<String>,
        xdg_config: Option<String>,
        xdg_data: Option<String>,
    ) -> PathResult<Self> {
        let set = |v: Option<String>| v.filter(|s| !s.is_empty()).map(PathBuf::from);

        let home = set(home);
        let base = |xdg: Option<PathBuf>, fallback: &str| -> PathResult<PathBuf> {
            match xdg {
                Some(dir) => Ok(dir),
                None => home
                    .as_ref()
                    .map(|h| h.join(fallback))
                    .ok_or(PathError::NoHome),
            }
        };

        Ok(Self {
            config_dir: base(set(xdg_config), ".config")?.join("akh-memory"),
            data_dir: base(set(xdg_data), ".local/share")?.join("akh-memory"),
        })
    }

    /// `config_dir/config.toml`
    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    /// `data_dir/memory.jsonl`
    pub fn default_memory_file(&self) -> PathBuf {
        self.data_dir.join(MEMORY_FILE_NAME)
    }
}

/// Resolve a user-supplied memory path: relative paths are taken from `cwd`.
pub fn resolve_memory_path(raw: &str, cwd: &Path) -> PathBuf {
    let path = PathBuf::from(raw);
    if path.is_absolute() {
        path
    } else {
        cwd.join(path)
    }
}

/// Move a legacy `memory.json` next to `target` into place when `target` is missing.
///
/// Returns the legacy path if a migration happened.
pub fn migrate_legacy(target: &Path) -> PathResult<Option<PathBuf>> {
    if target.extension().and_then(|e| e.to_str()) != Some("jsonl") || target.exists() {
        return Ok(None);
    }
    let legacy = target.with_file_name(LEGACY_FILE_NAME);
    if !legacy.is_file() {
        return Ok(None);
    }

    std::fs::rename(&legacy, target).map_err(|e| PathError::Migrate {
        from: legacy.display().to_string(),
        to: target.display().to_string(),
        source: e,
    })?;
    tracing::warn!(
        from = %legacy.display(),
        to = %target.display(),
        "migrated legacy memory file"
    );
    Ok(Some(legacy))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xdg_variables_take_precedence() {
        let paths = MemoryPaths::from_vars(
            Some("/home/u".into()),
            Some("/cfg".into()),
            Some("/data".into()),
        )
        .unwrap();
        assert_eq!(paths.config_file(), PathBuf::from("/cfg/akh-memory/config.toml"));
        assert_eq!(
            paths.default_memory_file(),
            PathBuf::from("/data/akh-memory/memory.jsonl")
        );
    }

    #[test]
    fn falls_back_to_home() {
        let paths = MemoryPaths::from_vars(Some("/home/u".into()), Some(String::new()), None).unwrap();
        assert_eq!(paths.config_dir, PathBuf::from("/home/u/.config/akh-memory"));
        assert_eq!(paths.data_dir, PathBuf::from("/home/u/.local/share/akh-memory"));
    }

    #[test]
    fn no_home_and_no_xdg_is_an_error() {
        assert!(matches!(
            MemoryPaths::from_vars(None, None, None),
            Err(PathError::NoHome)
        ));
    }

    #[test]
    fn relative_memory_path_uses_cwd() {
        let cwd = Path::new("/work");
        assert_eq!(resolve_memory_path("mem.jsonl", cwd), PathBuf::from("/work/mem.jsonl"));
        assert_eq!(resolve_memory_path("/abs/mem.jsonl", cwd), PathBuf::from("/abs/mem.jsonl"));
    }

    #[test]
    fn legacy_file_is_migrated_once() {
        let dir = tempfile::TempDir::new().unwrap();
        let target = dir.path().join(MEMORY_FILE_NAME);
        std::fs::write(dir.path().join(LEGACY_FILE_NAME), "{}\n").unwrap();

        assert!(migrate_legacy(&target).unwrap().is_some());
        assert!(target.exists());
        assert!(!dir.path().join(LEGACY_FILE_NAME).exists());
        assert!(migrate_legacy(&target).unwrap().is_none());
    }

    #[test]
    fn existing_target_is_never_replaced() {
        let dir = tempfile::TempDir::new().unwrap();
        let target = dir.path().join(MEMORY_FILE_NAME);
        std::fs::write(&target, "new\n").unwrap();
        std::fs::write(dir.path().join(LEGACY_FILE_NAME), "old\n").unwrap();

        assert!(migrate_legacy(&target).unwrap().is_none());
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "new\n");
    }
}
