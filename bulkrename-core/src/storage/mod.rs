//! Storage collaborators: where renamed items actually live.
//!
//! Item identifiers are `/`-separated paths. `FsStorage` maps them onto a
//! directory tree, `MemoryStorage` keeps them in memory (in-memory objects,
//! and a recording double for tests).

mod fs;
mod memory;

pub use fs::FsStorage;
pub use memory::{MemoryStorage, StorageCall};

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Item not found: {path}")]
    NotFound { path: String },

    #[error("Target already exists: {path}")]
    AlreadyExists { path: String },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
}

impl StorageError {
    pub fn io(path: impl Into<String>, source: io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            io::ErrorKind::NotFound => Self::NotFound { path },
            _ => Self::Io { path, source },
        }
    }
}

/// Operations the rename engine needs from the item store.
pub trait Storage {
    fn exists(&self, path: &str) -> bool;

    /// Rename or move an item (and, for folders, everything inside it).
    fn rename(&mut self, from: &str, to: &str) -> Result<(), StorageError>;

    /// Every leaf item below a folder, sorted.
    fn list_items(&self, under: &str) -> Vec<String>;

    /// Items that reference `path`.
    fn referencers(&self, path: &str) -> Vec<String>;

    /// Items `path` depends on.
    fn dependencies(&self, path: &str) -> Vec<String>;

    /// Toggle the store's own source-control integration.
    fn set_auto_source_control(&mut self, enabled: bool);

    /// On-disk location backing an item.
    fn resolve(&self, path: &str) -> PathBuf;

    /// Move a backing file directly, bypassing the store.
    fn move_physical(&mut self, from: &Path, to: &Path) -> io::Result<()> {
        system_move(from, to)
    }
}

/// Raw filesystem move that creates the target's parent directories.
pub fn system_move(from: &Path, to: &Path) -> io::Result<()> {
    if !from.exists() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("Source file does not exist: {}", from.display()),
        ));
    }
    if let Some(parent) = to.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::rename(from, to)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_system_move_creates_parents() {
        let temp_dir = TempDir::new().unwrap();
        let from = temp_dir.path().join("a.txt");
        std::fs::write(&from, "x").unwrap();
        let to = temp_dir.path().join("deep").join("er").join("a.txt");

        system_move(&from, &to).unwrap();
        assert!(!from.exists());
        assert_eq!(std::fs::read_to_string(&to).unwrap(), "x");
    }

    #[test]
    fn test_system_move_missing_source() {
        let temp_dir = TempDir::new().unwrap();
        let err = system_move(
            &temp_dir.path().join("missing"),
            &temp_dir.path().join("other"),
        )
        .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_storage_error_io_maps_not_found() {
        let err = StorageError::io("a/b", io::Error::new(io::ErrorKind::NotFound, "gone"));
        assert!(matches!(err, StorageError::NotFound { .. }));
    }
}
