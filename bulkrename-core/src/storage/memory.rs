use super::{Storage, StorageError};
use std::cell::{Cell, RefCell};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};

/// A call made against a `MemoryStorage`, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageCall {
    Rename { from: String, to: String },
    ListItems(String),
    Referencers(String),
    Dependencies(String),
    SetAutoSourceControl(bool),
    MovePhysical { from: PathBuf, to: PathBuf },
}

/// In-memory item registry.
///
/// Backs renames of objects that only exist as labels, and records every
/// call so orchestration can be checked without touching a disk.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: BTreeSet<String>,
    dependencies: HashMap<String, Vec<String>>,
    failing_renames: HashSet<String>,
    failing_moves: HashSet<PathBuf>,
    auto_source_control: bool,
    calls: RefCell<Vec<StorageCall>>,
    exists_calls: Cell<usize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            auto_source_control: true,
            ..Self::default()
        }
    }

    pub fn with_items<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut storage = Self::new();
        storage.items = items.into_iter().map(Into::into).collect();
        storage
    }

    /// Record that `item` depends on `dependency`.
    #[must_use]
    pub fn with_dependency(mut self, item: &str, dependency: &str) -> Self {
        self.dependencies
            .entry(item.to_string())
            .or_default()
            .push(dependency.to_string());
        self
    }

    /// Make renames of `path` fail.
    #[must_use]
    pub fn failing_rename(mut self, path: &str) -> Self {
        self.failing_renames.insert(path.to_string());
        self
    }

    /// Make physical moves out of `path` fail.
    #[must_use]
    pub fn failing_physical_move(mut self, path: impl Into<PathBuf>) -> Self {
        self.failing_moves.insert(path.into());
        self
    }

    pub fn items(&self) -> Vec<String> {
        self.items.iter().cloned().collect()
    }

    pub fn auto_source_control(&self) -> bool {
        self.auto_source_control
    }

    pub fn calls(&self) -> Vec<StorageCall> {
        self.calls.borrow().clone()
    }

    pub fn exists_calls(&self) -> usize {
        self.exists_calls.get()
    }

    pub fn rename_calls(&self) -> Vec<(String, String)> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|call| match call {
                StorageCall::Rename { from, to } => Some((from.clone(), to.clone())),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: StorageCall) {
        self.calls.borrow_mut().push(call);
    }

    fn children(&self, folder: &str) -> Vec<String> {
        let prefix = format!("{}/", folder.trim_end_matches('/'));
        self.items
            .iter()
            .filter(|item| item.starts_with(&prefix))
            .cloned()
            .collect()
    }
}

impl Storage for MemoryStorage {
    fn exists(&self, path: &str) -> bool {
        self.exists_calls.set(self.exists_calls.get() + 1);
        self.items.contains(path) || !self.children(path).is_empty()
    }

    fn rename(&mut self, from: &str, to: &str) -> Result<(), StorageError> {
        self.record(StorageCall::Rename {
            from: from.to_string(),
            to: to.to_string(),
        });
        if self.failing_renames.contains(from) {
            return Err(StorageError::io(
                from,
                io::Error::new(io::ErrorKind::PermissionDenied, "rename refused"),
            ));
        }

        let children = self.children(from);
        if !self.items.contains(from) && children.is_empty() {
            return Err(StorageError::NotFound {
                path: from.to_string(),
            });
        }
        if self.items.contains(to) {
            return Err(StorageError::AlreadyExists {
                path: to.to_string(),
            });
        }

        if self.items.remove(from) {
            self.items.insert(to.to_string());
        }
        for child in children {
            self.items.remove(&child);
            self.items.insert(format!("{}{}", to, &child[from.len()..]));
        }
        Ok(())
    }

    fn list_items(&self, under: &str) -> Vec<String> {
        self.record(StorageCall::ListItems(under.to_string()));
        self.children(under)
    }

    fn referencers(&self, path: &str) -> Vec<String> {
        self.record(StorageCall::Referencers(path.to_string()));
        let mut referencers: Vec<String> = self
            .dependencies
            .iter()
            .filter(|(_, deps)| deps.iter().any(|d| d == path))
            .map(|(item, _)| item.clone())
            .collect();
        referencers.sort();
        referencers
    }

    fn dependencies(&self, path: &str) -> Vec<String> {
        self.record(StorageCall::Dependencies(path.to_string()));
        self.dependencies.get(path).cloned().unwrap_or_default()
    }

    fn set_auto_source_control(&mut self, enabled: bool) {
        self.record(StorageCall::SetAutoSourceControl(enabled));
        self.auto_source_control = enabled;
    }

    fn resolve(&self, path: &str) -> PathBuf {
        PathBuf::from(path)
    }

    fn move_physical(&mut self, from: &Path, to: &Path) -> io::Result<()> {
        self.record(StorageCall::MovePhysical {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
        });
        if self.failing_moves.contains(from) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("cannot move {}", from.display()),
            ));
        }
        Ok(())
    }
}
