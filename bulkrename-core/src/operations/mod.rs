//! High-level operations that correspond to CLI commands
//!
//! These hold the business logic for each bulkrename command, separated
//! from argument parsing and output formatting.

pub mod commit;
pub mod preview;
pub mod relink;

pub use commit::{commit_operation, commit_with};
pub use preview::{plan_session, preview_operation, PlannedSession};
pub use relink::{relink_operation, relink_with};

use crate::chain::TransformChain;
use crate::kind::ItemKind;
use crate::storage::{FsStorage, MemoryStorage, Storage};
use std::path::Path;

/// Everything needed to plan a bulk rename from the command line.
#[derive(Debug, Clone)]
pub struct RenameRequest {
    pub kind: ItemKind,
    /// Item identifiers in selection order
    pub items: Vec<String>,
    pub chain: TransformChain,
    /// Manual names applied after the chain, by position
    pub names: Vec<(usize, String)>,
    pub show_full_path: bool,
    pub vcs_fix: bool,
}

impl RenameRequest {
    pub fn new(kind: ItemKind, items: Vec<String>) -> Self {
        Self {
            kind,
            items,
            chain: TransformChain::new(),
            names: Vec::new(),
            show_full_path: false,
            vcs_fix: false,
        }
    }
}

/// Storage for a request: the directory tree for assets and folders, an
/// in-memory registry for objects.
pub fn open_storage(request: &RenameRequest, root: &Path) -> Box<dyn Storage> {
    match request.kind {
        ItemKind::Object => Box::new(MemoryStorage::with_items(request.items.iter().cloned())),
        ItemKind::Asset | ItemKind::Folder => Box::new(FsStorage::new(root)),
    }
}

/// Turn user-supplied paths into `/`-separated identifiers relative to root.
pub fn normalize_item(root: &Path, item: &str) -> String {
    let path = Path::new(item);
    let relative = if path.is_absolute() {
        path.strip_prefix(root).unwrap_or(path)
    } else {
        path
    };
    relative
        .components()
        .filter_map(|c| match c {
            std::path::Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
