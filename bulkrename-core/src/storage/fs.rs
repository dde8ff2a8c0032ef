use super::{Storage, StorageError};
use aho_corasick::AhoCorasick;
use content_inspector::ContentType;
use ignore::WalkBuilder;
use std::collections::{BTreeSet, HashMap};
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// Items are files and folders below a root directory.
///
/// A text file depends on another item when its content mentions that
/// item's relative path or file name; referencers are the inverse.
#[derive(Debug, Clone)]
pub struct FsStorage {
    root: PathBuf,
    auto_source_control: bool,
}

impl FsStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            auto_source_control: true,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn auto_source_control(&self) -> bool {
        self.auto_source_control
    }

    /// Relative `/`-separated identifier for a path below the root.
    pub fn item_for(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.root).ok()?;
        let parts: Vec<String> = relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join("/"))
        }
    }

    fn walker(&self) -> WalkBuilder {
        let mut builder = WalkBuilder::new(&self.root);
        builder
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .ignore(true)
            .parents(true)
            .hidden(true);
        builder
    }

    /// Every text file below the root with its content.
    fn text_files(&self) -> Vec<(String, String)> {
        self.walker()
            .build()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_some_and(|t| t.is_file()))
            .filter_map(|entry| {
                let item = self.item_for(entry.path())?;
                let content = read_text(entry.path())?;
                Some((item, content))
            })
            .collect()
    }

    fn files(&self) -> Vec<String> {
        self.walker()
            .build()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_some_and(|t| t.is_file()))
            .filter_map(|entry| self.item_for(entry.path()))
            .collect()
    }
}

fn read_text(path: &Path) -> Option<String> {
    let bytes = std::fs::read(path).ok()?;
    if matches!(content_inspector::inspect(&bytes), ContentType::BINARY) {
        return None;
    }
    Some(String::from_utf8_lossy(&bytes).into_owned())
}

/// Strings whose presence in a text file counts as a mention of `item`.
fn mention_keys(item: &str) -> Vec<String> {
    let mut keys = vec![item.to_string()];
    if let Some((_, name)) = item.rsplit_once('/') {
        if !name.is_empty() {
            keys.push(name.to_string());
        }
    }
    keys
}

impl Storage for FsStorage {
    fn exists(&self, path: &str) -> bool {
        self.resolve(path).exists()
    }

    fn rename(&mut self, from: &str, to: &str) -> Result<(), StorageError> {
        let source = self.resolve(from);
        let target = self.resolve(to);
        if !source.exists() {
            return Err(StorageError::NotFound {
                path: from.to_string(),
            });
        }
        if target.exists() {
            return Err(StorageError::AlreadyExists {
                path: to.to_string(),
            });
        }
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StorageError::io(to, e))?;
        }
        std::fs::rename(&source, &target).map_err(|e| StorageError::io(from, e))
    }

    fn list_items(&self, under: &str) -> Vec<String> {
        let folder = self.resolve(under);
        let mut items: Vec<String> = WalkDir::new(&folder)
            .min_depth(1)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_file())
            .filter_map(|entry| self.item_for(entry.path()))
            .collect();
        items.sort();
        items
    }

    fn referencers(&self, path: &str) -> Vec<String> {
        let Ok(automaton) = AhoCorasick::new(mention_keys(path)) else {
            return Vec::new();
        };
        let mut referencers: Vec<String> = self
            .text_files()
            .into_iter()
            .filter(|(item, content)| item != path && automaton.is_match(content))
            .map(|(item, _)| item)
            .collect();
        referencers.sort();
        referencers
    }

    fn dependencies(&self, path: &str) -> Vec<String> {
        let Some(content) = read_text(&self.resolve(path)) else {
            return Vec::new();
        };

        let candidates: Vec<String> = self.files().into_iter().filter(|f| f != path).collect();
        let mut owners: HashMap<String, Vec<usize>> = HashMap::new();
        for (index, candidate) in candidates.iter().enumerate() {
            for key in mention_keys(candidate) {
                owners.entry(key).or_default().push(index);
            }
        }
        let keys: Vec<&String> = owners.keys().collect();
        let Ok(automaton) = AhoCorasick::new(&keys) else {
            return Vec::new();
        };

        let mut found = BTreeSet::new();
        for m in automaton.find_overlapping_iter(&content) {
            for &index in &owners[keys[m.pattern().as_usize()]] {
                found.insert(candidates[index].clone());
            }
        }
        found.into_iter().collect()
    }

    fn set_auto_source_control(&mut self, enabled: bool) {
        self.auto_source_control = enabled;
    }

    fn resolve(&self, path: &str) -> PathBuf {
        path.split('/')
            .filter(|part| !part.is_empty())
            .fold(self.root.clone(), |acc, part| acc.join(part))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, FsStorage) {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        std::fs::create_dir_all(root.join("props")).unwrap();
        std::fs::create_dir_all(root.join("maps")).unwrap();
        std::fs::write(root.join("props/chair.mesh"), "mesh data").unwrap();
        std::fs::write(root.join("props/table.mesh"), "mesh data").unwrap();
        std::fs::write(root.join("maps/level.map"), "uses props/chair.mesh\n").unwrap();
        let storage = FsStorage::new(root);
        (temp_dir, storage)
    }

    #[test]
    fn test_resolve_and_item_for() {
        let (temp_dir, storage) = setup();
        let resolved = storage.resolve("props/chair.mesh");
        assert_eq!(resolved, temp_dir.path().join("props").join("chair.mesh"));
        assert_eq!(
            storage.item_for(&resolved),
            Some("props/chair.mesh".to_string())
        );
        assert!(storage.exists("props/chair.mesh"));
        assert!(!storage.exists("props/stool.mesh"));
    }

    #[test]
    fn test_list_items_is_sorted_leaves() {
        let (_temp_dir, storage) = setup();
        assert_eq!(
            storage.list_items("props"),
            vec!["props/chair.mesh".to_string(), "props/table.mesh".to_string()]
        );
    }

    #[test]
    fn test_references_by_content() {
        let (_temp_dir, storage) = setup();
        assert_eq!(
            storage.referencers("props/chair.mesh"),
            vec!["maps/level.map".to_string()]
        );
        assert!(storage.referencers("props/table.mesh").is_empty());
        assert_eq!(
            storage.dependencies("maps/level.map"),
            vec!["props/chair.mesh".to_string()]
        );
    }

    #[test]
    fn test_rename_file_and_conflict() {
        let (temp_dir, mut storage) = setup();
        storage.rename("props/chair.mesh", "props/stool.mesh").unwrap();
        assert!(temp_dir.path().join("props/stool.mesh").exists());
        assert!(matches!(
            storage.rename("props/stool.mesh", "props/table.mesh"),
            Err(StorageError::AlreadyExists { .. })
        ));
        assert!(matches!(
            storage.rename("props/chair.mesh", "props/other.mesh"),
            Err(StorageError::NotFound { .. })
        ));
    }

    #[test]
    fn test_rename_folder() {
        let (temp_dir, mut storage) = setup();
        storage.rename("props", "furniture").unwrap();
        assert!(temp_dir.path().join("furniture/chair.mesh").exists());
        assert!(!temp_dir.path().join("props").exists());
    }
}
