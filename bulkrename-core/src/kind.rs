use serde::{Deserialize, Serialize};
use std::fmt;

/// Characters that are never allowed in a new name.
const FORBIDDEN_CHARS: &str = "!@#$%^&*()=\\|]}[{'\";:?><`~.,";

/// What kind of item a rename session operates on.
///
/// Each variant selects a small table of pure rules: how an original
/// identifier is split into its editable name, how a candidate is turned back
/// into a full path, and which characters are forbidden.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    /// A file-backed item such as `Textures/rock.png`
    Asset,
    /// A directory such as `Textures/Rocks`
    Folder,
    /// An in-memory object identified by its label only
    Object,
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Asset => write!(f, "asset"),
            Self::Folder => write!(f, "folder"),
            Self::Object => write!(f, "object"),
        }
    }
}

impl std::str::FromStr for ItemKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "asset" | "file" => Ok(Self::Asset),
            "folder" | "dir" | "directory" => Ok(Self::Folder),
            "object" => Ok(Self::Object),
            _ => Err(format!("Invalid item kind: {}", s)),
        }
    }
}

/// Per-session naming scope threaded through the chain and status checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameScope {
    pub kind: ItemKind,
    /// Edit the whole path instead of just the leaf name (assets only)
    pub show_full_path: bool,
}

impl NameScope {
    pub fn new(kind: ItemKind, show_full_path: bool) -> Self {
        Self {
            kind,
            show_full_path,
        }
    }

    /// The part of `original` the operator edits.
    pub fn editable_name<'a>(&self, original: &'a str) -> &'a str {
        match self.kind {
            ItemKind::Folder | ItemKind::Object => original,
            ItemKind::Asset => {
                let parts = AssetPath::split(original);
                if self.show_full_path {
                    &original[..parts.stem_end]
                } else {
                    &original[parts.stem_start..parts.stem_end]
                }
            },
        }
    }

    /// Rebuild the full identifier from an edited candidate.
    pub fn final_path(&self, original: &str, candidate: &str) -> String {
        match self.kind {
            ItemKind::Folder | ItemKind::Object => candidate.to_string(),
            ItemKind::Asset => {
                let parts = AssetPath::split(original);
                let extension = &original[parts.stem_end..];
                if self.show_full_path {
                    format!("{}{}", candidate, extension)
                } else {
                    format!("{}{}{}", &original[..parts.stem_start], candidate, extension)
                }
            },
        }
    }

    /// Whether the candidate is a single path segment, making `/` illegal.
    pub fn edits_segment(&self) -> bool {
        self.kind == ItemKind::Asset && !self.show_full_path
    }

    /// Whether duplicate probes and character checks apply at all.
    pub fn has_path_semantics(&self) -> bool {
        self.kind != ItemKind::Object
    }

    /// First forbidden character in `candidate`, if any.
    pub fn find_forbidden(&self, candidate: &str) -> Option<char> {
        let segment = self.edits_segment();
        candidate
            .chars()
            .find(|c| FORBIDDEN_CHARS.contains(*c) || (segment && *c == '/'))
    }
}

/// Byte offsets splitting `dir/stem.ext`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct AssetPath {
    stem_start: usize,
    stem_end: usize,
}

impl AssetPath {
    fn split(path: &str) -> Self {
        let stem_start = path.rfind('/').map_or(0, |i| i + 1);
        let leaf = &path[stem_start..];
        // A leading dot names a hidden file, not an extension
        let stem_end = match leaf.rfind('.') {
            Some(i) if i > 0 => stem_start + i,
            _ => path.len(),
        };
        Self {
            stem_start,
            stem_end,
        }
    }
}
