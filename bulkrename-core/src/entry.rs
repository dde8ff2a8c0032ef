use crate::kind::{ItemKind, NameScope};
use crate::preview::Span;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Validity of an entry's candidate name. Always derived, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameStatus {
    Valid,
    NoChange,
    Invalid,
    Duplicated,
}

impl NameStatus {
    /// Whether this status keeps the session from committing.
    pub fn blocks_commit(self) -> bool {
        matches!(self, Self::Invalid | Self::Duplicated)
    }

    pub fn reason(self) -> &'static str {
        match self {
            Self::Valid => "Ok",
            Self::NoChange => "New name is the same. Will ignore.",
            Self::Invalid => "New name contains invalid character or is empty",
            Self::Duplicated => "An item with the same name already exists",
        }
    }
}

impl fmt::Display for NameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Valid => write!(f, "valid"),
            Self::NoChange => write!(f, "no change"),
            Self::Invalid => write!(f, "invalid"),
            Self::Duplicated => write!(f, "duplicated"),
        }
    }
}

/// One item queued for rename.
#[derive(Debug, Clone)]
pub struct RenameEntry {
    original_path: String,
    candidate: String,
    /// Last storage probe for the candidate's final path; `None` until probed
    duplicate: Option<bool>,
    preview: Option<Vec<Span>>,
}

impl RenameEntry {
    /// Create an entry whose candidate starts as the editable part of `original_path`.
    pub fn new(original_path: impl Into<String>, scope: NameScope) -> Self {
        let original_path = original_path.into();
        let candidate = scope.editable_name(&original_path).to_string();
        Self {
            original_path,
            candidate,
            duplicate: None,
            preview: None,
        }
    }

    pub fn original_path(&self) -> &str {
        &self.original_path
    }

    pub fn candidate(&self) -> &str {
        &self.candidate
    }

    /// Replace the candidate; the duplicate probe becomes stale.
    pub fn set_candidate(&mut self, candidate: impl Into<String>) {
        self.candidate = candidate.into();
        self.duplicate = None;
    }

    /// Restore the candidate to the original's editable name.
    pub fn reset(&mut self, scope: NameScope) {
        let original = scope.editable_name(&self.original_path).to_string();
        self.set_candidate(original);
        self.preview = None;
    }

    pub fn duplicate(&self) -> Option<bool> {
        self.duplicate
    }

    /// Whether the duplicate flag needs a fresh probe.
    pub fn needs_probe(&self) -> bool {
        self.duplicate.is_none()
    }

    pub fn record_probe(&mut self, exists: bool) {
        self.duplicate = Some(exists);
    }

    pub fn preview(&self) -> Option<&[Span]> {
        self.preview.as_deref()
    }

    pub(crate) fn set_preview(&mut self, spans: Option<Vec<Span>>) {
        self.preview = spans;
    }

    /// Full identifier the item would be renamed to.
    pub fn final_path(&self, scope: NameScope) -> String {
        scope.final_path(&self.original_path, &self.candidate)
    }

    /// Whether committing this entry would change nothing.
    pub fn is_noop(&self, scope: NameScope) -> bool {
        self.final_path(scope) == self.original_path
    }

    /// Classify the candidate name.
    ///
    /// Precedence: empty, duplicate, unchanged, forbidden character, valid.
    /// Objects only distinguish unchanged from valid.
    pub fn status(&self, scope: NameScope) -> NameStatus {
        let unchanged = self.candidate == scope.editable_name(&self.original_path);
        if scope.kind == ItemKind::Object {
            return if unchanged {
                NameStatus::NoChange
            } else {
                NameStatus::Valid
            };
        }
        if self.candidate.is_empty() {
            return NameStatus::Invalid;
        }
        if self.duplicate == Some(true) {
            return NameStatus::Duplicated;
        }
        if unchanged {
            return NameStatus::NoChange;
        }
        if scope.find_forbidden(&self.candidate).is_some() {
            return NameStatus::Invalid;
        }
        NameStatus::Valid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEGMENT: NameScope = NameScope {
        kind: ItemKind::Asset,
        show_full_path: false,
    };

    #[test]
    fn test_new_entry_starts_unchanged() {
        let entry = RenameEntry::new("Props/Chair.mesh", SEGMENT);
        assert_eq!(entry.candidate(), "Chair");
        assert_eq!(entry.status(SEGMENT), NameStatus::NoChange);
        assert!(entry.is_noop(SEGMENT));
    }

    #[test]
    fn test_status_is_idempotent() {
        let mut entry = RenameEntry::new("Props/Chair.mesh", SEGMENT);
        entry.set_candidate("Stool");
        entry.record_probe(false);
        let first = entry.status(SEGMENT);
        assert_eq!(first, NameStatus::Valid);
        for _ in 0..3 {
            assert_eq!(entry.status(SEGMENT), first);
        }
    }

    #[test]
    fn test_empty_wins_over_forbidden_and_duplicate() {
        let mut entry = RenameEntry::new("Props/Chair.mesh", SEGMENT);
        entry.set_candidate("");
        entry.record_probe(true);
        assert_eq!(entry.status(SEGMENT), NameStatus::Invalid);
    }

    #[test]
    fn test_duplicate_wins_over_forbidden() {
        let mut entry = RenameEntry::new("Props/Chair.mesh", SEGMENT);
        entry.set_candidate("Sto?l");
        entry.record_probe(true);
        assert_eq!(entry.status(SEGMENT), NameStatus::Duplicated);
    }

    #[test]
    fn test_forbidden_character_is_invalid() {
        let mut entry = RenameEntry::new("Props/Chair.mesh", SEGMENT);
        entry.set_candidate("Sub/Chair");
        entry.record_probe(false);
        assert_eq!(entry.status(SEGMENT), NameStatus::Invalid);

        let full = NameScope::new(ItemKind::Asset, true);
        let mut entry = RenameEntry::new("Props/Chair.mesh", full);
        entry.set_candidate("Props/Sub/Chair");
        entry.record_probe(false);
        assert_eq!(entry.status(full), NameStatus::Valid);
    }

    #[test]
    fn test_set_candidate_invalidates_probe() {
        let mut entry = RenameEntry::new("Props/Chair.mesh", SEGMENT);
        entry.record_probe(true);
        assert!(!entry.needs_probe());
        entry.set_candidate("Stool");
        assert!(entry.needs_probe());
        assert_eq!(entry.duplicate(), None);
    }

    #[test]
    fn test_object_status_is_two_state() {
        let scope = NameScope::new(ItemKind::Object, false);
        let mut entry = RenameEntry::new("Light.001", scope);
        assert_eq!(entry.status(scope), NameStatus::NoChange);
        entry.set_candidate("Lamp: Key?");
        entry.record_probe(true);
        assert_eq!(entry.status(scope), NameStatus::Valid);
    }

    #[test]
    fn test_final_path_and_reset() {
        let mut entry = RenameEntry::new("Props/Chair.mesh", SEGMENT);
        entry.set_candidate("Stool");
        assert_eq!(entry.final_path(SEGMENT), "Props/Stool.mesh");
        assert!(!entry.is_noop(SEGMENT));
        entry.reset(SEGMENT);
        assert_eq!(entry.candidate(), "Chair");
        assert!(entry.is_noop(SEGMENT));
    }
}
