use crate::chain::{ChainEdit, TransformChain};
use crate::entry::{NameStatus, RenameEntry};
use crate::kind::{ItemKind, NameScope};
use crate::matcher::ChainError;
use crate::preview::{self, render_markup, Span};
use crate::storage::Storage;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Session-wide settings chosen when the items are selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub kind: ItemKind,
    /// Edit whole asset paths rather than leaf names
    pub show_full_path: bool,
    /// Route the commit through the version-control aware path
    pub vcs_fix: bool,
}

impl SessionConfig {
    pub fn new(kind: ItemKind) -> Self {
        Self {
            kind,
            show_full_path: false,
            vcs_fix: false,
        }
    }

    pub fn scope(&self) -> NameScope {
        NameScope::new(self.kind, self.show_full_path)
    }
}

/// One item moving from `from` to `to`, both full identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameItem {
    pub from: String,
    pub to: String,
}

/// The finalized renames handed to the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitSet {
    pub kind: ItemKind,
    pub vcs_fix: bool,
    pub items: Vec<RenameItem>,
}

impl CommitSet {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Immutable view of one entry for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryRow {
    pub original_path: String,
    /// The editable part of the original, shown in the "Old" column
    pub original_name: String,
    pub candidate: String,
    pub final_path: String,
    pub preview: Vec<Span>,
    pub status: NameStatus,
}

impl EntryRow {
    pub fn markup(&self) -> String {
        render_markup(&self.preview)
    }
}

/// Immutable view of a whole session, rebuilt after every change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub config: SessionConfig,
    pub chain: TransformChain,
    pub editing: bool,
    pub can_commit: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain_error: Option<String>,
    pub rows: Vec<EntryRow>,
}

/// The set of entries being renamed together with the pending chain.
///
/// All changes come in through the methods below; derived state (previews,
/// duplicate probes, statuses) is recomputed here and read back through
/// `snapshot`.
#[derive(Debug, Clone)]
pub struct RenameSession {
    entries: Vec<RenameEntry>,
    chain: TransformChain,
    config: SessionConfig,
    editing: bool,
    chain_error: Option<ChainError>,
}

impl RenameSession {
    /// Start a session over `items`, kept in selection order.
    pub fn new<I, S>(items: I, config: SessionConfig, storage: &dyn Storage) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let scope = config.scope();
        let entries = items
            .into_iter()
            .map(|item| RenameEntry::new(item, scope))
            .collect();
        let mut session = Self {
            entries,
            chain: TransformChain::new(),
            config,
            editing: false,
            chain_error: None,
        };
        session.probe_duplicates(storage);
        session
    }

    pub fn entries(&self) -> &[RenameEntry] {
        &self.entries
    }

    pub fn config(&self) -> SessionConfig {
        self.config
    }

    pub fn chain(&self) -> &TransformChain {
        &self.chain
    }

    pub fn is_editing(&self) -> bool {
        self.editing
    }

    pub fn chain_error(&self) -> Option<&ChainError> {
        self.chain_error.as_ref()
    }

    pub fn set_vcs_fix(&mut self, enabled: bool) {
        self.config.vcs_fix = enabled;
    }

    /// Change one pending chain parameter and refresh every preview.
    pub fn set_chain_param(&mut self, edit: ChainEdit) {
        self.chain.edit(edit);
        self.editing = true;
        self.refresh_previews();
    }

    /// Replace the whole pending chain at once.
    pub fn set_chain(&mut self, chain: TransformChain) {
        self.editing = !chain.is_identity();
        self.chain = chain;
        self.refresh_previews();
    }

    /// Drop the pending chain without touching any candidate.
    pub fn reset_chain(&mut self) {
        self.chain = TransformChain::new();
        self.editing = false;
        self.chain_error = None;
        for entry in &mut self.entries {
            entry.set_preview(None);
        }
    }

    /// Commit the pending chain into every candidate, then reset it.
    ///
    /// Nothing changes when the chain's search pattern does not compile.
    pub fn apply_chain(&mut self, storage: &dyn Storage) -> Result<(), ChainError> {
        let compiled = self.chain.compile()?;
        let renamed: Vec<String> = self
            .entries
            .iter()
            .map(|entry| compiled.apply(entry.candidate()))
            .collect();
        for (entry, candidate) in self.entries.iter_mut().zip(renamed) {
            entry.set_candidate(candidate);
        }
        self.reset_chain();
        self.probe_duplicates(storage);
        Ok(())
    }

    /// Manually edit one candidate. Returns the new status, or `None` if the
    /// index is out of range.
    pub fn set_candidate(
        &mut self,
        index: usize,
        candidate: impl Into<String>,
        storage: &dyn Storage,
    ) -> Option<NameStatus> {
        let entry = self.entries.get_mut(index)?;
        entry.set_candidate(candidate);
        if self.editing {
            self.refresh_previews();
        }
        self.probe_duplicates(storage);
        self.status(index)
    }

    /// Switch between leaf-name and full-path editing; resets every entry.
    pub fn set_show_full_path(&mut self, show_full_path: bool, storage: &dyn Storage) {
        self.config.show_full_path = show_full_path;
        self.reset_all(storage);
    }

    /// Restore every candidate to its original and clear the chain.
    pub fn reset_all(&mut self, storage: &dyn Storage) {
        let scope = self.config.scope();
        for entry in &mut self.entries {
            entry.reset(scope);
        }
        self.reset_chain();
        self.probe_duplicates(storage);
    }

    /// Status of the entry at `index`, or `None` if it is out of range.
    ///
    /// Two changed entries that would land on the same path are both
    /// reported as duplicated.
    pub fn status(&self, index: usize) -> Option<NameStatus> {
        let scope = self.config.scope();
        let entry = self.entries.get(index)?;
        let status = entry.status(scope);
        if status == NameStatus::Valid && scope.has_path_semantics() {
            let target = entry.final_path(scope);
            let clashes = self
                .entries
                .iter()
                .enumerate()
                .any(|(i, other)| i != index && other.final_path(scope) == target);
            if clashes {
                return Some(NameStatus::Duplicated);
            }
        }
        Some(status)
    }

    pub fn statuses(&self) -> Vec<NameStatus> {
        let scope = self.config.scope();
        let mut targets: HashMap<String, usize> = HashMap::new();
        for entry in &self.entries {
            *targets.entry(entry.final_path(scope)).or_insert(0) += 1;
        }
        self.entries
            .iter()
            .map(|entry| {
                let status = entry.status(scope);
                if status == NameStatus::Valid
                    && scope.has_path_semantics()
                    && targets[&entry.final_path(scope)] > 1
                {
                    NameStatus::Duplicated
                } else {
                    status
                }
            })
            .collect()
    }

    /// Whether the session may be committed right now.
    pub fn can_commit(&self) -> bool {
        if self.editing {
            return false;
        }
        let statuses = self.statuses();
        if statuses.iter().any(|s| s.blocks_commit()) {
            return false;
        }
        statuses.contains(&NameStatus::Valid)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let scope = self.config.scope();
        let rows = self
            .entries
            .iter()
            .zip(self.statuses())
            .map(|(entry, status)| EntryRow {
                original_path: entry.original_path().to_string(),
                original_name: scope.editable_name(entry.original_path()).to_string(),
                candidate: entry.candidate().to_string(),
                final_path: entry.final_path(scope),
                preview: entry
                    .preview()
                    .map_or_else(|| vec![Span::kept(entry.candidate())], <[Span]>::to_vec),
                status,
            })
            .collect();

        SessionSnapshot {
            config: self.config,
            chain: self.chain.clone(),
            editing: self.editing,
            can_commit: self.can_commit(),
            chain_error: self.chain_error.as_ref().map(ToString::to_string),
            rows,
        }
    }

    /// Finish the session: the renames left once entries whose final path
    /// equals their original are dropped.
    pub fn into_commit_set(self) -> CommitSet {
        let scope = self.config.scope();
        CommitSet {
            kind: self.config.kind,
            vcs_fix: self.config.vcs_fix,
            items: self
                .entries
                .iter()
                .filter(|entry| !entry.is_noop(scope))
                .map(|entry| RenameItem {
                    from: entry.original_path().to_string(),
                    to: entry.final_path(scope),
                })
                .collect(),
        }
    }

    fn refresh_previews(&mut self) {
        if self.chain.is_identity() {
            self.chain_error = None;
            for entry in &mut self.entries {
                entry.set_preview(None);
            }
            return;
        }
        match self.chain.compile() {
            Ok(compiled) => {
                self.chain_error = None;
                for entry in &mut self.entries {
                    let spans = preview::annotate(entry.candidate(), &compiled);
                    entry.set_preview(Some(spans));
                }
            },
            Err(e) => {
                self.chain_error = Some(e);
                for entry in &mut self.entries {
                    entry.set_preview(None);
                }
            },
        }
    }

    /// Re-probe storage for every entry whose candidate changed since its
    /// last probe.
    fn probe_duplicates(&mut self, storage: &dyn Storage) {
        let scope = self.config.scope();
        for entry in &mut self.entries {
            if !entry.needs_probe() {
                continue;
            }
            let exists = if scope.has_path_semantics() && !entry.is_noop(scope) {
                storage.exists(&entry.final_path(scope))
            } else {
                false
            };
            entry.record_probe(exists);
        }
    }
}
