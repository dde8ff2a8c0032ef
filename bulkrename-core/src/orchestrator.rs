//! Commit a finished session to storage, optionally through version control.
//!
//! The version-control aware path keeps history attached to renamed files:
//! every affected file is checked out first, storage performs the rename,
//! and then each new file is moved back to its old location on disk so the
//! server can record the rename itself with `move old new`.

use crate::interrupt::{self, CommitInFlightGuard};
use crate::journal::{JournalEntry, RelinkJournal, RelinkPair};
use crate::kind::ItemKind;
use crate::notify::{Hyperlink, NotifyLevel, Notifier};
use crate::oplog::{new_batch_id, OperationLog};
use crate::session::{CommitSet, RenameItem};
use crate::storage::{Storage, StorageError};
use crate::vcs::{CommandError, ConnectError, VcsConnector, VcsSession};
use std::collections::HashSet;
use std::io;
use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("Can not checkout files ({} requested){}", .files.len(), format_messages(.messages))]
pub struct CheckoutError {
    pub files: Vec<PathBuf>,
    pub messages: Vec<String>,
}

fn format_messages(messages: &[String]) -> String {
    if messages.is_empty() {
        String::new()
    } else {
        format!(": {}", messages.join("; "))
    }
}

/// Why re-linking one file's history failed.
#[derive(Debug, Error)]
pub enum MoveError {
    #[error("Can not move {} back to {}: {source}", .from.display(), .to.display())]
    MoveBack {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Command(#[from] CommandError),

    #[error("Can not move file from {} to {}{}", .from.display(), .to.display(), format_messages(.messages))]
    Rejected {
        from: PathBuf,
        to: PathBuf,
        messages: Vec<String>,
    },

    /// The history move failed and the file could not be put back: it is
    /// stranded at `from` while storage expects it at `to`.
    #[error("File left at {}, could not restore it to {}: {source} ({cause})", .from.display(), .to.display())]
    Restore {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
        cause: Box<MoveError>,
    },
}

#[derive(Debug, Error)]
pub enum ItemError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Move(#[from] MoveError),
}

/// One item that did not make it through the batch.
#[derive(Debug)]
pub struct ItemFailure {
    pub from: String,
    pub to: String,
    pub error: ItemError,
}

/// Failures that stop a batch before storage is touched.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    #[error("Interrupted before checkout; nothing was renamed")]
    Interrupted,
}

#[derive(Debug)]
pub enum BatchOutcome {
    Completed {
        renamed: Vec<RenameItem>,
    },
    CompletedWithWarnings {
        renamed: Vec<RenameItem>,
        failures: Vec<ItemFailure>,
    },
    Aborted(BatchError),
}

impl BatchOutcome {
    fn finish(renamed: Vec<RenameItem>, failures: Vec<ItemFailure>) -> Self {
        if failures.is_empty() {
            Self::Completed { renamed }
        } else {
            Self::CompletedWithWarnings { renamed, failures }
        }
    }

    pub fn renamed(&self) -> &[RenameItem] {
        match self {
            Self::Completed { renamed } | Self::CompletedWithWarnings { renamed, .. } => renamed,
            Self::Aborted(_) => &[],
        }
    }

    pub fn failures(&self) -> &[ItemFailure] {
        match self {
            Self::CompletedWithWarnings { failures, .. } => failures,
            _ => &[],
        }
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self, Self::Aborted(_))
    }
}

/// Turns storage's own source-control integration off until dropped.
struct SourceControlPause<'s> {
    storage: &'s mut dyn Storage,
}

impl<'s> SourceControlPause<'s> {
    fn new(storage: &'s mut dyn Storage) -> Self {
        storage.set_auto_source_control(false);
        Self { storage }
    }
}

impl<'s> Deref for SourceControlPause<'s> {
    type Target = dyn Storage + 's;

    fn deref(&self) -> &Self::Target {
        self.storage
    }
}

impl<'s> DerefMut for SourceControlPause<'s> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.storage
    }
}

impl Drop for SourceControlPause<'_> {
    fn drop(&mut self) {
        self.storage.set_auto_source_control(true);
    }
}

/// A leaf item moving as part of a (possibly folder) rename.
#[derive(Debug, Clone)]
struct LeafMove {
    /// The committed item this leaf belongs to
    item: usize,
    old: String,
    new: String,
}

/// Move a renamed file's history on the server.
///
/// The new file is first moved back to its old location so the server sees
/// an ordinary `move old new`. If the server refuses, the file is put back
/// where storage expects it.
pub fn relink(
    storage: &mut dyn Storage,
    session: &mut dyn VcsSession,
    pair: &RelinkPair,
) -> Result<(), MoveError> {
    storage
        .move_physical(&pair.to, &pair.from)
        .map_err(|source| MoveError::MoveBack {
            from: pair.to.clone(),
            to: pair.from.clone(),
            source,
        })?;

    let args = vec![path_arg(&pair.from), path_arg(&pair.to)];
    let result = match session.run_command("move", &args) {
        Ok(records) if records.is_empty() || records.has_errors() => Err(MoveError::Rejected {
            from: pair.from.clone(),
            to: pair.to.clone(),
            messages: records.errors,
        }),
        Ok(_) => Ok(()),
        Err(e) => Err(MoveError::from(e)),
    };

    match result {
        Err(cause) => match storage.move_physical(&pair.from, &pair.to) {
            Ok(()) => Err(cause),
            Err(source) => Err(MoveError::Restore {
                from: pair.from.clone(),
                to: pair.to.clone(),
                source,
                cause: Box::new(cause),
            }),
        },
        Ok(()) => Ok(()),
    }
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Runs one commit set against storage and, when asked, version control.
pub struct Orchestrator<'a> {
    storage: &'a mut dyn Storage,
    notifier: &'a dyn Notifier,
    log: OperationLog,
    journal: Option<RelinkJournal>,
    batch_id: String,
}

impl<'a> Orchestrator<'a> {
    pub fn new(storage: &'a mut dyn Storage, notifier: &'a dyn Notifier) -> Self {
        Self {
            storage,
            notifier,
            log: OperationLog::disabled(),
            journal: None,
            batch_id: new_batch_id(),
        }
    }

    #[must_use]
    pub fn with_log(mut self, log: OperationLog) -> Self {
        self.log = log;
        self
    }

    #[must_use]
    pub fn with_journal(mut self, journal: RelinkJournal) -> Self {
        self.journal = Some(journal);
        self
    }

    #[must_use]
    pub fn with_batch_id(mut self, batch_id: impl Into<String>) -> Self {
        self.batch_id = batch_id.into();
        self
    }

    pub fn batch_id(&self) -> &str {
        &self.batch_id
    }

    pub fn log_path(&self) -> Option<&Path> {
        self.log.path()
    }

    /// Rename every item in `set` and notify the user of the result.
    ///
    /// Version control is used only when a connector is given, the set asks
    /// for it and the items are not in-memory objects.
    pub fn commit(&mut self, set: &CommitSet, connector: Option<&dyn VcsConnector>) -> BatchOutcome {
        let outcome = match connector {
            Some(connector) if set.vcs_fix && set.kind != ItemKind::Object => {
                self.commit_with_vcs(set, connector)
            },
            _ => self.commit_plain(set),
        };
        self.report(set, &outcome);
        outcome
    }

    fn commit_plain(&mut self, set: &CommitSet) -> BatchOutcome {
        self.log.log(&format!(
            "Batch {}: renaming {} {} item(s)",
            self.batch_id,
            set.items.len(),
            set.kind
        ));
        let mut renamed = Vec::new();
        let mut failures = Vec::new();
        for item in &set.items {
            match self.storage.rename(&item.from, &item.to) {
                Ok(()) => {
                    self.log.log(&format!("Renamed {} -> {}", item.from, item.to));
                    renamed.push(item.clone());
                },
                Err(e) => {
                    self.log.log(&format!("Failed {} -> {}: {}", item.from, item.to, e));
                    failures.push(ItemFailure {
                        from: item.from.clone(),
                        to: item.to.clone(),
                        error: e.into(),
                    });
                },
            }
        }
        BatchOutcome::finish(renamed, failures)
    }

    fn commit_with_vcs(&mut self, set: &CommitSet, connector: &dyn VcsConnector) -> BatchOutcome {
        self.log.log(&format!(
            "Batch {}: renaming {} {} item(s) with version control",
            self.batch_id,
            set.items.len(),
            set.kind
        ));
        if interrupt::interrupt_requested() {
            self.log.log("Interrupted before connecting");
            return BatchOutcome::Aborted(BatchError::Interrupted);
        }

        let mut session = match connector.connect() {
            Ok(session) => session,
            Err(e) => {
                self.log.log(&format!("Connection failed: {}", e));
                return BatchOutcome::Aborted(e.into());
            },
        };
        self.log.log("Connected to version control");

        let mut storage = SourceControlPause::new(&mut *self.storage);
        self.log.log("Auto source control disabled");

        let moves = expand_moves(&*storage, set);
        let checkout = checkout_list(&*storage, &moves);
        self.log.log(&format!("Checking out {} file(s)", checkout.len()));

        // Last point at which the batch can stop without leaving work behind
        if interrupt::interrupt_requested() {
            self.log.log("Interrupted before checkout");
            return BatchOutcome::Aborted(BatchError::Interrupted);
        }

        let args: Vec<String> = checkout.iter().map(|p| path_arg(p)).collect();
        let messages = match session.run_command("edit", &args) {
            Ok(records) if !records.is_empty() => None,
            Ok(records) => Some(records.errors),
            Err(e) => Some(vec![e.to_string()]),
        };
        if let Some(messages) = messages {
            self.log.log("Checkout failed; nothing renamed");
            return BatchOutcome::Aborted(BatchError::Checkout(CheckoutError {
                files: checkout,
                messages,
            }));
        }

        let _in_flight = CommitInFlightGuard::activate();
        let pairs: Vec<RelinkPair> = moves
            .iter()
            .map(|m| RelinkPair {
                from: storage.resolve(&m.old),
                to: storage.resolve(&m.new),
            })
            .collect();
        if let Some(journal) = &self.journal {
            if let Err(e) = journal.record(JournalEntry::new(self.batch_id.clone(), pairs.clone())) {
                self.log.log(&format!("Could not write relink journal: {:#}", e));
            }
        }

        let mut renamed = Vec::new();
        let mut failures = Vec::new();
        let mut failed_items = HashSet::new();
        for (index, item) in set.items.iter().enumerate() {
            match storage.rename(&item.from, &item.to) {
                Ok(()) => {
                    self.log.log(&format!("Renamed {} -> {}", item.from, item.to));
                    renamed.push(item.clone());
                },
                Err(e) => {
                    self.log.log(&format!("Failed {} -> {}: {}", item.from, item.to, e));
                    failed_items.insert(index);
                    failures.push(ItemFailure {
                        from: item.from.clone(),
                        to: item.to.clone(),
                        error: e.into(),
                    });
                },
            }
        }

        let mut pending = Vec::new();
        for (leaf, pair) in moves.iter().zip(&pairs) {
            if failed_items.contains(&leaf.item) {
                continue;
            }
            match relink(&mut *storage, session.as_mut(), pair) {
                Ok(()) => self.log.log(&format!(
                    "Moved {} -> {}",
                    pair.from.display(),
                    pair.to.display()
                )),
                Err(e) => {
                    if matches!(e, MoveError::Restore { .. }) {
                        self.log.log(&format!(
                            "Stranded: {} must be moved to {} by hand",
                            pair.from.display(),
                            pair.to.display()
                        ));
                    }
                    self.log.log(&format!("{}", e));
                    pending.push(pair.clone());
                    failures.push(ItemFailure {
                        from: leaf.old.clone(),
                        to: leaf.new.clone(),
                        error: e.into(),
                    });
                },
            }
        }

        if let Some(journal) = &self.journal {
            if let Err(e) = journal.settle(&self.batch_id, pending) {
                self.log.log(&format!("Could not update relink journal: {:#}", e));
            }
        }

        drop(storage);
        self.log.log("Auto source control re-enabled");
        BatchOutcome::finish(renamed, failures)
    }

    fn report(&mut self, set: &CommitSet, outcome: &BatchOutcome) {
        let link = self
            .log
            .path()
            .map(|path| Hyperlink::new("log", path.display().to_string()));
        match outcome {
            BatchOutcome::Aborted(e) => {
                self.log.log(&format!("Aborted: {}", e));
                self.notifier
                    .notify(NotifyLevel::Error, &e.to_string(), link.as_ref());
            },
            BatchOutcome::Completed { renamed } | BatchOutcome::CompletedWithWarnings { renamed, .. } => {
                let message = format!("Bulk rename on {} {}(s) done", renamed.len(), set.kind);
                self.log.log(&message);
                self.notifier
                    .notify(NotifyLevel::Success, &message, link.as_ref());
                for failure in outcome.failures() {
                    self.notifier.notify(
                        NotifyLevel::Error,
                        &format!("{} -> {}: {}", failure.from, failure.to, failure.error),
                        link.as_ref(),
                    );
                }
            },
        }
    }
}

/// Leaf items touched by each committed rename. Folders contribute every
/// item below them, paired old to new by swapping the folder prefix.
fn expand_moves(storage: &dyn Storage, set: &CommitSet) -> Vec<LeafMove> {
    let mut moves = Vec::new();
    for (index, item) in set.items.iter().enumerate() {
        if set.kind == ItemKind::Folder {
            let folder = item.from.trim_end_matches('/');
            let target = item.to.trim_end_matches('/');
            for old in storage.list_items(&item.from) {
                let Some(rest) = old.strip_prefix(folder).filter(|rest| rest.starts_with('/')) else {
                    continue;
                };
                let new = format!("{}{}", target, rest);
                moves.push(LeafMove {
                    item: index,
                    old,
                    new,
                });
            }
        } else {
            moves.push(LeafMove {
                item: index,
                old: item.from.clone(),
                new: item.to.clone(),
            });
        }
    }
    moves
}

/// Physical files to check out: each moving item, then everything that
/// references it or that it depends on. Ordered, without duplicates.
fn checkout_list(storage: &dyn Storage, moves: &[LeafMove]) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    let mut files = Vec::new();
    for leaf in moves {
        let related = std::iter::once(leaf.old.clone())
            .chain(storage.referencers(&leaf.old))
            .chain(storage.dependencies(&leaf.old));
        for item in related {
            let path = storage.resolve(&item);
            if seen.insert(path.clone()) {
                files.push(path);
            }
        }
    }
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::RecordingNotifier;
    use crate::storage::MemoryStorage;

    fn set(kind: ItemKind, items: &[(&str, &str)]) -> CommitSet {
        CommitSet {
            kind,
            vcs_fix: true,
            items: items
                .iter()
                .map(|(from, to)| RenameItem {
                    from: (*from).to_string(),
                    to: (*to).to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_expand_folder_moves() {
        let storage = MemoryStorage::with_items(["maps/a", "maps/sub/b", "other"]);
        let moves = expand_moves(&storage, &set(ItemKind::Folder, &[("maps", "levels")]));
        let pairs: Vec<_> = moves.iter().map(|m| (m.old.as_str(), m.new.as_str())).collect();
        assert_eq!(
            pairs,
            vec![("maps/a", "levels/a"), ("maps/sub/b", "levels/sub/b")]
        );
    }

    #[test]
    fn test_expand_folder_with_trailing_slash() {
        let storage = MemoryStorage::with_items(["maps/a", "maps/sub/b"]);
        let moves = expand_moves(&storage, &set(ItemKind::Folder, &[("maps/", "levels/")]));
        let pairs: Vec<_> = moves.iter().map(|m| (m.old.as_str(), m.new.as_str())).collect();
        assert_eq!(
            pairs,
            vec![("maps/a", "levels/a"), ("maps/sub/b", "levels/sub/b")]
        );
    }

    #[test]
    fn test_checkout_list_is_ordered_and_unique() {
        let storage = MemoryStorage::with_items(["old1", "old2", "dep1", "user"])
            .with_dependency("old1", "dep1")
            .with_dependency("old2", "dep1")
            .with_dependency("user", "old1");
        let moves = expand_moves(
            &storage,
            &set(ItemKind::Asset, &[("old1", "new1"), ("old2", "new2")]),
        );
        let files = checkout_list(&storage, &moves);
        assert_eq!(
            files,
            vec![
                PathBuf::from("old1"),
                PathBuf::from("user"),
                PathBuf::from("dep1"),
                PathBuf::from("old2")
            ]
        );
    }

    #[test]
    fn test_plain_commit_collects_failures() {
        let mut storage = MemoryStorage::with_items(["a", "b", "taken"]);
        let notifier = RecordingNotifier::new();
        let mut orchestrator = Orchestrator::new(&mut storage, &notifier);
        let outcome = orchestrator.commit(
            &set(ItemKind::Asset, &[("a", "x"), ("b", "taken")]),
            None,
        );

        assert_eq!(outcome.renamed().len(), 1);
        assert_eq!(outcome.failures().len(), 1);
        assert_eq!(outcome.failures()[0].from, "b");
        assert_eq!(notifier.count(NotifyLevel::Success), 1);
        assert_eq!(notifier.count(NotifyLevel::Error), 1);
        assert_eq!(storage.items(), vec!["b", "taken", "x"]);
    }

    #[test]
    fn test_pause_reenables_on_drop() {
        let mut storage = MemoryStorage::new();
        {
            let paused = SourceControlPause::new(&mut storage);
            assert!(!paused.exists("nothing"));
        }
        assert!(storage.auto_source_control());
        assert_eq!(
            storage.calls(),
            vec![
                crate::storage::StorageCall::SetAutoSourceControl(false),
                crate::storage::StorageCall::SetAutoSourceControl(true)
            ]
        );
    }
}
