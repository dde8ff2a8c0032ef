use crate::config::{Config, STATE_DIR};
use crate::journal::RelinkJournal;
use crate::lock::BatchLock;
use crate::oplog::{new_batch_id, OperationLog};
use crate::orchestrator::relink;
use crate::output::{FailureReport, RelinkResult};
use crate::storage::{FsStorage, Storage};
use crate::vcs::{P4Connector, VcsConnector};
use anyhow::{bail, Context, Result};
use std::path::Path;

/// High-level relink operation - equivalent to `bulkrename relink`
pub fn relink_operation(working_dir: Option<&Path>) -> Result<RelinkResult> {
    let root = working_dir.unwrap_or_else(|| Path::new("."));
    let journal = RelinkJournal::in_dir(&root.join(STATE_DIR));
    if journal.pending()?.is_empty() {
        return Ok(RelinkResult {
            relinked: 0,
            pending: Vec::new(),
            failures: Vec::new(),
        });
    }

    let config = Config::load(root)?;
    if !config.vcs.enabled {
        bail!(
            "Version control is not enabled. Set `enabled = true` under [vcs] in {}/config.toml",
            STATE_DIR
        );
    }
    let connector = P4Connector::new(config.vcs);
    let mut storage = FsStorage::new(root);
    relink_with(root, &mut storage, &connector)
}

/// Replay every pending history move from the journal.
///
/// Pairs that still fail are written back; the journal disappears once
/// everything went through.
pub fn relink_with(
    root: &Path,
    storage: &mut dyn Storage,
    connector: &dyn VcsConnector,
) -> Result<RelinkResult> {
    let state_dir = root.join(STATE_DIR);
    let journal = RelinkJournal::in_dir(&state_dir);
    let pending = journal.pending()?;
    if pending.is_empty() {
        return Ok(RelinkResult {
            relinked: 0,
            pending: Vec::new(),
            failures: Vec::new(),
        });
    }

    let _lock = BatchLock::acquire(&state_dir)?;
    let batch_id = format!("relink-{}", new_batch_id());
    let mut log = OperationLog::for_batch(&state_dir, &batch_id)
        .context("Failed to open operation log")?;
    log.log(&format!("Replaying {} pending history move(s)", pending.len()));

    let mut session = connector
        .connect()
        .context("Failed to connect to version control")?;

    let mut relinked = 0;
    let mut still_pending = Vec::new();
    let mut failures = Vec::new();
    for pair in pending {
        match relink(&mut *storage, session.as_mut(), &pair) {
            Ok(()) => {
                log.log(&format!(
                    "Moved {} -> {}",
                    pair.from.display(),
                    pair.to.display()
                ));
                relinked += 1;
            },
            Err(e) => {
                log.log(&e.to_string());
                failures.push(FailureReport {
                    from: pair.from.display().to_string(),
                    to: pair.to.display().to_string(),
                    error: e.to_string(),
                });
                still_pending.push(pair);
            },
        }
    }

    journal.replace_all(&batch_id, still_pending.clone())?;
    Ok(RelinkResult {
        relinked,
        pending: still_pending,
        failures,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_nothing_pending() {
        let temp_dir = TempDir::new().unwrap();
        let result = relink_operation(Some(temp_dir.path())).unwrap();
        assert_eq!(result.relinked, 0);
        assert!(result.pending.is_empty());
    }
}
