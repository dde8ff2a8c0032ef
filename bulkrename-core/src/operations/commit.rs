use super::preview::{ensure_items_exist, plan_session};
use super::{open_storage, RenameRequest};
use crate::config::{Config, STATE_DIR};
use crate::journal::RelinkJournal;
use crate::kind::ItemKind;
use crate::lock::BatchLock;
use crate::notify::{Notifier, TerminalNotifier};
use crate::oplog::{new_batch_id, OperationLog};
use crate::orchestrator::{BatchOutcome, Orchestrator};
use crate::output::{CommitResult, FailureReport};
use crate::vcs::{P4Connector, VcsConnector};
use anyhow::{bail, Context, Result};
use std::path::Path;

/// High-level apply operation - equivalent to `bulkrename apply`
pub fn commit_operation(
    request: &RenameRequest,
    working_dir: Option<&Path>,
    use_color: bool,
) -> Result<CommitResult> {
    let root = working_dir.unwrap_or_else(|| Path::new("."));
    let config = Config::load(root)?;

    let connector = if request.vcs_fix && request.kind != ItemKind::Object {
        if !config.vcs.enabled {
            bail!(
                "Version control is not enabled. Set `enabled = true` under [vcs] in {}/config.toml",
                STATE_DIR
            );
        }
        Some(P4Connector::new(config.vcs.clone()))
    } else {
        None
    };

    let notifier = TerminalNotifier::new(use_color);
    commit_with(
        request,
        root,
        connector.as_ref().map(|c| c as &dyn VcsConnector),
        &notifier,
    )
}

/// Plan, validate and commit a request with the given collaborators.
pub fn commit_with(
    request: &RenameRequest,
    root: &Path,
    connector: Option<&dyn VcsConnector>,
    notifier: &dyn Notifier,
) -> Result<CommitResult> {
    let mut storage = open_storage(request, root);
    ensure_items_exist(request, storage.as_ref())?;

    let planned = plan_session(request, storage.as_ref())?;
    if !planned.session.can_commit() {
        let blocked: Vec<String> = planned
            .display
            .rows
            .iter()
            .filter(|row| row.status.blocks_commit())
            .map(|row| format!("{}: {}", row.original_path, row.status.reason()))
            .collect();
        if blocked.is_empty() {
            bail!("Nothing to rename: every new name is the same as the original");
        }
        bail!("Cannot rename:\n  {}", blocked.join("\n  "));
    }
    let set = planned.session.into_commit_set();

    let state_dir = root.join(STATE_DIR);
    let _lock = BatchLock::acquire(&state_dir)?;
    let batch_id = new_batch_id();
    let log = OperationLog::for_batch(&state_dir, &batch_id)
        .context("Failed to open operation log")?;
    let vcs = connector.is_some() && set.vcs_fix && set.kind != ItemKind::Object;

    let mut orchestrator = Orchestrator::new(storage.as_mut(), notifier)
        .with_log(log)
        .with_journal(RelinkJournal::in_dir(&state_dir))
        .with_batch_id(batch_id.clone());
    let log_path = orchestrator.log_path().map(|p| p.display().to_string());

    let (renamed, failures) = match orchestrator.commit(&set, connector) {
        BatchOutcome::Aborted(e) => {
            return Err(anyhow::Error::new(e).context("Bulk rename aborted; nothing was renamed"))
        },
        BatchOutcome::Completed { renamed } => (renamed, Vec::new()),
        BatchOutcome::CompletedWithWarnings { renamed, failures } => (renamed, failures),
    };

    Ok(CommitResult {
        batch_id,
        kind: set.kind,
        vcs,
        renamed,
        failures: failures
            .into_iter()
            .map(|f| FailureReport {
                from: f.from,
                to: f.to,
                error: f.error.to_string(),
            })
            .collect(),
        log_path,
    })
}
