use super::{open_storage, RenameRequest};
use crate::kind::ItemKind;
use crate::output::{PreviewResult, PreviewRow};
use crate::preview::{render_markup, render_table, spans_result, Span};
use crate::session::{RenameSession, SessionConfig, SessionSnapshot};
use crate::storage::Storage;
use anyhow::{anyhow, bail, Context, Result};
use std::path::Path;

/// A session with the request's chain and manual names applied, plus a
/// display snapshot whose rows still show what the chain changed.
#[derive(Debug, Clone)]
pub struct PlannedSession {
    pub session: RenameSession,
    pub display: SessionSnapshot,
}

/// Build the session for a request against `storage`.
pub fn plan_session(request: &RenameRequest, storage: &dyn Storage) -> Result<PlannedSession> {
    let mut config = SessionConfig::new(request.kind);
    config.show_full_path = request.show_full_path;
    config.vcs_fix = request.vcs_fix;

    let mut session = RenameSession::new(request.items.iter().cloned(), config, storage);
    session.set_chain(request.chain.clone());
    let pending = session.snapshot();
    session
        .apply_chain(storage)
        .context("Invalid search pattern")?;

    for (index, name) in &request.names {
        session
            .set_candidate(*index, name.clone(), storage)
            .ok_or_else(|| {
                anyhow!(
                    "No item at position {} ({} items selected)",
                    index,
                    request.items.len()
                )
            })?;
    }

    let mut display = session.snapshot();
    for (row, before) in display.rows.iter_mut().zip(&pending.rows) {
        row.preview = if spans_result(&before.preview) == row.candidate {
            before.preview.clone()
        } else if row.candidate == row.original_name {
            vec![Span::kept(row.candidate.as_str())]
        } else {
            // Renamed by hand after the chain
            vec![
                Span::removed(row.original_name.as_str()),
                Span::added(row.candidate.as_str()),
            ]
        };
    }

    Ok(PlannedSession { session, display })
}

pub(crate) fn ensure_items_exist(request: &RenameRequest, storage: &dyn Storage) -> Result<()> {
    if request.items.is_empty() {
        bail!("No items selected");
    }
    if request.kind == ItemKind::Object {
        return Ok(());
    }
    for item in &request.items {
        if !storage.exists(item) {
            bail!("Item not found: {}", item);
        }
    }
    Ok(())
}

/// High-level preview operation - equivalent to `bulkrename preview`
pub fn preview_operation(
    request: &RenameRequest,
    working_dir: Option<&Path>,
    use_color: bool,
) -> Result<PreviewResult> {
    let root = working_dir.unwrap_or_else(|| Path::new("."));
    let storage = open_storage(request, root);
    ensure_items_exist(request, storage.as_ref())?;

    let planned = plan_session(request, storage.as_ref())?;
    let rows = planned
        .display
        .rows
        .iter()
        .map(|row| PreviewRow {
            original_path: row.original_path.clone(),
            final_path: row.final_path.clone(),
            markup: render_markup(&row.preview),
            status: row.status,
            reason: row.status.reason().to_string(),
        })
        .collect();

    Ok(PreviewResult {
        kind: request.kind,
        rows,
        can_commit: planned.session.can_commit(),
        table: render_table(&planned.display, use_color),
    })
}
