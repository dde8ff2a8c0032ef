use anyhow::{Context, Result};
use bulkrename_core::operations::normalize_item;
use bulkrename_core::{ItemKind, RenameRequest};

use crate::cli::{ChainArgs, TargetArgs};

/// Turn parsed arguments into a core request. Asset and folder paths are
/// made relative to the working directory.
pub fn build_request(
    target: TargetArgs,
    chain: ChainArgs,
    show_full_path: bool,
    vcs_fix: bool,
) -> Result<RenameRequest> {
    let kind = ItemKind::from(target.kind);
    let items = if kind == ItemKind::Object {
        target.items
    } else {
        let root = std::env::current_dir().context("Failed to get current directory")?;
        target
            .items
            .iter()
            .map(|item| normalize_item(&root, item))
            .collect()
    };

    let mut request = RenameRequest::new(kind, items);
    request.chain = chain.into();
    request.names = target.names;
    request.show_full_path = show_full_path || target.full_path;
    request.vcs_fix = vcs_fix;
    Ok(request)
}
