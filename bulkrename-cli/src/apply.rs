use anyhow::Result;
use bulkrename_core::{commit_operation, OutputFormatter};
use std::process;

use crate::cli::{ChainArgs, OutputFormat, TargetArgs};
use crate::request::build_request;

pub fn handle_apply(
    target: TargetArgs,
    chain: ChainArgs,
    show_full_path: bool,
    vcs: bool,
    output: OutputFormat,
    quiet: bool,
    use_color: bool,
) -> Result<()> {
    let request = build_request(target, chain, show_full_path, vcs)?;
    let result = commit_operation(&request, None, use_color)?;

    match output {
        OutputFormat::Json => {
            println!("{}", result.format_json());
        },
        OutputFormat::Summary => {
            if !quiet {
                print!("{}", result.format_summary());
            }
        },
    }

    // Some items failed but the batch itself went through
    if !result.is_clean() {
        process::exit(1);
    }
    Ok(())
}
