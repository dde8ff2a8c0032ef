use anyhow::Result;
use bulkrename_core::{preview_operation, OutputFormatter};

use crate::cli::{ChainArgs, OutputFormat, TargetArgs};
use crate::request::build_request;

pub fn handle_preview(
    target: TargetArgs,
    chain: ChainArgs,
    show_full_path: bool,
    output: OutputFormat,
    use_color: bool,
) -> Result<()> {
    let request = build_request(target, chain, show_full_path, false)?;
    let result = preview_operation(&request, None, use_color)?;

    print!("{}", result.format(output.into()));
    if output == OutputFormat::Json {
        println!();
    }
    Ok(())
}
