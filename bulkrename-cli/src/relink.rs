use anyhow::Result;
use bulkrename_core::{relink_operation, OutputFormatter};
use std::process;

use crate::cli::OutputFormat;

pub fn handle_relink(output: OutputFormat, quiet: bool) -> Result<()> {
    let result = relink_operation(None)?;

    match output {
        OutputFormat::Json => {
            println!("{}", result.format_json());
        },
        OutputFormat::Summary => {
            if !quiet {
                println!("{}", result.format_summary().trim_end());
            }
        },
    }

    if !result.pending.is_empty() {
        process::exit(1);
    }
    Ok(())
}
