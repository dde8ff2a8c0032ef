use anyhow::{Context, Result};
use bulkrename_core::interrupt::{commit_in_flight, interrupt_requested, request_interrupt};
use bulkrename_core::preview::should_use_color;
use bulkrename_core::{Config, OutputFormatter, VersionResult};
use clap::Parser;
use std::path::Path;
use std::process;

mod apply;
mod cli;
mod preview;
mod relink;
mod request;

use cli::{Cli, Commands, OutputFormat};

fn on_signal(name: &str) {
    if commit_in_flight() {
        eprintln!("\nReceived {name}. Renames are under way; finishing the batch...");
    } else {
        eprintln!("\nReceived {name}. Stopping before anything is renamed...");
    }
    request_interrupt();
}

fn install_signal_handlers() {
    // SIGINT (Ctrl-C)
    if let Err(e) = ctrlc::set_handler(|| on_signal("SIGINT")) {
        eprintln!("Warning: could not install SIGINT handler: {e}");
    }

    // SIGTERM
    let registered = unsafe {
        signal_hook::low_level::register(signal_hook::consts::SIGTERM, || on_signal("SIGTERM"))
    };
    if let Err(e) = registered {
        eprintln!("Warning: could not install SIGTERM handler: {e}");
    }
}

fn main() {
    install_signal_handlers();

    let cli = Cli::parse();

    // Handle -C directory flag
    if let Some(ref dir) = cli.directory {
        std::env::set_current_dir(dir)
            .with_context(|| format!("Failed to change to directory: {}", dir.display()))
            .unwrap_or_else(|e| {
                eprintln!("Error: {e:#}");
                process::exit(2);
            });
    }

    let config = Config::load(Path::new(".")).unwrap_or_else(|e| {
        eprintln!("Warning: {e:#}; using default settings");
        Config::default()
    });
    let use_color = !cli.no_color && should_use_color(config.defaults.use_color);
    let show_full_path = config.defaults.show_full_path;

    let result = match cli.command {
        Commands::Preview {
            target,
            chain,
            output,
        } => preview::handle_preview(target, chain, show_full_path, output, use_color),

        Commands::Apply {
            target,
            chain,
            vcs,
            output,
            quiet,
        } => apply::handle_apply(target, chain, show_full_path, vcs, output, quiet, use_color),

        Commands::Relink { output, quiet } => relink::handle_relink(output, quiet),

        Commands::Version { output } => handle_version(output),
    };

    match result {
        Ok(()) => process::exit(0),
        Err(e) => {
            eprintln!("Error: {e:#}");
            process::exit(exit_code(&e));
        },
    }
}

/// 130 when a signal stopped the batch, 1 when nothing could be renamed,
/// 2 for bad input, 3 for anything else.
fn exit_code(error: &anyhow::Error) -> i32 {
    if interrupt_requested() {
        return 130;
    }
    let message = format!("{error:#}").to_lowercase();
    if message.contains("cannot rename")
        || message.contains("nothing to rename")
        || message.contains("aborted")
    {
        1
    } else if message.contains("invalid")
        || message.contains("not found")
        || message.contains("no item")
        || message.contains("not enabled")
    {
        2
    } else {
        3
    }
}

fn handle_version(output: OutputFormat) -> Result<()> {
    let version_result = VersionResult {
        name: "bulkrename".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    println!("{}", version_result.format(output.into()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_code(&anyhow::anyhow!("Cannot rename:\n  a: b")), 1);
        assert_eq!(
            exit_code(&anyhow::anyhow!("Connect to server failed").context("Bulk rename aborted")),
            1
        );
        assert_eq!(exit_code(&anyhow::anyhow!("Item not found: a.txt")), 2);
        assert_eq!(exit_code(&anyhow::anyhow!("disk on fire")), 3);
    }
}
