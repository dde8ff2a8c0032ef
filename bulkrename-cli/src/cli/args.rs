use bulkrename_core::TransformChain;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use super::types::{parse_manual_name, KindArg, OutputFormat};

/// Bulk rename assets, folders and objects with a chain of text transformations
#[derive(Parser, Debug)]
#[command(name = "bulkrename")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Run as if started in <path> instead of the current working directory
    #[arg(short = 'C', global = true, value_name = "PATH")]
    pub directory: Option<PathBuf>,
}

/// Transformations applied to every selected name, in this order
#[derive(Args, Debug, Clone, Default)]
pub struct ChainArgs {
    /// Remove this many characters from the start of each name
    #[arg(long, value_name = "N", default_value_t = 0)]
    pub trim_begin: usize,

    /// Remove this many characters from the end of each name
    #[arg(long, value_name = "N", default_value_t = 0)]
    pub trim_end: usize,

    /// Add text before each name
    #[arg(long, default_value = "")]
    pub prefix: String,

    /// Add text after each name
    #[arg(long, default_value = "")]
    pub suffix: String,

    /// Text to search for (a regular expression with --regex)
    #[arg(long, default_value = "")]
    pub search: String,

    /// Replacement for every search match, taken literally
    #[arg(long, default_value = "", requires = "search")]
    pub replace: String,

    /// Match the search text regardless of case
    #[arg(short = 'i', long)]
    pub ignore_case: bool,

    /// Treat the search text as a regular expression
    #[arg(long)]
    pub regex: bool,
}

impl From<ChainArgs> for TransformChain {
    fn from(args: ChainArgs) -> Self {
        Self {
            trim_begin: args.trim_begin,
            trim_end: args.trim_end,
            prefix: args.prefix,
            suffix: args.suffix,
            search: args.search,
            replace: args.replace,
            ignore_case: args.ignore_case,
            use_regex: args.regex,
        }
    }
}

/// Which items to rename and how they are edited
#[derive(Args, Debug, Clone)]
pub struct TargetArgs {
    /// Items to rename, in order (paths relative to the working directory, or object names)
    #[arg(required = true, value_name = "ITEM")]
    pub items: Vec<String>,

    /// Kind of the selected items
    #[arg(long, value_enum, default_value_t = KindArg::Asset)]
    pub kind: KindArg,

    /// Edit whole asset paths instead of leaf names
    #[arg(long)]
    pub full_path: bool,

    /// Set the new name of one item by position after the chain ran (e.g. 0=Rock_A)
    #[arg(long = "name", value_name = "INDEX=NAME", value_parser = parse_manual_name)]
    pub names: Vec<(usize, String)>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show what the chain would do to each item, without renaming anything
    Preview {
        #[command(flatten)]
        target: TargetArgs,

        #[command(flatten)]
        chain: ChainArgs,

        /// Output format
        #[arg(long, value_enum, default_value = "summary")]
        output: OutputFormat,
    },

    /// Rename the items
    Apply {
        #[command(flatten)]
        target: TargetArgs,

        #[command(flatten)]
        chain: ChainArgs,

        /// Keep version control history attached to renamed files
        #[arg(long)]
        vcs: bool,

        /// Output format
        #[arg(long, value_enum, default_value = "summary")]
        output: OutputFormat,

        /// Suppress all output
        #[arg(long, short = 'q')]
        quiet: bool,
    },

    /// Retry history moves left over from an earlier apply
    Relink {
        /// Output format
        #[arg(long, value_enum, default_value = "summary")]
        output: OutputFormat,

        /// Suppress all output
        #[arg(long, short = 'q')]
        quiet: bool,
    },

    /// Show version information
    Version {
        /// Output format
        #[arg(long, value_enum, default_value = "summary")]
        output: OutputFormat,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_apply_with_chain() {
        let cli = Cli::try_parse_from([
            "bulkrename",
            "apply",
            "props/chair.mesh",
            "props/table.mesh",
            "--prefix",
            "SM_",
            "--search",
            "a",
            "--replace",
            "o",
            "-i",
            "--name",
            "1=desk",
            "--vcs",
        ])
        .unwrap();

        let Commands::Apply {
            target, chain, vcs, ..
        } = cli.command
        else {
            panic!("expected apply");
        };
        assert_eq!(target.items.len(), 2);
        assert_eq!(target.kind, KindArg::Asset);
        assert_eq!(target.names, vec![(1, "desk".to_string())]);
        assert!(vcs);

        let chain = TransformChain::from(chain);
        assert_eq!(chain.prefix, "SM_");
        assert_eq!(chain.search, "a");
        assert_eq!(chain.replace, "o");
        assert!(chain.ignore_case);
        assert!(!chain.use_regex);
    }

    #[test]
    fn test_replace_requires_search() {
        let result = Cli::try_parse_from(["bulkrename", "preview", "a", "--replace", "b"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_items_are_required() {
        let result = Cli::try_parse_from(["bulkrename", "preview", "--prefix", "x"]);
        assert!(result.is_err());
    }
}
