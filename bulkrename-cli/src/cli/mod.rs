pub mod args;
pub mod types;

pub use args::{ChainArgs, Cli, Commands, TargetArgs};
pub use types::{KindArg, OutputFormat};
