#![allow(unused)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::option_if_let_else)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod chain;
pub mod config;
pub mod entry;
pub mod interrupt;
pub mod journal;
pub mod kind;
pub mod lock;
pub mod matcher;
pub mod notify;
pub mod operations;
pub mod oplog;
pub mod orchestrator;
pub mod output;
pub mod preview;
pub mod session;
pub mod storage;
pub mod vcs;

pub use chain::{ChainEdit, CompiledChain, TransformChain, TrimPlan};
pub use config::{Config, DefaultsConfig, STATE_DIR};
pub use entry::{NameStatus, RenameEntry};
pub use journal::{JournalEntry, RelinkJournal, RelinkPair};
pub use kind::{ItemKind, NameScope};
pub use lock::BatchLock;
pub use matcher::{ChainError, Matcher};
pub use notify::{Hyperlink, Notifier, NotifyLevel, RecordingNotifier, TerminalNotifier};
pub use operations::{
    commit_operation, commit_with, preview_operation, relink_operation, relink_with,
    RenameRequest,
};
pub use oplog::OperationLog;
pub use orchestrator::{
    relink, BatchError, BatchOutcome, CheckoutError, ItemError, ItemFailure, MoveError,
    Orchestrator,
};
pub use output::{
    CommitResult, OutputFormat, OutputFormatter, PreviewResult, RelinkResult, VersionResult,
};
pub use preview::{render_ansi, render_markup, should_use_color, Mark, Span};
pub use session::{CommitSet, RenameItem, RenameSession, SessionConfig, SessionSnapshot};
pub use storage::{FsStorage, MemoryStorage, Storage, StorageError};
pub use vcs::{
    Charset, CommandError, ConnectError, P4Connector, Record, RecordSet, VcsConfig,
    VcsConnection, VcsConnector, VcsSession, VcsTransport,
};
