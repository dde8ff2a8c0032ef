use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Identifier for one commit, used to name its log file.
pub fn new_batch_id() -> String {
    format!(
        "{}-{}",
        chrono::Local::now().format("%Y%m%d-%H%M%S"),
        std::process::id()
    )
}

/// Append-only, timestamped log of the steps a commit takes.
#[derive(Debug, Default)]
pub struct OperationLog {
    path: Option<PathBuf>,
    file: Option<File>,
}

impl OperationLog {
    /// Open (or create) the log at `path`, creating parent directories.
    pub fn open(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path: Some(path),
            file: Some(file),
        })
    }

    /// The log for `batch_id` below `<state_dir>/logs`.
    pub fn for_batch(state_dir: &Path, batch_id: &str) -> io::Result<Self> {
        Self::open(state_dir.join("logs").join(format!("{}.log", batch_id)))
    }

    /// A log that drops every line.
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Write one line. A failed write turns the log off for the rest of the
    /// batch; it never fails the batch itself.
    pub fn log(&mut self, message: &str) {
        if let Some(file) = self.file.as_mut() {
            let written = writeln!(
                file,
                "[{}] {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                message
            )
            .and_then(|()| file.flush());
            if written.is_err() {
                self.file = None;
            }
        }
    }
}
