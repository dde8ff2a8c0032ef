use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

/// A history re-link still to be done: `move from to` on the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelinkPair {
    /// Physical location before the rename
    pub from: PathBuf,
    /// Physical location after the rename
    pub to: PathBuf,
}

/// The re-links one commit intended to perform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub batch_id: String,
    pub created_at: String,
    pub pairs: Vec<RelinkPair>,
}

impl JournalEntry {
    pub fn new(batch_id: impl Into<String>, pairs: Vec<RelinkPair>) -> Self {
        Self {
            batch_id: batch_id.into(),
            created_at: chrono::Local::now().to_rfc3339(),
            pairs,
        }
    }
}

/// Persisted list of pending re-links, one entry per commit.
///
/// An entry is written before storage is touched and trimmed to the failed
/// pairs afterwards, so an interrupted or partly failed commit can be
/// finished later. The file is removed once nothing is pending.
#[derive(Debug, Clone)]
pub struct RelinkJournal {
    path: PathBuf,
}

impl RelinkJournal {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The journal at `<state_dir>/relink.json`.
    pub fn in_dir(state_dir: &Path) -> Self {
        Self::new(state_dir.join("relink.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Vec<JournalEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let file = File::open(&self.path)
            .with_context(|| format!("Failed to open journal: {}", self.path.display()))?;
        serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse journal: {}", self.path.display()))
    }

    /// All pending pairs across entries, oldest first.
    pub fn pending(&self) -> Result<Vec<RelinkPair>> {
        Ok(self
            .load()?
            .into_iter()
            .flat_map(|entry| entry.pairs)
            .collect())
    }

    /// Add (or replace) the entry for `entry.batch_id`.
    pub fn record(&self, entry: JournalEntry) -> Result<()> {
        let mut entries = self.load()?;
        entries.retain(|e| e.batch_id != entry.batch_id);
        entries.push(entry);
        self.save(&entries)
    }

    /// Keep only `failed` for `batch_id`; drop the entry when nothing failed.
    pub fn settle(&self, batch_id: &str, failed: Vec<RelinkPair>) -> Result<()> {
        let mut entries = self.load()?;
        if failed.is_empty() {
            entries.retain(|e| e.batch_id != batch_id);
        } else if let Some(entry) = entries.iter_mut().find(|e| e.batch_id == batch_id) {
            entry.pairs = failed;
        } else {
            entries.push(JournalEntry::new(batch_id, failed));
        }
        self.save(&entries)
    }

    /// Replace everything with a single entry of still-failing pairs.
    pub fn replace_all(&self, batch_id: &str, failed: Vec<RelinkPair>) -> Result<()> {
        if failed.is_empty() {
            return self.save(&[]);
        }
        self.save(&[JournalEntry::new(batch_id, failed)])
    }

    fn save(&self, entries: &[JournalEntry]) -> Result<()> {
        if entries.is_empty() {
            if self.path.exists() {
                fs::remove_file(&self.path).with_context(|| {
                    format!("Failed to remove journal: {}", self.path.display())
                })?;
            }
            return Ok(());
        }

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.path)
            .with_context(|| format!("Failed to create journal: {}", self.path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), entries)
            .with_context(|| format!("Failed to write journal: {}", self.path.display()))?;
        Ok(())
    }
}
