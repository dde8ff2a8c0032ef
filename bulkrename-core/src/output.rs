use crate::entry::NameStatus;
use crate::journal::RelinkPair;
use crate::kind::ItemKind;
use crate::session::RenameItem;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Summary,
    Json,
}

/// One row of a preview.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewRow {
    pub original_path: String,
    pub final_path: String,
    /// `<r>removed</>` / `<a>added</>` annotated name
    pub markup: String,
    pub status: NameStatus,
    pub reason: String,
}

/// Result of a preview operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewResult {
    pub kind: ItemKind,
    pub rows: Vec<PreviewRow>,
    pub can_commit: bool,
    /// Rendered table for the summary format
    #[serde(skip)]
    pub table: String,
}

impl PreviewResult {
    pub fn count(&self, status: NameStatus) -> usize {
        self.rows.iter().filter(|row| row.status == status).count()
    }
}

/// A failed item as reported to the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureReport {
    pub from: String,
    pub to: String,
    pub error: String,
}

/// Result of an apply operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitResult {
    pub batch_id: String,
    pub kind: ItemKind,
    pub vcs: bool,
    pub renamed: Vec<RenameItem>,
    pub failures: Vec<FailureReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_path: Option<String>,
}

impl CommitResult {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Result of a relink operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelinkResult {
    pub relinked: usize,
    pub pending: Vec<RelinkPair>,
    pub failures: Vec<FailureReport>,
}

/// Result of a version command
#[derive(Debug, Serialize, Deserialize)]
pub struct VersionResult {
    pub name: String,
    pub version: String,
}

/// Trait for formatting output in different formats
pub trait OutputFormatter {
    fn format(&self, format: OutputFormat) -> String {
        match format {
            OutputFormat::Json => self.format_json(),
            OutputFormat::Summary => self.format_summary(),
        }
    }

    fn format_json(&self) -> String;
    fn format_summary(&self) -> String;
}

impl OutputFormatter for PreviewResult {
    fn format_json(&self) -> String {
        serde_json::to_string(&json!({
            "success": true,
            "operation": "preview",
            "kind": self.kind,
            "can_commit": self.can_commit,
            "summary": {
                "valid": self.count(NameStatus::Valid),
                "no_change": self.count(NameStatus::NoChange),
                "invalid": self.count(NameStatus::Invalid),
                "duplicated": self.count(NameStatus::Duplicated),
            },
            "rows": self.rows,
        }))
        .unwrap_or_default()
    }

    fn format_summary(&self) -> String {
        let mut output = self.table.clone();
        if !output.ends_with('\n') {
            output.push('\n');
        }
        output.push_str(&format!(
            "{} to rename, {} unchanged, {} invalid, {} duplicated\n",
            self.count(NameStatus::Valid),
            self.count(NameStatus::NoChange),
            self.count(NameStatus::Invalid),
            self.count(NameStatus::Duplicated),
        ));
        for row in self.rows.iter().filter(|row| row.status.blocks_commit()) {
            output.push_str(&format!("  {}: {}\n", row.original_path, row.reason));
        }
        if !self.can_commit {
            output.push_str("Nothing can be committed as is.\n");
        }
        output
    }
}

impl OutputFormatter for CommitResult {
    fn format_json(&self) -> String {
        serde_json::to_string(&json!({
            "success": self.is_clean(),
            "operation": "apply",
            "batch_id": self.batch_id,
            "kind": self.kind,
            "vcs": self.vcs,
            "summary": {
                "renamed": self.renamed.len(),
                "failed": self.failures.len(),
            },
            "renamed": self.renamed,
            "failures": self.failures,
            "log_path": self.log_path,
        }))
        .unwrap_or_default()
    }

    fn format_summary(&self) -> String {
        let mut output = format!("✓ Renamed {} {}(s)", self.renamed.len(), self.kind);
        if self.vcs {
            output.push_str(" with version control history");
        }
        output.push('\n');
        for item in &self.renamed {
            output.push_str(&format!("  {} -> {}\n", item.from, item.to));
        }
        if !self.failures.is_empty() {
            output.push_str(&format!("✗ {} failure(s)\n", self.failures.len()));
            for failure in &self.failures {
                output.push_str(&format!(
                    "  {} -> {}: {}\n",
                    failure.from, failure.to, failure.error
                ));
            }
            if self.vcs {
                output.push_str("Retry history moves with: bulkrename relink\n");
            }
        }
        if let Some(log_path) = &self.log_path {
            output.push_str(&format!("Log: {}\n", log_path));
        }
        output
    }
}

impl OutputFormatter for RelinkResult {
    fn format_json(&self) -> String {
        serde_json::to_string(&json!({
            "success": self.pending.is_empty(),
            "operation": "relink",
            "summary": {
                "relinked": self.relinked,
                "pending": self.pending.len(),
            },
            "pending": self.pending,
            "failures": self.failures,
        }))
        .unwrap_or_default()
    }

    fn format_summary(&self) -> String {
        if self.relinked == 0 && self.pending.is_empty() {
            return "No pending history moves".to_string();
        }
        let mut output = format!("✓ Re-linked {} file(s)\n", self.relinked);
        for failure in &self.failures {
            output.push_str(&format!(
                "✗ {} -> {}: {}\n",
                failure.from, failure.to, failure.error
            ));
        }
        if !self.pending.is_empty() {
            output.push_str(&format!("{} still pending\n", self.pending.len()));
        }
        output
    }
}

impl OutputFormatter for VersionResult {
    fn format_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    fn format_summary(&self) -> String {
        format!("{} {}", self.name, self.version)
    }
}
