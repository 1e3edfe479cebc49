use crate::error::ErrorKind;
use crate::planner::ExecutionStep;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt::Write;
use std::path::PathBuf;

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Summary,
    Json,
}

impl OutputFormat {
    /// Parse the `output` config value, falling back to summary
    pub fn from_config(value: &str) -> Self {
        if value.eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Summary
        }
    }
}

/// What happened to one requested rename
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestOutcome {
    pub from: PathBuf,
    pub to: PathBuf,
    pub success: bool,
    pub final_path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorKind>,
}

/// Result of a rename operation
#[derive(Debug, Serialize, Deserialize)]
pub struct RenameResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_id: Option<String>,
    pub succeeded: usize,
    pub failed: usize,
    pub steps: usize,
    pub cycles: usize,
    pub cancelled: bool,
    /// Why the whole batch was refused, if it was
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejected: Option<String>,
    pub results: Vec<RequestOutcome>,
}

impl RenameResult {
    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}

/// Result of a plan operation (or `rename --dry-run`)
#[derive(Debug, Serialize, Deserialize)]
pub struct PlanResult {
    pub requests: usize,
    pub noops: usize,
    pub cycles: usize,
    pub steps: Vec<ExecutionStep>,
    /// Components that could not be planned, as `request index: reason`
    pub errors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejected: Option<String>,
}

impl PlanResult {
    pub fn is_runnable(&self) -> bool {
        self.rejected.is_none() && self.errors.is_empty()
    }
}

/// Result of an undo operation
#[derive(Debug, Serialize, Deserialize)]
pub struct UndoResult {
    pub batch_id: String,
    pub label: String,
    pub files_restored: usize,
    pub steps_replayed: usize,
}

/// Result of a redo operation
#[derive(Debug, Serialize, Deserialize)]
pub struct RedoResult {
    pub batch_id: String,
    pub label: String,
    pub files_renamed: usize,
    pub steps_replayed: usize,
}

/// Result of a history operation
#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryResult {
    pub entries: Vec<HistoryItem>,
    pub redo_available: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryItem {
    pub id: String,
    pub created_at: String,
    pub label: String,
    pub files: usize,
    pub steps: usize,
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

impl OutputFormatter for RenameResult {
    fn format_json(&self) -> String {
        serde_json::to_string(&json!({
            "success": self.all_succeeded(),
            "operation": "rename",
            "batch_id": self.batch_id,
            "summary": {
                "succeeded": self.succeeded,
                "failed": self.failed,
                "steps": self.steps,
                "cycles": self.cycles,
            },
            "cancelled": self.cancelled,
            "rejected": self.rejected,
            "results": self.results,
        }))
        .unwrap_or_default()
    }

    fn format_summary(&self) -> String {
        let mut output = String::new();

        if let Some(reason) = &self.rejected {
            writeln!(output, "✗ Batch rejected: {}", reason).unwrap();
        }

        for outcome in &self.results {
            if let Some(error) = &outcome.error {
                writeln!(
                    output,
                    "✗ {} -> {}: {}",
                    outcome.from.display(),
                    outcome.to.display(),
                    error
                )
                .unwrap();
            }
        }

        if self.rejected.is_none() {
            write!(output, "✓ Renamed {} files in {} steps", self.succeeded, self.steps).unwrap();
            if self.cycles > 0 {
                write!(output, " ({} cycles)", self.cycles).unwrap();
            }
            output.push('\n');
        }

        if self.failed > 0 {
            writeln!(output, "{} renames failed", self.failed).unwrap();
        }

        if self.cancelled {
            output.push_str("Cancelled before all renames ran\n");
        }

        if self.batch_id.is_some() {
            output.push_str("Undo with: batchren undo\n");
        }

        output
    }
}

impl OutputFormatter for PlanResult {
    fn format_json(&self) -> String {
        serde_json::to_string(&json!({
            "success": self.is_runnable(),
            "operation": "plan",
            "summary": {
                "requests": self.requests,
                "noops": self.noops,
                "cycles": self.cycles,
                "steps": self.steps.len(),
            },
            "steps": self.steps,
            "errors": self.errors,
            "rejected": self.rejected,
        }))
        .unwrap_or_default()
    }

    fn format_summary(&self) -> String {
        let mut output = String::new();

        if let Some(reason) = &self.rejected {
            writeln!(output, "✗ Batch rejected: {}", reason).unwrap();
            return output;
        }

        writeln!(
            output,
            "Plan: {} requests, {} steps, {} cycles, {} unchanged",
            self.requests,
            self.steps.len(),
            self.cycles,
            self.noops
        )
        .unwrap();

        for (index, step) in self.steps.iter().enumerate() {
            writeln!(
                output,
                "{:>4}. {} -> {}{}",
                index + 1,
                step.from.display(),
                step.to.display(),
                if step.is_temporary { " (temporary)" } else { "" }
            )
            .unwrap();
        }

        for error in &self.errors {
            writeln!(output, "✗ {}", error).unwrap();
        }

        output
    }
}

impl OutputFormatter for UndoResult {
    fn format_json(&self) -> String {
        serde_json::to_string(&json!({
            "success": true,
            "operation": "undo",
            "batch_id": self.batch_id,
            "label": self.label,
            "summary": {
                "files_restored": self.files_restored,
                "steps_replayed": self.steps_replayed,
            }
        }))
        .unwrap_or_default()
    }

    fn format_summary(&self) -> String {
        let mut output = format!("Successfully undid batch {} ({})\n", self.batch_id, self.label);
        writeln!(output, "✓ Restored {} files", self.files_restored).unwrap();
        output.push_str("Redo with: batchren redo");
        output
    }
}

impl OutputFormatter for RedoResult {
    fn format_json(&self) -> String {
        serde_json::to_string(&json!({
            "success": true,
            "operation": "redo",
            "batch_id": self.batch_id,
            "label": self.label,
            "summary": {
                "files_renamed": self.files_renamed,
                "steps_replayed": self.steps_replayed,
            }
        }))
        .unwrap_or_default()
    }

    fn format_summary(&self) -> String {
        let mut output = format!("Successfully redid batch {} ({})\n", self.batch_id, self.label);
        writeln!(output, "✓ Renamed {} files", self.files_renamed).unwrap();
        output
    }
}

impl OutputFormatter for HistoryResult {
    fn format_json(&self) -> String {
        serde_json::to_string(&json!({
            "entries": self.entries,
            "redo_available": self.redo_available,
        }))
        .unwrap_or_default()
    }

    fn format_summary(&self) -> String {
        use comfy_table::{Cell, Color, Table};

        if self.entries.is_empty() {
            return "No history entries found".to_string();
        }

        let mut table = Table::new();
        table.set_header(vec![
            Cell::new("ID").fg(Color::Cyan),
            Cell::new("Date").fg(Color::Cyan),
            Cell::new("Batch").fg(Color::Cyan),
            Cell::new("Files").fg(Color::Cyan),
            Cell::new("Steps").fg(Color::Cyan),
        ]);

        for entry in &self.entries {
            let date = entry
                .created_at
                .split('T')
                .next()
                .unwrap_or(&entry.created_at);
            table.add_row(vec![
                entry.id.clone(),
                date.to_string(),
                entry.label.clone(),
                entry.files.to_string(),
                entry.steps.to_string(),
            ]);
        }

        let mut output = table.to_string();
        output.push('\n');
        if self.redo_available > 0 {
            writeln!(output, "{} undone batches can be redone", self.redo_available).unwrap();
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
