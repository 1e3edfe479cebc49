use super::{state_dir, working_dir_or_current};
use crate::config::Config;
use crate::history::UndoStack;
use crate::output::{HistoryItem, HistoryResult};
use anyhow::{Context, Result};
use std::path::Path;

/// History operation - returns structured data
pub fn history_operation(
    limit: Option<usize>,
    working_dir: Option<&Path>,
) -> Result<HistoryResult> {
    let current_dir = working_dir_or_current(working_dir);
    let config = Config::load(&current_dir).context("Failed to load config")?;
    let stack = UndoStack::load(&state_dir(&current_dir), config.defaults.max_history)
        .context("Failed to load undo history")?;

    let entries = stack
        .list_entries(limit)
        .into_iter()
        .map(|batch| HistoryItem {
            id: batch.id.clone(),
            created_at: batch.created_at.clone(),
            label: batch.label.clone(),
            files: batch.files_moved(),
            steps: batch.forward.len(),
        })
        .collect();

    Ok(HistoryResult {
        entries,
        redo_available: stack.redo_entries().len(),
    })
}
