use super::{state_dir, working_dir_or_current};
use crate::config::Config;
use crate::fs::StdFs;
use crate::history::{StackError, UndoStack};
use crate::log::OperationLog;
use crate::output::{RedoResult, UndoResult};
use crate::undo::ReversibleBatch;
use anyhow::{Context, Result};
use std::path::Path;

/// High-level undo operation - equivalent to `batchren undo`
pub fn undo_operation(working_dir: Option<&Path>) -> Result<UndoResult> {
    let batch = replay_top(working_dir, Direction::Undo)?;
    Ok(UndoResult {
        batch_id: batch.id.clone(),
        label: batch.label.clone(),
        files_restored: batch.files_moved(),
        steps_replayed: batch.undo.steps.len(),
    })
}

/// High-level redo operation - equivalent to `batchren redo`
pub fn redo_operation(working_dir: Option<&Path>) -> Result<RedoResult> {
    let batch = replay_top(working_dir, Direction::Redo)?;
    Ok(RedoResult {
        batch_id: batch.id.clone(),
        label: batch.label.clone(),
        files_renamed: batch.files_moved(),
        steps_replayed: batch.forward.len(),
    })
}

#[derive(Clone, Copy)]
enum Direction {
    Undo,
    Redo,
}

fn replay_top(working_dir: Option<&Path>, direction: Direction) -> Result<ReversibleBatch> {
    let current_dir = working_dir_or_current(working_dir);
    let config = Config::load(&current_dir).context("Failed to load config")?;
    let state_dir = state_dir(&current_dir);
    let mut stack = UndoStack::load(&state_dir, config.defaults.max_history)
        .context("Failed to load undo history")?;

    let top = match direction {
        Direction::Undo => stack.peek_undo(),
        Direction::Redo => stack.peek_redo(),
    };
    let mut log = match top {
        Some(batch) if config.defaults.write_log => {
            OperationLog::open(&state_dir.join("logs").join(format!("{}.log", batch.id)))
                .unwrap_or_default()
        },
        _ => OperationLog::disabled(),
    };

    let outcome = match direction {
        Direction::Undo => stack.undo(&StdFs, &mut log),
        Direction::Redo => stack.redo(&StdFs, &mut log),
    };

    // Invalidated entries are dropped from the stack even on failure
    if !matches!(
        outcome,
        Err(StackError::NothingToUndo | StackError::NothingToRedo)
    ) {
        stack.save().context("Failed to save undo history")?;
    }

    let verb = match direction {
        Direction::Undo => "undo",
        Direction::Redo => "redo",
    };
    outcome.with_context(|| format!("Failed to {verb}"))
}
