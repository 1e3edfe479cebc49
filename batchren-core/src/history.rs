use crate::fs::RenameFs;
use crate::log::OperationLog;
use crate::undo::{ReplayError, Reversible, ReversibleBatch};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

pub const DEFAULT_MAX_ENTRIES: usize = 50;
const HISTORY_FILE_NAME: &str = "history.json";

/// Receives the reversible action produced by each executed batch.
pub trait UndoSink: Send + Sync {
    fn register(&self, batch: ReversibleBatch);
}

#[derive(Debug, Error)]
pub enum StackError {
    #[error("nothing to undo")]
    NothingToUndo,
    #[error("nothing to redo")]
    NothingToRedo,
    #[error(transparent)]
    Replay(#[from] ReplayError),
}

/// Capped undo/redo history of executed batches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UndoStack {
    #[serde(skip)]
    path: Option<PathBuf>,
    pub max_entries: usize,
    undo: Vec<ReversibleBatch>,
    redo: Vec<ReversibleBatch>,
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ENTRIES)
    }
}

impl UndoStack {
    pub fn new(max_entries: usize) -> Self {
        Self {
            path: None,
            max_entries,
            undo: Vec::new(),
            redo: Vec::new(),
        }
    }

    /// Load the stack from `<state_dir>/history.json`, empty if absent
    pub fn load(state_dir: &Path, max_entries: usize) -> Result<Self> {
        let path = state_dir.join(HISTORY_FILE_NAME);
        let mut stack: Self = if path.exists() {
            let file = File::open(&path)
                .with_context(|| format!("Failed to open history file: {}", path.display()))?;
            let reader = BufReader::new(file);
            serde_json::from_reader(reader)
                .with_context(|| format!("Failed to parse history file: {}", path.display()))?
        } else {
            Self::new(max_entries)
        };

        stack.path = Some(path);
        stack.max_entries = max_entries;
        stack.prune();
        Ok(stack)
    }

    /// Write the stack back to where it was loaded from. In-memory stacks are
    /// not persisted.
    pub fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)
            .with_context(|| format!("Failed to create history file: {}", path.display()))?;

        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)
            .with_context(|| format!("Failed to write history file: {}", path.display()))?;

        Ok(())
    }

    /// Record a new batch. Anything that was undone can no longer be redone.
    pub fn push(&mut self, batch: ReversibleBatch) {
        self.redo.clear();
        self.undo.push(batch);
        self.prune();
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn peek_undo(&self) -> Option<&ReversibleBatch> {
        self.undo.last()
    }

    pub fn peek_redo(&self) -> Option<&ReversibleBatch> {
        self.redo.last()
    }

    /// Undo the most recent batch.
    ///
    /// An entry whose files vanished is dropped. An entry whose replay failed
    /// but was rolled back stays on the stack so it can be retried.
    pub fn undo(
        &mut self,
        fs: &dyn RenameFs,
        log: &mut OperationLog,
    ) -> Result<ReversibleBatch, StackError> {
        let batch = self.undo.pop().ok_or(StackError::NothingToUndo)?;
        match batch.undo(fs, log) {
            Ok(_) => {
                self.redo.push(batch.clone());
                Ok(batch)
            },
            Err(e) => {
                if keep_after_failure(&e) {
                    self.undo.push(batch);
                }
                Err(e.into())
            },
        }
    }

    /// Re-apply the most recently undone batch
    pub fn redo(
        &mut self,
        fs: &dyn RenameFs,
        log: &mut OperationLog,
    ) -> Result<ReversibleBatch, StackError> {
        let batch = self.redo.pop().ok_or(StackError::NothingToRedo)?;
        match batch.redo(fs, log) {
            Ok(_) => {
                self.undo.push(batch.clone());
                self.prune();
                Ok(batch)
            },
            Err(e) => {
                if keep_after_failure(&e) {
                    self.redo.push(batch);
                }
                Err(e.into())
            },
        }
    }

    /// Undoable entries, most recent first, optionally limited to N
    pub fn list_entries(&self, limit: Option<usize>) -> Vec<&ReversibleBatch> {
        let entries = self.undo.iter().rev();
        match limit {
            Some(limit) => entries.take(limit).collect(),
            None => entries.collect(),
        }
    }

    pub fn redo_entries(&self) -> Vec<&ReversibleBatch> {
        self.redo.iter().rev().collect()
    }

    pub fn len(&self) -> usize {
        self.undo.len()
    }

    pub fn is_empty(&self) -> bool {
        self.undo.is_empty()
    }

    fn prune(&mut self) {
        if self.undo.len() > self.max_entries {
            let to_remove = self.undo.len() - self.max_entries;
            self.undo.drain(0..to_remove);
        }
    }
}

fn keep_after_failure(err: &ReplayError) -> bool {
    matches!(
        err,
        ReplayError::StepFailed {
            rolled_back: true,
            ..
        }
    )
}

impl UndoSink for Mutex<UndoStack> {
    fn register(&self, batch: ReversibleBatch) {
        match self.lock() {
            Ok(mut stack) => stack.push(batch),
            Err(poisoned) => poisoned.into_inner().push(batch),
        }
    }
}
