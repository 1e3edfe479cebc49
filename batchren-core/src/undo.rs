use crate::error::ErrorKind;
use crate::fs::RenameFs;
use crate::log::OperationLog;
use crate::planner::ExecutionStep;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;
use thiserror::Error;

/// The inverse of the steps a batch executed, already in replay order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UndoEntry {
    pub steps: Vec<ExecutionStep>,
}

impl UndoEntry {
    /// Invert executed steps. The last executed step is undone first, which
    /// walks cycle detours back out through their temporary names.
    pub fn from_executed(executed: &[ExecutionStep]) -> Self {
        Self {
            steps: executed.iter().rev().map(ExecutionStep::inverse).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Paths that must exist for a replay of `steps` to start cleanly
    pub fn required_paths(steps: &[ExecutionStep]) -> Vec<PathBuf> {
        let mut produced = HashSet::new();
        let mut required = Vec::new();
        for step in steps {
            if !produced.contains(&step.from) {
                required.push(step.from.clone());
            }
            produced.insert(step.to.clone());
        }
        required
    }

    /// Files this entry would move back that have disappeared
    pub fn missing(&self, fs: &dyn RenameFs) -> Vec<PathBuf> {
        Self::required_paths(&self.steps)
            .into_iter()
            .filter(|path| !fs.exists(path))
            .collect()
    }

    pub fn is_valid(&self, fs: &dyn RenameFs) -> bool {
        self.missing(fs).is_empty()
    }
}

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("replay step {index} failed ({} -> {}): {source}", from.display(), to.display())]
    StepFailed {
        index: usize,
        from: PathBuf,
        to: PathBuf,
        kind: ErrorKind,
        /// Whether the steps replayed before the failure were put back
        rolled_back: bool,
        #[source]
        source: io::Error,
    },

    #[error("{} file(s) referenced by batch {id} no longer exist", missing.len())]
    Invalidated { id: String, missing: Vec<PathBuf> },
}

/// Run steps in order. On failure the already-replayed prefix is reversed
/// (best effort) so a replay is all or nothing whenever the filesystem allows.
pub fn replay(
    steps: &[ExecutionStep],
    fs: &dyn RenameFs,
    log: &mut OperationLog,
) -> Result<usize, ReplayError> {
    for (index, step) in steps.iter().enumerate() {
        log.log(&format!(
            "Replaying {} -> {}",
            step.from.display(),
            step.to.display()
        ));

        if let Err(source) = fs.rename(&step.from, &step.to) {
            log.log(&format!("Replay failed at step {}: {}", index, source));
            let rolled_back = rollback(&steps[..index], fs, log);
            return Err(ReplayError::StepFailed {
                index,
                from: step.from.clone(),
                to: step.to.clone(),
                kind: ErrorKind::from_io(&source),
                rolled_back,
                source,
            });
        }
    }
    Ok(steps.len())
}

fn rollback(done: &[ExecutionStep], fs: &dyn RenameFs, log: &mut OperationLog) -> bool {
    log.log("Starting rollback of partial replay");
    let mut clean = true;
    for step in done.iter().rev() {
        if let Err(e) = fs.rename(&step.to, &step.from) {
            log.log(&format!(
                "Failed to revert {} -> {}: {}",
                step.to.display(),
                step.from.display(),
                e
            ));
            clean = false;
        }
    }
    if clean {
        log.log("Rollback completed successfully");
    }
    clean
}

/// Something the undo/redo stack can reverse and re-apply as one action.
pub trait Reversible {
    fn label(&self) -> &str;
    fn undo(&self, fs: &dyn RenameFs, log: &mut OperationLog) -> Result<usize, ReplayError>;
    fn redo(&self, fs: &dyn RenameFs, log: &mut OperationLog) -> Result<usize, ReplayError>;
}

/// One executed batch, as the rest of the application sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReversibleBatch {
    pub id: String,
    pub created_at: String,
    pub label: String,
    /// Steps that actually ran, in execution order
    pub forward: Vec<ExecutionStep>,
    pub undo: UndoEntry,
}

impl ReversibleBatch {
    /// `None` when nothing was executed, since there is nothing to undo
    pub fn from_executed(executed: &[ExecutionStep], label: impl Into<String>) -> Option<Self> {
        Self::with_id(generate_batch_id(executed), executed, label)
    }

    /// Same as [`Self::from_executed`] with an id chosen before execution
    pub fn with_id(
        id: String,
        executed: &[ExecutionStep],
        label: impl Into<String>,
    ) -> Option<Self> {
        if executed.is_empty() {
            return None;
        }

        Some(Self {
            id,
            created_at: chrono::Local::now().to_rfc3339(),
            label: label.into(),
            forward: executed.to_vec(),
            undo: UndoEntry::from_executed(executed),
        })
    }

    /// Number of distinct requests this batch moved
    pub fn files_moved(&self) -> usize {
        self.forward
            .iter()
            .map(|s| s.request)
            .collect::<HashSet<_>>()
            .len()
    }

    fn check(&self, steps: &[ExecutionStep], fs: &dyn RenameFs) -> Result<(), ReplayError> {
        let missing: Vec<_> = UndoEntry::required_paths(steps)
            .into_iter()
            .filter(|path| !fs.exists(path))
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ReplayError::Invalidated {
                id: self.id.clone(),
                missing,
            })
        }
    }
}

impl Reversible for ReversibleBatch {
    fn label(&self) -> &str {
        &self.label
    }

    fn undo(&self, fs: &dyn RenameFs, log: &mut OperationLog) -> Result<usize, ReplayError> {
        log.log(&format!("Undoing batch {}", self.id));
        self.check(&self.undo.steps, fs)?;
        replay(&self.undo.steps, fs, log)
    }

    fn redo(&self, fs: &dyn RenameFs, log: &mut OperationLog) -> Result<usize, ReplayError> {
        log.log(&format!("Redoing batch {}", self.id));
        self.check(&self.forward, fs)?;
        replay(&self.forward, fs, log)
    }
}

static BATCH_COUNTER: AtomicU64 = AtomicU64::new(0);

/// 16 hex characters, unique per process even for identical steps
pub fn generate_batch_id<'a>(steps: impl IntoIterator<Item = &'a ExecutionStep>) -> String {
    let mut hasher = Sha256::new();
    for step in steps {
        hasher.update(step.from.to_string_lossy().as_bytes());
        hasher.update(step.to.to_string_lossy().as_bytes());
    }
    let nanos = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    hasher.update(nanos.to_string().as_bytes());
    hasher.update(std::process::id().to_string().as_bytes());
    hasher.update(
        BATCH_COUNTER
            .fetch_add(1, Ordering::Relaxed)
            .to_string()
            .as_bytes(),
    );
    format!("{:x}", hasher.finalize())[..16].to_string()
}
