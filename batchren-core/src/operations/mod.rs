//! High-level operations that correspond to CLI commands
//!
//! These modules hold the state handling for each batchren command (config,
//! the persisted undo stack under `.batchren/`, log files), separated from CLI
//! concerns like argument parsing and printing.

pub mod history;
pub mod plan;
pub mod rename;
pub mod undo;

pub use history::history_operation;
pub use plan::plan_operation;
pub use rename::{parse_mapping, rename_operation, RenamePair};
pub use undo::{redo_operation, undo_operation};

use crate::config::STATE_DIR_NAME;
use crate::request::RenameRequest;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

fn working_dir_or_current(working_dir: Option<&Path>) -> PathBuf {
    working_dir.map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}

fn state_dir(current_dir: &Path) -> PathBuf {
    current_dir.join(STATE_DIR_NAME)
}

/// Turn CLI pairs into requests, resolving relative paths against `current_dir`
fn build_requests(pairs: &[RenamePair], current_dir: &Path) -> Result<Vec<RenameRequest>> {
    pairs
        .iter()
        .enumerate()
        .map(|(index, pair)| {
            RenameRequest::for_path(resolve_source(&pair.from, current_dir), pair.to.clone())
                .with_context(|| format!("Invalid rename pair #{}: {}", index + 1, pair))
        })
        .collect()
}

/// Absolute source path with a canonical parent, so `sub/../b` and `b` name
/// the same slot. The leaf is kept as given since it may be a symlink.
fn resolve_source(from: &Path, current_dir: &Path) -> PathBuf {
    let absolute_path = if from.is_absolute() {
        from.to_path_buf()
    } else {
        current_dir.join(from)
    };

    match (absolute_path.parent(), absolute_path.file_name()) {
        (Some(parent), Some(name)) => {
            let parent = parent.canonicalize().unwrap_or_else(|_| parent.to_path_buf());
            parent.join(name)
        },
        _ => absolute_path,
    }
}
