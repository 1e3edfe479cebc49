use super::{build_requests, state_dir, working_dir_or_current};
use crate::config::Config;
use crate::engine::{BatchOptions, BatchRenamer, BatchReport};
use crate::executor::CancelFlag;
use crate::history::UndoStack;
use crate::output::{RenameResult, RequestOutcome};
use crate::request::RenameRequest;
use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// One `FROM TO` pair as given on the command line or in a mapping file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenamePair {
    pub from: PathBuf,
    /// New leaf name in the same directory
    pub to: String,
}

impl RenamePair {
    pub fn new(from: impl Into<PathBuf>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

impl fmt::Display for RenamePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.from.display(), self.to)
    }
}

/// Parse a mapping file: one `path<TAB>new_name` per line.
///
/// Blank lines and lines starting with `#` are skipped.
pub fn parse_mapping(content: &str) -> Result<Vec<RenamePair>> {
    let mut pairs = Vec::new();

    for (index, line) in content.lines().enumerate() {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() || line.trim_start().starts_with('#') {
            continue;
        }

        let Some((from, to)) = line.split_once('\t') else {
            bail!("line {}: expected <path><TAB><new name>", index + 1);
        };
        if from.is_empty() || to.is_empty() {
            bail!("line {}: path and new name must not be empty", index + 1);
        }

        pairs.push(RenamePair::new(from, to));
    }

    Ok(pairs)
}

/// Rename operation - runs the batch and records it for undo
pub fn rename_operation(
    pairs: &[RenamePair],
    cancel: Option<CancelFlag>,
    working_dir: Option<&Path>,
) -> Result<RenameResult> {
    let current_dir = working_dir_or_current(working_dir);
    let config = Config::load(&current_dir).context("Failed to load config")?;
    let requests = build_requests(pairs, &current_dir)?;

    let state_dir = state_dir(&current_dir);
    let stack = Arc::new(Mutex::new(
        UndoStack::load(&state_dir, config.defaults.max_history)
            .context("Failed to load undo history")?,
    ));

    let mut options = BatchOptions::from(&config);
    if config.defaults.write_log {
        options.log_dir = Some(state_dir.join("logs"));
    }

    let mut renamer = BatchRenamer::default()
        .with_undo_sink(stack.clone())
        .with_options(options);
    if let Some(cancel) = cancel {
        renamer = renamer.with_cancel_flag(cancel);
    }

    let report = renamer.run(&requests);

    if report.batch.is_some() {
        stack
            .lock()
            .map_err(|_| anyhow!("Undo history lock poisoned"))?
            .save()
            .context("Failed to save undo history")?;
    }

    Ok(rename_result(&requests, &report))
}

fn rename_result(requests: &[RenameRequest], report: &BatchReport) -> RenameResult {
    let results = requests
        .iter()
        .zip(&report.results)
        .map(|(request, result)| RequestOutcome {
            from: request.current_path(),
            to: request.target_path(),
            success: result.success,
            final_path: result.final_path.clone(),
            error: result.error.clone(),
        })
        .collect();

    RenameResult {
        batch_id: report.batch.as_ref().map(|b| b.id.clone()),
        succeeded: report.succeeded(),
        failed: report.failed(),
        steps: report.batch.as_ref().map_or(0, |b| b.forward.len()),
        cycles: report.plan.cycle_count(),
        cancelled: report.cancelled,
        rejected: report.rejected.as_ref().map(ToString::to_string),
        results,
    }
}
