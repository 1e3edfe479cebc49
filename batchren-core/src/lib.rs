#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::option_if_let_else)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

//! Batch file renaming that survives swaps and cycles.
//!
//! A batch is validated as a whole, turned into a collision graph, split into
//! chains and cycles, and executed as a sequence of single renames. Cycles
//! are broken through a temporary name in the same directory. Each executed
//! batch becomes one reversible action on the undo stack.

pub mod classify;
pub mod config;
pub mod engine;
pub mod error;
pub mod executor;
pub mod fs;
pub mod graph;
pub mod history;
pub mod log;
pub mod operations;
pub mod output;
pub mod planner;
pub mod request;
pub mod undo;
pub mod validate;

pub use classify::{classify, Component};
pub use config::Config;
pub use engine::{submit_batch_rename, BatchHandle, BatchOptions, BatchRenamer, BatchReport};
pub use error::{BatchError, ErrorKind, FileRefError};
pub use executor::{BatchResult, CancelFlag};
pub use fs::{RenameFs, StdFs};
pub use graph::CollisionGraph;
pub use history::{StackError, UndoSink, UndoStack};
pub use log::OperationLog;
pub use operations::{
    history_operation, parse_mapping, plan_operation, redo_operation, rename_operation,
    undo_operation, RenamePair,
};
pub use output::{
    HistoryItem, HistoryResult, OutputFormat, OutputFormatter, PlanResult, RedoResult,
    RenameResult, RequestOutcome, UndoResult, VersionResult,
};
pub use planner::{plan_batch, BatchPlan, ComponentPlan, ExecutionStep, PlannerOptions};
pub use request::{FileRef, PathRef, RenameRequest};
pub use undo::{ReplayError, Reversible, ReversibleBatch, UndoEntry};
pub use validate::{validate_batch, ValidatedBatch};
