use crate::classify::classify;
use crate::config::Config;
use crate::error::{BatchError, ErrorKind};
use crate::executor::{BatchResult, CancelFlag, Executor};
use crate::fs::{RenameFs, StdFs};
use crate::graph::CollisionGraph;
use crate::history::UndoSink;
use crate::log::OperationLog;
use crate::planner::{plan_batch, BatchPlan, PlannerOptions};
use crate::request::RenameRequest;
use crate::undo::{generate_batch_id, ReversibleBatch};
use crate::validate::validate_batch;
use anyhow::{anyhow, Result};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Options for running a batch
#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub temp_name_attempts: usize,
    /// Directory for the per-batch `<id>.log`, none to skip logging
    pub log_dir: Option<PathBuf>,
    /// Shown in undo history; derived from the batch when absent
    pub label: Option<String>,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            temp_name_attempts: crate::planner::DEFAULT_TEMP_NAME_ATTEMPTS,
            log_dir: None,
            label: None,
        }
    }
}

impl From<&Config> for BatchOptions {
    fn from(config: &Config) -> Self {
        Self {
            temp_name_attempts: config.defaults.temp_name_attempts,
            ..Self::default()
        }
    }
}

/// Everything a finished batch produced.
#[derive(Debug, Clone)]
pub struct BatchReport {
    /// One result per request, in request order
    pub results: Vec<BatchResult>,
    pub plan: BatchPlan,
    /// The reversible action registered for this batch, if anything moved
    pub batch: Option<ReversibleBatch>,
    /// Set when the batch was refused before touching the filesystem
    pub rejected: Option<BatchError>,
    pub cancelled: bool,
    pub log_path: Option<PathBuf>,
}

impl BatchReport {
    pub fn all_succeeded(&self) -> bool {
        self.results.iter().all(|r| r.success)
    }

    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.success).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.succeeded()
    }

    fn rejected(requests: &[RenameRequest], error: BatchError) -> Self {
        let offending = error.offending_requests();
        let kind = error.kind();
        let results = requests
            .iter()
            .enumerate()
            .map(|(index, request)| BatchResult {
                request: index,
                success: false,
                final_path: request.current_path(),
                error: Some(if offending.contains(&index) {
                    kind.clone()
                } else {
                    ErrorKind::BatchRejected
                }),
            })
            .collect();

        Self {
            results,
            plan: BatchPlan::default(),
            batch: None,
            rejected: Some(error),
            cancelled: false,
            log_path: None,
        }
    }
}

/// Entry point of the engine.
///
/// A renamer is cheap to clone. Every clone shares the filesystem, the undo
/// sink and the cancel flag.
#[derive(Clone)]
pub struct BatchRenamer {
    fs: Arc<dyn RenameFs>,
    undo: Option<Arc<dyn UndoSink>>,
    options: BatchOptions,
    cancel: CancelFlag,
}

impl Default for BatchRenamer {
    fn default() -> Self {
        Self::new(Arc::new(StdFs))
    }
}

impl BatchRenamer {
    pub fn new(fs: Arc<dyn RenameFs>) -> Self {
        Self {
            fs,
            undo: None,
            options: BatchOptions::default(),
            cancel: CancelFlag::new(),
        }
    }

    #[must_use]
    pub fn with_undo_sink(mut self, sink: Arc<dyn UndoSink>) -> Self {
        self.undo = Some(sink);
        self
    }

    #[must_use]
    pub fn with_options(mut self, options: BatchOptions) -> Self {
        self.options = options;
        self
    }

    /// Share an existing flag, e.g. one set from a signal handler
    #[must_use]
    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Flag checked between components of every batch this renamer runs
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Validate and plan without touching anything but `exists`
    pub fn plan(&self, requests: &[RenameRequest]) -> Result<BatchPlan, BatchError> {
        let validated = validate_batch(requests)?;
        let graph = CollisionGraph::build(requests, &validated);
        let components = classify(&graph);
        Ok(plan_batch(
            requests,
            &validated,
            &graph,
            &components,
            self.fs.as_ref(),
            &self.planner_options(),
        ))
    }

    /// Run a batch to completion on the calling thread
    pub fn run(&self, requests: &[RenameRequest]) -> BatchReport {
        let plan = match self.plan(requests) {
            Ok(plan) => plan,
            Err(error) => return BatchReport::rejected(requests, error),
        };

        let id = generate_batch_id(plan.steps());
        let (mut log, log_path) = if plan.step_count() == 0 {
            (OperationLog::disabled(), None)
        } else {
            self.open_log(&id)
        };
        log.log(&format!(
            "Starting batch {}: {} requests, {} steps, {} cycles",
            id,
            requests.len(),
            plan.step_count(),
            plan.cycle_count()
        ));

        let execution =
            Executor::new(self.fs.as_ref(), &mut log, self.cancel.clone()).run(&plan, requests);

        let label = self
            .options
            .label
            .clone()
            .unwrap_or_else(|| default_label(requests));
        let batch = ReversibleBatch::with_id(id, &execution.executed, label);
        if let (Some(sink), Some(batch)) = (&self.undo, &batch) {
            sink.register(batch.clone());
        }

        let succeeded = execution.results.iter().filter(|r| r.success).count();
        log.log(&format!(
            "Batch finished: {} succeeded, {} failed{}",
            succeeded,
            execution.results.len() - succeeded,
            if execution.cancelled { " (cancelled)" } else { "" }
        ));

        BatchReport {
            results: execution.results,
            plan,
            batch,
            rejected: None,
            cancelled: execution.cancelled,
            log_path,
        }
    }

    /// Run a batch on a worker thread and hand the results to `on_complete`.
    ///
    /// The returned handle has its own cancel flag, so cancelling it leaves
    /// other batches of this renamer alone. Cancelling the renamer's shared
    /// flag still stops the submitted batch.
    pub fn submit<F>(&self, requests: Vec<RenameRequest>, on_complete: F) -> BatchHandle
    where
        F: FnOnce(Vec<BatchResult>) + Send + 'static,
    {
        let mut renamer = self.clone();
        renamer.cancel = self.cancel.child();
        let cancel = renamer.cancel_flag();

        let thread = thread::spawn(move || {
            let report = renamer.run(&requests);
            on_complete(report.results.clone());
            report
        });

        BatchHandle { cancel, thread }
    }

    fn planner_options(&self) -> PlannerOptions {
        PlannerOptions {
            temp_name_attempts: self.options.temp_name_attempts,
        }
    }

    fn open_log(&self, id: &str) -> (OperationLog, Option<PathBuf>) {
        let Some(dir) = &self.options.log_dir else {
            return (OperationLog::disabled(), None);
        };

        let path = dir.join(format!("{id}.log"));
        match OperationLog::open(&path) {
            Ok(log) => (log, Some(path)),
            Err(e) => {
                eprintln!("Warning: cannot open log {}: {}", path.display(), e);
                (OperationLog::disabled(), None)
            },
        }
    }
}

/// A batch running on a worker thread
#[derive(Debug)]
pub struct BatchHandle {
    cancel: CancelFlag,
    thread: JoinHandle<BatchReport>,
}

impl BatchHandle {
    /// Stop before the next component. The component in flight finishes.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    pub fn join(self) -> Result<BatchReport> {
        self.thread
            .join()
            .map_err(|_| anyhow!("batch worker thread panicked"))
    }
}

/// Run `requests` on the real filesystem without undo registration
pub fn submit_batch_rename<F>(requests: Vec<RenameRequest>, on_complete: F) -> BatchHandle
where
    F: FnOnce(Vec<BatchResult>) + Send + 'static,
{
    BatchRenamer::default().submit(requests, on_complete)
}

fn default_label(requests: &[RenameRequest]) -> String {
    match requests {
        [single] => format!("{} -> {}", single.current_name, single.target_name),
        _ => format!("rename {} files", requests.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::UndoStack;
    use std::fs;
    use std::sync::mpsc;
    use std::sync::Mutex;
    use tempfile::TempDir;

    fn request(dir: &TempDir, from: &str, to: &str) -> RenameRequest {
        RenameRequest::for_path(dir.path().join(from), to).unwrap()
    }

    #[test]
    fn test_run_swaps_and_registers_undo() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("a.txt"), "A").unwrap();
        fs::write(temp_dir.path().join("b.txt"), "B").unwrap();

        let stack = Arc::new(Mutex::new(UndoStack::new(10)));
        let renamer = BatchRenamer::default().with_undo_sink(stack.clone());
        let report = renamer.run(&[
            request(&temp_dir, "a.txt", "b.txt"),
            request(&temp_dir, "b.txt", "a.txt"),
        ]);

        assert!(report.all_succeeded());
        assert_eq!(report.plan.step_count(), 3);
        assert_eq!(
            fs::read_to_string(temp_dir.path().join("a.txt")).unwrap(),
            "B"
        );
        assert_eq!(stack.lock().unwrap().len(), 1);
        assert_eq!(stack.lock().unwrap().peek_undo().unwrap().label, "rename 2 files");
    }

    #[test]
    fn test_rejected_batch_fails_every_request() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("a"), "").unwrap();
        fs::write(temp_dir.path().join("b"), "").unwrap();
        fs::write(temp_dir.path().join("c"), "").unwrap();

        let report = BatchRenamer::default().run(&[
            request(&temp_dir, "a", "x"),
            request(&temp_dir, "b", "x"),
            request(&temp_dir, "c", "y"),
        ]);

        assert!(matches!(report.rejected, Some(BatchError::DuplicateTarget { .. })));
        assert_eq!(report.results[0].error, Some(ErrorKind::DuplicateTarget));
        assert_eq!(report.results[1].error, Some(ErrorKind::DuplicateTarget));
        assert_eq!(report.results[2].error, Some(ErrorKind::BatchRejected));
        assert!(temp_dir.path().join("a").exists());
        assert!(report.batch.is_none());
    }

    #[test]
    fn test_noop_batch_registers_nothing() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("same"), "").unwrap();

        let stack = Arc::new(Mutex::new(UndoStack::new(10)));
        let report = BatchRenamer::default()
            .with_undo_sink(stack.clone())
            .run(&[request(&temp_dir, "same", "same")]);

        assert!(report.all_succeeded());
        assert!(report.batch.is_none());
        assert!(stack.lock().unwrap().is_empty());
    }

    #[test]
    fn test_log_written_under_batch_id() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("old"), "").unwrap();
        let log_dir = temp_dir.path().join("logs");

        let report = BatchRenamer::default()
            .with_options(BatchOptions {
                log_dir: Some(log_dir.clone()),
                ..BatchOptions::default()
            })
            .run(&[request(&temp_dir, "old", "new")]);

        let batch = report.batch.unwrap();
        let log_path = report.log_path.unwrap();
        assert_eq!(log_path, log_dir.join(format!("{}.log", batch.id)));
        let content = fs::read_to_string(log_path).unwrap();
        assert!(content.contains("Starting batch"));
        assert!(content.contains("Batch finished: 1 succeeded, 0 failed"));
        assert_eq!(batch.label, "old -> new");
    }

    #[test]
    fn test_submit_invokes_callback() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("1"), "").unwrap();
        fs::write(temp_dir.path().join("2"), "").unwrap();

        let (tx, rx) = mpsc::channel();
        let handle = submit_batch_rename(
            vec![request(&temp_dir, "1", "2"), request(&temp_dir, "2", "3")],
            move |results| tx.send(results).unwrap(),
        );

        let report = handle.join().unwrap();
        let results = rx.recv().unwrap();
        assert_eq!(results, report.results);
        assert!(results.iter().all(|r| r.success));
        assert!(temp_dir.path().join("3").exists());
        assert!(!temp_dir.path().join("1").exists());
    }

    #[test]
    fn test_cancelled_renamer_moves_nothing() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("a"), "").unwrap();

        let renamer = BatchRenamer::default();
        renamer.cancel_flag().cancel();
        let report = renamer.run(&[request(&temp_dir, "a", "b")]);

        assert!(report.cancelled);
        assert_eq!(report.results[0].error, Some(ErrorKind::Cancelled));
        assert!(temp_dir.path().join("a").exists());
    }

    #[test]
    fn test_submit_honors_shared_cancel_flag() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("a"), "").unwrap();

        let shared = CancelFlag::new();
        let renamer = BatchRenamer::default().with_cancel_flag(shared.clone());
        shared.cancel();

        let handle = renamer.submit(vec![request(&temp_dir, "a", "b")], |_| {});
        let report = handle.join().unwrap();

        assert!(report.cancelled);
        assert_eq!(report.results[0].error, Some(ErrorKind::Cancelled));
        assert!(temp_dir.path().join("a").exists());
    }
}
