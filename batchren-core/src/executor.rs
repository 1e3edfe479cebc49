use crate::classify::Component;
use crate::error::ErrorKind;
use crate::fs::RenameFs;
use crate::log::OperationLog;
use crate::planner::{BatchPlan, ComponentPlan, ExecutionStep};
use crate::request::RenameRequest;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Outcome for one original request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResult {
    pub request: usize,
    pub success: bool,
    /// Where the file is now, whether or not it reached its target
    pub final_path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorKind>,
}

/// Shared flag checked between components. Never interrupts a component.
///
/// A flag made with [`CancelFlag::child`] also reads as cancelled once its
/// parent is, while cancelling the child leaves the parent untouched.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag {
    flag: Arc<AtomicBool>,
    parent: Option<Arc<AtomicBool>>,
}

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn child(&self) -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            parent: Some(self.flag.clone()),
        }
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
            || self
                .parent
                .as_ref()
                .is_some_and(|parent| parent.load(Ordering::SeqCst))
    }
}

/// What the executor did.
#[derive(Debug, Clone, Default)]
pub struct Execution {
    pub results: Vec<BatchResult>,
    /// Steps that succeeded, in execution order
    pub executed: Vec<ExecutionStep>,
    pub cancelled: bool,
}

impl Execution {
    pub fn all_succeeded(&self) -> bool {
        self.results.iter().all(|r| r.success)
    }
}

/// Runs a [`BatchPlan`] one step at a time.
pub struct Executor<'a> {
    fs: &'a dyn RenameFs,
    log: &'a mut OperationLog,
    cancel: CancelFlag,
}

impl<'a> Executor<'a> {
    pub fn new(fs: &'a dyn RenameFs, log: &'a mut OperationLog, cancel: CancelFlag) -> Self {
        Self { fs, log, cancel }
    }

    pub fn run(&mut self, plan: &BatchPlan, requests: &[RenameRequest]) -> Execution {
        let mut execution = Execution {
            results: requests
                .iter()
                .enumerate()
                .map(|(index, request)| BatchResult {
                    request: index,
                    success: false,
                    final_path: request.current_path(),
                    error: None,
                })
                .collect(),
            ..Execution::default()
        };

        for &noop in &plan.noops {
            execution.results[noop].success = true;
        }

        for component_plan in &plan.components {
            if self.cancel.is_cancelled() {
                if !execution.cancelled {
                    self.log.log("Cancelled, skipping remaining components");
                }
                execution.cancelled = true;
                fail_all(&mut execution, &component_plan.component, &ErrorKind::Cancelled);
                continue;
            }

            if let Some(error) = &component_plan.error {
                self.log.log(&format!(
                    "Skipping component {:?}: {}",
                    component_plan.component.requests(),
                    error
                ));
                fail_first_abort_rest(&mut execution, &component_plan.component, error);
                continue;
            }

            match component_plan.component {
                Component::Chain(_) => self.run_chain(component_plan, requests, &mut execution),
                Component::Cycle(_) => self.run_cycle(component_plan, requests, &mut execution),
            }
        }

        execution
    }

    fn run_chain(
        &mut self,
        plan: &ComponentPlan,
        requests: &[RenameRequest],
        execution: &mut Execution,
    ) {
        for (position, step) in plan.steps.iter().enumerate() {
            if let Err(error) = self.apply_step(step, requests, execution) {
                execution.results[step.request].error = Some(error);

                // Everything upstream still points at an occupied name
                for blocked in &plan.steps[position + 1..] {
                    self.log.log(&format!(
                        "Blocked: {} -> {}",
                        blocked.from.display(),
                        blocked.to.display()
                    ));
                    execution.results[blocked.request].error = Some(ErrorKind::Blocked);
                }
                return;
            }
            execution.results[step.request].success = true;
        }
    }

    fn run_cycle(
        &mut self,
        plan: &ComponentPlan,
        requests: &[RenameRequest],
        execution: &mut Execution,
    ) {
        for step in &plan.steps {
            if let Err(error) = self.apply_step(step, requests, execution) {
                if step.is_temporary {
                    self.log.log("Cycle detour failed, nothing in this cycle was moved");
                } else {
                    self.log.log(
                        "Cycle aborted after detour, parked file left under its temporary name",
                    );
                }
                for &member in plan.component.requests() {
                    let result = &mut execution.results[member];
                    result.success = false;
                    result.error = Some(if member == step.request {
                        error.clone()
                    } else {
                        ErrorKind::CycleAborted
                    });
                }
                return;
            }
        }

        for &member in plan.component.requests() {
            execution.results[member].success = true;
        }
    }

    fn apply_step(
        &mut self,
        step: &ExecutionStep,
        requests: &[RenameRequest],
        execution: &mut Execution,
    ) -> Result<(), ErrorKind> {
        self.log.log(&format!(
            "Renaming {} -> {}{}",
            step.from.display(),
            step.to.display(),
            if step.is_temporary { " (temporary)" } else { "" }
        ));

        if let Err(e) = self.fs.rename(&step.from, &step.to) {
            let kind = ErrorKind::from_io(&e);
            self.log.log(&format!(
                "Error renaming {} -> {}: {}",
                step.from.display(),
                step.to.display(),
                e
            ));
            return Err(kind);
        }

        if let Err(e) = requests[step.request].file_ref.commit_rename(&step.to) {
            // The file did move; the handle is the caller's problem
            self.log.log(&format!("Warning: {}", e));
        }

        execution.results[step.request].final_path.clone_from(&step.to);
        execution.executed.push(step.clone());
        Ok(())
    }
}

fn fail_all(execution: &mut Execution, component: &Component, error: &ErrorKind) {
    for &member in component.requests() {
        execution.results[member].success = false;
        execution.results[member].error = Some(error.clone());
    }
}

/// The first member carries `error`, everyone else without an error of their
/// own is reported as an aborted cycle member.
fn fail_first_abort_rest(execution: &mut Execution, component: &Component, error: &ErrorKind) {
    for (position, &member) in component.requests().iter().enumerate() {
        let result = &mut execution.results[member];
        result.success = false;
        if position == 0 {
            result.error = Some(error.clone());
        } else if result.error.is_none() {
            result.error = Some(ErrorKind::CycleAborted);
        }
    }
}
