use crate::classify::Component;
use crate::error::ErrorKind;
use crate::fs::RenameFs;
use crate::graph::CollisionGraph;
use crate::request::RenameRequest;
use crate::validate::ValidatedBatch;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

pub const DEFAULT_TEMP_NAME_ATTEMPTS: usize = 64;

/// One call to the rename primitive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionStep {
    /// Request whose file this step moves
    pub request: usize,
    pub from: PathBuf,
    pub to: PathBuf,
    /// The step parks a file under a temporary name to break a cycle
    #[serde(default)]
    pub is_temporary: bool,
}

impl ExecutionStep {
    fn new(request: usize, from: PathBuf, to: PathBuf) -> Self {
        Self {
            request,
            from,
            to,
            is_temporary: false,
        }
    }

    /// The step that undoes this one
    pub fn inverse(&self) -> Self {
        Self {
            request: self.request,
            from: self.to.clone(),
            to: self.from.clone(),
            is_temporary: self.is_temporary,
        }
    }
}

/// Ordered steps for one component, or the reason it cannot run at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentPlan {
    pub component: Component,
    pub steps: Vec<ExecutionStep>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorKind>,
}

/// Every component plan of a batch, in a deterministic order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchPlan {
    pub components: Vec<ComponentPlan>,
    /// Requests that need no filesystem call
    pub noops: Vec<usize>,
}

impl BatchPlan {
    pub fn steps(&self) -> impl Iterator<Item = &ExecutionStep> {
        self.components.iter().flat_map(|c| c.steps.iter())
    }

    pub fn step_count(&self) -> usize {
        self.components.iter().map(|c| c.steps.len()).sum()
    }

    pub fn cycle_count(&self) -> usize {
        self.components
            .iter()
            .filter(|c| c.component.is_cycle())
            .count()
    }
}

#[derive(Debug, Clone)]
pub struct PlannerOptions {
    /// How many temporary names to try per cycle before giving up
    pub temp_name_attempts: usize,
}

impl Default for PlannerOptions {
    fn default() -> Self {
        Self {
            temp_name_attempts: DEFAULT_TEMP_NAME_ATTEMPTS,
        }
    }
}

/// Turn classified components into collision-free step sequences.
///
/// A chain is renamed tail first, so every step writes to a name that was
/// either never part of the batch or was vacated by the step before it. A
/// cycle first parks one member under a temporary name, which turns the rest
/// into a chain, and finally moves the parked file to its real target.
pub fn plan_batch(
    requests: &[RenameRequest],
    validated: &ValidatedBatch,
    graph: &CollisionGraph,
    components: &[Component],
    fs: &dyn RenameFs,
    options: &PlannerOptions,
) -> BatchPlan {
    let mut reserved = HashSet::new();
    let components = components
        .iter()
        .map(|component| match component {
            Component::Chain(members) => ComponentPlan {
                component: component.clone(),
                steps: chain_steps(requests, members),
                error: None,
            },
            Component::Cycle(members) => {
                match cycle_steps(requests, members, graph, fs, options, &mut reserved) {
                    Ok(steps) => ComponentPlan {
                        component: component.clone(),
                        steps,
                        error: None,
                    },
                    Err(kind) => ComponentPlan {
                        component: component.clone(),
                        steps: Vec::new(),
                        error: Some(kind),
                    },
                }
            },
        })
        .collect();

    BatchPlan {
        components,
        noops: validated.noops.clone(),
    }
}

fn chain_steps(requests: &[RenameRequest], members: &[usize]) -> Vec<ExecutionStep> {
    members
        .iter()
        .rev()
        .map(|&index| {
            let request = &requests[index];
            ExecutionStep::new(index, request.current_path(), request.target_path())
        })
        .collect()
}

fn cycle_steps(
    requests: &[RenameRequest],
    members: &[usize],
    graph: &CollisionGraph,
    fs: &dyn RenameFs,
    options: &PlannerOptions,
    reserved: &mut HashSet<PathBuf>,
) -> Result<Vec<ExecutionStep>, ErrorKind> {
    let Some((&first, rest)) = members.split_first() else {
        return Ok(Vec::new());
    };
    let parked = &requests[first];
    let temp_path = temporary_path(parked, graph, fs, options, reserved)?;

    let mut steps = Vec::with_capacity(members.len() + 1);
    steps.push(ExecutionStep {
        request: first,
        from: parked.current_path(),
        to: temp_path.clone(),
        is_temporary: true,
    });
    steps.extend(chain_steps(requests, rest));
    steps.push(ExecutionStep::new(first, temp_path, parked.target_path()));
    Ok(steps)
}

/// Find a name in the request's directory that is free on disk, unused by the
/// batch and not handed out to another cycle already.
fn temporary_path(
    request: &RenameRequest,
    graph: &CollisionGraph,
    fs: &dyn RenameFs,
    options: &PlannerOptions,
    reserved: &mut HashSet<PathBuf>,
) -> Result<PathBuf, ErrorKind> {
    let salt = salt_for(&request.current_path());

    for attempt in 0..options.temp_name_attempts {
        let name = format!(".batchren-{}-{}.tmp", salt, attempt);
        let candidate = request.directory.join(&name);

        if graph.contains(&request.directory, &name)
            || reserved.contains(&candidate)
            || fs.exists(&candidate)
        {
            continue;
        }

        reserved.insert(candidate.clone());
        return Ok(candidate);
    }

    Err(ErrorKind::TemporaryNameExhausted)
}

fn salt_for(path: &Path) -> String {
    let mut hasher = Sha256::new();
    hasher.update(path.to_string_lossy().as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    digest[..12].to_string()
}

/// Whether a path was produced by [`plan_batch`] as a cycle detour
pub fn is_temporary_name(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with(".batchren-") && n.ends_with(".tmp"))
}
