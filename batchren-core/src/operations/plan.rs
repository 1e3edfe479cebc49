use super::{build_requests, working_dir_or_current, RenamePair};
use crate::config::Config;
use crate::engine::{BatchOptions, BatchRenamer};
use crate::output::PlanResult;
use anyhow::{Context, Result};
use std::path::Path;

/// Plan operation - computes the steps a rename would take without running them
pub fn plan_operation(pairs: &[RenamePair], working_dir: Option<&Path>) -> Result<PlanResult> {
    let current_dir = working_dir_or_current(working_dir);
    let config = Config::load(&current_dir).context("Failed to load config")?;
    let requests = build_requests(pairs, &current_dir)?;

    let renamer = BatchRenamer::default().with_options(BatchOptions::from(&config));
    let plan = match renamer.plan(&requests) {
        Ok(plan) => plan,
        Err(error) => {
            return Ok(PlanResult {
                requests: requests.len(),
                noops: 0,
                cycles: 0,
                steps: Vec::new(),
                errors: Vec::new(),
                rejected: Some(error.to_string()),
            });
        },
    };

    let errors = plan
        .components
        .iter()
        .filter_map(|component| {
            let error = component.error.as_ref()?;
            let first = *component.component.requests().first()?;
            Some(format!(
                "{}: {}",
                requests[first].current_path().display(),
                error
            ))
        })
        .collect();

    Ok(PlanResult {
        requests: requests.len(),
        noops: plan.noops.len(),
        cycles: plan.cycle_count(),
        steps: plan.steps().cloned().collect(),
        errors,
        rejected: None,
    })
}
