use anyhow::Result;
use batchren_core::{plan_operation, OutputFormatter};

use crate::cli::BatchInput;
use crate::input::collect_pairs;
use crate::OutputFormat;

/// Returns whether the batch could run as planned
pub fn handle_plan(input: &BatchInput, output: OutputFormat, quiet: bool) -> Result<bool> {
    let pairs = collect_pairs(input)?;
    let result = plan_operation(&pairs, None)?;

    match output {
        OutputFormat::Json => {
            println!("{}", result.format_json());
        },
        OutputFormat::Summary => {
            if !quiet {
                print!("{}", result.format_summary());
            }
        },
    }

    Ok(result.is_runnable())
}
