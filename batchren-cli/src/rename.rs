use anyhow::Result;
use batchren_core::{rename_operation, CancelFlag, OutputFormatter};

use crate::cli::BatchInput;
use crate::input::collect_pairs;
use crate::OutputFormat;

/// Returns whether every request ended up under its target name
pub fn handle_rename(
    input: &BatchInput,
    output: OutputFormat,
    quiet: bool,
    cancel: CancelFlag,
) -> Result<bool> {
    let pairs = collect_pairs(input)?;
    let result = rename_operation(&pairs, Some(cancel), None)?;

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

    Ok(result.all_succeeded())
}
