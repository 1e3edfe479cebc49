use anyhow::Result;
use batchren_core::{history_operation, OutputFormatter};

use crate::OutputFormat;

pub fn handle_history(limit: Option<usize>, output: OutputFormat, quiet: bool) -> Result<()> {
    let result = history_operation(limit, None)?;

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

    Ok(())
}
