use anyhow::Result;
use batchren_core::{undo_operation, OutputFormatter};

use crate::OutputFormat;

pub fn handle_undo(output: OutputFormat, quiet: bool) -> Result<()> {
    let result = undo_operation(None)?;

    match output {
        OutputFormat::Json => {
            println!("{}", result.format_json());
        },
        OutputFormat::Summary => {
            if !quiet {
                println!("{}", result.format_summary());
            }
        },
    }

    Ok(())
}
