use anyhow::Result;
use batchren_core::{redo_operation, OutputFormatter};

use crate::OutputFormat;

pub fn handle_redo(output: OutputFormat, quiet: bool) -> Result<()> {
    let result = redo_operation(None)?;

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
