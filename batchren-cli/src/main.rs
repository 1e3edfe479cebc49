use anyhow::{Context, Result};
use batchren_core::{CancelFlag, Config, OutputFormatter, VersionResult};
use clap::Parser;
use std::process;

mod cli;
mod history;
mod input;
mod plan;
mod redo;
mod rename;
mod undo;

use cli::{Cli, Commands, OutputFormat};

fn main() {
    // Ctrl-C stops the batch before its next component
    let cancel = CancelFlag::new();
    let handler_flag = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        eprintln!("\nReceived SIGINT. Finishing the current rename group...");
        handler_flag.cancel();
    }) {
        eprintln!("Warning: failed to set SIGINT handler: {e}");
    }

    let cli = Cli::parse();

    // Handle -C directory flag
    if let Some(ref dir) = cli.directory {
        if let Err(e) = std::env::set_current_dir(dir)
            .with_context(|| format!("Failed to change to directory: {}", dir.display()))
        {
            eprintln!("Error: {e:#}");
            process::exit(1);
        }
    }

    let config = match Config::load(std::path::Path::new(".")) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: ignoring unreadable config: {e:#}");
            Config::default()
        },
    };

    let result = run(cli.command, &config, cancel);

    match result {
        Ok(true) => process::exit(0),
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("Error: {e:#}");
            process::exit(1);
        },
    }
}

/// Dispatch a command. `Ok(false)` means it ran but some rename failed.
fn run(command: Commands, config: &Config, cancel: CancelFlag) -> Result<bool> {
    match command {
        Commands::Rename {
            input,
            dry_run,
            output,
            quiet,
        } => {
            let output = OutputFormat::resolve(output, config);
            if dry_run {
                plan::handle_plan(&input, output, quiet)
            } else {
                rename::handle_rename(&input, output, quiet, cancel)
            }
        },

        Commands::Plan {
            input,
            output,
            quiet,
        } => plan::handle_plan(&input, OutputFormat::resolve(output, config), quiet),

        Commands::Undo { output, quiet } => {
            undo::handle_undo(OutputFormat::resolve(output, config), quiet).map(|()| true)
        },

        Commands::Redo { output, quiet } => {
            redo::handle_redo(OutputFormat::resolve(output, config), quiet).map(|()| true)
        },

        Commands::History {
            limit,
            output,
            quiet,
        } => history::handle_history(limit, OutputFormat::resolve(output, config), quiet)
            .map(|()| true),

        Commands::Version { output } => handle_version(output).map(|()| true),
    }
}

fn handle_version(output: OutputFormat) -> Result<()> {
    let version_result = VersionResult {
        name: "batchren".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    println!("{}", version_result.format(output.into()));
    Ok(())
}
