use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use super::types::OutputFormat;

/// Rename many files at once, including swaps and rotations, with undo
#[derive(Parser, Debug)]
#[command(name = "batchren")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Run as if started in <path> instead of the current working directory
    #[arg(short = 'C', global = true, value_name = "PATH")]
    pub directory: Option<PathBuf>,
}

/// The renames making up one batch
#[derive(Args, Debug, Clone)]
pub struct BatchInput {
    /// Rename FROM to the leaf name TO (repeatable)
    #[arg(
        long = "pair",
        num_args = 2,
        value_names = ["FROM", "TO"],
        action = clap::ArgAction::Append
    )]
    pub pairs: Vec<String>,

    /// Read renames from a file with one `path<TAB>new_name` per line
    #[arg(long, value_name = "FILE")]
    pub mapping: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Rename a batch of files
    Rename {
        #[command(flatten)]
        input: BatchInput,

        /// Show the planned steps only, don't rename anything
        #[arg(long)]
        dry_run: bool,

        /// Output format for machine consumption
        #[arg(long, value_enum)]
        output: Option<OutputFormat>,

        /// Suppress all output
        #[arg(long)]
        quiet: bool,
    },

    /// Show the rename steps a batch would take
    Plan {
        #[command(flatten)]
        input: BatchInput,

        /// Output format for machine consumption
        #[arg(long, value_enum)]
        output: Option<OutputFormat>,

        /// Suppress all output
        #[arg(long)]
        quiet: bool,
    },

    /// Undo the most recent batch
    Undo {
        /// Output format for machine consumption
        #[arg(long, value_enum)]
        output: Option<OutputFormat>,

        /// Suppress all output
        #[arg(long)]
        quiet: bool,
    },

    /// Redo the most recently undone batch
    Redo {
        /// Output format for machine consumption
        #[arg(long, value_enum)]
        output: Option<OutputFormat>,

        /// Suppress all output
        #[arg(long)]
        quiet: bool,
    },

    /// Show batches that can be undone
    History {
        /// Limit number of entries
        #[arg(long)]
        limit: Option<usize>,

        /// Output format for machine consumption
        #[arg(long, value_enum)]
        output: Option<OutputFormat>,

        /// Suppress all output
        #[arg(long)]
        quiet: bool,
    },

    /// Show version information
    Version {
        /// Output format for machine consumption
        #[arg(long, value_enum, default_value = "summary")]
        output: OutputFormat,
    },
}
