pub mod args;
pub mod types;

pub use args::{BatchInput, Cli, Commands};
pub use types::OutputFormat;
