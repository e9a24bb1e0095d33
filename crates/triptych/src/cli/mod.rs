//! Command-line interface module.

mod commands;
mod history;
mod run;

pub use commands::{Cli, Commands};
pub use history::{list_runs, show_status};
pub use run::{RunOptions, run_plan};
