//! CLI command definitions.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use uuid::Uuid;

/// Triptych - run one prompt across many model configurations and compare the results
#[derive(Parser, Debug)]
#[command(name = "triptych")]
#[command(
    about = "Run one prompt across many model configurations and compare the results",
    long_about = None
)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Configuration file used instead of the default search path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Execute an execution plan TOML file
    Run {
        /// Path to the plan file
        plan: PathBuf,

        /// Resolve every function call from its mock response
        #[arg(long)]
        mock_functions: bool,

        /// Print the full result as JSON instead of a summary
        #[arg(long)]
        json: bool,

        /// Persist the run to Postgres instead of memory
        #[arg(long)]
        database: bool,
    },

    /// List recorded execution runs, newest first
    List {
        /// Maximum number of runs
        #[arg(long, default_value = "20")]
        limit: usize,

        /// Runs to skip
        #[arg(long, default_value = "0")]
        offset: usize,
    },

    /// Show the status of a recorded execution run
    Status {
        /// Execution run id
        execution_id: Uuid,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_flags_parse() {
        let cli = Cli::try_parse_from([
            "triptych",
            "run",
            "plan.toml",
            "--mock-functions",
            "--json",
            "-v",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Run {
                plan,
                mock_functions,
                json,
                database,
            } => {
                assert_eq!(plan, PathBuf::from("plan.toml"));
                assert!(mock_functions);
                assert!(json);
                assert!(!database);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_status_requires_uuid() {
        assert!(Cli::try_parse_from(["triptych", "status", "not-a-uuid"]).is_err());
    }
}
