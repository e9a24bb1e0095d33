//! Triptych CLI binary.
//!
//! - Execute plan files across every configured variation
//! - List and inspect runs recorded in Postgres

use clap::Parser;
use triptych::{ObservabilityConfig, TriptychConfig, init_observability};

mod cli;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use cli::{Cli, Commands, RunOptions, list_runs, run_plan, show_status};

    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    init_observability(&ObservabilityConfig::new(log_level).with_json_logs(cli.json_logs))?;

    let config = match &cli.config {
        Some(path) => TriptychConfig::from_file(path)?,
        None => TriptychConfig::load()?,
    };

    match cli.command {
        Commands::Run {
            plan,
            mock_functions,
            json,
            database,
        } => {
            let options = RunOptions {
                mock_functions,
                json,
                database,
            };
            run_plan(&plan, &config, options).await?;
        }

        Commands::List { limit, offset } => {
            list_runs(&config, limit, offset).await?;
        }

        Commands::Status { execution_id } => {
            show_status(&config, execution_id).await?;
        }
    }

    Ok(())
}
