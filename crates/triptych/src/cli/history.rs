//! Run history command handlers (Postgres only).

use triptych::{TriptychConfig, TriptychResult};
use uuid::Uuid;

#[cfg(feature = "database")]
pub(crate) fn connect(config: &TriptychConfig) -> TriptychResult<triptych::PgExecutionLogger> {
    use triptych::{ConfigError, PgExecutionLogger, establish_pool, run_migrations};

    let url = config.database.resolve_url().ok_or_else(|| {
        ConfigError::new("no database URL: set [database] url or DATABASE_URL")
    })?;
    let pool = establish_pool(&url, config.database.pool_size)?;
    let mut conn = pool
        .get()
        .map_err(|e| ConfigError::new(format!("Failed to get connection from pool: {e}")))?;
    run_migrations(&mut conn)?;
    Ok(PgExecutionLogger::new(pool))
}

/// Print recorded runs, newest first.
#[cfg(feature = "database")]
pub async fn list_runs(config: &TriptychConfig, limit: usize, offset: usize) -> TriptychResult<()> {
    use triptych::ExecutionLogger;

    let logger = connect(config)?;
    let runs = logger.list_runs(limit, offset).await?;
    if runs.is_empty() {
        println!("No execution runs recorded.");
    } else {
        print!("{}", triptych::render_runs(&runs));
    }
    Ok(())
}

/// Print one run's status.
#[cfg(feature = "database")]
pub async fn show_status(config: &TriptychConfig, execution_id: Uuid) -> TriptychResult<()> {
    use triptych::{ExecutionError, ExecutionErrorKind, ExecutionLogger};

    let logger = connect(config)?;
    let run = logger.get_run(execution_id).await?.ok_or_else(|| {
        ExecutionError::new(ExecutionErrorKind::UnknownExecution(execution_id.to_string()))
    })?;
    println!("{}  {}  {}", run.id, run.status, run.name);
    if let Some(error) = run.error_message {
        println!("error: {error}");
    }
    Ok(())
}

#[cfg(not(feature = "database"))]
fn unavailable() -> triptych::TriptychError {
    triptych::ConfigError::new(
        "run history requires triptych to be built with the `database` feature",
    )
    .into()
}

/// Print recorded runs, newest first.
#[cfg(not(feature = "database"))]
pub async fn list_runs(
    _config: &TriptychConfig,
    _limit: usize,
    _offset: usize,
) -> TriptychResult<()> {
    Err(unavailable())
}

/// Print one run's status.
#[cfg(not(feature = "database"))]
pub async fn show_status(_config: &TriptychConfig, _execution_id: Uuid) -> TriptychResult<()> {
    Err(unavailable())
}
