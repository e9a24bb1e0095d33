//! PostgreSQL implementation of ExecutionLogger.

use crate::models::{
    ExecutionRunRow, NewApiConfigurationRow, NewApiRequestRow, NewApiResponseRow,
    NewComparisonRow, NewFunctionCallRow,
};
use crate::schema::{
    api_configurations, api_requests, api_responses, comparison_results, execution_runs,
    function_calls,
};
use crate::{DEFAULT_POOL_SIZE, PgPool, establish_pool, run_migrations};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use tracing::{debug, instrument};
use triptych_core::{
    ApiConfiguration, ApiRequest, ApiResponse, ComparisonResult, ExecutionRun, FunctionCallRecord,
};
use triptych_error::{DatabaseError, LoggerError, LoggerErrorKind, TriptychResult};
use triptych_interface::ExecutionLogger;
use uuid::Uuid;

/// Execution logger backed by Postgres.
///
/// Every insert is `ON CONFLICT (id) DO NOTHING`, so replaying a write after a
/// lost acknowledgement leaves exactly one row. Blocking diesel calls run on
/// tokio's blocking pool.
///
/// # Example
///
/// ```no_run
/// use triptych_database::PgExecutionLogger;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let logger = PgExecutionLogger::connect("postgres://localhost/triptych")?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct PgExecutionLogger {
    pool: PgPool,
}

impl std::fmt::Debug for PgExecutionLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgExecutionLogger")
            .field("max_size", &self.pool.max_size())
            .finish()
    }
}

impl PgExecutionLogger {
    /// Wrap an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect with the default pool size and apply pending migrations.
    ///
    /// # Errors
    ///
    /// Returns a database error if the pool cannot be built or migrations fail.
    pub fn connect(database_url: &str) -> Result<Self, DatabaseError> {
        let pool = establish_pool(database_url, DEFAULT_POOL_SIZE)?;
        let mut conn = pool.get().map_err(|e| {
            DatabaseError::new(triptych_error::DatabaseErrorKind::Pool(e.to_string()))
        })?;
        run_migrations(&mut conn)?;
        Ok(Self::new(pool))
    }

    /// The underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run `op` on a pooled connection on the blocking pool.
    async fn with_conn<T, F>(&self, record: &'static str, op: F) -> Result<T, LoggerError>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> Result<T, LoggerError> + Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get().map_err(|e| {
                LoggerError::new(LoggerErrorKind::Unavailable(format!(
                    "Failed to get connection from pool: {e}"
                )))
            })?;
            op(&mut conn)
        })
        .await
        .map_err(|e| LoggerError::write_failed(record, format!("task join error: {e}")))?
    }
}

fn write_error(record: &'static str) -> impl Fn(diesel::result::Error) -> LoggerError {
    move |e| LoggerError::write_failed(record, e.to_string())
}

#[async_trait]
impl ExecutionLogger for PgExecutionLogger {
    #[instrument(skip(self, run), fields(run_id = %run.id))]
    async fn create_run(&self, run: &ExecutionRun) -> TriptychResult<()> {
        let row = ExecutionRunRow::from(run);
        self.with_conn("run", move |conn| {
            diesel::insert_into(execution_runs::table)
                .values(&row)
                .on_conflict(execution_runs::id)
                .do_nothing()
                .execute(conn)
                .map_err(write_error("run"))?;
            Ok(())
        })
        .await?;
        debug!("Run recorded");
        Ok(())
    }

    #[instrument(skip(self, run), fields(run_id = %run.id, status = %run.status))]
    async fn update_run(&self, run: &ExecutionRun) -> TriptychResult<()> {
        let run = run.clone();
        self.with_conn("run", move |conn| {
            conn.transaction::<_, LoggerError, _>(|conn| {
                let stored: Option<ExecutionRunRow> = execution_runs::table
                    .find(run.id)
                    .select(ExecutionRunRow::as_select())
                    .for_update()
                    .first(conn)
                    .optional()
                    .map_err(write_error("run"))?;
                let Some(stored) = stored else {
                    return Err(LoggerError::new(LoggerErrorKind::NotFound {
                        record: "run".into(),
                        id: run.id.to_string(),
                    }));
                };
                let current = stored
                    .run_status()
                    .map_err(|e| LoggerError::write_failed("run", e.to_string()))?;
                if current != run.status && !current.can_transition_to(run.status) {
                    return Err(LoggerError::write_failed(
                        "run",
                        format!("cannot move run from {current} to {}", run.status),
                    ));
                }

                diesel::update(execution_runs::table.find(run.id))
                    .set((
                        execution_runs::status.eq(run.status.to_string()),
                        execution_runs::error_message.eq(&run.error_message),
                        execution_runs::updated_at.eq(run.updated_at),
                    ))
                    .execute(conn)
                    .map_err(write_error("run"))?;
                Ok(())
            })
        })
        .await?;
        Ok(())
    }

    async fn log_configuration(&self, configuration: &ApiConfiguration) -> TriptychResult<()> {
        let row = NewApiConfigurationRow::from(configuration);
        self.with_conn("configuration", move |conn| {
            diesel::insert_into(api_configurations::table)
                .values(&row)
                .on_conflict(api_configurations::id)
                .do_nothing()
                .execute(conn)
                .map_err(write_error("configuration"))?;
            Ok(())
        })
        .await?;
        Ok(())
    }

    async fn log_request(&self, request: &ApiRequest) -> TriptychResult<()> {
        let row = NewApiRequestRow::from(request);
        self.with_conn("request", move |conn| {
            diesel::insert_into(api_requests::table)
                .values(&row)
                .on_conflict(api_requests::id)
                .do_nothing()
                .execute(conn)
                .map_err(write_error("request"))?;
            Ok(())
        })
        .await?;
        Ok(())
    }

    async fn log_response(&self, response: &ApiResponse) -> TriptychResult<()> {
        let row = NewApiResponseRow::from(response);
        self.with_conn("response", move |conn| {
            diesel::insert_into(api_responses::table)
                .values(&row)
                .on_conflict(api_responses::id)
                .do_nothing()
                .execute(conn)
                .map_err(write_error("response"))?;
            Ok(())
        })
        .await?;
        Ok(())
    }

    async fn log_function_call(&self, call: &FunctionCallRecord) -> TriptychResult<()> {
        let row = NewFunctionCallRow::from(call);
        self.with_conn("function_call", move |conn| {
            diesel::insert_into(function_calls::table)
                .values(&row)
                .on_conflict(function_calls::id)
                .do_nothing()
                .execute(conn)
                .map_err(write_error("function_call"))?;
            Ok(())
        })
        .await?;
        Ok(())
    }

    async fn log_comparison(&self, comparison: &ComparisonResult) -> TriptychResult<()> {
        let row = NewComparisonRow::try_from(comparison)?;
        self.with_conn("comparison", move |conn| {
            diesel::insert_into(comparison_results::table)
                .values(&row)
                .on_conflict(comparison_results::id)
                .do_nothing()
                .execute(conn)
                .map_err(write_error("comparison"))?;
            Ok(())
        })
        .await?;
        Ok(())
    }

    async fn get_run(&self, id: Uuid) -> TriptychResult<Option<ExecutionRun>> {
        let row = self
            .with_conn("run", move |conn| {
                execution_runs::table
                    .find(id)
                    .select(ExecutionRunRow::as_select())
                    .first(conn)
                    .optional()
                    .map_err(write_error("run"))
            })
            .await?;
        Ok(row.map(ExecutionRun::try_from).transpose()?)
    }

    async fn list_runs(&self, limit: usize, offset: usize) -> TriptychResult<Vec<ExecutionRun>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let offset = i64::try_from(offset).unwrap_or(i64::MAX);
        let rows = self
            .with_conn("run", move |conn| {
                execution_runs::table
                    .select(ExecutionRunRow::as_select())
                    .order((execution_runs::created_at.desc(), execution_runs::id.desc()))
                    .limit(limit)
                    .offset(offset)
                    .load(conn)
                    .map_err(write_error("run"))
            })
            .await?;
        rows.into_iter()
            .map(|row| ExecutionRun::try_from(row).map_err(Into::into))
            .collect()
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}
