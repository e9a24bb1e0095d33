//! Background execution with status polling and cancellation.

use crate::MultiVariationExecutor;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, instrument};
use triptych_core::{
    ExecuteRequest, ExecuteResponse, ExecutionResult, ExecutionRun, ExecutionStatusReport,
};
use triptych_error::{ExecutionError, ExecutionErrorKind, TriptychResult};
use uuid::Uuid;

#[derive(Debug)]
struct TrackedExecution {
    run: ExecutionRun,
    cancel: CancellationToken,
    result: Option<ExecutionResult>,
}

/// Executions started by one service. In-flight executions are always kept;
/// finished ones are kept newest first up to `capacity`.
#[derive(Debug)]
struct Registry {
    executions: HashMap<Uuid, TrackedExecution>,
    finished: VecDeque<Uuid>,
    capacity: usize,
}

impl Registry {
    fn new(capacity: usize) -> Self {
        Self {
            executions: HashMap::new(),
            finished: VecDeque::new(),
            capacity,
        }
    }

    fn track(&mut self, run: ExecutionRun, cancel: CancellationToken) {
        let tracked = TrackedExecution {
            run,
            cancel,
            result: None,
        };
        self.executions.insert(tracked.run.id, tracked);
    }

    fn finish(&mut self, result: ExecutionResult) {
        let id = result.execution_run.id;
        let Some(tracked) = self.executions.get_mut(&id) else {
            return;
        };
        tracked.run = result.execution_run.clone();
        tracked.result = Some(result);
        self.finished.push_back(id);

        while self.finished.len() > self.capacity {
            let Some(evicted) = self.finished.pop_front() else {
                break;
            };
            self.executions.remove(&evicted);
            debug!(execution_id = %evicted, "Evicted finished execution");
        }
    }
}

type SharedRegistry = Arc<RwLock<Registry>>;

/// Entry point for callers: start executions, poll them, list and cancel them.
///
/// Executions started here are tracked in memory for status and result
/// lookups, up to `EngineConfig::retained_executions` finished ones. Older
/// runs, and runs from earlier processes, are still visible through the
/// executor's logger, without results.
#[derive(Debug, Clone)]
pub struct ExecutionService {
    executor: Arc<MultiVariationExecutor>,
    executions: SharedRegistry,
    tasks: TaskTracker,
}

impl ExecutionService {
    /// Service over an executor.
    pub fn new(executor: MultiVariationExecutor) -> Self {
        let capacity = executor.config().retained_executions;
        Self {
            executor: Arc::new(executor),
            executions: Arc::new(RwLock::new(Registry::new(capacity))),
            tasks: TaskTracker::new(),
        }
    }

    /// The underlying executor.
    pub fn executor(&self) -> &MultiVariationExecutor {
        &self.executor
    }

    /// Validate and persist the run, then run its variations in the background.
    ///
    /// # Errors
    ///
    /// Returns configuration and setup errors synchronously; nothing runs in
    /// that case.
    #[instrument(skip(self, request), fields(run = %request.name))]
    pub async fn execute(&self, request: ExecuteRequest) -> TriptychResult<ExecuteResponse> {
        let prepared = self.executor.prepare(request).await?;
        let run = prepared.run().clone();
        let cancel = CancellationToken::new();
        self.executions
            .write()
            .await
            .track(run.clone(), cancel.clone());

        let executor = Arc::clone(&self.executor);
        let executions = Arc::clone(&self.executions);
        self.tasks.spawn(async move {
            let result = executor.run_prepared(prepared, cancel).await;
            executions.write().await.finish(result);
        });

        info!(execution_id = %run.id, "Execution accepted");
        Ok(ExecuteResponse {
            execution_id: run.id,
            run,
        })
    }

    /// Execute in the foreground and return the full result.
    ///
    /// # Errors
    ///
    /// Returns configuration and setup errors.
    pub async fn execute_and_wait(
        &self,
        request: ExecuteRequest,
    ) -> TriptychResult<ExecutionResult> {
        let prepared = self.executor.prepare(request).await?;
        let cancel = CancellationToken::new();
        self.executions
            .write()
            .await
            .track(prepared.run().clone(), cancel.clone());
        let result = self.executor.run_prepared(prepared, cancel).await;
        self.executions.write().await.finish(result.clone());
        Ok(result)
    }

    /// Status of an execution; the result is present only once it is terminal
    /// and still retained.
    ///
    /// # Errors
    ///
    /// Returns `UnknownExecution` if neither this service nor the logger knows
    /// the id, or a logger error if the lookup fails.
    pub async fn get_execution_status(
        &self,
        execution_id: Uuid,
    ) -> TriptychResult<ExecutionStatusReport> {
        if let Some(tracked) = self.executions.read().await.executions.get(&execution_id) {
            let result = tracked
                .result
                .clone()
                .filter(|_| tracked.run.is_terminal());
            return Ok(ExecutionStatusReport {
                execution_id,
                status: tracked.run.status,
                error: tracked.run.error_message.clone(),
                result,
            });
        }

        match self.executor.logger().get_run(execution_id).await? {
            Some(run) => Ok(ExecutionStatusReport {
                execution_id,
                status: run.status,
                error: run.error_message,
                result: None,
            }),
            None => Err(unknown(execution_id)),
        }
    }

    /// Runs known to the logger, newest first.
    ///
    /// # Errors
    ///
    /// Returns a logger error if the listing fails.
    pub async fn list_execution_runs(
        &self,
        limit: usize,
        offset: usize,
    ) -> TriptychResult<Vec<ExecutionRun>> {
        self.executor.logger().list_runs(limit, offset).await
    }

    /// Cancel a running execution. Returns `false` if it had already finished,
    /// including finished executions no longer retained in memory.
    ///
    /// # Errors
    ///
    /// Returns `UnknownExecution` if neither this service nor the logger knows
    /// the id.
    pub async fn cancel(&self, execution_id: Uuid) -> TriptychResult<bool> {
        {
            let registry = self.executions.read().await;
            if let Some(tracked) = registry.executions.get(&execution_id) {
                if tracked.result.is_some() {
                    return Ok(false);
                }
                info!(%execution_id, "Cancelling execution");
                tracked.cancel.cancel();
                return Ok(true);
            }
        }

        match self.executor.logger().get_run(execution_id).await? {
            Some(_) => Ok(false),
            None => Err(unknown(execution_id)),
        }
    }

    /// Wait for every background execution to finish.
    pub async fn shutdown(&self) {
        self.tasks.close();
        self.tasks.wait().await;
    }
}

fn unknown(execution_id: Uuid) -> triptych_error::TriptychError {
    ExecutionError::new(ExecutionErrorKind::UnknownExecution(execution_id.to_string())).into()
}
