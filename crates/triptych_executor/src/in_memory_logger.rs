//! Execution logger that keeps history in process memory.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;
use tracing::debug;
use triptych_core::{
    ApiConfiguration, ApiRequest, ApiResponse, ComparisonResult, ExecutionRun, FunctionCallRecord,
};
use triptych_error::{LoggerError, LoggerErrorKind, TriptychResult};
use triptych_interface::ExecutionLogger;
use uuid::Uuid;

/// Records in arrival order plus the identities already stored.
#[derive(Debug)]
struct Journal<T> {
    records: Vec<T>,
    seen: HashSet<Uuid>,
}

impl<T> Default for Journal<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            seen: HashSet::new(),
        }
    }
}

impl<T: Clone> Journal<T> {
    /// Append `record` unless its identity is already stored.
    fn push_once(&mut self, id: Uuid, record: &T) -> bool {
        if !self.seen.insert(id) {
            return false;
        }
        self.records.push(record.clone());
        true
    }

    fn iter(&self) -> std::slice::Iter<'_, T> {
        self.records.iter()
    }
}

#[derive(Debug, Default)]
struct History {
    runs: HashMap<Uuid, ExecutionRun>,
    configurations: Journal<ApiConfiguration>,
    requests: Journal<ApiRequest>,
    responses: Journal<ApiResponse>,
    function_calls: Journal<FunctionCallRecord>,
    comparisons: Journal<ComparisonResult>,
}

/// In-memory [`ExecutionLogger`].
///
/// Writes are serialised behind a lock; records are kept in arrival order and
/// a repeated identity is ignored.
#[derive(Debug, Default)]
pub struct InMemoryExecutionLogger {
    history: RwLock<History>,
}

impl InMemoryExecutionLogger {
    /// Empty logger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configurations written for a run.
    pub async fn configurations(&self, run_id: Uuid) -> Vec<ApiConfiguration> {
        self.history
            .read()
            .await
            .configurations
            .iter()
            .filter(|c| c.execution_run_id == Some(run_id))
            .cloned()
            .collect()
    }

    /// Requests written for a run.
    pub async fn requests(&self, run_id: Uuid) -> Vec<ApiRequest> {
        self.history
            .read()
            .await
            .requests
            .iter()
            .filter(|r| r.execution_run_id == run_id)
            .cloned()
            .collect()
    }

    /// All responses, in arrival order.
    pub async fn responses(&self) -> Vec<ApiResponse> {
        self.history.read().await.responses.records.clone()
    }

    /// All function calls, in arrival order.
    pub async fn function_calls(&self) -> Vec<FunctionCallRecord> {
        self.history.read().await.function_calls.records.clone()
    }

    /// Comparisons written for a run.
    pub async fn comparisons(&self, run_id: Uuid) -> Vec<ComparisonResult> {
        self.history
            .read()
            .await
            .comparisons
            .iter()
            .filter(|c| c.execution_run_id == run_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl ExecutionLogger for InMemoryExecutionLogger {
    async fn create_run(&self, run: &ExecutionRun) -> TriptychResult<()> {
        let mut history = self.history.write().await;
        history.runs.entry(run.id).or_insert_with(|| run.clone());
        debug!(run_id = %run.id, "Run recorded");
        Ok(())
    }

    async fn update_run(&self, run: &ExecutionRun) -> TriptychResult<()> {
        let mut history = self.history.write().await;
        let Some(stored) = history.runs.get_mut(&run.id) else {
            return Err(LoggerError::new(LoggerErrorKind::NotFound {
                record: "run".into(),
                id: run.id.to_string(),
            })
            .into());
        };
        if stored.status == run.status {
            stored.error_message = run.error_message.clone();
            stored.updated_at = run.updated_at;
            return Ok(());
        }
        if !stored.status.can_transition_to(run.status) {
            return Err(LoggerError::write_failed(
                "run",
                format!("cannot move run from {} to {}", stored.status, run.status),
            )
            .into());
        }
        *stored = run.clone();
        Ok(())
    }

    async fn log_configuration(&self, configuration: &ApiConfiguration) -> TriptychResult<()> {
        let mut history = self.history.write().await;
        history.configurations.push_once(configuration.id, configuration);
        Ok(())
    }

    async fn log_request(&self, request: &ApiRequest) -> TriptychResult<()> {
        let mut history = self.history.write().await;
        history.requests.push_once(request.id, request);
        Ok(())
    }

    async fn log_response(&self, response: &ApiResponse) -> TriptychResult<()> {
        let mut history = self.history.write().await;
        history.responses.push_once(response.id, response);
        Ok(())
    }

    async fn log_function_call(&self, call: &FunctionCallRecord) -> TriptychResult<()> {
        let mut history = self.history.write().await;
        history.function_calls.push_once(call.id, call);
        Ok(())
    }

    async fn log_comparison(&self, comparison: &ComparisonResult) -> TriptychResult<()> {
        let mut history = self.history.write().await;
        history.comparisons.push_once(comparison.id, comparison);
        Ok(())
    }

    async fn get_run(&self, id: Uuid) -> TriptychResult<Option<ExecutionRun>> {
        Ok(self.history.read().await.runs.get(&id).cloned())
    }

    async fn list_runs(&self, limit: usize, offset: usize) -> TriptychResult<Vec<ExecutionRun>> {
        let history = self.history.read().await;
        let mut runs: Vec<ExecutionRun> = history.runs.values().cloned().collect();
        runs.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(runs.into_iter().skip(offset).take(limit).collect())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use triptych_core::RunStatus;

    #[tokio::test]
    async fn test_create_run_twice_is_idempotent() {
        let logger = InMemoryExecutionLogger::new();
        let run = ExecutionRun::new("r", None, false);
        logger.create_run(&run).await.unwrap();
        logger.create_run(&run).await.unwrap();
        assert_eq!(logger.list_runs(10, 0).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_refuses_to_leave_terminal_status() {
        let logger = InMemoryExecutionLogger::new();
        let mut run = ExecutionRun::new("r", None, false);
        logger.create_run(&run).await.unwrap();
        run.transition(RunStatus::Running).unwrap();
        logger.update_run(&run).await.unwrap();
        run.transition(RunStatus::Completed).unwrap();
        logger.update_run(&run).await.unwrap();

        let mut stale = run.clone();
        stale.status = RunStatus::Running;
        assert!(logger.update_run(&stale).await.is_err());
        let stored = logger.get_run(run.id).await.unwrap().unwrap();
        assert_eq!(stored.status, RunStatus::Completed);
    }

    #[tokio::test]
    async fn test_update_refuses_to_skip_running() {
        let logger = InMemoryExecutionLogger::new();
        let mut run = ExecutionRun::new("r", None, false);
        logger.create_run(&run).await.unwrap();

        run.status = RunStatus::Completed;
        assert!(logger.update_run(&run).await.is_err());
        let stored = logger.get_run(run.id).await.unwrap().unwrap();
        assert_eq!(stored.status, RunStatus::Pending);
    }

    #[test]
    fn test_journal_ignores_repeated_identity() {
        let mut journal = Journal::default();
        let id = Uuid::new_v4();
        assert!(journal.push_once(id, &"first"));
        assert!(!journal.push_once(id, &"second"));
        assert!(journal.push_once(Uuid::new_v4(), &"third"));
        assert_eq!(journal.iter().copied().collect::<Vec<_>>(), vec!["first", "third"]);
    }

    #[tokio::test]
    async fn test_update_unknown_run_is_not_found() {
        let logger = InMemoryExecutionLogger::new();
        let run = ExecutionRun::new("r", None, false);
        let err = logger.update_run(&run).await.unwrap_err();
        let logger_err = err.as_logger().unwrap();
        assert!(matches!(logger_err.kind, LoggerErrorKind::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_list_runs_newest_first_with_paging() {
        let logger = InMemoryExecutionLogger::new();
        let mut ids = Vec::new();
        for i in 0..3 {
            let mut run = ExecutionRun::new(format!("r{i}"), None, false);
            run.created_at += chrono::Duration::seconds(i);
            ids.push(run.id);
            logger.create_run(&run).await.unwrap();
        }
        let page = logger.list_runs(2, 0).await.unwrap();
        assert_eq!(page.iter().map(|r| r.id).collect::<Vec<_>>(), vec![ids[2], ids[1]]);
        let rest = logger.list_runs(2, 2).await.unwrap();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].id, ids[0]);
    }
}
