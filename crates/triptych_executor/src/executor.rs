//! Fan-out of variations over one execution run.

use crate::{EngineConfig, LogWriter, ResultComparator, VariationInput, VariationRunner};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};
use triptych_core::{
    ApiConfiguration, ApiResponse, ComparisonConfig, ComparisonResult, ExecuteRequest,
    ExecutionResult, ExecutionRun, LogEntry, ResponseStatus, RunStatus, VariationResult,
};
use triptych_error::{ExecutionError, ExecutionErrorKind, TriptychResult};
use triptych_interface::{ExecutionLogger, FunctionResolver, GenerationCapability};

/// A run that has been validated, persisted and marked running, but whose
/// variations have not been issued yet.
#[derive(Debug)]
pub struct PreparedExecution {
    run: ExecutionRun,
    configurations: Vec<ApiConfiguration>,
    input: Arc<VariationInput>,
    comparison: Option<ComparisonConfig>,
    logs: Vec<LogEntry>,
    started: Instant,
}

impl PreparedExecution {
    /// The run record, status `running`.
    pub fn run(&self) -> &ExecutionRun {
        &self.run
    }

    /// Configurations bound to the run, in input order.
    pub fn configurations(&self) -> &[ApiConfiguration] {
        &self.configurations
    }
}

/// Runs every configuration of an execution request and aggregates the results.
///
/// Variation failures never abort siblings. The only errors surfaced to the
/// caller are configuration errors (nothing was started) and setup errors (the
/// run record or its configurations could not be persisted).
#[derive(Debug, Clone)]
pub struct MultiVariationExecutor {
    runner: VariationRunner,
    log: LogWriter,
    comparator: ResultComparator,
    config: EngineConfig,
}

impl MultiVariationExecutor {
    /// Executor over the given generator and logger.
    pub fn new(
        generator: Arc<dyn GenerationCapability>,
        logger: Arc<dyn ExecutionLogger>,
        config: EngineConfig,
    ) -> Self {
        let log = LogWriter::new(logger, &config);
        Self {
            runner: VariationRunner::new(generator, log.clone(), config.clone()),
            log,
            comparator: ResultComparator::default(),
            config,
        }
    }

    /// Resolve provider function calls with `resolver`.
    pub fn with_resolver(mut self, resolver: Arc<dyn FunctionResolver>) -> Self {
        self.runner = self.runner.with_resolver(resolver);
        self
    }

    /// Replace the comparator, e.g. to register custom metrics.
    pub fn with_comparator(mut self, comparator: ResultComparator) -> Self {
        self.comparator = comparator;
        self
    }

    /// The logger runs are written to.
    pub fn logger(&self) -> &Arc<dyn ExecutionLogger> {
        self.log.logger()
    }

    /// Engine settings.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Execute a request to completion.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for zero configurations or duplicate
    /// variation names, and a setup error if the run cannot be persisted.
    pub async fn execute(&self, request: ExecuteRequest) -> TriptychResult<ExecutionResult> {
        self.execute_with_cancel(request, CancellationToken::new()).await
    }

    /// Execute a request, observing `cancel`.
    ///
    /// # Errors
    ///
    /// See [`MultiVariationExecutor::execute`].
    pub async fn execute_with_cancel(
        &self,
        request: ExecuteRequest,
        cancel: CancellationToken,
    ) -> TriptychResult<ExecutionResult> {
        let prepared = self.prepare(request).await?;
        Ok(self.run_prepared(prepared, cancel).await)
    }

    /// Reject requests that must never start.
    #[track_caller]
    pub fn validate(request: &ExecuteRequest) -> Result<(), ExecutionError> {
        if request.configurations.is_empty() {
            return Err(ExecutionError::new(ExecutionErrorKind::NoConfigurations));
        }
        let mut names = HashSet::new();
        let mut ids = HashSet::new();
        for configuration in &request.configurations {
            if !names.insert(configuration.variation_name.as_str()) {
                return Err(ExecutionError::new(ExecutionErrorKind::DuplicateVariation(
                    configuration.variation_name.clone(),
                )));
            }
            if !ids.insert(configuration.id) {
                return Err(ExecutionError::new(ExecutionErrorKind::InvalidRequest(
                    format!("duplicate configuration id {}", configuration.id),
                )));
            }
        }
        Ok(())
    }

    /// Validate, persist the run and its configurations, and mark it running.
    ///
    /// # Errors
    ///
    /// Configuration errors are returned before anything is persisted. Setup
    /// errors are returned after marking the run failed when the run exists.
    #[instrument(
        skip(self, request),
        fields(run = %request.name, variations = request.configurations.len())
    )]
    pub async fn prepare(&self, request: ExecuteRequest) -> TriptychResult<PreparedExecution> {
        let started = Instant::now();
        Self::validate(&request)?;

        let ExecuteRequest {
            name,
            description,
            prompt,
            context,
            function_calling_enabled,
            configurations,
            comparison,
            use_mock,
            credentials,
        } = request;

        let mut run = ExecutionRun::new(name, description, function_calling_enabled);
        if let Err(e) = self.log.create_run(&run).await {
            error!(run_id = %run.id, error = %e, "Could not create execution run");
            return Err(ExecutionError::new(ExecutionErrorKind::RunSetup(format!(
                "failed to create execution run: {e}"
            )))
            .into());
        }

        let configurations: Vec<ApiConfiguration> =
            configurations.iter().map(|c| c.owned_by(run.id)).collect();
        for configuration in &configurations {
            if let Err(e) = self.log.log_configuration(configuration).await {
                let message = format!(
                    "failed to record configuration '{}': {e}",
                    configuration.variation_name
                );
                return Err(self.fail_setup(&mut run, message).await);
            }
        }

        run.transition(RunStatus::Running)?;
        if let Err(e) = self.log.update_run(&run).await {
            return Err(self.fail_setup(&mut run, format!("failed to mark run running: {e}")).await);
        }

        info!(run_id = %run.id, "Execution run started");
        let logs = vec![LogEntry::info(
            None,
            format!(
                "run '{}' started with {} variation(s)",
                run.name,
                configurations.len()
            ),
        )];

        Ok(PreparedExecution {
            input: Arc::new(VariationInput {
                run_id: run.id,
                prompt,
                context,
                function_calling_enabled,
                use_mock,
                credentials,
            }),
            run,
            configurations,
            comparison,
            logs,
            started,
        })
    }

    async fn fail_setup(
        &self,
        run: &mut ExecutionRun,
        message: String,
    ) -> triptych_error::TriptychError {
        error!(run_id = %run.id, error = %message, "Execution setup failed");
        if run.fail(message.clone()).is_ok() {
            if let Err(e) = self.log.update_run(run).await {
                warn!(run_id = %run.id, error = %e, "Could not record setup failure");
            }
        }
        ExecutionError::new(ExecutionErrorKind::RunSetup(message)).into()
    }

    /// Run every variation of a prepared execution and aggregate the results.
    #[instrument(skip(self, prepared, cancel), fields(run_id = %prepared.run.id))]
    pub async fn run_prepared(
        &self,
        prepared: PreparedExecution,
        cancel: CancellationToken,
    ) -> ExecutionResult {
        let PreparedExecution {
            mut run,
            configurations,
            input,
            comparison,
            mut logs,
            started,
        } = prepared;

        let semaphore = self
            .config
            .max_concurrency
            .map(|limit| Arc::new(Semaphore::new(limit.max(1))));

        let mut join_set = JoinSet::new();
        for (index, configuration) in configurations.iter().cloned().enumerate() {
            let runner = self.runner.clone();
            let input = Arc::clone(&input);
            let cancel = cancel.clone();
            let semaphore = semaphore.clone();
            join_set.spawn(async move {
                let _permit = match semaphore {
                    Some(semaphore) => semaphore.acquire_owned().await.ok(),
                    None => None,
                };
                let (result, journal) = runner
                    .run_with_journal(&configuration, &input, &cancel)
                    .await;
                (index, result, journal)
            });
        }

        let mut slots: Vec<Option<(VariationResult, Vec<LogEntry>)>> =
            configurations.iter().map(|_| None).collect();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((index, result, journal)) => slots[index] = Some((result, journal)),
                Err(e) => error!(error = %e, "Variation task failed"),
            }
        }

        let mut results = Vec::with_capacity(slots.len());
        for (slot, configuration) in slots.into_iter().zip(&configurations) {
            let (result, journal) = slot.unwrap_or_else(|| {
                let message = "variation task failed".to_string();
                let journal = vec![LogEntry::error(
                    Some(configuration.variation_name.as_str()),
                    message.clone(),
                )];
                (Self::lost_variation(configuration, &input, message), journal)
            });
            logs.extend(journal);
            results.push(result);
        }
        let total_time_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        if cancel.is_cancelled() {
            logs.push(LogEntry::warn(None, "execution cancelled"));
        }

        let comparison = match comparison.filter(ComparisonConfig::is_active) {
            Some(config) => self.compare(run.id, &results, &config, &mut logs).await,
            None => None,
        };

        if let Err(e) = run.transition(RunStatus::Completed) {
            error!(run_id = %run.id, error = %e, "Could not complete run");
        }
        if let Err(e) = self.log.update_run(&run).await {
            logs.push(LogEntry::warn(None, format!("run status not persisted: {e}")));
        }

        let result = ExecutionResult::assemble(run, results, comparison, total_time_ms, logs);
        info!(
            success_count = result.success_count,
            error_count = result.error_count,
            total_time_ms,
            "Execution run completed"
        );
        result
    }

    async fn compare(
        &self,
        run_id: uuid::Uuid,
        results: &[VariationResult],
        config: &ComparisonConfig,
        logs: &mut Vec<LogEntry>,
    ) -> Option<ComparisonResult> {
        match self.comparator.compare(run_id, results, config) {
            Ok(comparison) => {
                if let Err(e) = self.log.log_comparison(&comparison).await {
                    logs.push(LogEntry::warn(None, format!("comparison not persisted: {e}")));
                }
                logs.push(LogEntry::info(
                    None,
                    format!(
                        "best variation '{}' by {}",
                        comparison.best_configuration.variation_name, comparison.metric_name
                    ),
                ));
                Some(comparison)
            }
            Err(e) => {
                warn!(error = %e, "Comparison skipped");
                logs.push(LogEntry::error(None, format!("comparison failed: {}", e.kind)));
                None
            }
        }
    }

    /// Stand-in result for a variation whose task died before reporting.
    fn lost_variation(
        configuration: &ApiConfiguration,
        input: &VariationInput,
        message: String,
    ) -> VariationResult {
        let request = triptych_core::ApiRequest {
            id: uuid::Uuid::new_v4(),
            execution_run_id: input.run_id,
            configuration_id: configuration.id,
            request_type: triptych_core::RequestKind::Generate,
            prompt: input.prompt.clone(),
            context: input.context.clone(),
            function_name: None,
            function_arguments: None,
            request_body: serde_json::Value::Null,
            created_at: chrono::Utc::now(),
        };
        let response = ApiResponse::failure(request.id, ResponseStatus::Error, message, 0);
        VariationResult {
            configuration: configuration.clone(),
            request,
            response,
            function_calls: Vec::new(),
            execution_time_ms: 0,
        }
    }
}
