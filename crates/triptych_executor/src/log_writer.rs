//! Bounded-retry writes to the execution logger.

use crate::EngineConfig;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_retry2::{Retry, RetryError, strategy::ExponentialBackoff, strategy::jitter};
use tracing::{error, warn};
use triptych_core::{
    ApiConfiguration, ApiRequest, ApiResponse, ComparisonResult, ExecutionRun, FunctionCallRecord,
};
use triptych_error::{RetryableError, TriptychError, TriptychErrorKind, TriptychResult};
use triptych_interface::ExecutionLogger;

const MAX_LOG_RETRY_DELAY: Duration = Duration::from_secs(2);

/// Writes records to an [`ExecutionLogger`], retrying transient failures a
/// bounded number of times.
///
/// Records carry their identity from construction, so a retried write of a
/// record the sink already accepted is a no-op.
#[derive(Clone)]
pub struct LogWriter {
    logger: Arc<dyn ExecutionLogger>,
    retries: usize,
    backoff_ms: u64,
}

impl std::fmt::Debug for LogWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogWriter")
            .field("backend", &self.logger.backend_name())
            .field("retries", &self.retries)
            .field("backoff_ms", &self.backoff_ms)
            .finish()
    }
}

impl LogWriter {
    /// Wrap a logger with the engine's retry settings.
    pub fn new(logger: Arc<dyn ExecutionLogger>, config: &EngineConfig) -> Self {
        Self {
            logger,
            retries: config.log_retry_attempts,
            backoff_ms: config.log_retry_backoff_ms.max(1),
        }
    }

    /// The wrapped logger.
    pub fn logger(&self) -> &Arc<dyn ExecutionLogger> {
        &self.logger
    }

    fn is_transient(err: &TriptychError) -> bool {
        match err.kind() {
            TriptychErrorKind::Logger(e) => e.is_retryable(),
            TriptychErrorKind::Execution(_) => false,
            _ => true,
        }
    }

    async fn retry<F, Fut>(&self, record: &'static str, mut write: F) -> TriptychResult<()>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = TriptychResult<()>>,
    {
        let strategy = ExponentialBackoff::from_millis(self.backoff_ms)
            .factor(2)
            .max_delay(MAX_LOG_RETRY_DELAY)
            .map(jitter)
            .take(self.retries);

        Retry::spawn(strategy, || {
            let attempt = write();
            async move {
                attempt.await.map_err(|e| {
                    if Self::is_transient(&e) {
                        warn!(record, error = %e, "Log write failed, will retry");
                        RetryError::Transient {
                            err: e,
                            retry_after: None,
                        }
                    } else {
                        RetryError::Permanent(e)
                    }
                })
            }
        })
        .await
        .inspect_err(|e| error!(record, error = %e, "Giving up on log write"))
    }

    /// Persist a new run.
    pub async fn create_run(&self, run: &ExecutionRun) -> TriptychResult<()> {
        let logger = &self.logger;
        self.retry("run", move || logger.create_run(run)).await
    }

    /// Persist the run's current state.
    pub async fn update_run(&self, run: &ExecutionRun) -> TriptychResult<()> {
        let logger = &self.logger;
        self.retry("run", move || logger.update_run(run)).await
    }

    /// Persist a configuration.
    pub async fn log_configuration(&self, configuration: &ApiConfiguration) -> TriptychResult<()> {
        let logger = &self.logger;
        self.retry("configuration", move || logger.log_configuration(configuration))
            .await
    }

    /// Persist a request.
    pub async fn log_request(&self, request: &ApiRequest) -> TriptychResult<()> {
        let logger = &self.logger;
        self.retry("request", move || logger.log_request(request)).await
    }

    /// Persist a response.
    pub async fn log_response(&self, response: &ApiResponse) -> TriptychResult<()> {
        let logger = &self.logger;
        self.retry("response", move || logger.log_response(response)).await
    }

    /// Persist a function call.
    pub async fn log_function_call(&self, call: &FunctionCallRecord) -> TriptychResult<()> {
        let logger = &self.logger;
        self.retry("function_call", move || logger.log_function_call(call))
            .await
    }

    /// Persist a comparison.
    pub async fn log_comparison(&self, comparison: &ComparisonResult) -> TriptychResult<()> {
        let logger = &self.logger;
        self.retry("comparison", move || logger.log_comparison(comparison))
            .await
    }
}
