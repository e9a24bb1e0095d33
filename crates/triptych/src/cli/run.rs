//! Plan execution command handler.

use std::path::Path;
use std::sync::Arc;
use tracing::{instrument, warn};
use triptych::{
    ExecutionLogger, ExecutionPlan, ExecutionService, InMemoryExecutionLogger, TriptychConfig,
    TriptychResult, render_result,
};

/// Switches for one `run` invocation.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Force mock function resolution
    pub mock_functions: bool,
    /// Print JSON instead of a summary
    pub json: bool,
    /// Log to Postgres
    pub database: bool,
}

#[cfg(feature = "database")]
fn logger(
    config: &TriptychConfig,
    options: RunOptions,
) -> TriptychResult<Arc<dyn ExecutionLogger>> {
    if options.database {
        return Ok(Arc::new(super::history::connect(config)?));
    }
    Ok(Arc::new(InMemoryExecutionLogger::new()))
}

#[cfg(not(feature = "database"))]
fn logger(
    _config: &TriptychConfig,
    options: RunOptions,
) -> TriptychResult<Arc<dyn ExecutionLogger>> {
    if options.database {
        return Err(triptych::ConfigError::new(
            "--database requires triptych to be built with the `database` feature",
        )
        .into());
    }
    Ok(Arc::new(InMemoryExecutionLogger::new()))
}

#[cfg(feature = "gemini")]
fn generator(
    config: &TriptychConfig,
    plan: &ExecutionPlan,
) -> TriptychResult<Arc<dyn triptych::GenerationCapability>> {
    let generator = triptych::GeminiGenerator::from_env(config.gemini.clone())?
        .with_functions(plan.functions.clone());
    Ok(Arc::new(generator))
}

#[cfg(not(feature = "gemini"))]
fn generator(
    _config: &TriptychConfig,
    _plan: &ExecutionPlan,
) -> TriptychResult<Arc<dyn triptych::GenerationCapability>> {
    Err(triptych::ConfigError::new(
        "no generation backend: build triptych with the `gemini` feature",
    )
    .into())
}

/// Execute a plan file and print the result.
#[instrument(skip(config), fields(plan = %path.display()))]
pub async fn run_plan(
    path: &Path,
    config: &TriptychConfig,
    options: RunOptions,
) -> TriptychResult<()> {
    let plan = ExecutionPlan::from_file(path)?;
    let credentials = plan.credentials_from_env();
    let gaps = plan.credential_gaps(&credentials, options.mock_functions);
    if !gaps.mocked.is_empty() {
        warn!(
            functions = ?gaps.mocked,
            "Credentials not set; these functions will use mock data"
        );
    }
    if !gaps.failing.is_empty() {
        warn!(
            functions = ?gaps.failing,
            "Credentials not set; calls to these functions will fail"
        );
    }

    let executor = plan.executor(
        generator(config, &plan)?,
        logger(config, options)?,
        config.engine.clone(),
    );
    let service = ExecutionService::new(executor);
    let result = service
        .execute_and_wait(plan.to_request(options.mock_functions, credentials))
        .await?;

    if options.json {
        let json = serde_json::to_string_pretty(&result)
            .map_err(|e| triptych::JsonError::new(e.to_string()))?;
        println!("{json}");
    } else {
        print!("{}", render_result(&result));
    }
    Ok(())
}
