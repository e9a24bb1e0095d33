//! Live Postgres tests. Run with `--features database-tests` and a
//! `DATABASE_URL` pointing at a disposable database.

#![cfg(feature = "database-tests")]

use chrono::Utc;
use serde_json::json;
use triptych_core::{
    ApiConfiguration, ApiRequest, ApiResponse, ExecutionRun, RequestKind, ResponseStatus, RunStatus,
};
use triptych_database::{PgExecutionLogger, database_url_from_env};
use triptych_interface::ExecutionLogger;
use uuid::Uuid;

fn logger() -> PgExecutionLogger {
    let _ = dotenvy::dotenv();
    let url = database_url_from_env().expect("DATABASE_URL");
    PgExecutionLogger::connect(&url).expect("connect and migrate")
}

#[tokio::test]
async fn test_run_lifecycle_and_terminal_guard() {
    let logger = logger();
    let mut run = ExecutionRun::new("pg lifecycle", None, false);
    logger.create_run(&run).await.unwrap();
    logger.create_run(&run).await.unwrap();

    run.transition(RunStatus::Running).unwrap();
    logger.update_run(&run).await.unwrap();
    run.transition(RunStatus::Completed).unwrap();
    logger.update_run(&run).await.unwrap();

    let stored = logger.get_run(run.id).await.unwrap().unwrap();
    assert_eq!(stored.status, RunStatus::Completed);

    let mut rewind = stored.clone();
    rewind.status = RunStatus::Running;
    assert!(logger.update_run(&rewind).await.is_err());
}

#[tokio::test]
async fn test_update_of_unknown_run_is_not_found() {
    let logger = logger();
    let run = ExecutionRun::new("never created", None, false);
    let err = logger.update_run(&run).await.unwrap_err();
    assert!(matches!(
        err.as_logger().map(|e| &e.kind),
        Some(triptych_error::LoggerErrorKind::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_repeated_writes_leave_one_row() {
    let logger = logger();
    let run = ExecutionRun::new("pg idempotent", None, false);
    logger.create_run(&run).await.unwrap();

    let configuration = ApiConfiguration::builder()
        .variation_name("only")
        .model_name("gemini-test")
        .build()
        .unwrap()
        .owned_by(run.id);
    logger.log_configuration(&configuration).await.unwrap();
    logger.log_configuration(&configuration).await.unwrap();

    let request = ApiRequest {
        id: Uuid::new_v4(),
        execution_run_id: run.id,
        configuration_id: configuration.id,
        request_type: RequestKind::Generate,
        prompt: "hi".into(),
        context: None,
        function_name: None,
        function_arguments: None,
        request_body: json!({"prompt": "hi"}),
        created_at: Utc::now(),
    };
    logger.log_request(&request).await.unwrap();
    logger.log_request(&request).await.unwrap();

    let response = ApiResponse::failure(request.id, ResponseStatus::Timeout, "slow", 10);
    logger.log_response(&response).await.unwrap();
    logger.log_response(&response).await.unwrap();

    let runs = logger.list_runs(100, 0).await.unwrap();
    assert_eq!(runs.iter().filter(|r| r.id == run.id).count(), 1);
}
