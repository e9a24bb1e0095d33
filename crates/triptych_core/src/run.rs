//! Execution run records and their lifecycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use triptych_error::{ExecutionError, ExecutionErrorKind};
use uuid::Uuid;

/// Lifecycle state of an execution run.
///
/// Runs move `pending → running → {completed, failed}`; a run that could not
/// be set up may also move straight from `pending` to `failed`. The two
/// terminal states never change again.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RunStatus {
    /// Created, no variation issued yet
    Pending,
    /// Variations are in flight
    Running,
    /// All variations finished (whatever their individual outcome)
    Completed,
    /// The run could not be set up
    Failed,
}

impl RunStatus {
    /// Whether this status is terminal.
    pub fn is_terminal(self) -> bool {
        matches!(self, RunStatus::Completed | RunStatus::Failed)
    }

    /// Whether a run in this status may move to `next`.
    pub fn can_transition_to(self, next: RunStatus) -> bool {
        matches!(
            (self, next),
            (RunStatus::Pending, RunStatus::Running)
                | (RunStatus::Pending, RunStatus::Failed)
                | (RunStatus::Running, RunStatus::Completed)
                | (RunStatus::Running, RunStatus::Failed)
        )
    }
}

/// One logical batch of variations sharing a base prompt and context.
///
/// # Examples
///
/// ```
/// use triptych_core::{ExecutionRun, RunStatus};
///
/// let mut run = ExecutionRun::new("greeting", None, false);
/// assert_eq!(run.status, RunStatus::Pending);
/// run.transition(RunStatus::Running).unwrap();
/// run.transition(RunStatus::Completed).unwrap();
/// assert!(run.transition(RunStatus::Running).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionRun {
    /// Unique run identity
    pub id: Uuid,
    /// Human-readable run name
    pub name: String,
    /// Optional description
    pub description: Option<String>,
    /// Whether provider function-call requests are resolved in this run
    pub function_calling_enabled: bool,
    /// Current lifecycle state
    pub status: RunStatus,
    /// Setup failure message, if the run failed
    pub error_message: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last status change timestamp
    pub updated_at: DateTime<Utc>,
}

impl ExecutionRun {
    /// Create a new pending run with a fresh identity.
    pub fn new(
        name: impl Into<String>,
        description: Option<String>,
        function_calling_enabled: bool,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description,
            function_calling_enabled,
            status: RunStatus::Pending,
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Move the run to `next`, refusing transitions the lifecycle forbids.
    ///
    /// # Errors
    ///
    /// Returns `ExecutionErrorKind::InvalidTransition` when the run is terminal
    /// or `next` is not reachable from the current status.
    #[track_caller]
    pub fn transition(&mut self, next: RunStatus) -> Result<(), ExecutionError> {
        if !self.status.can_transition_to(next) {
            return Err(ExecutionError::new(ExecutionErrorKind::InvalidTransition {
                from: self.status.to_string(),
                to: next.to_string(),
            }));
        }
        self.status = next;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Mark the run failed with the given message.
    ///
    /// # Errors
    ///
    /// Returns an error if the run is already terminal.
    #[track_caller]
    pub fn fail(&mut self, message: impl Into<String>) -> Result<(), ExecutionError> {
        self.transition(RunStatus::Failed)?;
        self.error_message = Some(message.into());
        Ok(())
    }

    /// Whether the run has reached a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
