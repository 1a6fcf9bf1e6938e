//! Run identifiers, loop states and results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::Usage;

/// Unique identifier for a run.
pub type RunId = Uuid;

/// Run lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
    Canceled,
}

/// Why a run reached `Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DoneReason {
    /// The reasoning capability produced a reply with no requested operations.
    Answered,
    /// The turn limit was reached and a truncation notice was appended.
    Truncated,
}

/// State of the loop between steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    AwaitingReasoning,
    AwaitingOperations,
    Done(DoneReason),
}

/// Summary of a finished run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunOutcome {
    pub run_id: RunId,
    pub reason: DoneReason,
    /// Reasoning calls made during the run.
    pub turns: usize,
    pub usage: Usage,
}

/// Final result for a spawned run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    pub status: RunStatus,
    pub error: Option<String>,
    pub outcome: Option<RunOutcome>,
    pub finished_at: DateTime<Utc>,
}

impl RunResult {
    pub fn completed(outcome: RunOutcome) -> Self {
        Self {
            status: RunStatus::Completed,
            error: None,
            outcome: Some(outcome),
            finished_at: Utc::now(),
        }
    }

    pub fn canceled() -> Self {
        Self {
            status: RunStatus::Canceled,
            error: None,
            outcome: None,
            finished_at: Utc::now(),
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            status: RunStatus::Failed,
            error: Some(error.into()),
            outcome: None,
            finished_at: Utc::now(),
        }
    }
}
