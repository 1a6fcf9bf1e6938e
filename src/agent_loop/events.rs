//! Run event stream types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{OperationCall, ToolOutcome};

use super::types::{DoneReason, RunId};

/// Stream category for events.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunEventStream {
    Lifecycle,
    Assistant,
    Operation,
}

/// Run lifecycle event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum RunLifecycle {
    Started,
    Completed { reason: DoneReason },
    Failed { error: String },
    Canceled,
}

/// Concrete event payloads emitted by the loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RunEventPayload {
    Lifecycle {
        state: RunLifecycle,
    },
    TurnStarted {
        turn: usize,
    },
    AssistantMessage {
        text: String,
        operations: Vec<OperationCall>,
    },
    OperationStarted {
        call: OperationCall,
    },
    OperationResult {
        call_id: String,
        name: String,
        outcome: ToolOutcome,
    },
}

/// Envelope for run events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunEvent {
    pub run_id: RunId,
    pub seq: u64,
    pub timestamp: DateTime<Utc>,
    pub stream: RunEventStream,
    pub payload: RunEventPayload,
}
