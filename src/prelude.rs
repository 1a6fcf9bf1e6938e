//! Convenience re-exports for common use.

pub use crate::agent::{ChallengeAgent, HintAgent, Orchestrator};
pub use crate::agent_loop::{DoneReason, LoopRunner, RunEvent, RunEventSink, RunOutcome};
pub use crate::challenge::{BuiltinCatalog, ChallengeProfile, ProfileSource};
pub use crate::config::ProbeConfig;
pub use crate::error::{OperationError, ProbeError, Result};
pub use crate::mcp::{Endpoint, NormalizedPayload, OperationExecutor, SessionExecutor};
pub use crate::provider::{create_provider, ReasoningProvider};
pub use crate::resolver::{HeuristicResolver, StructuredResolver};
pub use crate::tools::Vocabulary;
pub use crate::types::{Conversation, Message, Operation, OperationCall, ReasoningSettings, ToolOutcome};
