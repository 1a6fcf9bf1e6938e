//! The bounded reason-act loop.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::future::join_all;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::DEFAULT_MAX_TURNS;
use crate::error::{OperationError, ProbeError};
use crate::mcp::OperationExecutor;
use crate::provider::{ReasoningProvider, ReasoningRequest};
use crate::resolver::{Resolution, StructuredResolver};
use crate::types::{Conversation, Message, OperationCall, ReasoningSettings, ToolOutcome, Usage};

use super::events::{RunEvent, RunEventPayload, RunEventStream, RunLifecycle};
use super::types::{DoneReason, LoopState, RunId, RunOutcome, RunResult};

/// Callback used for streaming run events.
pub type RunEventSink = Arc<dyn Fn(RunEvent) + Send + Sync>;

/// Assistant text appended when a run hits its turn limit.
pub fn truncation_notice(max_turns: usize) -> String {
    format!(
        "I stopped after {max_turns} reasoning steps without reaching a final answer. \
         Send another message to continue from here."
    )
}

/// Drives one conversation through reasoning and operation steps.
///
/// Each call to [`LoopRunner::run`] appends to the conversation: one
/// Assistant message per reasoning call, followed by exactly one ToolResult
/// per declared operation in declaration order. Operation failures become
/// error results; reasoning failures end the run.
#[derive(Clone)]
pub struct LoopRunner {
    provider: Arc<dyn ReasoningProvider>,
    executor: Arc<dyn OperationExecutor>,
    resolver: Arc<StructuredResolver>,
    settings: ReasoningSettings,
    max_turns: usize,
    event_sink: Option<RunEventSink>,
}

impl LoopRunner {
    pub fn new(
        provider: Arc<dyn ReasoningProvider>,
        executor: Arc<dyn OperationExecutor>,
        resolver: StructuredResolver,
    ) -> Self {
        Self {
            provider,
            executor,
            resolver: Arc::new(resolver),
            settings: ReasoningSettings::default(),
            max_turns: DEFAULT_MAX_TURNS,
            event_sink: None,
        }
    }

    pub fn with_settings(mut self, settings: ReasoningSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_max_turns(mut self, max_turns: usize) -> Self {
        self.max_turns = max_turns;
        self
    }

    pub fn with_event_sink(mut self, sink: RunEventSink) -> Self {
        self.event_sink = Some(sink);
        self
    }

    pub fn settings(&self) -> &ReasoningSettings {
        &self.settings
    }

    pub fn max_turns(&self) -> usize {
        self.max_turns
    }

    pub fn resolver(&self) -> &StructuredResolver {
        &self.resolver
    }

    /// Run the loop until the reasoning capability answers, the turn limit
    /// is reached, reasoning fails, or `cancel` fires.
    ///
    /// On cancellation the ToolResults of in-flight operations are still
    /// appended before `ProbeError::Canceled` is returned.
    pub async fn run(
        &self,
        conversation: &mut Conversation,
        cancel: &CancellationToken,
    ) -> Result<RunOutcome, ProbeError> {
        let run_id = Uuid::new_v4();
        let emitter = RunEventEmitter::new(run_id, self.event_sink.clone());
        emitter.lifecycle(RunLifecycle::Started);

        let tools = self.resolver.vocabulary().definitions();
        let mut state = LoopState::AwaitingReasoning;
        let mut turns = 0usize;
        let mut usage = Usage::default();

        loop {
            match state {
                LoopState::AwaitingReasoning => {
                    if turns >= self.max_turns {
                        info!(%run_id, max_turns = self.max_turns, "turn limit reached");
                        let notice = truncation_notice(self.max_turns);
                        emitter.emit(
                            RunEventStream::Assistant,
                            RunEventPayload::AssistantMessage {
                                text: notice.clone(),
                                operations: Vec::new(),
                            },
                        );
                        conversation.push(Message::assistant(notice));
                        state = LoopState::Done(DoneReason::Truncated);
                        continue;
                    }
                    if cancel.is_cancelled() {
                        return Err(canceled(&emitter));
                    }

                    turns += 1;
                    emitter.emit(RunEventStream::Lifecycle, RunEventPayload::TurnStarted { turn: turns });
                    debug!(%run_id, turn = turns, messages = conversation.len(), "reasoning");

                    let request = ReasoningRequest {
                        messages: conversation.messages().to_vec(),
                        settings: self.settings.clone(),
                        tools: tools.clone(),
                    };
                    let response = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return Err(canceled(&emitter)),
                        response = self.provider.invoke(&request) => response,
                    };
                    let response = match response {
                        Ok(response) => response,
                        Err(err) => {
                            warn!(%run_id, turn = turns, error = %err, "reasoning failed");
                            emitter.lifecycle(RunLifecycle::Failed {
                                error: err.to_string(),
                            });
                            return Err(err);
                        }
                    };

                    usage.merge(&response.usage);
                    let message = response.into_message();
                    emitter.emit(
                        RunEventStream::Assistant,
                        RunEventPayload::AssistantMessage {
                            text: message.text().to_string(),
                            operations: message.operations().to_vec(),
                        },
                    );
                    state = if message.operations().is_empty() {
                        LoopState::Done(DoneReason::Answered)
                    } else {
                        LoopState::AwaitingOperations
                    };
                    conversation.push(message);
                }
                LoopState::AwaitingOperations => {
                    let calls = conversation
                        .last()
                        .map(|message| message.operations().to_vec())
                        .unwrap_or_default();
                    let results = join_all(
                        calls
                            .iter()
                            .map(|call| self.execute_call(call, cancel, &emitter)),
                    )
                    .await;
                    conversation.extend(results);

                    if cancel.is_cancelled() {
                        return Err(canceled(&emitter));
                    }
                    state = LoopState::AwaitingReasoning;
                }
                LoopState::Done(reason) => {
                    emitter.lifecycle(RunLifecycle::Completed { reason });
                    debug!(%run_id, ?reason, turns, "run finished");
                    return Ok(RunOutcome {
                        run_id,
                        reason,
                        turns,
                        usage,
                    });
                }
            }
        }
    }

    /// Spawn the loop on a task that owns `conversation`.
    pub fn start(&self, conversation: Conversation) -> RunHandle {
        let runner = self.clone();
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let join = tokio::spawn(async move {
            let mut conversation = conversation;
            let result = runner.run(&mut conversation, &token).await;
            (conversation, result)
        });
        RunHandle { cancel, join }
    }

    async fn execute_call(
        &self,
        call: &OperationCall,
        cancel: &CancellationToken,
        emitter: &RunEventEmitter,
    ) -> Message {
        emitter.emit(
            RunEventStream::Operation,
            RunEventPayload::OperationStarted { call: call.clone() },
        );

        let outcome = match self.resolver.resolve(call) {
            Resolution::Resolved(operation) => {
                match self.executor.execute(&operation, cancel).await {
                    Ok(payload) => ToolOutcome::success(payload.render()),
                    Err(err) => ToolOutcome::from(&err),
                }
            }
            Resolution::Invalid(cause) => {
                ToolOutcome::from(&OperationError::new(call.name.clone(), cause))
            }
            Resolution::Unrecognized => {
                warn!(name = %call.name, "reasoning declared an unknown operation");
                ToolOutcome::failure(format!("unknown operation '{}'", call.name))
            }
        };

        emitter.emit(
            RunEventStream::Operation,
            RunEventPayload::OperationResult {
                call_id: call.id.clone(),
                name: call.name.clone(),
                outcome: outcome.clone(),
            },
        );
        Message::tool_result(call.id.clone(), call.name.clone(), outcome)
    }
}

fn canceled(emitter: &RunEventEmitter) -> ProbeError {
    emitter.lifecycle(RunLifecycle::Canceled);
    ProbeError::Canceled("run canceled".into())
}

/// Handle for a spawned run.
pub struct RunHandle {
    cancel: CancellationToken,
    join: JoinHandle<(Conversation, Result<RunOutcome, ProbeError>)>,
}

impl RunHandle {
    /// Request cancellation. In-flight sessions are still closed.
    pub fn abort(&self) {
        self.cancel.cancel();
    }

    /// Wait for the run and take back its conversation.
    pub async fn wait(self) -> Result<(Conversation, RunResult), ProbeError> {
        let (conversation, result) = self
            .join
            .await
            .map_err(|err| ProbeError::InvalidState(format!("run task failed: {err}")))?;
        let result = match result {
            Ok(outcome) => RunResult::completed(outcome),
            Err(ProbeError::Canceled(_)) => RunResult::canceled(),
            Err(err) => RunResult::failed(err.to_string()),
        };
        Ok((conversation, result))
    }
}

struct RunEventEmitter {
    run_id: RunId,
    seq: AtomicU64,
    sink: Option<RunEventSink>,
}

impl RunEventEmitter {
    fn new(run_id: RunId, sink: Option<RunEventSink>) -> Self {
        Self {
            run_id,
            seq: AtomicU64::new(1),
            sink,
        }
    }

    fn emit(&self, stream: RunEventStream, payload: RunEventPayload) {
        let Some(sink) = &self.sink else { return };
        let seq = self.seq.fetch_add(1, Ordering::SeqCst);
        (sink)(RunEvent {
            run_id: self.run_id,
            seq,
            timestamp: chrono::Utc::now(),
            stream,
            payload,
        });
    }

    fn lifecycle(&self, state: RunLifecycle) {
        self.emit(RunEventStream::Lifecycle, RunEventPayload::Lifecycle { state });
    }
}
