//! Tool-calling agent bound to one challenge endpoint.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::agent_loop::{LoopRunner, RunEventSink, RunOutcome};
use crate::challenge::prompt::challenge_system_prompt;
use crate::challenge::ChallengeProfile;
use crate::error::ProbeError;
use crate::mcp::OperationExecutor;
use crate::provider::ReasoningProvider;
use crate::resolver::StructuredResolver;
use crate::tools::Vocabulary;
use crate::types::{Conversation, Message, ReasoningSettings};

/// Structured-strategy agent that keeps its conversation across `send` calls.
pub struct ChallengeAgent {
    profile: ChallengeProfile,
    runner: LoopRunner,
    conversation: Conversation,
}

impl ChallengeAgent {
    pub fn new(
        profile: ChallengeProfile,
        provider: Arc<dyn ReasoningProvider>,
        executor: Arc<dyn OperationExecutor>,
    ) -> Self {
        let resolver = StructuredResolver::new(Vocabulary::for_profile(&profile));
        Self {
            profile,
            runner: LoopRunner::new(provider, executor, resolver),
            conversation: Conversation::new(),
        }
    }

    pub fn with_settings(mut self, settings: ReasoningSettings) -> Self {
        self.runner = self.runner.with_settings(settings);
        self
    }

    pub fn with_max_turns(mut self, max_turns: usize) -> Self {
        self.runner = self.runner.with_max_turns(max_turns);
        self
    }

    pub fn with_event_sink(mut self, sink: RunEventSink) -> Self {
        self.runner = self.runner.with_event_sink(sink);
        self
    }

    pub fn profile(&self) -> &ChallengeProfile {
        &self.profile
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Append the user's text and run the loop to completion.
    ///
    /// Returns the final Assistant text; the full transcript stays in
    /// [`ChallengeAgent::conversation`].
    pub async fn send(
        &mut self,
        text: impl Into<String>,
        cancel: &CancellationToken,
    ) -> Result<String, ProbeError> {
        self.send_with_outcome(text, cancel)
            .await
            .map(|(answer, _)| answer)
    }

    pub async fn send_with_outcome(
        &mut self,
        text: impl Into<String>,
        cancel: &CancellationToken,
    ) -> Result<(String, RunOutcome), ProbeError> {
        if !self.conversation.has_system() {
            let signatures = self.runner.resolver().vocabulary().signatures();
            self.conversation
                .ensure_system(challenge_system_prompt(&self.profile, &signatures));
        }
        self.conversation.push(Message::human(text));

        let outcome = self.runner.run(&mut self.conversation, cancel).await?;
        let answer = self.conversation.final_answer().unwrap_or_default().to_string();
        Ok((answer, outcome))
    }

    pub fn reset(&mut self) {
        self.conversation = Conversation::new();
    }
}
