//! Hint agent: runs MCP operations named in plain text, otherwise teaches.

use std::fmt::Write as _;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::challenge::prompt::hint_system_prompt;
use crate::challenge::ChallengeProfile;
use crate::error::ProbeError;
use crate::mcp::OperationExecutor;
use crate::provider::{ReasoningProvider, ReasoningRequest};
use crate::resolver::HeuristicResolver;
use crate::types::{Conversation, Message, Operation, ReasoningSettings};

/// Reply to one user message.
#[derive(Debug, Clone, PartialEq)]
pub struct HintReply {
    pub text: String,
    /// The operation the heuristic picked, if any.
    pub executed: Option<Operation>,
}

pub struct HintAgent {
    profile: ChallengeProfile,
    resolver: HeuristicResolver,
    provider: Arc<dyn ReasoningProvider>,
    executor: Arc<dyn OperationExecutor>,
    settings: ReasoningSettings,
    conversation: Conversation,
}

impl HintAgent {
    pub fn new(
        profile: ChallengeProfile,
        provider: Arc<dyn ReasoningProvider>,
        executor: Arc<dyn OperationExecutor>,
    ) -> Result<Self, ProbeError> {
        let resolver = HeuristicResolver::new(&profile.tools)?;
        Ok(Self {
            profile,
            resolver,
            provider,
            executor,
            settings: ReasoningSettings::default(),
            conversation: Conversation::new(),
        })
    }

    pub fn with_settings(mut self, settings: ReasoningSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn profile(&self) -> &ChallengeProfile {
        &self.profile
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Handle one user message.
    ///
    /// Operation failures are reported in the reply text; only a reasoning
    /// failure is returned as an error.
    pub async fn send(
        &mut self,
        text: impl Into<String>,
        cancel: &CancellationToken,
    ) -> Result<HintReply, ProbeError> {
        let text = text.into();
        self.conversation
            .ensure_system(hint_system_prompt(&self.profile));
        self.conversation.push(Message::human(text.clone()));

        if let Some(matched) = self.resolver.resolve(&text) {
            debug!(rule = matched.rule, operation = %matched.operation.label(), "heuristic match");
            let body = match self.executor.execute(&matched.operation, cancel).await {
                Ok(payload) => format!("```json\n{}\n```", payload.render()),
                Err(err) => err.to_tool_text(),
            };
            let reply = format!("{}\n{body}", result_header(&matched.operation));
            self.conversation.push(Message::assistant(reply.clone()));
            return Ok(HintReply {
                text: reply,
                executed: Some(matched.operation),
            });
        }

        let request = ReasoningRequest {
            messages: self.conversation.messages().to_vec(),
            settings: self.settings.clone(),
            tools: Vec::new(),
        };
        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ProbeError::Canceled("hint canceled".into())),
            response = self.provider.invoke(&request) => response?,
        };
        let reply = response.text.clone();
        self.conversation.push(response.into_message());
        Ok(HintReply {
            text: reply,
            executed: None,
        })
    }
}

/// Heading line shown above an executed operation's result.
pub fn result_header(operation: &Operation) -> String {
    match operation {
        Operation::ListTools => "📋 Available MCP Tools:".to_string(),
        Operation::ListResources => "📋 Available MCP Resources:".to_string(),
        Operation::ListPrompts => "📋 Available MCP Prompts:".to_string(),
        Operation::CallTool { name, arguments } => {
            let mut call = format!("{name}(");
            for (i, (key, value)) in arguments.iter().enumerate() {
                if i > 0 {
                    call.push_str(", ");
                }
                match value.as_str() {
                    Some(s) => {
                        let _ = write!(call, "{key}='{s}'");
                    }
                    None => {
                        let _ = write!(call, "{key}={value}");
                    }
                }
            }
            call.push(')');
            format!("🔧 Executed tool `{call}`:")
        }
        Operation::ReadResource { uri } => format!("📄 Read resource `{uri}`:"),
        Operation::GetPrompt { name, .. } => format!("💬 Fetched prompt `{name}`:"),
    }
}
