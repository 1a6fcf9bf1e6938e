//! Orchestrator: helps the user pick a challenge.

use std::sync::Arc;

use regex::Regex;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::challenge::prompt::orchestrator_system_prompt;
use crate::challenge::ChallengeProfile;
use crate::error::ProbeError;
use crate::provider::{ReasoningProvider, ReasoningRequest};
use crate::types::{Conversation, Message, ReasoningSettings};

/// Sampling temperature used for routing answers.
pub const ORCHESTRATOR_TEMPERATURE: f64 = 0.7;

pub struct Orchestrator {
    profiles: Vec<ChallengeProfile>,
    provider: Arc<dyn ReasoningProvider>,
    settings: ReasoningSettings,
    mention: Regex,
    selected_challenge: Option<u32>,
    conversation: Conversation,
}

impl Orchestrator {
    pub fn new(
        profiles: Vec<ChallengeProfile>,
        provider: Arc<dyn ReasoningProvider>,
    ) -> Result<Self, ProbeError> {
        let mention = Regex::new(r"(?i)\bchallenge\s*(\d{1,2})\b")
            .map_err(|e| ProbeError::Configuration(format!("invalid challenge pattern: {e}")))?;
        let settings = ReasoningSettings {
            temperature: Some(ORCHESTRATOR_TEMPERATURE),
            ..ReasoningSettings::default()
        };
        Ok(Self {
            profiles,
            provider,
            settings,
            mention,
            selected_challenge: None,
            conversation: Conversation::new(),
        })
    }

    /// Override the model; the routing temperature is kept.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.settings.model = model.into();
        self
    }

    /// Challenge id most recently mentioned by the user.
    pub fn selected_challenge(&self) -> Option<u32> {
        self.selected_challenge
    }

    pub fn selected_profile(&self) -> Option<&ChallengeProfile> {
        let id = self.selected_challenge?;
        self.profiles.iter().find(|profile| profile.id == id)
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Answer one user message and update the selection.
    pub async fn send(
        &mut self,
        text: impl Into<String>,
        cancel: &CancellationToken,
    ) -> Result<String, ProbeError> {
        let text = text.into();
        self.conversation
            .ensure_system(orchestrator_system_prompt(&self.profiles));
        self.conversation.push(Message::human(text.clone()));

        let request = ReasoningRequest {
            messages: self.conversation.messages().to_vec(),
            settings: self.settings.clone(),
            tools: Vec::new(),
        };
        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ProbeError::Canceled("orchestrator canceled".into())),
            response = self.provider.invoke(&request) => response?,
        };

        if let Some(id) = self.detect_challenge(&text) {
            debug!(challenge = id, "challenge selected");
            self.selected_challenge = Some(id);
        }

        let reply = response.text.clone();
        self.conversation.push(response.into_message());
        Ok(reply)
    }

    /// First mention of a known challenge id, e.g. "challenge 3" or "Challenge10".
    pub fn detect_challenge(&self, text: &str) -> Option<u32> {
        self.mention
            .captures_iter(text)
            .filter_map(|caps| caps.get(1)?.as_str().parse::<u32>().ok())
            .find(|id| self.profiles.iter().any(|profile| profile.id == *id))
    }
}
