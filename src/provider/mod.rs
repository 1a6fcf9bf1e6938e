//! Reasoning capability: the model that decides the next step of a conversation.

pub mod http;

#[cfg(feature = "google")]
pub mod google;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::ProbeConfig;
use crate::error::ProbeError;
use crate::tools::ToolDefinition;
use crate::types::{FinishReason, Message, OperationCall, ReasoningSettings, Usage};

/// One reasoning call: the whole conversation plus the declared vocabulary.
#[derive(Debug, Clone)]
pub struct ReasoningRequest {
    pub messages: Vec<Message>,
    pub settings: ReasoningSettings,
    /// Empty when the caller wants a plain text answer.
    pub tools: Vec<ToolDefinition>,
}

/// The next Assistant message: text and zero or more declared operations.
#[derive(Debug, Clone, Default)]
pub struct ReasoningResponse {
    pub text: String,
    pub operations: Vec<OperationCall>,
    pub usage: Usage,
    pub finish_reason: Option<FinishReason>,
}

impl ReasoningResponse {
    pub fn into_message(self) -> Message {
        Message::assistant_with_operations(self.text, self.operations)
    }
}

/// Core trait implemented by reasoning providers.
#[async_trait]
pub trait ReasoningProvider: Send + Sync {
    /// Provider name (e.g. "google").
    fn provider_name(&self) -> &str;

    fn model_id(&self) -> &str;

    async fn invoke(&self, request: &ReasoningRequest) -> Result<ReasoningResponse, ProbeError>;
}

/// Create the configured provider.
#[allow(unused_variables)]
pub fn create_provider(config: &ProbeConfig) -> Result<Arc<dyn ReasoningProvider>, ProbeError> {
    #[cfg(feature = "google")]
    {
        let api_key = config.google_api_key.clone().ok_or_else(|| {
            ProbeError::Authentication("Missing GOOGLE_API_KEY (or GEMINI_API_KEY)".into())
        })?;
        let provider = google::GoogleProvider::new(config.reasoning.model.clone(), api_key)
            .with_base_url(config.google_base_url.clone());
        Ok(Arc::new(provider))
    }

    #[cfg(not(feature = "google"))]
    Err(ProbeError::Configuration(
        "no reasoning provider compiled in; enable the `google` feature".into(),
    ))
}
