//! Google Gemini provider (`generateContent` with function calling).

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::error::ProbeError;
use crate::types::{FinishReason, Message, OperationCall, Usage};
use crate::util::retry::RetryPolicy;

use super::http::{shared_client, status_to_error};
use super::{ReasoningProvider, ReasoningRequest, ReasoningResponse};

const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

pub struct GoogleProvider {
    model: String,
    api_key: String,
    base_url: String,
    retry: RetryPolicy,
}

impl GoogleProvider {
    pub fn new(model: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            api_key: api_key.into(),
            base_url: BASE_URL.to_string(),
            retry: RetryPolicy::default(),
        }
    }

    /// Override the API base URL; `None` keeps the public endpoint.
    pub fn with_base_url(mut self, base_url: Option<String>) -> Self {
        if let Some(url) = base_url {
            self.base_url = url.trim_end_matches('/').to_string();
        }
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn build_request_body(&self, request: &ReasoningRequest) -> Value {
        let mut system_parts = Vec::new();
        let mut contents: Vec<Value> = Vec::new();
        let mut responses: Vec<Value> = Vec::new();

        for message in &request.messages {
            if !matches!(message, Message::ToolResult { .. }) && !responses.is_empty() {
                contents.push(json!({ "role": "function", "parts": std::mem::take(&mut responses) }));
            }
            match message {
                Message::System { text } => system_parts.push(json!({ "text": text })),
                Message::Human { text } => {
                    contents.push(json!({ "role": "user", "parts": [{ "text": text }] }));
                }
                Message::Assistant {
                    text, operations, ..
                } => {
                    let mut parts = Vec::new();
                    if !text.is_empty() {
                        parts.push(json!({ "text": text }));
                    }
                    parts.extend(operations.iter().map(|call| {
                        json!({ "functionCall": { "name": call.name, "args": call.arguments } })
                    }));
                    if !parts.is_empty() {
                        contents.push(json!({ "role": "model", "parts": parts }));
                    }
                }
                // Consecutive results answer one model turn and travel together.
                Message::ToolResult { name, outcome, .. } => responses.push(json!({
                    "functionResponse": {
                        "name": name,
                        "response": { "content": outcome.text() },
                    }
                })),
            }
        }
        if !responses.is_empty() {
            contents.push(json!({ "role": "function", "parts": responses }));
        }

        let mut body = serde_json::Map::new();
        body.insert("contents".into(), Value::Array(contents));
        if !system_parts.is_empty() {
            body.insert("systemInstruction".into(), json!({ "parts": system_parts }));
        }

        let settings = &request.settings;
        let mut generation = serde_json::Map::new();
        if let Some(max) = settings.max_output_tokens {
            generation.insert("maxOutputTokens".into(), max.into());
        }
        if let Some(temperature) = settings.temperature {
            generation.insert("temperature".into(), temperature.into());
        }
        if let Some(top_p) = settings.top_p {
            generation.insert("topP".into(), top_p.into());
        }
        if !generation.is_empty() {
            body.insert("generationConfig".into(), Value::Object(generation));
        }

        if !request.tools.is_empty() {
            let declarations: Vec<Value> = request
                .tools
                .iter()
                .map(|tool| {
                    json!({
                        "name": tool.name,
                        "description": tool.description,
                        "parameters": tool.parameters.schema,
                    })
                })
                .collect();
            body.insert(
                "tools".into(),
                json!([{ "functionDeclarations": declarations }]),
            );
        }

        Value::Object(body)
    }

    async fn generate_once(&self, url: &str, body: &Value) -> Result<GeminiResponse, ProbeError> {
        let resp = shared_client()
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await?;

        let status = resp.status().as_u16();
        if !resp.status().is_success() {
            let body_text = resp.text().await.unwrap_or_default();
            return Err(status_to_error(status, &body_text));
        }
        Ok(resp.json().await?)
    }
}

#[async_trait]
impl ReasoningProvider for GoogleProvider {
    fn provider_name(&self) -> &str {
        "google"
    }

    fn model_id(&self) -> &str {
        &self.model
    }

    async fn invoke(&self, request: &ReasoningRequest) -> Result<ReasoningResponse, ProbeError> {
        let body = self.build_request_body(request);
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);

        debug!(
            model = %self.model,
            messages = request.messages.len(),
            tools = request.tools.len(),
            "Google generateContent"
        );

        let data = self.retry.execute(|| self.generate_once(&url, &body)).await?;
        parse_response(data)
    }
}

fn parse_response(data: GeminiResponse) -> Result<ReasoningResponse, ProbeError> {
    let candidate = data.candidates.into_iter().next().ok_or_else(|| {
        let reason = data
            .prompt_feedback
            .and_then(|feedback| feedback.block_reason)
            .unwrap_or_else(|| "no candidates".into());
        ProbeError::reasoning("google", format!("empty Gemini response: {reason}"))
    })?;

    let mut text = String::new();
    let mut operations = Vec::new();
    for part in candidate.content.map(|c| c.parts).unwrap_or_default() {
        if let Some(t) = part.text {
            text.push_str(&t);
        }
        if let Some(call) = part.function_call {
            operations.push(OperationCall::new(
                uuid::Uuid::new_v4().to_string(),
                call.name,
                call.args.unwrap_or_else(|| Value::Object(Default::default())),
            ));
        }
    }

    let finish_reason = if !operations.is_empty() {
        Some(FinishReason::ToolCalls)
    } else {
        match candidate.finish_reason.as_deref() {
            Some("STOP") => Some(FinishReason::Stop),
            Some("MAX_TOKENS") => Some(FinishReason::Length),
            Some("SAFETY") | Some("RECITATION") | Some("PROHIBITED_CONTENT") => {
                Some(FinishReason::ContentFilter)
            }
            Some(_) => Some(FinishReason::Error),
            None => None,
        }
    };

    let usage = data
        .usage_metadata
        .map(|u| Usage {
            input_tokens: u.prompt_token_count,
            output_tokens: u.candidates_token_count,
            total_tokens: u.total_token_count,
        })
        .unwrap_or_default();

    Ok(ReasoningResponse {
        text,
        operations,
        usage,
        finish_reason,
    })
}

// Internal Gemini response types

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    usage_metadata: Option<GeminiUsage>,
    prompt_feedback: Option<GeminiPromptFeedback>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPart {
    text: Option<String>,
    function_call: Option<GeminiFunctionCall>,
}

#[derive(Deserialize)]
struct GeminiFunctionCall {
    name: String,
    args: Option<Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsage {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
    #[serde(default)]
    total_token_count: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPromptFeedback {
    block_reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::Vocabulary;
    use crate::types::{ReasoningSettings, ToolOutcome};
    use pretty_assertions::assert_eq;

    fn request(messages: Vec<Message>) -> ReasoningRequest {
        ReasoningRequest {
            messages,
            settings: ReasoningSettings::builder().temperature(0.8).build(),
            tools: Vocabulary::generic().definitions(),
        }
    }

    #[test]
    fn groups_tool_results_after_model_call() {
        let provider = GoogleProvider::new("gemini-2.5-flash", "key");
        let body = provider.build_request_body(&request(vec![
            Message::system("be helpful"),
            Message::human("read both"),
            Message::assistant_with_operations(
                "",
                vec![
                    OperationCall::new("1", "read_mcp_resource", json!({"uri": "a://x"})),
                    OperationCall::new("2", "read_mcp_resource", json!({"uri": "b://y"})),
                ],
            ),
            Message::tool_result("1", "read_mcp_resource", ToolOutcome::success("x")),
            Message::tool_result("2", "read_mcp_resource", ToolOutcome::failure("missing")),
        ]));

        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "be helpful");
        let contents = body["contents"].as_array().expect("contents");
        assert_eq!(contents.len(), 3);
        assert_eq!(contents[1]["role"], "model");
        assert_eq!(contents[1]["parts"][1]["functionCall"]["args"]["uri"], "b://y");
        assert_eq!(contents[2]["role"], "function");
        assert_eq!(
            contents[2]["parts"][1]["functionResponse"]["response"]["content"],
            "Error: missing"
        );
        assert_eq!(body["generationConfig"]["temperature"], 0.8);
        assert_eq!(
            body["tools"][0]["functionDeclarations"][0]["name"],
            "list_mcp_tools"
        );
    }

    #[test]
    fn parses_function_calls_and_usage() {
        let data: GeminiResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {"parts": [
                    {"text": "Checking."},
                    {"functionCall": {"name": "list_mcp_resources", "args": {}}}
                ]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 12, "candidatesTokenCount": 3, "totalTokenCount": 15}
        }))
        .expect("valid response");

        let response = parse_response(data).expect("parsed");
        assert_eq!(response.text, "Checking.");
        assert_eq!(response.operations.len(), 1);
        assert_eq!(response.operations[0].name, "list_mcp_resources");
        assert_eq!(response.finish_reason, Some(FinishReason::ToolCalls));
        assert_eq!(response.usage.total_tokens, 15);
    }

    #[test]
    fn blocked_prompt_is_reasoning_error() {
        let data: GeminiResponse =
            serde_json::from_value(json!({"promptFeedback": {"blockReason": "SAFETY"}}))
                .expect("valid response");
        let err = parse_response(data).expect_err("no candidates");
        assert!(matches!(err, ProbeError::Reasoning { message, .. } if message.contains("SAFETY")));
    }
}
