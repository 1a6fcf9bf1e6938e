//! Normalization of raw MCP results into one serializable shape.
//!
//! Every operation result passes through [`normalize`] before it reaches a
//! conversation. Nothing here fails: malformed input is described in place.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::OperationKind;

/// One piece of content from a tool call, resource read, or prompt fetch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContentRecord {
    Text {
        text: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        uri: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        role: Option<String>,
    },
    /// Content without a text form, kept as compact JSON.
    Opaque { repr: String },
}

impl ContentRecord {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text {
            text: text.into(),
            uri: None,
            role: None,
        }
    }

    fn opaque(value: &Value) -> Self {
        Self::Opaque {
            repr: value.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_schema: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDescriptor {
    pub uri: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptDescriptor {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Vec<PromptArgument>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptArgument {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
}

/// A listed descriptor, or a description of why the source entry was unusable.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DescriptorEntry<T> {
    Described(T),
    Anomaly { info: String },
}

impl<T> DescriptorEntry<T> {
    pub fn described(&self) -> Option<&T> {
        match self {
            Self::Described(value) => Some(value),
            Self::Anomaly { .. } => None,
        }
    }
}

/// Uniform result of one operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum NormalizedPayload {
    Content(Vec<ContentRecord>),
    Tools(Vec<DescriptorEntry<ToolDescriptor>>),
    Resources(Vec<DescriptorEntry<ResourceDescriptor>>),
    Prompts(Vec<DescriptorEntry<PromptDescriptor>>),
}

impl NormalizedPayload {
    /// Pretty-printed JSON, the form shown to users and the reasoning model.
    pub fn render(&self) -> String {
        serde_json::to_string_pretty(self)
            .unwrap_or_else(|e| format!("{{\"info\": \"unserializable payload: {e}\"}}"))
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Content(records) => records.len(),
            Self::Tools(entries) => entries.len(),
            Self::Resources(entries) => entries.len(),
            Self::Prompts(entries) => entries.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Names of described tools, in server order.
    pub fn tool_names(&self) -> Vec<&str> {
        match self {
            Self::Tools(entries) => entries
                .iter()
                .filter_map(DescriptorEntry::described)
                .map(|tool| tool.name.as_str())
                .collect(),
            _ => Vec::new(),
        }
    }

    /// URIs of described resources, in server order.
    pub fn resource_uris(&self) -> Vec<&str> {
        match self {
            Self::Resources(entries) => entries
                .iter()
                .filter_map(DescriptorEntry::described)
                .map(|resource| resource.uri.as_str())
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Normalize a raw JSON-RPC result for the given operation kind.
pub fn normalize(raw: &Value, kind: OperationKind) -> NormalizedPayload {
    match kind {
        OperationKind::ListTools => NormalizedPayload::Tools(descriptors(raw, "tools")),
        OperationKind::ListResources => {
            NormalizedPayload::Resources(descriptors(raw, "resources"))
        }
        OperationKind::ListPrompts => NormalizedPayload::Prompts(descriptors(raw, "prompts")),
        OperationKind::CallTool => NormalizedPayload::Content(tool_content(raw)),
        OperationKind::ReadResource => NormalizedPayload::Content(resource_contents(raw)),
        OperationKind::GetPrompt => NormalizedPayload::Content(prompt_messages(raw)),
    }
}

fn descriptors<T>(raw: &Value, key: &str) -> Vec<DescriptorEntry<T>>
where
    T: for<'de> Deserialize<'de>,
{
    let Some(items) = raw.get(key).and_then(Value::as_array) else {
        return vec![DescriptorEntry::Anomaly {
            info: format!("response has no '{key}' list: {raw}"),
        }];
    };

    items
        .iter()
        .enumerate()
        .map(|(index, item)| match T::deserialize(item) {
            Ok(descriptor) => DescriptorEntry::Described(descriptor),
            Err(e) => DescriptorEntry::Anomaly {
                info: format!("unreadable entry {index} ({e}): {item}"),
            },
        })
        .collect()
}

fn tool_content(raw: &Value) -> Vec<ContentRecord> {
    let items = match raw.get("content").and_then(Value::as_array) {
        Some(items) => items,
        None => return vec![ContentRecord::opaque(raw)],
    };

    if items.is_empty() {
        return match raw.get("structuredContent") {
            Some(structured) => vec![ContentRecord::opaque(structured)],
            None => Vec::new(),
        };
    }

    items.iter().map(content_item).collect()
}

fn content_item(item: &Value) -> ContentRecord {
    let text = |value: Option<&Value>| value.and_then(Value::as_str).map(str::to_string);

    match item.get("type").and_then(Value::as_str) {
        Some("text") => match text(item.get("text")) {
            Some(body) => ContentRecord::text(body),
            None => ContentRecord::opaque(item),
        },
        Some("resource") => match text(item.pointer("/resource/text")) {
            Some(body) => ContentRecord::Text {
                text: body,
                uri: text(item.pointer("/resource/uri")),
                role: None,
            },
            None => ContentRecord::opaque(item),
        },
        _ => ContentRecord::opaque(item),
    }
}

fn resource_contents(raw: &Value) -> Vec<ContentRecord> {
    let Some(items) = raw.get("contents").and_then(Value::as_array) else {
        return vec![ContentRecord::opaque(raw)];
    };

    items
        .iter()
        .map(|item| match item.get("text").and_then(Value::as_str) {
            Some(body) => ContentRecord::Text {
                text: body.to_string(),
                uri: item.get("uri").and_then(Value::as_str).map(str::to_string),
                role: None,
            },
            None => ContentRecord::opaque(item),
        })
        .collect()
}

fn prompt_messages(raw: &Value) -> Vec<ContentRecord> {
    let Some(messages) = raw.get("messages").and_then(Value::as_array) else {
        return vec![ContentRecord::opaque(raw)];
    };

    messages
        .iter()
        .map(|message| {
            let role = message
                .get("role")
                .and_then(Value::as_str)
                .map(str::to_string);
            match message.get("content").map(content_item) {
                Some(ContentRecord::Text { text, uri, .. }) => ContentRecord::Text { text, uri, role },
                Some(other) => other,
                None => ContentRecord::opaque(message),
            }
        })
        .collect()
}
