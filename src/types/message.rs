//! Conversation messages and the append-only conversation value.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::OperationError;

/// An operation requested by the reasoning capability, with its correlation id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OperationCall {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub arguments: serde_json::Value,
}

impl OperationCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }
}

/// Payload of a tool result: success content or an error description, never both.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ToolOutcome {
    Success { text: String },
    Failure { text: String },
}

impl ToolOutcome {
    pub fn success(text: impl Into<String>) -> Self {
        Self::Success { text: text.into() }
    }

    /// Build a failure outcome; the text is normalized to start with `Error:`.
    pub fn failure(text: impl Into<String>) -> Self {
        let text = text.into();
        let text = if text.starts_with("Error:") {
            text
        } else {
            format!("Error: {text}")
        };
        Self::Failure { text }
    }

    pub fn text(&self) -> &str {
        match self {
            Self::Success { text } | Self::Failure { text } => text,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Failure { .. })
    }
}

impl From<&OperationError> for ToolOutcome {
    fn from(err: &OperationError) -> Self {
        Self::Failure {
            text: err.to_tool_text(),
        }
    }
}

/// A message in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Message {
    System {
        text: String,
    },
    Human {
        text: String,
    },
    Assistant {
        text: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        operations: Vec<OperationCall>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timestamp: Option<DateTime<Utc>>,
    },
    ToolResult {
        call_id: String,
        name: String,
        outcome: ToolOutcome,
    },
}

impl Message {
    pub fn system(text: impl Into<String>) -> Self {
        Self::System { text: text.into() }
    }

    pub fn human(text: impl Into<String>) -> Self {
        Self::Human { text: text.into() }
    }

    /// Create an assistant message with no requested operations.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::Assistant {
            text: text.into(),
            operations: Vec::new(),
            timestamp: Some(Utc::now()),
        }
    }

    pub fn assistant_with_operations(text: impl Into<String>, operations: Vec<OperationCall>) -> Self {
        Self::Assistant {
            text: text.into(),
            operations,
            timestamp: Some(Utc::now()),
        }
    }

    pub fn tool_result(call_id: impl Into<String>, name: impl Into<String>, outcome: ToolOutcome) -> Self {
        Self::ToolResult {
            call_id: call_id.into(),
            name: name.into(),
            outcome,
        }
    }

    /// Text content of the message.
    pub fn text(&self) -> &str {
        match self {
            Self::System { text } | Self::Human { text } | Self::Assistant { text, .. } => text,
            Self::ToolResult { outcome, .. } => outcome.text(),
        }
    }

    /// Operations requested by an assistant message (empty otherwise).
    pub fn operations(&self) -> &[OperationCall] {
        match self {
            Self::Assistant { operations, .. } => operations,
            _ => &[],
        }
    }

    pub fn is_system(&self) -> bool {
        matches!(self, Self::System { .. })
    }

    pub fn is_assistant(&self) -> bool {
        matches!(self, Self::Assistant { .. })
    }
}

/// Ordered, append-only sequence of messages.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_messages(messages: Vec<Message>) -> Self {
        Self { messages }
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn extend(&mut self, messages: impl IntoIterator<Item = Message>) {
        self.messages.extend(messages);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn has_system(&self) -> bool {
        self.messages.iter().any(Message::is_system)
    }

    /// Prepend a system message unless one is already present.
    ///
    /// Returns `true` when the message was inserted.
    pub fn ensure_system(&mut self, text: impl Into<String>) -> bool {
        if self.has_system() {
            return false;
        }
        self.messages.insert(0, Message::system(text));
        true
    }

    /// Text of the latest human message.
    pub fn last_human_text(&self) -> Option<&str> {
        self.messages.iter().rev().find_map(|m| match m {
            Message::Human { text } => Some(text.as_str()),
            _ => None,
        })
    }

    /// Text of the latest assistant message, i.e. the user-visible answer once a turn is done.
    pub fn final_answer(&self) -> Option<&str> {
        self.messages.iter().rev().find_map(|m| match m {
            Message::Assistant { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    /// Check the correlation invariant: every tool result answers a call declared
    /// by the immediately preceding assistant message, results for one assistant
    /// turn are contiguous, and each declared call has exactly one result.
    pub fn validate_correlation(&self) -> Result<(), String> {
        let mut pending: Option<(usize, Vec<&str>, Vec<&str>)> = None;

        for (index, message) in self.messages.iter().enumerate() {
            match message {
                Message::ToolResult { call_id, .. } => {
                    let Some((_, declared, answered)) = pending.as_mut() else {
                        return Err(format!(
                            "tool result '{call_id}' at {index} has no preceding assistant call"
                        ));
                    };
                    if !declared.contains(&call_id.as_str()) {
                        return Err(format!(
                            "tool result '{call_id}' at {index} does not match a declared call"
                        ));
                    }
                    if answered.contains(&call_id.as_str()) {
                        return Err(format!("tool result '{call_id}' at {index} is duplicated"));
                    }
                    answered.push(call_id.as_str());
                }
                other => {
                    if let Some((at, declared, answered)) = pending.take() {
                        if declared.len() != answered.len() {
                            return Err(format!(
                                "assistant message at {at} declared {} calls but got {} results",
                                declared.len(),
                                answered.len()
                            ));
                        }
                    }
                    if let Message::Assistant { operations, .. } = other {
                        if !operations.is_empty() {
                            let declared = operations.iter().map(|c| c.id.as_str()).collect();
                            pending = Some((index, declared, Vec::new()));
                        }
                    }
                }
            }
        }

        // A trailing assistant turn may still be awaiting results.
        Ok(())
    }
}
