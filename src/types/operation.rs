//! Protocol operations the client can issue against an MCP endpoint.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// JSON object used for tool and prompt arguments.
pub type JsonObject = serde_json::Map<String, serde_json::Value>;

/// One typed request against an MCP endpoint. Immutable once issued.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    ListTools,
    ListResources,
    ListPrompts,
    CallTool {
        name: String,
        #[serde(default)]
        arguments: JsonObject,
    },
    ReadResource {
        uri: String,
    },
    GetPrompt {
        name: String,
        #[serde(default)]
        arguments: JsonObject,
    },
}

/// Discriminant of [`Operation`], used to pick the normalization shape.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OperationKind {
    ListTools,
    ListResources,
    ListPrompts,
    CallTool,
    ReadResource,
    GetPrompt,
}

impl OperationKind {
    /// JSON-RPC method name for this operation.
    pub fn method(self) -> &'static str {
        match self {
            Self::ListTools => "tools/list",
            Self::ListResources => "resources/list",
            Self::ListPrompts => "prompts/list",
            Self::CallTool => "tools/call",
            Self::ReadResource => "resources/read",
            Self::GetPrompt => "prompts/get",
        }
    }

    /// Whether the response is a paginated descriptor listing.
    pub fn is_listing(self) -> bool {
        matches!(self, Self::ListTools | Self::ListResources | Self::ListPrompts)
    }

    /// Key of the descriptor array inside a listing response.
    pub fn listing_key(self) -> Option<&'static str> {
        match self {
            Self::ListTools => Some("tools"),
            Self::ListResources => Some("resources"),
            Self::ListPrompts => Some("prompts"),
            _ => None,
        }
    }
}

impl Operation {
    pub fn call_tool(name: impl Into<String>, arguments: JsonObject) -> Self {
        Self::CallTool {
            name: name.into(),
            arguments,
        }
    }

    pub fn read_resource(uri: impl Into<String>) -> Self {
        Self::ReadResource { uri: uri.into() }
    }

    pub fn get_prompt(name: impl Into<String>, arguments: JsonObject) -> Self {
        Self::GetPrompt {
            name: name.into(),
            arguments,
        }
    }

    pub fn kind(&self) -> OperationKind {
        match self {
            Self::ListTools => OperationKind::ListTools,
            Self::ListResources => OperationKind::ListResources,
            Self::ListPrompts => OperationKind::ListPrompts,
            Self::CallTool { .. } => OperationKind::CallTool,
            Self::ReadResource { .. } => OperationKind::ReadResource,
            Self::GetPrompt { .. } => OperationKind::GetPrompt,
        }
    }

    /// Human-readable label used in logs and error text, e.g. `read_resource(notes://x)`.
    pub fn label(&self) -> String {
        match self {
            Self::CallTool { name, .. } | Self::GetPrompt { name, .. } => {
                format!("{}({name})", self.kind())
            }
            Self::ReadResource { uri } => format!("{}({uri})", self.kind()),
            _ => self.kind().to_string(),
        }
    }

    /// JSON-RPC params for this operation (without pagination cursor).
    pub fn params(&self) -> serde_json::Value {
        match self {
            Self::ListTools | Self::ListResources | Self::ListPrompts => {
                serde_json::Value::Object(JsonObject::new())
            }
            Self::CallTool { name, arguments } => serde_json::json!({
                "name": name,
                "arguments": arguments,
            }),
            Self::ReadResource { uri } => serde_json::json!({ "uri": uri }),
            Self::GetPrompt { name, arguments } => {
                // prompts/get takes string-valued arguments only.
                let arguments: JsonObject = arguments
                    .iter()
                    .map(|(key, value)| {
                        let text = match value {
                            serde_json::Value::String(s) => s.clone(),
                            other => other.to_string(),
                        };
                        (key.clone(), serde_json::Value::String(text))
                    })
                    .collect();
                serde_json::json!({ "name": name, "arguments": arguments })
            }
        }
    }
}
