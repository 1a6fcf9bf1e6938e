//! MCP client speaking JSON-RPC over an [`MCPTransport`].

use rmcp::model::{ClientInfo, ProtocolVersion};
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::jsonrpc::{self, Incoming};
use super::transport::MCPTransport;
use crate::error::ProbeError;
use crate::types::{JsonObject, Operation};

const CLIENT_NAME: &str = "mcprobe";

/// Upper bound on `nextCursor` pages followed by one listing.
const MAX_PAGES: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MCPConnectionState {
    Connected,
    Initialized,
    Closed,
}

/// What the server reported during the handshake.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServerDetails {
    pub protocol_version: String,
    pub name: Option<String>,
    pub version: Option<String>,
    pub instructions: Option<String>,
}

impl ServerDetails {
    fn from_initialize_result(result: &Value) -> Self {
        let text = |value: Option<&Value>| value.and_then(Value::as_str).map(str::to_string);
        Self {
            protocol_version: text(result.get("protocolVersion")).unwrap_or_default(),
            name: text(result.pointer("/serverInfo/name")),
            version: text(result.pointer("/serverInfo/version")),
            instructions: text(result.get("instructions")),
        }
    }
}

/// Client for a Model Context Protocol server.
///
/// Owns its transport exclusively. Requests are matched to responses by id;
/// server notifications are skipped and server `ping` requests are answered.
pub struct MCPClient {
    transport: Box<dyn MCPTransport>,
    state: MCPConnectionState,
    next_id: u64,
    server: Option<ServerDetails>,
}

impl MCPClient {
    /// Create a client over an already connected transport.
    pub fn new(transport: Box<dyn MCPTransport>) -> Self {
        Self {
            transport,
            state: MCPConnectionState::Connected,
            next_id: 1,
            server: None,
        }
    }

    pub fn connection_state(&self) -> MCPConnectionState {
        self.state
    }

    pub fn is_initialized(&self) -> bool {
        self.state == MCPConnectionState::Initialized
    }

    pub fn server(&self) -> Option<&ServerDetails> {
        self.server.as_ref()
    }

    /// Perform the `initialize` handshake, falling back to the 2024-11-05
    /// protocol revision when the server rejects the latest one.
    pub async fn initialize(&mut self) -> Result<(), ProbeError> {
        match self.state {
            MCPConnectionState::Initialized => return Ok(()),
            MCPConnectionState::Closed => {
                return Err(ProbeError::Transport("MCP session is closed".into()))
            }
            MCPConnectionState::Connected => {}
        }

        let result = match self.handshake(ProtocolVersion::LATEST).await {
            Ok(result) => result,
            Err(error) if should_retry_protocol_fallback(&error) => {
                debug!(error = %error, "retrying MCP initialize with 2024-11-05");
                self.handshake(ProtocolVersion::V_2024_11_05).await?
            }
            Err(error) => return Err(error),
        };

        let server = ServerDetails::from_initialize_result(&result);
        debug!(
            protocol = %server.protocol_version,
            server = server.name.as_deref().unwrap_or("unknown"),
            "MCP session initialized"
        );
        self.server = Some(server);

        self.transport
            .send(jsonrpc::notification("notifications/initialized"))
            .await?;
        self.state = MCPConnectionState::Initialized;
        Ok(())
    }

    /// Execute one operation and return the raw JSON-RPC result.
    ///
    /// Listings follow `nextCursor` and return `{"<key>": [all entries]}`.
    pub async fn execute(&mut self, operation: &Operation) -> Result<Value, ProbeError> {
        self.ensure_initialized()?;
        let kind = operation.kind();

        if let Some(key) = kind.listing_key() {
            return self.list_all(kind.method(), key).await;
        }

        let result = self.request(kind.method(), operation.params()).await?;
        if let Operation::CallTool { name, .. } = operation {
            check_tool_error(name, &result)?;
        }
        Ok(result)
    }

    pub async fn list_tools(&mut self) -> Result<Value, ProbeError> {
        self.execute(&Operation::ListTools).await
    }

    pub async fn list_resources(&mut self) -> Result<Value, ProbeError> {
        self.execute(&Operation::ListResources).await
    }

    pub async fn list_prompts(&mut self) -> Result<Value, ProbeError> {
        self.execute(&Operation::ListPrompts).await
    }

    /// Call a tool. `arguments` may be an object, a stringified object, or null.
    pub async fn call_tool(&mut self, name: &str, arguments: Value) -> Result<Value, ProbeError> {
        let arguments = coerce_tool_arguments(arguments)?;
        self.execute(&Operation::call_tool(name, arguments)).await
    }

    pub async fn read_resource(&mut self, uri: &str) -> Result<Value, ProbeError> {
        self.execute(&Operation::read_resource(uri)).await
    }

    pub async fn get_prompt(&mut self, name: &str, arguments: Value) -> Result<Value, ProbeError> {
        let arguments = coerce_tool_arguments(arguments)?;
        self.execute(&Operation::get_prompt(name, arguments)).await
    }

    /// Close the session. Safe to call more than once.
    pub async fn close(&mut self) -> Result<(), ProbeError> {
        if self.state == MCPConnectionState::Closed {
            return Ok(());
        }
        self.state = MCPConnectionState::Closed;
        self.transport.close().await
    }

    fn ensure_initialized(&self) -> Result<(), ProbeError> {
        match self.state {
            MCPConnectionState::Initialized => Ok(()),
            MCPConnectionState::Closed => {
                Err(ProbeError::Transport("MCP session is closed".into()))
            }
            MCPConnectionState::Connected => Err(ProbeError::InvalidState(
                "MCP client must be initialized first".into(),
            )),
        }
    }

    async fn handshake(&mut self, version: ProtocolVersion) -> Result<Value, ProbeError> {
        let client_info = ClientInfo {
            protocol_version: version,
            ..Default::default()
        };
        let mut params = serde_json::to_value(&client_info)?;
        if let Some(params) = params.as_object_mut() {
            params.insert(
                "clientInfo".into(),
                json!({ "name": CLIENT_NAME, "version": env!("CARGO_PKG_VERSION") }),
            );
        }
        self.request("initialize", params).await
    }

    async fn list_all(&mut self, method: &str, key: &str) -> Result<Value, ProbeError> {
        let mut entries = Vec::new();
        let mut cursor: Option<String> = None;

        for _ in 0..MAX_PAGES {
            let params = match &cursor {
                Some(cursor) => json!({ "cursor": cursor }),
                None => json!({}),
            };
            let page = self.request(method, params).await?;

            match page.get(key) {
                Some(Value::Array(items)) => entries.extend(items.iter().cloned()),
                _ if entries.is_empty() => return Ok(page),
                _ => {
                    warn!(method, "listing page without '{key}', keeping earlier pages");
                    break;
                }
            }

            cursor = page
                .get("nextCursor")
                .and_then(Value::as_str)
                .filter(|c| !c.is_empty())
                .map(str::to_string);
            if cursor.is_none() {
                break;
            }
        }

        if cursor.is_some() {
            warn!(method, pages = MAX_PAGES, "listing truncated at page limit");
        }

        let mut result = JsonObject::new();
        result.insert(key.to_string(), Value::Array(entries));
        Ok(Value::Object(result))
    }

    async fn request(&mut self, method: &str, params: Value) -> Result<Value, ProbeError> {
        if self.state == MCPConnectionState::Closed {
            return Err(ProbeError::Transport("MCP session is closed".into()));
        }

        let id = self.next_id;
        self.next_id += 1;
        self.transport
            .send(jsonrpc::request(id, method, params))
            .await?;

        loop {
            let message = self.transport.receive().await?;
            match jsonrpc::classify(message) {
                Incoming::Response { id: got, outcome } if jsonrpc::id_matches(&got, id) => {
                    return outcome.map_err(|error| ProbeError::Protocol {
                        code: error.code,
                        message: error.message,
                    });
                }
                Incoming::Response { id: got, .. } => {
                    debug!(expected = id, got = %got, "skipping unrelated MCP response");
                }
                Incoming::Request { id: ping_id, method } if method == "ping" => {
                    self.transport
                        .send(jsonrpc::result_response(ping_id, json!({})))
                        .await?;
                }
                Incoming::Request { id: request_id, method } => {
                    debug!(method = %method, "rejecting server request");
                    self.transport
                        .send(jsonrpc::error_response(
                            request_id,
                            jsonrpc::METHOD_NOT_FOUND,
                            "method not supported by client",
                        ))
                        .await?;
                }
                Incoming::Notification { method } => {
                    debug!(method = %method, "skipping MCP notification");
                }
                Incoming::Invalid(reason) => warn!(reason = %reason, "ignoring malformed MCP message"),
            }
        }
    }
}

fn should_retry_protocol_fallback(error: &ProbeError) -> bool {
    match error {
        ProbeError::Protocol { message, .. } => {
            let message = message.to_ascii_lowercase();
            message.contains("protocol") && message.contains("version")
        }
        _ => false,
    }
}

fn check_tool_error(name: &str, result: &Value) -> Result<(), ProbeError> {
    if result.get("isError").and_then(Value::as_bool) != Some(true) {
        return Ok(());
    }
    let message = result
        .get("content")
        .and_then(extract_text_content)
        .or_else(|| result.get("structuredContent").map(Value::to_string))
        .unwrap_or_else(|| "MCP tool returned an error result".into());

    Err(ProbeError::ToolExecution {
        tool_name: name.to_string(),
        message,
    })
}

/// Accept tool arguments as an object, a stringified object, or null.
pub(crate) fn coerce_tool_arguments(value: Value) -> Result<JsonObject, ProbeError> {
    match value {
        Value::Null => Ok(JsonObject::new()),
        Value::Object(map) => Ok(map),
        Value::String(raw) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return Ok(JsonObject::new());
            }
            let parsed: Value = serde_json::from_str(trimmed).map_err(|e| {
                ProbeError::InvalidArgument(format!("MCP tool arguments must be valid JSON: {e}"))
            })?;
            coerce_tool_arguments(parsed)
        }
        other => Err(ProbeError::InvalidArgument(format!(
            "MCP tool arguments must be a JSON object; got {other}"
        ))),
    }
}

fn extract_text_content(content: &Value) -> Option<String> {
    let lines: Vec<&str> = content
        .as_array()?
        .iter()
        .filter_map(|item| {
            item.get("text")
                .or_else(|| item.pointer("/resource/text"))
                .and_then(Value::as_str)
        })
        .collect();

    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}
