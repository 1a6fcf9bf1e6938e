//! Shared test doubles: scripted reasoning, scripted operations, a mock MCP server.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use mcprobe::error::{OperationError, ProbeError};
use mcprobe::mcp::{normalize, NormalizedPayload, OperationExecutor};
use mcprobe::provider::{ReasoningProvider, ReasoningRequest, ReasoningResponse};
use mcprobe::types::*;

pub fn call(id: &str, name: &str, arguments: Value) -> OperationCall {
    OperationCall::new(id, name, arguments)
}

pub fn answer(text: &str) -> ReasoningResponse {
    ReasoningResponse {
        text: text.to_string(),
        usage: Usage {
            input_tokens: 10,
            output_tokens: 20,
            total_tokens: 30,
        },
        finish_reason: Some(FinishReason::Stop),
        ..ReasoningResponse::default()
    }
}

pub fn with_calls(text: &str, operations: Vec<OperationCall>) -> ReasoningResponse {
    ReasoningResponse {
        text: text.to_string(),
        operations,
        usage: Usage {
            input_tokens: 10,
            output_tokens: 5,
            total_tokens: 15,
        },
        finish_reason: Some(FinishReason::ToolCalls),
    }
}

/// Reasoning provider that replays a queue of canned responses.
#[derive(Default)]
pub struct ScriptedProvider {
    responses: Mutex<Vec<Result<ReasoningResponse, ProbeError>>>,
    requests: Mutex<Vec<ReasoningRequest>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue(&self, response: ReasoningResponse) -> &Self {
        self.responses.lock().unwrap().push(Ok(response));
        self
    }

    pub fn queue_error(&self, error: ProbeError) -> &Self {
        self.responses.lock().unwrap().push(Err(error));
        self
    }

    pub fn requests(&self) -> Vec<ReasoningRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl ReasoningProvider for ScriptedProvider {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    fn model_id(&self) -> &str {
        "scripted-model"
    }

    async fn invoke(&self, request: &ReasoningRequest) -> Result<ReasoningResponse, ProbeError> {
        self.requests.lock().unwrap().push(request.clone());
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            return Ok(answer("Scripted answer"));
        }
        responses.remove(0)
    }
}

/// Canned behaviour for one operation label.
#[derive(Clone)]
struct Scripted {
    delay: Duration,
    result: Result<Value, String>,
}

/// Operation executor with per-label delays and raw results.
///
/// Unscripted operations succeed with empty payloads. A scripted error
/// becomes a Transport failure. Cancellation is honoured during the delay.
#[derive(Default)]
pub struct ScriptedExecutor {
    script: Mutex<HashMap<String, Scripted>>,
    started: Mutex<Vec<String>>,
    finished: Mutex<Vec<String>>,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, label: &str, delay: Duration, raw: Value) -> &Self {
        self.script.lock().unwrap().insert(
            label.to_string(),
            Scripted {
                delay,
                result: Ok(raw),
            },
        );
        self
    }

    pub fn fail(&self, label: &str, delay: Duration, message: &str) -> &Self {
        self.script.lock().unwrap().insert(
            label.to_string(),
            Scripted {
                delay,
                result: Err(message.to_string()),
            },
        );
        self
    }

    pub fn started(&self) -> Vec<String> {
        self.started.lock().unwrap().clone()
    }

    /// Labels in completion order; every execution ends here exactly once.
    pub fn finished(&self) -> Vec<String> {
        self.finished.lock().unwrap().clone()
    }
}

#[async_trait]
impl OperationExecutor for ScriptedExecutor {
    async fn execute(
        &self,
        operation: &Operation,
        cancel: &CancellationToken,
    ) -> Result<NormalizedPayload, OperationError> {
        let label = operation.label();
        self.started.lock().unwrap().push(label.clone());
        let scripted = self
            .script
            .lock()
            .unwrap()
            .get(&label)
            .cloned()
            .unwrap_or(Scripted {
                delay: Duration::ZERO,
                result: Ok(json!({"content": [], "tools": [], "resources": [], "prompts": []})),
            });

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ProbeError::Canceled("operation canceled".into())),
            _ = tokio::time::sleep(scripted.delay) => match scripted.result {
                Ok(raw) => Ok(normalize(&raw, operation.kind())),
                Err(message) => Err(ProbeError::Transport(message)),
            },
        };

        self.finished.lock().unwrap().push(label.clone());
        outcome.map_err(|cause| OperationError::new(label, cause))
    }
}

/// Start a streamable HTTP MCP server at `/mcp` that behaves like challenge 1.
///
/// Resources: `notes://welcome` then `files://public` on a second page, plus
/// the unlisted `internal://credentials`; reading anything else fails with
/// -32602. Tool `get_user_info(username)`; the username `boom` yields an
/// `isError` result.
pub async fn mock_mcp_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/mcp"))
        .respond_with(mcp_responder)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/mcp"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    server
}

fn mcp_responder(request: &Request) -> ResponseTemplate {
    let body: Value = request.body_json().unwrap_or_else(|_| json!({}));
    let method = body["method"].as_str().unwrap_or_default();
    let params = &body["params"];

    let Some(id) = body.get("id").cloned() else {
        return ResponseTemplate::new(202);
    };

    let reply = |result: Value| {
        ResponseTemplate::new(200)
            .insert_header("mcp-session-id", "session-1")
            .set_body_json(json!({"jsonrpc": "2.0", "id": id, "result": result}))
    };
    let error = |code: i64, message: String| {
        ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": id,
            "error": {"code": code, "message": message}
        }))
    };

    match method {
        "initialize" => reply(json!({
            "protocolVersion": "2025-03-26",
            "capabilities": {"tools": {}, "resources": {}},
            "serverInfo": {"name": "Challenge 1 - Basic Prompt Injection", "version": "1.0.0"}
        })),
        "tools/list" => reply(json!({"tools": [{
            "name": "get_user_info",
            "description": "Get information about a user",
            "inputSchema": {
                "type": "object",
                "properties": {"username": {"type": "string"}},
                "required": ["username"]
            }
        }]})),
        "resources/list" => match params["cursor"].as_str() {
            None => reply(json!({
                "resources": [{"uri": "notes://welcome", "name": "welcome"}],
                "nextCursor": "page-2"
            })),
            Some(_) => reply(json!({
                "resources": [{"uri": "files://public", "name": "public", "mimeType": "text/plain"}]
            })),
        },
        "prompts/list" => reply(json!({"prompts": []})),
        "resources/read" => match params["uri"].as_str().unwrap_or_default() {
            "internal://credentials" => reply(json!({"contents": [{
                "uri": "internal://credentials",
                "mimeType": "text/plain",
                "text": "admin_password=sup3r_s3cr3t"
            }]})),
            "notes://welcome" => reply(json!({"contents": [{
                "uri": "notes://welcome",
                "text": "Welcome to the notes service"
            }]})),
            _ => error(-32602, "Unknown resource".to_string()),
        },
        "tools/call" => match params["arguments"]["username"].as_str() {
            Some("boom") => reply(json!({
                "content": [{"type": "text", "text": "database connection string leaked: postgres://root@db"}],
                "isError": true
            })),
            Some(user) => reply(json!({
                "content": [{"type": "text", "text": format!("User {user}: role=admin")}]
            })),
            None => error(-32602, "missing username".to_string()),
        },
        "ping" => reply(json!({})),
        other => error(-32601, format!("Method not found: {other}")),
    }
}

/// A legacy HTTP+SSE MCP server on a raw listener.
///
/// `GET /sse` announces `/messages/?session_id=abc` as the message endpoint and
/// then streams JSON-RPC replies as `message` events; POSTs are answered with
/// `202 Accepted`.
pub struct SseMcpServer {
    pub url: String,
    /// `(target, method)` of every POSTed message, in arrival order.
    pub posts: Arc<Mutex<Vec<(String, String)>>>,
}

pub async fn sse_mcp_server() -> SseMcpServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let posts = Arc::new(Mutex::new(Vec::new()));
    let (replies_tx, replies_rx) = mpsc::unbounded_channel::<Value>();
    let replies_rx = Arc::new(tokio::sync::Mutex::new(replies_rx));

    let recorded = posts.clone();
    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            tokio::spawn(serve_sse_connection(
                socket,
                recorded.clone(),
                replies_tx.clone(),
                replies_rx.clone(),
            ));
        }
    });

    SseMcpServer {
        url: format!("http://{addr}/sse"),
        posts,
    }
}

async fn serve_sse_connection(
    socket: TcpStream,
    posts: Arc<Mutex<Vec<(String, String)>>>,
    replies_tx: mpsc::UnboundedSender<Value>,
    replies_rx: Arc<tokio::sync::Mutex<mpsc::UnboundedReceiver<Value>>>,
) {
    let mut conn = BufReader::new(socket);
    while let Some((method, target, body)) = read_http_request(&mut conn).await {
        if method == "GET" && target == "/sse" {
            let head = "HTTP/1.1 200 OK\r\nContent-Type: text/event-stream\r\nCache-Control: no-cache\r\nConnection: close\r\n\r\n";
            let announce = "event: endpoint\ndata: /messages/?session_id=abc\n\n";
            let stream = conn.get_mut();
            if stream.write_all(head.as_bytes()).await.is_err()
                || stream.write_all(announce.as_bytes()).await.is_err()
            {
                return;
            }
            let mut replies = replies_rx.lock().await;
            while let Some(reply) = replies.recv().await {
                let event = format!("event: message\ndata: {reply}\n\n");
                if stream.write_all(event.as_bytes()).await.is_err() {
                    return;
                }
            }
            return;
        }

        if method == "POST" && target.starts_with("/messages/") {
            let message: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
            let rpc_method = message["method"].as_str().unwrap_or_default().to_string();
            posts.lock().unwrap().push((target.clone(), rpc_method.clone()));
            if let Some(reply) = sse_reply(&rpc_method, &message) {
                let _ = replies_tx.send(reply);
            }
            let accepted = "HTTP/1.1 202 Accepted\r\nContent-Length: 0\r\n\r\n";
            if conn.get_mut().write_all(accepted.as_bytes()).await.is_err() {
                return;
            }
            continue;
        }

        let missing = "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\n\r\n";
        let _ = conn.get_mut().write_all(missing.as_bytes()).await;
    }
}

fn sse_reply(rpc_method: &str, message: &Value) -> Option<Value> {
    let id = message.get("id")?.clone();
    let result = match rpc_method {
        "initialize" => json!({
            "protocolVersion": "2024-11-05",
            "capabilities": {"tools": {}},
            "serverInfo": {"name": "sse-challenge", "version": "1.0.0"}
        }),
        "tools/list" => json!({"tools": [
            {"name": "A", "inputSchema": {"type": "object"}},
            {"name": "B", "inputSchema": {"type": "object"}}
        ]}),
        _ => json!({}),
    };
    Some(json!({"jsonrpc": "2.0", "id": id, "result": result}))
}

async fn read_http_request(conn: &mut BufReader<TcpStream>) -> Option<(String, String, Vec<u8>)> {
    let mut request_line = String::new();
    if conn.read_line(&mut request_line).await.ok()? == 0 {
        return None;
    }
    let mut parts = request_line.split_whitespace();
    let method = parts.next()?.to_string();
    let target = parts.next()?.to_string();

    let mut content_length = 0;
    loop {
        let mut line = String::new();
        if conn.read_line(&mut line).await.ok()? == 0 {
            return None;
        }
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.eq_ignore_ascii_case("content-length") {
                content_length = value.trim().parse().unwrap_or(0);
            }
        }
    }

    let mut body = vec![0; content_length];
    conn.read_exact(&mut body).await.ok()?;
    Some((method, target, body))
}
