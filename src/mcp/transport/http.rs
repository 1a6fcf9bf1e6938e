use std::collections::VecDeque;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::{HeaderMap, ACCEPT, CONTENT_TYPE};
use serde_json::Value;
use tracing::debug;

use super::common::{build_headers, is_response, parse_url, sse_messages};
use super::MCPTransport;
use crate::error::ProbeError;
use crate::mcp::endpoint::Endpoint;

const SESSION_HEADER: &str = "mcp-session-id";

/// Streamable HTTP transport: every message is a POST, replies come back in
/// the response body as JSON or as an event stream.
pub struct StreamableHttpTransport {
    client: reqwest::Client,
    url: reqwest::Url,
    headers: HeaderMap,
    session_id: Option<String>,
    inbox: VecDeque<Value>,
    closed: bool,
}

impl StreamableHttpTransport {
    pub fn new(endpoint: &Endpoint, client: reqwest::Client) -> Result<Self, ProbeError> {
        Ok(Self {
            client,
            url: parse_url(&endpoint.url)?,
            headers: build_headers(&endpoint.headers)?,
            session_id: None,
            inbox: VecDeque::new(),
            closed: false,
        })
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }
}

#[async_trait]
impl MCPTransport for StreamableHttpTransport {
    async fn send(&mut self, message: Value) -> Result<(), ProbeError> {
        if self.closed {
            return Err(ProbeError::Transport("MCP transport closed".into()));
        }

        let mut request = self
            .client
            .post(self.url.clone())
            .headers(self.headers.clone())
            .header(ACCEPT, "application/json, text/event-stream")
            .json(&message);
        if let Some(session_id) = &self.session_id {
            request = request.header(SESSION_HEADER, session_id.as_str());
        }

        let response = request.send().await?;
        if let Some(session_id) = response
            .headers()
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
        {
            self.session_id = Some(session_id.to_string());
        }

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProbeError::Transport(format!(
                "POST {} returned {status}: {body}",
                self.url
            )));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if content_type.starts_with("text/event-stream") {
            let messages = sse_messages(response.bytes_stream());
            futures::pin_mut!(messages);
            while let Some(message) = messages.next().await {
                let message = message?;
                let done = is_response(&message);
                self.inbox.push_back(message);
                if done {
                    break;
                }
            }
            return Ok(());
        }

        let body = response.bytes().await?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(());
        }
        match serde_json::from_slice::<Value>(&body)? {
            Value::Array(batch) => self.inbox.extend(batch),
            single => self.inbox.push_back(single),
        }
        Ok(())
    }

    async fn receive(&mut self) -> Result<Value, ProbeError> {
        if self.closed {
            return Err(ProbeError::Transport("MCP transport closed".into()));
        }
        self.inbox.pop_front().ok_or_else(|| {
            ProbeError::Transport("no pending message from streamable HTTP endpoint".into())
        })
    }

    async fn close(&mut self) -> Result<(), ProbeError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.inbox.clear();
        if let Some(session_id) = self.session_id.take() {
            // Best effort; servers without session support may reject DELETE.
            let result = self
                .client
                .delete(self.url.clone())
                .headers(self.headers.clone())
                .header(SESSION_HEADER, session_id.as_str())
                .send()
                .await;
            if let Err(e) = result {
                debug!(error = %e, "MCP session DELETE failed");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn parses_event_stream_reply_and_tracks_session() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/mcp"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("mcp-session-id", "s-1")
                    .set_body_raw(
                        "event: message\ndata: {\"jsonrpc\":\"2.0\",\"method\":\"notifications/message\"}\n\n\
                         event: message\ndata: {\"jsonrpc\":\"2.0\",\"id\":1,\"result\":{}}\n\n",
                        "text/event-stream",
                    ),
            )
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/mcp"))
            .and(header("mcp-session-id", "s-1"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let endpoint = Endpoint::streamable_http(format!("{}/mcp", server.uri()));
        let mut transport =
            StreamableHttpTransport::new(&endpoint, reqwest::Client::new()).expect("valid");
        transport
            .send(json!({"jsonrpc":"2.0","id":1,"method":"ping"}))
            .await
            .expect("send");
        assert_eq!(transport.session_id(), Some("s-1"));

        let first = transport.receive().await.expect("notification");
        assert_eq!(first["method"], "notifications/message");
        let second = transport.receive().await.expect("response");
        assert_eq!(second["id"], 1);
        assert!(transport.receive().await.is_err());

        transport.close().await.expect("close");
        transport.close().await.expect("second close is a no-op");
    }

    #[tokio::test]
    async fn accepted_notification_has_no_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(202))
            .mount(&server)
            .await;

        let endpoint = Endpoint::streamable_http(format!("{}/mcp", server.uri()));
        let mut transport =
            StreamableHttpTransport::new(&endpoint, reqwest::Client::new()).expect("valid");
        transport
            .send(json!({"jsonrpc":"2.0","method":"notifications/initialized"}))
            .await
            .expect("202 accepted");
        assert!(transport.receive().await.is_err());
    }

    #[tokio::test]
    async fn http_error_status_is_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let endpoint = Endpoint::streamable_http(format!("{}/mcp", server.uri()));
        let mut transport =
            StreamableHttpTransport::new(&endpoint, reqwest::Client::new()).expect("valid");
        let err = transport
            .send(json!({"jsonrpc":"2.0","id":1,"method":"tools/list"}))
            .await
            .expect_err("500 should fail");
        assert!(matches!(err, ProbeError::Transport(message) if message.contains("boom")));
    }
}
