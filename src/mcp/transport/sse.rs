use std::collections::VecDeque;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::HeaderMap;
use reqwest_eventsource::{retry::Never, Event, EventSource};
use serde_json::Value;
use tracing::debug;

use super::common::{build_headers, decode_message, parse_url};
use super::MCPTransport;
use crate::error::ProbeError;
use crate::mcp::endpoint::Endpoint;

/// Legacy HTTP+SSE transport.
///
/// Opens an event stream on the endpoint URL, waits for the `endpoint` event
/// announcing where to POST messages, and reads responses from `message` events.
pub struct SseTransport {
    client: reqwest::Client,
    url: reqwest::Url,
    headers: HeaderMap,
    source: Option<EventSource>,
    message_url: Option<reqwest::Url>,
    inbox: VecDeque<Value>,
    closed: bool,
}

impl SseTransport {
    pub fn new(endpoint: &Endpoint, client: reqwest::Client) -> Result<Self, ProbeError> {
        Ok(Self {
            client,
            url: parse_url(&endpoint.url)?,
            headers: build_headers(&endpoint.headers)?,
            source: None,
            message_url: None,
            inbox: VecDeque::new(),
            closed: false,
        })
    }

    /// URL announced by the server's `endpoint` event, once connected.
    pub fn message_url(&self) -> Option<&reqwest::Url> {
        self.message_url.as_ref()
    }

    /// Open the event stream and wait for the message endpoint announcement.
    pub async fn connect(&mut self) -> Result<(), ProbeError> {
        if self.closed {
            return Err(ProbeError::Transport("MCP transport closed".into()));
        }
        if self.message_url.is_some() {
            return Ok(());
        }

        let request = self
            .client
            .get(self.url.clone())
            .headers(self.headers.clone());
        let mut source = EventSource::new(request)
            .map_err(|e| ProbeError::Transport(format!("cannot open SSE stream: {e}")))?;
        source.set_retry_policy(Box::new(Never));

        loop {
            match source.next().await {
                Some(Ok(Event::Open)) => debug!(url = %self.url, "SSE stream open"),
                Some(Ok(Event::Message(event))) if event.event == "endpoint" => {
                    let message_url = resolve_endpoint(&self.url, &event.data)?;
                    debug!(url = %message_url, "discovered MCP message endpoint");
                    self.message_url = Some(message_url);
                    break;
                }
                Some(Ok(Event::Message(event))) => {
                    if let Some(message) = decode_message(&event.data)? {
                        self.inbox.push_back(message);
                    }
                }
                Some(Err(reqwest_eventsource::Error::StreamEnded)) | None => {
                    source.close();
                    return Err(ProbeError::Transport(
                        "SSE stream closed before endpoint event".into(),
                    ));
                }
                Some(Err(e)) => {
                    source.close();
                    return Err(ProbeError::Transport(format!(
                        "SSE connect to {} failed: {e}",
                        self.url
                    )));
                }
            }
        }

        self.source = Some(source);
        Ok(())
    }
}

#[async_trait]
impl MCPTransport for SseTransport {
    async fn send(&mut self, message: Value) -> Result<(), ProbeError> {
        if self.closed {
            return Err(ProbeError::Transport("MCP transport closed".into()));
        }
        let url = self
            .message_url
            .clone()
            .ok_or_else(|| ProbeError::InvalidState("SSE transport is not connected".into()))?;

        let response = self
            .client
            .post(url.clone())
            .headers(self.headers.clone())
            .json(&message)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProbeError::Transport(format!(
                "POST {url} returned {status}: {body}"
            )));
        }
        Ok(())
    }

    async fn receive(&mut self) -> Result<Value, ProbeError> {
        if self.closed {
            return Err(ProbeError::Transport("MCP transport closed".into()));
        }
        if let Some(message) = self.inbox.pop_front() {
            return Ok(message);
        }
        let source = self
            .source
            .as_mut()
            .ok_or_else(|| ProbeError::InvalidState("SSE transport is not connected".into()))?;

        loop {
            match source.next().await {
                Some(Ok(Event::Open)) => {}
                Some(Ok(Event::Message(event))) => match event.event.as_str() {
                    "message" | "" => {
                        if let Some(message) = decode_message(&event.data)? {
                            return Ok(message);
                        }
                    }
                    other => debug!(event = other, "ignoring SSE event"),
                },
                Some(Err(reqwest_eventsource::Error::StreamEnded)) | None => {
                    return Err(ProbeError::Transport("SSE stream closed by server".into()));
                }
                Some(Err(e)) => {
                    return Err(ProbeError::Transport(format!("SSE stream error: {e}")));
                }
            }
        }
    }

    async fn close(&mut self) -> Result<(), ProbeError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.inbox.clear();
        if let Some(mut source) = self.source.take() {
            source.close();
        }
        debug!(url = %self.url, "SSE transport closed");
        Ok(())
    }
}

impl Drop for SseTransport {
    fn drop(&mut self) {
        if let Some(source) = self.source.as_mut() {
            source.close();
        }
    }
}

/// Resolve the `endpoint` event payload against the stream URL.
///
/// The payload is either a plain (possibly relative) URI or `{"uri": "..."}`.
fn resolve_endpoint(base: &reqwest::Url, data: &str) -> Result<reqwest::Url, ProbeError> {
    let data = data.trim();
    let raw = if data.starts_with('{') {
        let value: Value = serde_json::from_str(data)
            .map_err(|e| ProbeError::Transport(format!("invalid endpoint event: {e}")))?;
        value
            .get("uri")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| ProbeError::Transport("endpoint event missing 'uri'".into()))?
    } else {
        data.to_string()
    };

    base.join(&raw)
        .map_err(|e| ProbeError::Transport(format!("invalid message endpoint '{raw}': {e}")))
}
