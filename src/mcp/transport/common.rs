use std::collections::BTreeMap;
use std::sync::OnceLock;
use std::time::Duration;

use futures::{Stream, StreamExt};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;

use crate::error::ProbeError;

static MCP_CLIENT: OnceLock<reqwest::Client> = OnceLock::new();

/// Shared HTTP client for MCP endpoints.
///
/// Only the connect phase is bounded here; event streams stay open for the
/// life of a session and per-operation deadlines are applied by the caller.
pub fn mcp_http_client() -> &'static reqwest::Client {
    MCP_CLIENT.get_or_init(|| {
        reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .pool_max_idle_per_host(4)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new())
    })
}

pub(super) fn build_headers(headers: &BTreeMap<String, String>) -> Result<HeaderMap, ProbeError> {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
            ProbeError::Configuration(format!("invalid header name '{name}': {e}"))
        })?;
        let value = HeaderValue::from_str(value).map_err(|e| {
            ProbeError::Configuration(format!("invalid value for header '{name}': {e}"))
        })?;
        map.insert(name, value);
    }
    Ok(map)
}

pub(super) fn parse_url(raw: &str) -> Result<reqwest::Url, ProbeError> {
    reqwest::Url::parse(raw)
        .map_err(|e| ProbeError::Configuration(format!("invalid MCP endpoint URL '{raw}': {e}")))
}

/// Decode the data of a `message` event; blank keep-alive payloads yield `None`.
pub(super) fn decode_message(data: &str) -> Result<Option<Value>, ProbeError> {
    let trimmed = data.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    serde_json::from_str(trimmed)
        .map(Some)
        .map_err(|e| ProbeError::Transport(format!("invalid JSON-RPC payload: {e}")))
}

/// Whether a message is a JSON-RPC response (as opposed to a request or notification).
pub(super) fn is_response(message: &Value) -> bool {
    message.get("method").is_none()
        && message.get("id").is_some()
        && (message.get("result").is_some() || message.get("error").is_some())
}

#[derive(Debug, Clone, PartialEq)]
pub(super) struct SseFrame {
    pub event: Option<String>,
    pub data: String,
}

/// Incremental parser for `text/event-stream` bodies.
///
/// Bytes are buffered until a frame is complete, so a multi-byte character
/// split across network chunks is decoded whole.
#[derive(Debug, Default)]
pub(super) struct SseFrameParser {
    buffer: Vec<u8>,
}

impl SseFrameParser {
    pub(super) fn push(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.buffer.extend_from_slice(chunk);
        let mut frames = Vec::new();
        while let Some((end, delimiter)) = frame_boundary(&self.buffer) {
            let raw: Vec<u8> = self.buffer.drain(..end + delimiter).collect();
            if let Some(frame) = parse_frame(&String::from_utf8_lossy(&raw[..end])) {
                frames.push(frame);
            }
        }
        frames
    }

    pub(super) fn finish(&mut self) -> Option<SseFrame> {
        let raw = std::mem::take(&mut self.buffer);
        parse_frame(&String::from_utf8_lossy(&raw))
    }
}

/// Offset and length of the first blank-line delimiter (`\n\n` or `\r\n\r\n`).
fn frame_boundary(buffer: &[u8]) -> Option<(usize, usize)> {
    let lf = buffer.windows(2).position(|w| w == b"\n\n").map(|pos| (pos, 2));
    let crlf = buffer
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .map(|pos| (pos, 4));
    match (lf, crlf) {
        (Some(a), Some(b)) => Some(if a.0 <= b.0 { a } else { b }),
        (a, b) => a.or(b),
    }
}

fn parse_frame(raw: &str) -> Option<SseFrame> {
    let mut event = None;
    let mut data: Vec<&str> = Vec::new();

    for line in raw.lines() {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.is_empty() || line.starts_with(':') {
            continue;
        }
        let (field, value) = match line.find(':') {
            Some(pos) => (&line[..pos], line[pos + 1..].strip_prefix(' ').unwrap_or(&line[pos + 1..])),
            None => (line, ""),
        };
        match field {
            "event" => event = Some(value.to_string()),
            "data" => data.push(value),
            _ => {}
        }
    }

    if data.is_empty() {
        return None;
    }
    Some(SseFrame {
        event,
        data: data.join("\n"),
    })
}

/// JSON-RPC messages carried by an SSE response body.
pub(super) fn sse_messages<S, B>(bytes: S) -> impl Stream<Item = Result<Value, ProbeError>>
where
    S: Stream<Item = Result<B, reqwest::Error>>,
    B: AsRef<[u8]>,
{
    async_stream::try_stream! {
        let mut parser = SseFrameParser::default();
        futures::pin_mut!(bytes);

        while let Some(chunk) = bytes.next().await {
            let chunk = chunk.map_err(ProbeError::Network)?;
            for frame in parser.push(chunk.as_ref()) {
                if !matches!(frame.event.as_deref(), None | Some("message")) {
                    continue;
                }
                if let Some(message) = decode_message(&frame.data)? {
                    yield message;
                }
            }
        }

        if let Some(frame) = parser.finish() {
            if let Some(message) = decode_message(&frame.data)? {
                yield message;
            }
        }
    }
}
