//! MCP server endpoint addresses.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Wire transport spoken by an endpoint.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum TransportKind {
    /// Legacy HTTP+SSE: GET an event stream, POST to the announced endpoint.
    #[default]
    Sse,
    /// Streamable HTTP: POST each message, response carries JSON or an SSE body.
    StreamableHttp,
}

/// One MCP server endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub url: String,
    #[serde(default)]
    pub transport: TransportKind,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
}

impl Endpoint {
    /// Create an endpoint, picking SSE when the URL path ends in `/sse`.
    pub fn new(url: impl Into<String>) -> Self {
        let url = url.into();
        let transport = detect_transport(&url);
        Self {
            url,
            transport,
            headers: BTreeMap::new(),
        }
    }

    pub fn sse(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            transport: TransportKind::Sse,
            headers: BTreeMap::new(),
        }
    }

    pub fn streamable_http(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            transport: TransportKind::StreamableHttp,
            headers: BTreeMap::new(),
        }
    }

    /// Local challenge server endpoint: `http://localhost:{9000 + id}/sse`.
    pub fn local_challenge(id: u32) -> Self {
        Self::sse(format!("http://localhost:{}/sse", 9000 + id))
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

fn detect_transport(url: &str) -> TransportKind {
    let path = url.split(|c| c == '?' || c == '#').next().unwrap_or(url);
    if path.trim_end_matches('/').ends_with("/sse") {
        TransportKind::Sse
    } else {
        TransportKind::StreamableHttp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_transport_from_path() {
        assert_eq!(
            Endpoint::new("http://localhost:9001/sse").transport,
            TransportKind::Sse
        );
        assert_eq!(
            Endpoint::new("http://localhost:9001/sse/?x=1").transport,
            TransportKind::Sse
        );
        assert_eq!(
            Endpoint::new("http://localhost:8080/mcp").transport,
            TransportKind::StreamableHttp
        );
    }

    #[test]
    fn local_challenge_uses_offset_port() {
        assert_eq!(Endpoint::local_challenge(7).url, "http://localhost:9007/sse");
        assert_eq!(
            "streamable-http".parse::<TransportKind>().ok(),
            Some(TransportKind::StreamableHttp)
        );
    }
}
