//! MCP transport layer.

use async_trait::async_trait;

use crate::error::ProbeError;

/// Transport trait for MCP communication.
#[async_trait]
pub trait MCPTransport: Send {
    /// Send a JSON-RPC message.
    async fn send(&mut self, message: serde_json::Value) -> Result<(), ProbeError>;

    /// Receive the next JSON-RPC message.
    async fn receive(&mut self) -> Result<serde_json::Value, ProbeError>;

    /// Close the transport. Calling it again is a no-op.
    async fn close(&mut self) -> Result<(), ProbeError>;
}

mod common;
mod http;
mod sse;

pub use common::mcp_http_client;
pub use http::StreamableHttpTransport;
pub use sse::SseTransport;
