//! One-shot MCP sessions: connect, handshake, one operation, close.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::client::MCPClient;
use super::endpoint::{Endpoint, TransportKind};
use super::marshal::{normalize, NormalizedPayload};
use super::transport::{mcp_http_client, MCPTransport, SseTransport, StreamableHttpTransport};
use crate::error::{OperationError, ProbeError};
use crate::types::Operation;
use crate::util::timeout::{with_deadline, with_timeout};

pub use crate::config::DEFAULT_OPERATION_TIMEOUT;

/// Teardown gets its own budget and is never cut short by cancellation.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens a connected transport for an endpoint.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn open(&self, endpoint: &Endpoint) -> Result<Box<dyn MCPTransport>, ProbeError>;
}

/// Network connector for SSE and streamable HTTP endpoints.
#[derive(Debug, Clone)]
pub struct HttpConnector {
    client: reqwest::Client,
}

impl HttpConnector {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Default for HttpConnector {
    fn default() -> Self {
        Self::new(mcp_http_client().clone())
    }
}

#[async_trait]
impl Connector for HttpConnector {
    async fn open(&self, endpoint: &Endpoint) -> Result<Box<dyn MCPTransport>, ProbeError> {
        match endpoint.transport {
            TransportKind::Sse => {
                let mut transport = SseTransport::new(endpoint, self.client.clone())?;
                transport.connect().await?;
                Ok(Box::new(transport))
            }
            TransportKind::StreamableHttp => Ok(Box::new(StreamableHttpTransport::new(
                endpoint,
                self.client.clone(),
            )?)),
        }
    }
}

/// Executes operations and returns normalized payloads or typed failures.
#[async_trait]
pub trait OperationExecutor: Send + Sync {
    async fn execute(
        &self,
        operation: &Operation,
        cancel: &CancellationToken,
    ) -> Result<NormalizedPayload, OperationError>;
}

/// Runs every operation in a fresh session against one endpoint.
///
/// Nothing is pooled: each call connects, initializes, sends exactly one
/// operation and closes, so no state carries over between calls. Close is
/// attempted on every path, including timeout and cancellation.
#[derive(Clone)]
pub struct SessionExecutor {
    endpoint: Endpoint,
    connector: Arc<dyn Connector>,
    timeout: Duration,
}

impl SessionExecutor {
    pub fn new(endpoint: Endpoint, timeout: Duration) -> Self {
        Self {
            endpoint,
            connector: Arc::new(HttpConnector::default()),
            timeout,
        }
    }

    pub fn with_connector(mut self, connector: Arc<dyn Connector>) -> Self {
        self.connector = connector;
        self
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Run one operation and return the raw JSON-RPC result.
    pub async fn execute_raw(
        &self,
        operation: &Operation,
        cancel: &CancellationToken,
    ) -> Result<Value, ProbeError> {
        let deadline = tokio::time::Instant::now() + self.timeout;

        let transport = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Err(ProbeError::Canceled("canceled while connecting".into()));
            }
            opened = with_deadline(deadline, self.timeout, self.connector.open(&self.endpoint)) => opened?,
        };
        debug!(endpoint = %self.endpoint.url, "MCP transport open");

        let mut client = MCPClient::new(transport);
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ProbeError::Canceled(format!("{} abandoned", operation.label()))),
            result = with_deadline(deadline, self.timeout, async {
                client.initialize().await?;
                client.execute(operation).await
            }) => result,
        };

        if let Err(error) = with_timeout(CLOSE_TIMEOUT, client.close()).await {
            debug!(error = %error, "MCP session close failed");
        }
        debug!(endpoint = %self.endpoint.url, "MCP session closed");

        outcome
    }
}

#[async_trait]
impl OperationExecutor for SessionExecutor {
    async fn execute(
        &self,
        operation: &Operation,
        cancel: &CancellationToken,
    ) -> Result<NormalizedPayload, OperationError> {
        let label = operation.label();
        match self.execute_raw(operation, cancel).await {
            Ok(raw) => Ok(normalize(&raw, operation.kind())),
            Err(cause) => {
                warn!(operation = %label, error = %cause, "MCP operation failed");
                Err(OperationError::new(label, cause))
            }
        }
    }
}
