//! Model Context Protocol client side: transports, sessions and result normalization.

pub mod client;
pub mod endpoint;
pub mod jsonrpc;
pub mod marshal;
pub mod session;
pub mod transport;

pub use client::{MCPClient, MCPConnectionState, ServerDetails};
pub use endpoint::{Endpoint, TransportKind};
pub use marshal::{
    normalize, ContentRecord, DescriptorEntry, NormalizedPayload, PromptDescriptor,
    ResourceDescriptor, ToolDescriptor,
};
pub use session::{
    Connector, HttpConnector, OperationExecutor, SessionExecutor, DEFAULT_OPERATION_TIMEOUT,
};
pub use transport::{MCPTransport, SseTransport, StreamableHttpTransport};
