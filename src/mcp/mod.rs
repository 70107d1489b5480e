//! Model Context Protocol over Streamable HTTP.
//!
//! - [`jsonrpc`]: JSON-RPC 2.0 envelopes and message classification
//! - [`server`]: method dispatch (`initialize`, `ping`, `tools/*`)
//! - [`transport`]: per-session protocol state and event stream

pub mod jsonrpc;
pub mod server;
pub mod transport;

pub use jsonrpc::{
    codes, is_initialize_request, JsonRpcError, JsonRpcMessage, JsonRpcNotification,
    JsonRpcRequest, JsonRpcResponse,
};
pub use server::{McpServer, ServerInfo, SUPPORTED_PROTOCOL_VERSIONS};
pub use transport::{EventStream, McpTransport};

/// HTTP header carrying the session id.
pub const SESSION_ID_HEADER: &str = "mcp-session-id";
