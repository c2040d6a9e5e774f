//! Model Context Protocol (MCP) client and tool provider.

pub mod bridge;
pub mod client;
pub mod transport;

pub use bridge::McpToolProvider;
pub use client::{MCPClient, MCPConnectionState};
pub use transport::{MCPTransport, StdioTransport};
