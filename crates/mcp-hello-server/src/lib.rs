//! mcp-hello MCP server — four toy tools over newline-delimited JSON-RPC.

pub mod protocol;
pub mod tools;
pub mod transport;

pub use protocol::ProtocolHandler;
pub use transport::StdioTransport;
