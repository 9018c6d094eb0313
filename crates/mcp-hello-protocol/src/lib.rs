//! Wire types shared by the mcp-hello server and client.
//!
//! Covers JSON-RPC 2.0 framing plus the small slice of MCP the example
//! pair speaks: initialization, tool listing, and tool calls.

pub mod capabilities;
pub mod error;
pub mod framing;
pub mod message;
pub mod request;
pub mod response;

pub use capabilities::*;
pub use error::*;
pub use message::*;
pub use request::*;
pub use response::*;
