//! mcp-hello MCP client — drives the four-step protocol lifecycle
//! (handshake, tool enumeration, tool invocation, teardown) against an
//! MCP server over newline-delimited JSON-RPC.

pub mod driver;
pub mod error;
pub mod interactive;
pub mod process;

pub use driver::{SessionDriver, SessionState};
pub use error::{ClientError, ClientResult};
pub use process::{ServerProcess, ServerProcessConfig};
