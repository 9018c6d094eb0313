//! Client-side error types.

use std::time::Duration;

use crate::driver::SessionState;

/// All errors the client can surface to its caller.
#[derive(thiserror::Error, Debug)]
pub enum ClientError {
    /// The driver was asked to do something its state machine forbids.
    /// Nothing is written to the wire in this case.
    #[error("Session not ready (state: {0})")]
    SessionNotReady(SessionState),

    /// The server answered with a JSON-RPC error response.
    #[error("Server error {code}: {message}")]
    Rpc { code: i32, message: String },

    /// The peer violated the protocol (unparseable line, missing result,
    /// response for an unknown identifier).
    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type ClientResult<T> = Result<T, ClientError>;
