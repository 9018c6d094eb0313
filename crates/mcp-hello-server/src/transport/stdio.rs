//! Stdio transport — reads JSON-RPC from stdin, writes to stdout.

use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

use mcp_hello_protocol::error_codes::{INVALID_REQUEST, PARSE_ERROR};
use mcp_hello_protocol::{framing, JsonRpcError, McpError, McpResult, RequestId};

use crate::protocol::ProtocolHandler;

/// Stdio transport for desktop MCP clients.
pub struct StdioTransport {
    handler: ProtocolHandler,
}

impl StdioTransport {
    pub fn new(handler: ProtocolHandler) -> Self {
        Self { handler }
    }

    /// Run the transport loop — reads from stdin, writes to stdout.
    pub async fn run(&self) -> McpResult<()> {
        self.run_streams(tokio::io::stdin(), tokio::io::stdout())
            .await
    }

    /// Run the transport loop over arbitrary byte streams.
    ///
    /// One message per line, processed strictly sequentially. EOF on the
    /// read side is a shutdown request; protocol-level errors (unparseable
    /// payload, bad jsonrpc version) are answered once and then close the
    /// session rather than attempting recovery.
    pub async fn run_streams<R, W>(&self, reader: R, mut writer: W) -> McpResult<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut reader = BufReader::new(reader);
        let mut line = String::new();

        tracing::info!("Stdio transport started");

        loop {
            line.clear();
            let bytes_read = reader.read_line(&mut line).await.map_err(McpError::Io)?;

            if bytes_read == 0 {
                tracing::info!("EOF on stdin, shutting down");
                break;
            }

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            match framing::parse_message(trimmed) {
                Ok(msg) => {
                    if let Some(response) = self.handler.handle_message(msg).await {
                        Self::write_message(&mut writer, &response).await?;
                        if Self::closes_session(&response) {
                            tracing::warn!("Protocol error reported, closing session");
                            break;
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!("Parse error, closing session: {e}");
                    let error_response = e.to_json_rpc_error(RequestId::Null);
                    let value = Self::error_to_value(error_response)?;
                    Self::write_message(&mut writer, &value).await?;
                    break;
                }
            }
        }

        Ok(())
    }

    async fn write_message<W: AsyncWrite + Unpin>(writer: &mut W, value: &Value) -> McpResult<()> {
        let framed = framing::frame_message(value)?;
        writer
            .write_all(framed.as_bytes())
            .await
            .map_err(McpError::Io)?;
        writer.flush().await.map_err(McpError::Io)
    }

    fn error_to_value(error: JsonRpcError) -> McpResult<Value> {
        serde_json::to_value(error).map_err(|e| McpError::InternalError(e.to_string()))
    }

    /// Error responses in the protocol-error category end the session.
    fn closes_session(response: &Value) -> bool {
        match response
            .get("error")
            .and_then(|e| e.get("code"))
            .and_then(Value::as_i64)
        {
            Some(code) => code == i64::from(PARSE_ERROR) || code == i64::from(INVALID_REQUEST),
            None => false,
        }
    }
}
