//! Session driver — the client side of the protocol lifecycle.
//!
//! Owns the state machine (`Unopened → Handshaking → Ready → Closed`), the
//! sequential request-identifier counter, and the pending-request table
//! that correlates responses to requests. A background reader task parses
//! incoming lines and fulfills the matching table entry; the sending path
//! suspends on a oneshot until fulfillment.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;

use mcp_hello_protocol::{
    framing, ClientCapabilities, Implementation, InitializeParams, InitializeResult,
    JsonRpcErrorObject, JsonRpcMessage, JsonRpcNotification, JsonRpcRequest, RequestId,
    ToolCallParams, ToolCallResult, ToolDefinition, ToolListResult, MCP_VERSION,
};

use crate::error::{ClientError, ClientResult};

pub const CLIENT_NAME: &str = "mcp-hello-client";
pub const CLIENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default bound on how long a single request may stay outstanding. The
/// base protocol imposes no timeout; this guards against the hang risk.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Driver-side session lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unopened,
    Handshaking,
    Ready,
    Closed,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SessionState::Unopened => "unopened",
            SessionState::Handshaking => "handshaking",
            SessionState::Ready => "ready",
            SessionState::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// What the reader task delivers for a fulfilled request.
enum ServerReply {
    Result(Value),
    Error(JsonRpcErrorObject),
}

type PendingTable = Arc<Mutex<HashMap<i64, oneshot::Sender<ServerReply>>>>;

/// The client side of one session over a bidirectional byte channel.
pub struct SessionDriver {
    state: SessionState,
    next_id: i64,
    pending: PendingTable,
    outbound: Option<mpsc::Sender<String>>,
    request_timeout: Option<Duration>,
    // Set by the reader task when the peer sends an unparseable line.
    remote_closed: Arc<AtomicBool>,
    _reader_task: tokio::task::JoinHandle<()>,
    _writer_task: tokio::task::JoinHandle<()>,
}

impl SessionDriver {
    /// Create a driver over the given byte streams. The session starts
    /// `Unopened`; call [`SessionDriver::open`] to perform the handshake.
    pub fn new<R, W>(reader: R, writer: W) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let pending: PendingTable = Arc::new(Mutex::new(HashMap::new()));
        let remote_closed = Arc::new(AtomicBool::new(false));

        let (outbound_tx, mut outbound_rx) = mpsc::channel::<String>(16);

        let writer_task = {
            let mut writer = BufWriter::new(writer);
            tokio::spawn(async move {
                while let Some(line) = outbound_rx.recv().await {
                    if let Err(e) = writer.write_all(line.as_bytes()).await {
                        tracing::error!("Failed to write to server: {e}");
                        break;
                    }
                    if let Err(e) = writer.flush().await {
                        tracing::error!("Failed to flush to server: {e}");
                        break;
                    }
                }
                // Sender dropped: end-of-input for the peer.
            })
        };

        let reader_task = {
            let pending = Arc::clone(&pending);
            let remote_closed = Arc::clone(&remote_closed);
            tokio::spawn(async move {
                let mut lines = BufReader::new(reader).lines();
                loop {
                    match lines.next_line().await {
                        Ok(Some(line)) => {
                            if let Err(e) = Self::handle_line(&pending, &line) {
                                tracing::warn!("Protocol error from server, closing session: {e}");
                                remote_closed.store(true, Ordering::SeqCst);
                                break;
                            }
                        }
                        Ok(None) => {
                            tracing::debug!("Server closed the channel");
                            break;
                        }
                        Err(e) => {
                            tracing::warn!("Read error from server: {e}");
                            break;
                        }
                    }
                }
                // Unblock any caller still waiting on a response.
                pending.lock().clear();
            })
        };

        Self {
            state: SessionState::Unopened,
            next_id: 1,
            pending,
            outbound: Some(outbound_tx),
            request_timeout: Some(DEFAULT_REQUEST_TIMEOUT),
            remote_closed,
            _reader_task: reader_task,
            _writer_task: writer_task,
        }
    }

    /// Override the per-request timeout. `None` disables it.
    pub fn set_request_timeout(&mut self, timeout: Option<Duration>) {
        self.request_timeout = timeout;
    }

    /// Current lifecycle state. A session the peer tore down reads as
    /// `Closed` even if no local call observed the teardown yet.
    pub fn state(&self) -> SessionState {
        if self.remote_closed.load(Ordering::SeqCst) {
            return SessionState::Closed;
        }
        self.state
    }

    /// Perform the handshake: send `initialize`, await the matching
    /// response, then send the `notifications/initialized` notification.
    /// Any failure leaves the session `Closed`; a half-open handshake
    /// cannot be resumed.
    pub async fn open(&mut self) -> ClientResult<InitializeResult> {
        if self.state() != SessionState::Unopened {
            return Err(ClientError::SessionNotReady(self.state()));
        }
        self.state = SessionState::Handshaking;

        match self.handshake().await {
            Ok(result) => {
                self.state = SessionState::Ready;
                Ok(result)
            }
            Err(e) => {
                self.state = SessionState::Closed;
                Err(e)
            }
        }
    }

    async fn handshake(&mut self) -> ClientResult<InitializeResult> {
        let params = InitializeParams {
            protocol_version: MCP_VERSION.to_string(),
            capabilities: ClientCapabilities::default(),
            client_info: Implementation {
                name: CLIENT_NAME.to_string(),
                version: CLIENT_VERSION.to_string(),
            },
        };

        let value = self
            .request("initialize", Some(serde_json::to_value(params)?))
            .await?;

        let result: InitializeResult = serde_json::from_value(value)
            .map_err(|e| ClientError::Protocol(format!("Invalid initialize response: {e}")))?;

        tracing::info!(
            "Connected to {} v{} (protocol {})",
            result.server_info.name,
            result.server_info.version,
            result.protocol_version
        );

        self.notify("notifications/initialized", None).await?;

        Ok(result)
    }

    /// Fetch the full set of tool descriptors. Only valid in `Ready`.
    pub async fn list_tools(&mut self) -> ClientResult<Vec<ToolDefinition>> {
        self.ensure_ready()?;
        let value = self.request("tools/list", None).await?;
        let result: ToolListResult = serde_json::from_value(value)
            .map_err(|e| ClientError::Protocol(format!("Invalid tools/list response: {e}")))?;
        Ok(result.tools)
    }

    /// Invoke a tool and return its text result. Only valid in `Ready`.
    /// Server-reported errors surface as [`ClientError::Rpc`] with the
    /// original code and message.
    pub async fn invoke(&mut self, name: &str, arguments: Value) -> ClientResult<String> {
        self.ensure_ready()?;

        let params = ToolCallParams {
            name: name.to_string(),
            arguments: Some(arguments),
        };
        let value = self
            .request("tools/call", Some(serde_json::to_value(params)?))
            .await?;

        let result: ToolCallResult = serde_json::from_value(value)
            .map_err(|e| ClientError::Protocol(format!("Invalid tools/call response: {e}")))?;

        result
            .first_text()
            .map(str::to_string)
            .ok_or_else(|| ClientError::Protocol("Tool returned no content".to_string()))
    }

    /// Signal end-of-input to the peer and stop the session. The peer
    /// observes the closed channel as a request to shut down.
    pub fn close(&mut self) {
        self.state = SessionState::Closed;
        // Dropping the sender ends the writer task, which drops the write
        // half and delivers EOF to the peer.
        self.outbound = None;
    }

    fn ensure_ready(&self) -> ClientResult<()> {
        if self.state() != SessionState::Ready {
            return Err(ClientError::SessionNotReady(self.state()));
        }
        Ok(())
    }

    /// Allocate the next identifier, send the request, and suspend until
    /// the correspondingly-identified response arrives.
    async fn request(&mut self, method: &str, params: Option<Value>) -> ClientResult<Value> {
        let id = self.next_id;
        self.next_id += 1;

        let (tx, rx) = oneshot::channel();
        self.pending.lock().insert(id, tx);

        let request = JsonRpcRequest::new(id, method, params);
        if let Err(e) = self.send_line(&serde_json::to_string(&request)?).await {
            self.pending.lock().remove(&id);
            return Err(e);
        }

        let reply = match self.request_timeout {
            Some(limit) => match timeout(limit, rx).await {
                Ok(reply) => reply,
                Err(_) => {
                    self.pending.lock().remove(&id);
                    return Err(ClientError::Timeout(limit));
                }
            },
            None => rx.await,
        };

        match reply {
            Ok(ServerReply::Result(value)) => Ok(value),
            Ok(ServerReply::Error(err)) => Err(ClientError::Rpc {
                code: err.code,
                message: err.message,
            }),
            Err(_) if self.remote_closed.load(Ordering::SeqCst) => Err(ClientError::Protocol(
                "Session closed after a malformed server message".to_string(),
            )),
            Err(_) => Err(ClientError::Transport(
                "Channel closed before the response arrived".to_string(),
            )),
        }
    }

    /// Send a fire-and-forget notification.
    async fn notify(&mut self, method: &str, params: Option<Value>) -> ClientResult<()> {
        let notification = JsonRpcNotification::new(method, params);
        self.send_line(&serde_json::to_string(&notification)?).await
    }

    async fn send_line(&mut self, payload: &str) -> ClientResult<()> {
        let outbound = self
            .outbound
            .as_ref()
            .ok_or_else(|| ClientError::Transport("Channel already closed".to_string()))?;
        outbound
            .send(format!("{payload}\n"))
            .await
            .map_err(|_| ClientError::Transport("Server stdin closed".to_string()))
    }

    /// Reader-task side: parse one incoming line and fulfill the matching
    /// pending entry. Replies with unknown identifiers are dropped. An
    /// unparseable line is a protocol error and the caller tears the
    /// session down rather than reading on.
    fn handle_line(pending: &PendingTable, line: &str) -> ClientResult<()> {
        if line.trim().is_empty() {
            return Ok(());
        }

        let msg = framing::parse_message(line)
            .map_err(|e| ClientError::Protocol(format!("Unparseable message: {e}")))?;

        let (id, reply) = match msg {
            JsonRpcMessage::Response(resp) => (resp.id, ServerReply::Result(resp.result)),
            JsonRpcMessage::Error(err) => (err.id, ServerReply::Error(err.error)),
            JsonRpcMessage::Request(req) => {
                tracing::warn!("Server-initiated request '{}' is unsupported", req.method);
                return Ok(());
            }
            JsonRpcMessage::Notification(n) => {
                tracing::debug!("Server notification: {}", n.method);
                return Ok(());
            }
        };

        let RequestId::Number(id) = id else {
            tracing::warn!("Response with non-numeric id {id} dropped");
            return Ok(());
        };

        match pending.lock().remove(&id) {
            Some(slot) => {
                // The receiver may have timed out already; that's fine.
                let _ = slot.send(reply);
            }
            None => {
                tracing::warn!("Response for unknown request id {id} dropped");
            }
        }

        Ok(())
    }
}
