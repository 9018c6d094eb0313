//! Integration tests for the mcp-hello server: handshake, dispatch,
//! argument validation, error taxonomy, and transport shutdown behavior.

use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use mcp_hello_protocol::{JsonRpcMessage, MCP_VERSION, SERVER_NAME};
use mcp_hello_server::protocol::ProtocolHandler;
use mcp_hello_server::transport::StdioTransport;

// ─────────────────────── helpers ───────────────────────

/// Build a JSON-RPC request.
fn mcp_request(id: i64, method: &str, params: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": method,
        "params": params
    })
}

/// Build an initialize request.
fn init_request() -> Value {
    mcp_request(
        0,
        "initialize",
        json!({
            "protocolVersion": MCP_VERSION,
            "capabilities": {},
            "clientInfo": { "name": "test-client", "version": "1.0" }
        }),
    )
}

/// Build a tools/call request.
fn call_request(id: i64, tool: &str, arguments: Value) -> Value {
    mcp_request(id, "tools/call", json!({ "name": tool, "arguments": arguments }))
}

/// Send a JSON-RPC message through the handler and return the response.
async fn send(handler: &ProtocolHandler, msg: Value) -> Option<Value> {
    let parsed: JsonRpcMessage = serde_json::from_value(msg).unwrap();
    handler.handle_message(parsed).await
}

/// Send and unwrap the response.
async fn send_unwrap(handler: &ProtocolHandler, msg: Value) -> Value {
    send(handler, msg).await.expect("expected response")
}

/// Extract the text content block from a tools/call response.
fn result_text(resp: &Value) -> &str {
    resp["result"]["content"][0]["text"]
        .as_str()
        .unwrap_or_else(|| panic!("no text content in {resp}"))
}

// ─────────────────────── handshake ───────────────────────

#[tokio::test]
async fn initialize_returns_server_identity() {
    let handler = ProtocolHandler::new();
    let resp = send_unwrap(&handler, init_request()).await;

    let result = &resp["result"];
    assert_eq!(result["protocolVersion"], MCP_VERSION);
    assert_eq!(result["serverInfo"]["name"], SERVER_NAME);
    assert!(result["capabilities"]["tools"].is_object());
}

#[tokio::test]
async fn future_protocol_version_is_tolerated() {
    let handler = ProtocolHandler::new();
    let msg = mcp_request(
        0,
        "initialize",
        json!({
            "protocolVersion": "2099-01-01",
            "capabilities": {},
            "clientInfo": { "name": "future-client", "version": "99.0" }
        }),
    );
    let resp = send_unwrap(&handler, msg).await;

    // Server answers with its own version rather than failing.
    assert_eq!(resp["result"]["protocolVersion"], MCP_VERSION);
}

#[tokio::test]
async fn initialize_without_params_is_invalid() {
    let handler = ProtocolHandler::new();
    let resp = send_unwrap(&handler, json!({"jsonrpc": "2.0", "id": 1, "method": "initialize"})).await;
    assert_eq!(resp["error"]["code"], -32602);
}

#[tokio::test]
async fn initialized_notification_produces_no_response() {
    let handler = ProtocolHandler::new();
    send_unwrap(&handler, init_request()).await;

    let notif = json!({ "jsonrpc": "2.0", "method": "notifications/initialized" });
    let parsed: JsonRpcMessage = serde_json::from_value(notif).unwrap();
    assert!(handler.handle_message(parsed).await.is_none());
}

// ─────────────────────── tools ───────────────────────

#[tokio::test]
async fn tools_list_is_static_and_idempotent() {
    let handler = ProtocolHandler::new();
    send_unwrap(&handler, init_request()).await;

    let expected = ["hello", "echo", "get_time", "add_numbers"];

    for round in 0..3 {
        let resp = send_unwrap(&handler, mcp_request(10 + round, "tools/list", json!(null))).await;
        let names: Vec<&str> = resp["result"]["tools"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, expected, "round {round}");

        // Interleave an invocation; the registry must not change.
        send_unwrap(&handler, call_request(20 + round, "echo", json!({"message": "x"}))).await;
    }
}

#[tokio::test]
async fn hello_greets_by_name() {
    let handler = ProtocolHandler::new();
    send_unwrap(&handler, init_request()).await;

    let resp = send_unwrap(&handler, call_request(1, "hello", json!({"name": "Alice"}))).await;
    assert_eq!(
        result_text(&resp),
        "Hello, Alice! Welcome to the MCP Hello Server!"
    );
}

#[tokio::test]
async fn hello_without_name_is_invalid_params() {
    let handler = ProtocolHandler::new();
    send_unwrap(&handler, init_request()).await;

    let resp = send_unwrap(&handler, call_request(1, "hello", json!({}))).await;
    assert_eq!(resp["error"]["code"], -32602);
}

#[tokio::test]
async fn echo_repeats_the_message() {
    let handler = ProtocolHandler::new();
    send_unwrap(&handler, init_request()).await;

    let resp = send_unwrap(
        &handler,
        call_request(1, "echo", json!({"message": "Hello, MCP!"})),
    )
    .await;
    assert_eq!(result_text(&resp), "Echo: Hello, MCP!");
}

#[tokio::test]
async fn get_time_returns_a_well_formed_timestamp() {
    let handler = ProtocolHandler::new();
    send_unwrap(&handler, init_request()).await;

    let resp = send_unwrap(&handler, call_request(1, "get_time", json!({}))).await;
    let text = result_text(&resp);

    let stamp = text
        .strip_prefix("Current time: ")
        .unwrap_or_else(|| panic!("unexpected get_time text: {text}"));
    chrono::NaiveDateTime::parse_from_str(stamp, "%Y-%m-%d %H:%M:%S")
        .unwrap_or_else(|e| panic!("unparseable timestamp {stamp:?}: {e}"));
}

#[tokio::test]
async fn add_numbers_formats_integral_sums_without_fraction() {
    let handler = ProtocolHandler::new();
    send_unwrap(&handler, init_request()).await;

    let resp = send_unwrap(&handler, call_request(1, "add_numbers", json!({"a": 5, "b": 3}))).await;
    assert_eq!(result_text(&resp), "5 + 3 = 8");
}

#[tokio::test]
async fn add_numbers_keeps_fractional_values() {
    let handler = ProtocolHandler::new();
    send_unwrap(&handler, init_request()).await;

    let resp = send_unwrap(
        &handler,
        call_request(1, "add_numbers", json!({"a": 2.5, "b": 0.25})),
    )
    .await;
    assert_eq!(result_text(&resp), "2.5 + 0.25 = 2.75");
}

#[tokio::test]
async fn add_numbers_rejects_non_numeric_input() {
    let handler = ProtocolHandler::new();
    send_unwrap(&handler, init_request()).await;

    let resp = send_unwrap(
        &handler,
        call_request(1, "add_numbers", json!({"a": "x", "b": 3})),
    )
    .await;
    assert_eq!(resp["error"]["code"], -32602, "got: {resp}");
    assert!(resp.get("result").is_none());
}

#[tokio::test]
async fn add_numbers_with_missing_operand_is_invalid_params() {
    let handler = ProtocolHandler::new();
    send_unwrap(&handler, init_request()).await;

    let resp = send_unwrap(&handler, call_request(1, "add_numbers", json!({"a": 5}))).await;
    assert_eq!(resp["error"]["code"], -32602);
}

// ─────────────────────── error taxonomy ───────────────────────

#[tokio::test]
async fn unknown_tool_is_tool_not_found() {
    let handler = ProtocolHandler::new();
    send_unwrap(&handler, init_request()).await;

    let resp = send_unwrap(&handler, call_request(1, "frobnicate", json!({}))).await;
    assert_eq!(resp["error"]["code"], -32803);
    assert!(resp["error"]["message"]
        .as_str()
        .unwrap()
        .contains("frobnicate"));
}

#[tokio::test]
async fn unknown_method_is_method_not_found() {
    let handler = ProtocolHandler::new();
    send_unwrap(&handler, init_request()).await;

    let resp = send_unwrap(&handler, mcp_request(1, "foo/bar", json!({}))).await;
    assert_eq!(resp["error"]["code"], -32601);
}

#[tokio::test]
async fn wrong_jsonrpc_version_is_invalid_request() {
    let handler = ProtocolHandler::new();
    let msg = json!({"jsonrpc": "1.0", "id": 1, "method": "tools/list"});
    let resp = send_unwrap(&handler, msg).await;
    assert_eq!(resp["error"]["code"], -32600);
}

#[tokio::test]
async fn ping_returns_empty_object() {
    let handler = ProtocolHandler::new();
    let resp = send_unwrap(&handler, mcp_request(1, "ping", json!(null))).await;
    assert_eq!(resp["result"], json!({}));
}

// ─────────────────────── id correlation ───────────────────────

#[tokio::test]
async fn response_id_mirrors_request_id() {
    let handler = ProtocolHandler::new();
    send_unwrap(&handler, init_request()).await;

    let resp = send_unwrap(&handler, call_request(42, "echo", json!({"message": "a"}))).await;
    assert_eq!(resp["id"], 42);

    // String ids are echoed back too, including on errors.
    let msg = json!({
        "jsonrpc": "2.0",
        "id": "req-abc",
        "method": "tools/call",
        "params": { "name": "nope", "arguments": {} }
    });
    let resp = send_unwrap(&handler, msg).await;
    assert_eq!(resp["id"], "req-abc");
}

#[tokio::test]
async fn distinct_requests_get_distinct_results() {
    let handler = ProtocolHandler::new();
    send_unwrap(&handler, init_request()).await;

    let first = send_unwrap(&handler, call_request(1, "echo", json!({"message": "one"}))).await;
    let second = send_unwrap(&handler, call_request(2, "echo", json!({"message": "two"}))).await;

    assert_eq!(first["id"], 1);
    assert_eq!(result_text(&first), "Echo: one");
    assert_eq!(second["id"], 2);
    assert_eq!(result_text(&second), "Echo: two");
}

// ─────────────────────── transport ───────────────────────

/// Wire a transport to in-memory pipes. Returns the client's write and
/// read ends plus the server task handle. Two unidirectional pipes, so
/// dropping the write end delivers EOF to the server.
fn pipe_server() -> (
    tokio::io::DuplexStream,
    tokio::io::DuplexStream,
    tokio::task::JoinHandle<mcp_hello_protocol::McpResult<()>>,
) {
    let (client_write, server_read) = tokio::io::duplex(4096);
    let (server_write, client_read) = tokio::io::duplex(4096);

    let server = tokio::spawn(async move {
        let transport = StdioTransport::new(ProtocolHandler::new());
        transport.run_streams(server_read, server_write).await
    });

    (client_write, client_read, server)
}

#[tokio::test]
async fn transport_answers_over_a_pipe_and_shuts_down_on_eof() {
    let (mut client_write, client_read, server) = pipe_server();
    let mut lines = BufReader::new(client_read).lines();

    client_write
        .write_all(format!("{}\n", init_request()).as_bytes())
        .await
        .unwrap();
    let line = lines.next_line().await.unwrap().unwrap();
    let resp: Value = serde_json::from_str(&line).unwrap();
    assert_eq!(resp["result"]["serverInfo"]["name"], SERVER_NAME);

    // EOF is a shutdown request.
    drop(client_write);
    let outcome = server.await.unwrap();
    assert!(outcome.is_ok());
}

#[tokio::test]
async fn transport_closes_session_on_malformed_input() {
    let (mut client_write, client_read, server) = pipe_server();
    let mut lines = BufReader::new(client_read).lines();

    client_write.write_all(b"{\"broken\":\n").await.unwrap();

    // One parse-error response with null id, then the session closes
    // without waiting for further input.
    let line = lines.next_line().await.unwrap().unwrap();
    let resp: Value = serde_json::from_str(&line).unwrap();
    assert_eq!(resp["error"]["code"], -32700);
    assert_eq!(resp["id"], Value::Null);

    let outcome = server.await.unwrap();
    assert!(outcome.is_ok());
}
