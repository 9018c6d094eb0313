//! Tool: echo — repeat a message back.

use serde::Deserialize;
use serde_json::{json, Value};

use mcp_hello_protocol::{McpError, McpResult, ToolCallResult, ToolDefinition};

#[derive(Debug, Deserialize)]
struct EchoParams {
    message: String,
}

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "echo".to_string(),
        description: Some("Echo back the provided message".to_string()),
        input_schema: json!({
            "type": "object",
            "properties": {
                "message": { "type": "string", "description": "The message to echo back" }
            },
            "required": ["message"]
        }),
    }
}

pub fn execute(args: Value) -> McpResult<ToolCallResult> {
    let params: EchoParams =
        serde_json::from_value(args).map_err(|e| McpError::InvalidParams(e.to_string()))?;

    Ok(ToolCallResult::text(format!("Echo: {}", params.message)))
}
