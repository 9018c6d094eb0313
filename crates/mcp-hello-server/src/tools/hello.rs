//! Tool: hello — greet someone by name.

use serde::Deserialize;
use serde_json::{json, Value};

use mcp_hello_protocol::{McpError, McpResult, ToolCallResult, ToolDefinition};

#[derive(Debug, Deserialize)]
struct HelloParams {
    name: String,
}

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "hello".to_string(),
        description: Some("Say hello to someone".to_string()),
        input_schema: json!({
            "type": "object",
            "properties": {
                "name": { "type": "string", "description": "The name of the person to greet" }
            },
            "required": ["name"]
        }),
    }
}

pub fn execute(args: Value) -> McpResult<ToolCallResult> {
    let params: HelloParams =
        serde_json::from_value(args).map_err(|e| McpError::InvalidParams(e.to_string()))?;

    Ok(ToolCallResult::text(format!(
        "Hello, {}! Welcome to the MCP Hello Server!",
        params.name
    )))
}
