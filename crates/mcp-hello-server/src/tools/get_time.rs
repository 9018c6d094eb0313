//! Tool: get_time — read the local clock.

use serde_json::{json, Value};

use mcp_hello_protocol::{McpResult, ToolCallResult, ToolDefinition};

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "get_time".to_string(),
        description: Some("Get the current time".to_string()),
        input_schema: json!({
            "type": "object",
            "properties": {}
        }),
    }
}

pub fn execute(_args: Value) -> McpResult<ToolCallResult> {
    let now = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
    Ok(ToolCallResult::text(format!("Current time: {now}")))
}
