//! Tool: add_numbers — add two numbers.

use serde::Deserialize;
use serde_json::{json, Value};

use mcp_hello_protocol::{McpError, McpResult, ToolCallResult, ToolDefinition};

#[derive(Debug, Deserialize)]
struct AddParams {
    a: f64,
    b: f64,
}

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "add_numbers".to_string(),
        description: Some("Add two numbers together".to_string()),
        input_schema: json!({
            "type": "object",
            "properties": {
                "a": { "type": "number", "description": "First number" },
                "b": { "type": "number", "description": "Second number" }
            },
            "required": ["a", "b"]
        }),
    }
}

pub fn execute(args: Value) -> McpResult<ToolCallResult> {
    let params: AddParams =
        serde_json::from_value(args).map_err(|e| McpError::InvalidParams(e.to_string()))?;

    let sum = params.a + params.b;
    Ok(ToolCallResult::text(format!(
        "{} + {} = {}",
        format_number(params.a),
        format_number(params.b),
        format_number(sum)
    )))
}

/// Print integral values without a trailing `.0`, so `5 + 3 = 8`.
fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}
