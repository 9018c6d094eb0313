//! Tool registration and dispatch.

use serde_json::Value;

use mcp_hello_protocol::{McpError, McpResult, ToolCallResult, ToolDefinition};

use super::{add_numbers, echo, get_time, hello};

/// Static name-to-handler mapping, resolved by exact match.
pub struct ToolRegistry;

impl ToolRegistry {
    pub fn list_tools() -> Vec<ToolDefinition> {
        vec![
            hello::definition(),
            echo::definition(),
            get_time::definition(),
            add_numbers::definition(),
        ]
    }

    pub fn call(name: &str, arguments: Option<Value>) -> McpResult<ToolCallResult> {
        let args = arguments.unwrap_or(Value::Object(serde_json::Map::new()));

        match name {
            "hello" => hello::execute(args),
            "echo" => echo::execute(args),
            "get_time" => get_time::execute(args),
            "add_numbers" => add_numbers::execute(args),
            _ => Err(McpError::ToolNotFound(name.to_string())),
        }
    }
}
