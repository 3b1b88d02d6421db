//! `ping` tool: connectivity check.

use serde::Deserialize;
use serde_json::{json, Value};

use crate::types::{McpError, McpResult, ToolCallResult, ToolDefinition};

pub const NAME: &str = "ping";

#[derive(Debug, Deserialize)]
struct PingParams {
    #[serde(default = "default_msg")]
    msg: String,
}

fn default_msg() -> String {
    "hello".to_string()
}

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: NAME.to_string(),
        description: Some("Ping tool for connectivity testing.".to_string()),
        input_schema: json!({
            "type": "object",
            "properties": {
                "msg": { "type": "string", "default": "hello" }
            }
        }),
    }
}

pub async fn execute(args: Value) -> McpResult<ToolCallResult> {
    let params: PingParams =
        serde_json::from_value(args).map_err(|e| McpError::InvalidParams(e.to_string()))?;
    Ok(ToolCallResult::text(format!("pong: {}", params.msg)))
}
