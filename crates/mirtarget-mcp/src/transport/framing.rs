//! One JSON-RPC message per line.

use serde_json::Value;

use crate::types::{JsonRpcError, JsonRpcMessage, McpError, McpResult, RequestId};

pub fn parse_message(line: &str) -> McpResult<JsonRpcMessage> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Err(McpError::ParseError("Empty message".to_string()));
    }
    serde_json::from_str(trimmed).map_err(|e| McpError::ParseError(e.to_string()))
}

pub fn frame_message(value: &Value) -> McpResult<String> {
    let mut json = serde_json::to_string(value)?;
    json.push('\n');
    Ok(json)
}

/// Response for a line that could not be parsed; the id is unknown.
pub fn parse_error_response(err: &McpError) -> McpResult<Value> {
    let response = JsonRpcError::new(RequestId::Null, err.code(), err.to_string());
    Ok(serde_json::to_value(response)?)
}
