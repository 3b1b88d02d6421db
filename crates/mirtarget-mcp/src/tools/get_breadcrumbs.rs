//! `get_breadcrumbs` tool: this session's lookup history.

use std::sync::Arc;
use tokio::sync::Mutex;

use serde_json::{json, Value};

use crate::session::LookupSessionManager;
use crate::types::{McpResult, ToolCallResult, ToolDefinition};

pub const NAME: &str = "get_breadcrumbs";

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: NAME.to_string(),
        description: Some("Return previous lookups made in this session.".to_string()),
        input_schema: json!({ "type": "object", "properties": {} }),
    }
}

pub async fn execute(
    _args: Value,
    session: &Arc<Mutex<LookupSessionManager>>,
) -> McpResult<ToolCallResult> {
    let session = session.lock().await;
    Ok(ToolCallResult::json(&session.breadcrumbs()))
}
