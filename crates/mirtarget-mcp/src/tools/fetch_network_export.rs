//! `fetch_network_export` tool: direct export call, no browser.

use std::sync::Arc;
use tokio::sync::Mutex;

use serde::Deserialize;
use serde_json::{json, Value};

use mirtarget_engine::Query;

use crate::session::LookupSessionManager;
use crate::types::{McpError, McpResult, ToolCallResult, ToolDefinition};

use super::failure_envelope;

pub const NAME: &str = "fetch_network_export";

#[derive(Debug, Deserialize)]
struct ExportParams {
    #[serde(default)]
    query: String,
}

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: NAME.to_string(),
        description: Some(
            "Best-effort direct download of the miRTargetLink network export for a term. \
             Often unavailable for arbitrary terms; prefer run_mirtargetlink."
                .to_string(),
        ),
        input_schema: json!({
            "type": "object",
            "properties": {
                "query": { "type": "string", "description": "miRNA, gene, or pathway name" }
            },
            "required": ["query"]
        }),
    }
}

pub async fn execute(
    args: Value,
    session: &Arc<Mutex<LookupSessionManager>>,
) -> McpResult<ToolCallResult> {
    let params: ExportParams =
        serde_json::from_value(args).map_err(|e| McpError::InvalidParams(e.to_string()))?;

    let query = match Query::new(&params.query, None) {
        Ok(q) => q,
        Err(e) => {
            return Ok(ToolCallResult::error_json(&failure_envelope(
                &e,
                &params.query,
                None,
            )))
        }
    };

    let orchestrator = session.lock().await.orchestrator();
    match orchestrator.export_client().fetch(query.term()).await {
        Ok(export) => Ok(ToolCallResult::json(&json!({
            "query": query.term(),
            "export": export,
        }))),
        Err(e) => Ok(ToolCallResult::error_json(&failure_envelope(
            &e,
            query.term(),
            None,
        ))),
    }
}
