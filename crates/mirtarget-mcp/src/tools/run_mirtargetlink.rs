//! `run_mirtargetlink` tool: look up miRNA–target interactions for a term.

use std::sync::Arc;
use tokio::sync::Mutex;

use serde::Deserialize;
use serde_json::{json, Value};

use mirtarget_engine::Mode;

use crate::session::LookupSessionManager;
use crate::types::{McpError, McpResult, ToolCallResult, ToolDefinition};

use super::failure_envelope;

pub const NAME: &str = "run_mirtargetlink";

#[derive(Debug, Deserialize)]
struct RunParams {
    #[serde(default)]
    query: String,
    #[serde(default)]
    mode: Option<String>,
}

pub fn definition() -> ToolDefinition {
    let modes: Vec<&str> = Mode::ALL.iter().map(Mode::as_str).collect();
    ToolDefinition {
        name: NAME.to_string(),
        description: Some(
            "Fetch validated or predicted miRNA–target interactions and node annotations \
             via miRTargetLink 2.0. Returns at most 10 rows of each table."
                .to_string(),
        ),
        input_schema: json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "miRNA, gene, or pathway name (e.g. 'TP53', 'hsa-miR-21-5p')"
                },
                "mode": {
                    "type": "string",
                    "enum": modes,
                    "default": Mode::default().as_str(),
                    "description": "Evidence configuration applied before extraction"
                }
            },
            "required": ["query"]
        }),
    }
}

pub async fn execute(
    args: Value,
    session: &Arc<Mutex<LookupSessionManager>>,
) -> McpResult<ToolCallResult> {
    let params: RunParams =
        serde_json::from_value(args).map_err(|e| McpError::InvalidParams(e.to_string()))?;

    // The lookup takes tens of seconds; don't hold the session lock for it.
    let orchestrator = session.lock().await.orchestrator();

    match orchestrator
        .run_raw(&params.query, params.mode.as_deref())
        .await
    {
        Ok(result) => Ok(ToolCallResult::json(&result)),
        Err(e) => {
            let mode = params.mode.as_deref().or(Some(Mode::default().as_str()));
            Ok(ToolCallResult::error_json(&failure_envelope(
                &e,
                &params.query,
                mode,
            )))
        }
    }
}
