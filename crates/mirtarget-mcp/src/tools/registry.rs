//! Tool registration and dispatch.

use std::sync::Arc;
use tokio::sync::Mutex;

use serde_json::Value;

use crate::session::LookupSessionManager;
use crate::types::{McpError, McpResult, ToolCallResult, ToolDefinition};

use super::{fetch_network_export, get_breadcrumbs, ping, run_mirtargetlink};

/// Tools whose calls are written to the session's breadcrumb log.
const RECORDED_TOOLS: [&str; 2] = [run_mirtargetlink::NAME, fetch_network_export::NAME];

pub struct ToolRegistry;

impl ToolRegistry {
    pub fn list_tools() -> Vec<ToolDefinition> {
        vec![
            run_mirtargetlink::definition(),
            fetch_network_export::definition(),
            get_breadcrumbs::definition(),
            ping::definition(),
        ]
    }

    pub async fn call(
        name: &str,
        arguments: Option<Value>,
        session: &Arc<Mutex<LookupSessionManager>>,
    ) -> McpResult<ToolCallResult> {
        let args = arguments.unwrap_or(Value::Object(serde_json::Map::new()));

        let result = match name {
            run_mirtargetlink::NAME => run_mirtargetlink::execute(args.clone(), session).await?,
            fetch_network_export::NAME => {
                fetch_network_export::execute(args.clone(), session).await?
            }
            get_breadcrumbs::NAME => get_breadcrumbs::execute(args.clone(), session).await?,
            ping::NAME => ping::execute(args.clone()).await?,
            _ => return Err(McpError::ToolNotFound(name.to_string())),
        };

        if RECORDED_TOOLS.contains(&name) {
            session.lock().await.record(name, args, result.payload());
        }

        Ok(result)
    }
}
