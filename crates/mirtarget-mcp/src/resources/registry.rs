//! Resource listing and reads.

use std::sync::Arc;
use tokio::sync::Mutex;

use serde::Serialize;
use serde_json::json;

use mirtarget_engine::Mode;

use crate::session::LookupSessionManager;
use crate::types::{
    McpError, McpResult, ReadResourceResult, ResourceContent, ResourceDefinition,
};

pub const MODES_URI: &str = "mirtl://modes";
pub const BREADCRUMBS_URI: &str = "mirtl://breadcrumbs";

pub struct ResourceRegistry;

impl ResourceRegistry {
    pub fn list_resources() -> Vec<ResourceDefinition> {
        vec![
            ResourceDefinition {
                uri: MODES_URI.to_string(),
                name: "Lookup modes".to_string(),
                description: Some(
                    "Control settings each mode applies on the results page".to_string(),
                ),
                mime_type: Some("application/json".to_string()),
            },
            ResourceDefinition {
                uri: BREADCRUMBS_URI.to_string(),
                name: "Session breadcrumbs".to_string(),
                description: Some("Lookups made in the current session".to_string()),
                mime_type: Some("application/json".to_string()),
            },
        ]
    }

    pub async fn read(
        uri: &str,
        session: &Arc<Mutex<LookupSessionManager>>,
    ) -> McpResult<ReadResourceResult> {
        match uri {
            MODES_URI => {
                let modes: Vec<_> = Mode::ALL
                    .iter()
                    .map(|mode| {
                        json!({
                            "mode": mode,
                            "default": *mode == Mode::default(),
                            "settings": mode.control_settings(),
                        })
                    })
                    .collect();
                json_content(uri, &modes)
            }
            BREADCRUMBS_URI => {
                let session = session.lock().await;
                json_content(
                    uri,
                    &json!({
                        "session": session.current_session_id(),
                        "breadcrumbs": session.breadcrumbs(),
                    }),
                )
            }
            _ => Err(McpError::ResourceNotFound(uri.to_string())),
        }
    }
}

fn json_content(uri: &str, value: &impl Serialize) -> McpResult<ReadResourceResult> {
    let text = serde_json::to_string_pretty(value)?;
    Ok(ReadResourceResult {
        contents: vec![ResourceContent {
            uri: uri.to_string(),
            mime_type: Some("application/json".to_string()),
            text: Some(text),
        }],
    })
}
