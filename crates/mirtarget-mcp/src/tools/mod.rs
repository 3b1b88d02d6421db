//! MCP tool implementations.

pub mod fetch_network_export;
pub mod get_breadcrumbs;
pub mod ping;
pub mod registry;
pub mod run_mirtargetlink;

pub use registry::ToolRegistry;

use serde_json::{json, Value};

use mirtarget_engine::EngineError;

/// The in-band failure envelope returned with `isError: true`.
pub fn failure_envelope(err: &EngineError, query: &str, mode: Option<&str>) -> Value {
    json!({
        "success": false,
        "kind": err.kind().as_str(),
        "message": err.to_string(),
        "query": query,
        "mode": mode,
    })
}
