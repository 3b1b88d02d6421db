//! Routes parsed JSON-RPC messages to tools, resources and lifecycle handlers.

use std::sync::Arc;
use tokio::sync::Mutex;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::resources::ResourceRegistry;
use crate::session::LookupSessionManager;
use crate::tools::ToolRegistry;
use crate::types::*;

use super::negotiation::NegotiatedCapabilities;
use super::validator::validate_request;

pub struct ProtocolHandler {
    session: Arc<Mutex<LookupSessionManager>>,
    capabilities: Arc<Mutex<NegotiatedCapabilities>>,
}

impl ProtocolHandler {
    pub fn new(session: Arc<Mutex<LookupSessionManager>>) -> Self {
        Self {
            session,
            capabilities: Arc::new(Mutex::new(NegotiatedCapabilities::default())),
        }
    }

    pub fn session(&self) -> &Arc<Mutex<LookupSessionManager>> {
        &self.session
    }

    /// Handle one message. Requests always get a response; notifications never do.
    pub async fn handle_message(&self, msg: JsonRpcMessage) -> Option<Value> {
        match msg {
            JsonRpcMessage::Request(req) => Some(self.handle_request(req).await),
            JsonRpcMessage::Notification(notif) => {
                self.handle_notification(notif).await;
                None
            }
            _ => {
                tracing::warn!("Ignoring response-shaped message from client");
                None
            }
        }
    }

    async fn handle_request(&self, request: JsonRpcRequest) -> Value {
        if let Err(e) = validate_request(&request) {
            return serde_json::to_value(e.to_json_rpc_error(request.id)).unwrap_or_default();
        }

        let id = request.id.clone();
        match self.dispatch_request(request).await {
            Ok(value) => serde_json::to_value(JsonRpcResponse::new(id, value)).unwrap_or_default(),
            Err(e) => {
                tracing::debug!("Request {id} failed: {e}");
                serde_json::to_value(e.to_json_rpc_error(id)).unwrap_or_default()
            }
        }
    }

    async fn dispatch_request(&self, request: JsonRpcRequest) -> McpResult<Value> {
        let params = request.params;
        match request.method.as_str() {
            "initialize" => self.handle_initialize(params).await,
            "shutdown" => self.handle_shutdown().await,
            "ping" => Ok(Value::Object(serde_json::Map::new())),

            "tools/list" => to_result(ToolListResult {
                tools: ToolRegistry::list_tools(),
                next_cursor: None,
            }),
            "tools/call" => {
                let call: ToolCallParams = required_params(params, "Tool call params required")?;
                tracing::info!("tools/call {}", call.name);
                to_result(ToolRegistry::call(&call.name, call.arguments, &self.session).await?)
            }

            "resources/list" => to_result(ResourceListResult {
                resources: ResourceRegistry::list_resources(),
                next_cursor: None,
            }),
            "resources/read" => {
                let read: ResourceReadParams =
                    required_params(params, "Resource read params required")?;
                to_result(ResourceRegistry::read(&read.uri, &self.session).await?)
            }

            other => Err(McpError::MethodNotFound(other.to_string())),
        }
    }

    async fn handle_notification(&self, notification: JsonRpcNotification) {
        match notification.method.as_str() {
            "initialized" | "notifications/initialized" => {
                self.capabilities.lock().await.mark_initialized();
            }
            "notifications/cancelled" => {
                tracing::info!("Cancellation requested; lookups run to completion");
            }
            other => tracing::debug!("Unknown notification: {other}"),
        }
    }

    async fn handle_initialize(&self, params: Option<Value>) -> McpResult<Value> {
        let init: InitializeParams = required_params(params, "Initialize params required")?;
        let result = self.capabilities.lock().await.negotiate(init);
        self.session.lock().await.begin_session();
        to_result(result)
    }

    async fn handle_shutdown(&self) -> McpResult<Value> {
        tracing::info!("Shutdown requested");
        self.session.lock().await.end_session();
        Ok(Value::Object(serde_json::Map::new()))
    }
}

fn required_params<T: DeserializeOwned>(params: Option<Value>, missing: &str) -> McpResult<T> {
    params
        .map(serde_json::from_value)
        .transpose()
        .map_err(|e| McpError::InvalidParams(e.to_string()))?
        .ok_or_else(|| McpError::InvalidParams(missing.to_string()))
}

fn to_result(value: impl Serialize) -> McpResult<Value> {
    serde_json::to_value(value).map_err(|e| McpError::InternalError(e.to_string()))
}
