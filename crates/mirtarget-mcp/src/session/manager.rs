//! Session lifecycle around one stdio connection.

use std::sync::Arc;

use serde_json::Value;

use mirtarget_engine::QueryOrchestrator;

use super::breadcrumbs::{Breadcrumb, BreadcrumbStore};

/// Owns the lookup engine and the breadcrumb log for the current MCP session.
pub struct LookupSessionManager {
    orchestrator: Arc<QueryOrchestrator>,
    breadcrumbs: BreadcrumbStore,
    current: Option<String>,
}

impl LookupSessionManager {
    pub fn new(orchestrator: QueryOrchestrator) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            breadcrumbs: BreadcrumbStore::new(),
            current: None,
        }
    }

    /// Shared handle to the engine, so long lookups can run without holding the session lock.
    pub fn orchestrator(&self) -> Arc<QueryOrchestrator> {
        Arc::clone(&self.orchestrator)
    }

    /// Mint a session id and open its log. A still-open previous session is ended first.
    pub fn begin_session(&mut self) -> String {
        self.end_session();
        let id = uuid::Uuid::new_v4().to_string();
        self.breadcrumbs.open(&id);
        tracing::info!("Session {id} started");
        self.current = Some(id.clone());
        id
    }

    /// End the current session and discard its log.
    pub fn end_session(&mut self) -> Option<String> {
        let id = self.current.take()?;
        let dropped = self.breadcrumbs.close(&id).map(|log| log.len()).unwrap_or(0);
        tracing::info!("Session {id} ended ({dropped} breadcrumbs dropped)");
        Some(id)
    }

    pub fn current_session_id(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Record a tool call against the current session. Calls outside a session are not kept.
    pub fn record(&mut self, tool: &str, input: Value, output: Value) {
        match &self.current {
            Some(id) => {
                self.breadcrumbs.append(id, Breadcrumb::now(tool, input, output));
            }
            None => tracing::debug!("No active session; {tool} call not recorded"),
        }
    }

    pub fn breadcrumbs(&self) -> &[Breadcrumb] {
        match &self.current {
            Some(id) => self.breadcrumbs.history(id),
            None => &[],
        }
    }
}
