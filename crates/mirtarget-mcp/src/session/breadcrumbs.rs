//! Append-only tool-call history, keyed by session identity.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One recorded tool invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Breadcrumb {
    pub time: DateTime<Utc>,
    pub tool: String,
    pub input: Value,
    pub output: Value,
}

impl Breadcrumb {
    pub fn now(tool: &str, input: Value, output: Value) -> Self {
        Self {
            time: Utc::now(),
            tool: tool.to_string(),
            input,
            output,
        }
    }
}

/// Logs exist only between `open` and `close` of their session.
#[derive(Debug, Default)]
pub struct BreadcrumbStore {
    logs: HashMap<String, Vec<Breadcrumb>>,
}

impl BreadcrumbStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start an empty log for `session_id`. An existing log is kept.
    pub fn open(&mut self, session_id: &str) {
        self.logs.entry(session_id.to_string()).or_default();
    }

    /// Drop the log for `session_id`, returning what it held.
    pub fn close(&mut self, session_id: &str) -> Option<Vec<Breadcrumb>> {
        self.logs.remove(session_id)
    }

    /// Append to an open log. Returns false if the session has no log.
    pub fn append(&mut self, session_id: &str, crumb: Breadcrumb) -> bool {
        match self.logs.get_mut(session_id) {
            Some(log) => {
                log.push(crumb);
                true
            }
            None => false,
        }
    }

    pub fn history(&self, session_id: &str) -> &[Breadcrumb] {
        self.logs.get(session_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn session_count(&self) -> usize {
        self.logs.len()
    }
}
