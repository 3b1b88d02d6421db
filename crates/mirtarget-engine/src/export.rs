//! Best-effort direct network export, bypassing the browser.
//!
//! Known to be unreliable for arbitrary terms: a non-success status is an
//! explicit `Unavailable` result, only transport failures are errors.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::ExportOptions;
use crate::error::{EngineError, EngineResult};

/// Outcome of a network export call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum NetworkExport {
    Available { data: Value },
    Unavailable {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        http_status: Option<u16>,
        reason: String,
    },
}

impl NetworkExport {
    pub fn is_available(&self) -> bool {
        matches!(self, NetworkExport::Available { .. })
    }
}

/// HTTP client for the export endpoint.
#[derive(Clone)]
pub struct NetworkExportClient {
    client: reqwest::Client,
    url_template: String,
}

impl NetworkExportClient {
    pub fn new(options: &ExportOptions) -> Self {
        let ua = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
                  (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(options.timeout_ms))
            .redirect(reqwest::redirect::Policy::limited(5))
            .user_agent(ua)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(
                    "Export client config rejected ({e}); falling back to defaults without timeout"
                );
                reqwest::Client::new()
            });

        Self {
            client,
            url_template: options.url_template.clone(),
        }
    }

    /// Endpoint URL for a term, with the term percent-encoded.
    pub fn url_for(&self, term: &str) -> String {
        let encoded: String = url::form_urlencoded::byte_serialize(term.as_bytes()).collect();
        self.url_template.replace("{query}", &encoded)
    }

    /// Fetch the export for a term.
    pub async fn fetch(&self, term: &str) -> EngineResult<NetworkExport> {
        let url = self.url_for(term);
        tracing::info!("Requesting network export: {url}");

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| EngineError::UpstreamUnavailable(format!("{url}: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            tracing::warn!("Network export unavailable for '{term}' (HTTP {status})");
            return Ok(NetworkExport::Unavailable {
                http_status: Some(status.as_u16()),
                reason: format!("export endpoint answered HTTP {status}"),
            });
        }

        let body = resp
            .text()
            .await
            .map_err(|e| EngineError::UpstreamUnavailable(format!("{url}: {e}")))?;
        let data = serde_json::from_str(&body).unwrap_or(Value::String(body));

        Ok(NetworkExport::Available { data })
    }
}
