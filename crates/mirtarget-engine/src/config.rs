//! Engine configuration: remote endpoints, timing budgets, browser launch options.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

pub const DEFAULT_BASE_URL: &str = "https://ccb-compute.cs.uni-saarland.de/mirtargetlink2/";
pub const DEFAULT_EXPORT_URL: &str =
    "https://ccb-compute.cs.uni-saarland.de/mirtargetlink2/api/network/?query={query}";

/// Environment variable overriding the browser executable.
pub const CHROME_PATH_ENV: &str = "MIRTL_CHROME_PATH";
/// Environment variable overriding the remote home page.
pub const BASE_URL_ENV: &str = "MIRTL_BASE_URL";
/// Environment variable overriding the network export URL template.
pub const EXPORT_URL_ENV: &str = "MIRTL_EXPORT_URL";

/// Everything the engine needs to drive one query.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub base_url: String,
    pub navigation_timeout_ms: u64,
    pub selector_timeout_ms: u64,
    pub results_page_timeout_ms: u64,
    pub key_delay_ms: u64,
    pub row_limit: usize,
    pub reload: ReloadTimings,
    pub browser: BrowserOptions,
    pub export: ExportOptions,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            navigation_timeout_ms: 60_000,
            selector_timeout_ms: 60_000,
            results_page_timeout_ms: 60_000,
            key_delay_ms: 50,
            row_limit: 10,
            reload: ReloadTimings::default(),
            browser: BrowserOptions::default(),
            export: ExportOptions::default(),
        }
    }
}

/// Budgets for the reload synchronizer's phases.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReloadTimings {
    /// Soft budget for the loading placeholder to appear.
    pub loading_appear_timeout_ms: u64,
    /// Hard budget for the loading placeholder to clear.
    pub reload_timeout_ms: u64,
    /// Hard budget for the first row to appear.
    pub row_population_timeout_ms: u64,
    pub settle_delay_ms: u64,
    pub poll_interval_ms: u64,
}

impl Default for ReloadTimings {
    fn default() -> Self {
        Self {
            loading_appear_timeout_ms: 20_000,
            reload_timeout_ms: 120_000,
            row_population_timeout_ms: 30_000,
            settle_delay_ms: 2_500,
            poll_interval_ms: 250,
        }
    }
}

impl ReloadTimings {
    pub fn loading_appear(&self) -> Duration {
        Duration::from_millis(self.loading_appear_timeout_ms)
    }

    pub fn reload(&self) -> Duration {
        Duration::from_millis(self.reload_timeout_ms)
    }

    pub fn row_population(&self) -> Duration {
        Duration::from_millis(self.row_population_timeout_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

/// How the local browser is launched.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserOptions {
    /// Explicit browser binary; `None` uses the browser library's own detection.
    pub executable: Option<PathBuf>,
    pub headless: bool,
    pub extra_args: Vec<String>,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            executable: None,
            headless: true,
            extra_args: Vec::new(),
        }
    }
}

/// Direct network export endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    /// URL with a `{query}` placeholder.
    pub url_template: String,
    pub timeout_ms: u64,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            url_template: DEFAULT_EXPORT_URL.to_string(),
            timeout_ms: 30_000,
        }
    }
}

impl EngineConfig {
    /// Load a JSON config file; missing keys take their defaults.
    pub fn from_file(path: &Path) -> EngineResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            EngineError::Validation(format!("Cannot read config {}: {e}", path.display()))
        })?;
        serde_json::from_str(&text).map_err(|e| {
            EngineError::Validation(format!("Invalid config {}: {e}", path.display()))
        })
    }

    /// Apply `MIRTL_*` environment overrides.
    pub fn apply_env(mut self) -> Self {
        if let Ok(url) = std::env::var(BASE_URL_ENV) {
            self.base_url = url;
        }
        if let Ok(url) = std::env::var(EXPORT_URL_ENV) {
            self.export.url_template = url;
        }
        if let Some(path) = resolve_browser_path(None) {
            self.browser.executable = Some(path);
        }
        self
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }

    pub fn selector_timeout(&self) -> Duration {
        Duration::from_millis(self.selector_timeout_ms)
    }

    pub fn results_page_timeout(&self) -> Duration {
        Duration::from_millis(self.results_page_timeout_ms)
    }

    pub fn key_delay(&self) -> Duration {
        Duration::from_millis(self.key_delay_ms)
    }
}

/// Resolve the browser binary override: explicit path, then `MIRTL_CHROME_PATH`.
pub fn resolve_browser_path(explicit: Option<&str>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(PathBuf::from(path));
    }

    std::env::var(CHROME_PATH_ENV)
        .ok()
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from)
}
