//! Page session abstraction over the automated browser.
//!
//! The engine only talks to the remote page through `PageSession`; the
//! Chromium backend lives in [`crate::chromium`] and a scripted in-memory
//! page in `testing`.

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::error::EngineResult;

/// Selectors and markers of the remote results page.
///
/// These are a versioned external contract; a redesign of the site breaks them.
pub mod selectors {
    pub const SEARCH_INPUT: &str = "input.form-control";
    pub const SEARCH_SUBMIT: &str = "button.btn.btn-info";
    pub const APPLY_CONFIG: &str = "#updateConfig";
    pub const INTERACTION_TABLE: &str = "#interactionTable";
    pub const NODE_TABLE: &str = "#nodeTable";
    pub const LOADING_PLACEHOLDER: &str = "Loading...";
    /// Cell the grid renders in place of rows when a table has no data.
    pub const EMPTY_TABLE_CELL: &str = "td.dataTables_empty";
    pub const RESULT_URL_MARKERS: [&str; 2] = ["/network/", "/unidirectional_search/"];

    /// Body element of a table.
    pub fn body(table: &str) -> String {
        format!("{table} tbody")
    }

    /// The "no data" placeholder cell of a table body.
    pub fn empty_marker(table: &str) -> String {
        format!("{table} tbody {EMPTY_TABLE_CELL}")
    }

    /// Row elements of a table body.
    pub fn rows(table: &str) -> String {
        format!("{table} tbody tr")
    }
}

/// An exclusively-owned automated browsing context for one query.
#[async_trait]
pub trait PageSession: Send + Sync {
    /// Navigate to a URL, failing if the load exceeds `timeout`.
    async fn navigate(&mut self, url: &str, timeout: Duration) -> EngineResult<()>;
    /// Current address of the page.
    async fn current_url(&self) -> EngineResult<String>;
    /// Whether an element matching `selector` exists right now.
    async fn exists(&self, selector: &str) -> EngineResult<bool>;
    /// Type text into an input, one key at a time.
    async fn type_text(&mut self, selector: &str, text: &str, key_delay: Duration)
        -> EngineResult<()>;
    /// Click an element. Returns `false` if it is absent.
    async fn click(&mut self, selector: &str) -> EngineResult<bool>;
    /// Set a checkbox or switch and dispatch `change`. Returns `false` if absent.
    async fn set_checked(&mut self, selector: &str, checked: bool) -> EngineResult<bool>;
    /// Choose a dropdown value and dispatch `change`. Returns `false` if absent.
    async fn select_value(&mut self, selector: &str, value: &str) -> EngineResult<bool>;
    /// Raw text content of an element, `None` if absent.
    async fn text_content(&self, selector: &str) -> EngineResult<Option<String>>;
    /// Number of elements matching `selector`.
    async fn count(&self, selector: &str) -> EngineResult<usize>;
    /// Raw `td` texts of the first `limit` rows matching `row_selector`, in document order.
    async fn row_cells(&self, row_selector: &str, limit: usize) -> EngineResult<Vec<Vec<String>>>;
    /// Release the browsing context.
    async fn close(self: Box<Self>) -> EngineResult<()>;
}

/// Creates one fresh page session per query.
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn open(&self) -> EngineResult<Box<dyn PageSession>>;
}

/// Poll until `selector` exists or `timeout` elapses. Returns whether it appeared.
pub async fn wait_for_selector(
    session: &dyn PageSession,
    selector: &str,
    timeout: Duration,
    interval: Duration,
) -> EngineResult<bool> {
    let deadline = Instant::now() + timeout;
    loop {
        if session.exists(selector).await? {
            return Ok(true);
        }
        let now = Instant::now();
        if now >= deadline {
            return Ok(false);
        }
        tokio::time::sleep(interval.min(deadline - now)).await;
    }
}

/// Poll the page address until it matches one of the results-page shapes.
pub async fn wait_for_results_url(
    session: &dyn PageSession,
    timeout: Duration,
    interval: Duration,
) -> EngineResult<Option<String>> {
    let deadline = Instant::now() + timeout;
    loop {
        let url = session.current_url().await?;
        if selectors::RESULT_URL_MARKERS
            .iter()
            .any(|marker| url.contains(marker))
        {
            return Ok(Some(url));
        }
        let now = Instant::now();
        if now >= deadline {
            return Ok(None);
        }
        tokio::time::sleep(interval.min(deadline - now)).await;
    }
}
