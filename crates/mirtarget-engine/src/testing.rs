//! Scripted in-memory page for exercising the engine without a browser.
//!
//! Table contents follow a timeline measured from the moment the
//! apply-configuration trigger is clicked, so reload behaviour can be
//! replayed deterministically under a paused tokio clock.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::error::{EngineError, EngineResult};
use crate::page::{selectors, PageSession, SessionFactory};
use crate::types::ControlId;

pub const SCRIPTED_RESULTS_URL: &str =
    "https://ccb-compute.cs.uni-saarland.de/mirtargetlink2/network/scripted";

/// Contents of a table body at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableFrame {
    pub loading: bool,
    pub rows: Vec<Vec<String>>,
}

impl TableFrame {
    pub fn rows(rows: Vec<Vec<String>>) -> Self {
        Self {
            loading: false,
            rows,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn loading() -> Self {
        Self {
            loading: true,
            rows: vec![vec![selectors::LOADING_PLACEHOLDER.to_string()]],
        }
    }

    fn text(&self) -> String {
        if self.loading {
            return selectors::LOADING_PLACEHOLDER.to_string();
        }
        self.rows
            .iter()
            .map(|r| r.join(" "))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, Clone)]
struct ScriptedTable {
    initial: TableFrame,
    timeline: Vec<(Duration, TableFrame)>,
}

/// A page whose DOM is a script.
#[derive(Debug, Clone)]
pub struct ScriptedPage {
    elements: HashSet<String>,
    tables: HashMap<String, ScriptedTable>,
    redirect_to: Option<String>,
    redirect_after: Duration,
    fail_navigation: bool,

    url: String,
    checked: HashMap<String, bool>,
    selected: HashMap<String, String>,
    typed: HashMap<String, String>,
    clicks: Vec<String>,
    change_events: usize,
    submitted_at: Option<Instant>,
    reload_started: Option<Instant>,
    closes: Option<Arc<AtomicUsize>>,
}

impl ScriptedPage {
    /// A page with no elements at all.
    pub fn blank() -> Self {
        Self {
            elements: HashSet::new(),
            tables: HashMap::new(),
            redirect_to: None,
            redirect_after: Duration::ZERO,
            fail_navigation: false,
            url: "about:blank".to_string(),
            checked: HashMap::new(),
            selected: HashMap::new(),
            typed: HashMap::new(),
            clicks: Vec::new(),
            change_events: 0,
            submitted_at: None,
            reload_started: None,
            closes: None,
        }
    }

    /// The search form plus every results-page control; submitting redirects to a network view.
    pub fn results_page() -> Self {
        let mut page = Self::blank()
            .with_element(selectors::SEARCH_INPUT)
            .with_element(selectors::SEARCH_SUBMIT)
            .with_element(selectors::APPLY_CONFIG)
            .redirect_to(Some(SCRIPTED_RESULTS_URL));
        for control in [
            ControlId::WeakEvidence,
            ControlId::StrongEvidence,
            ControlId::PredictedEvidence,
            ControlId::PathwayOverlay,
            ControlId::NeighborExpansion,
            ControlId::Layout,
        ] {
            page = page.with_element(control.selector());
        }
        page
    }

    pub fn with_element(mut self, selector: &str) -> Self {
        self.elements.insert(selector.to_string());
        self
    }

    pub fn without_element(mut self, selector: &str) -> Self {
        self.elements.remove(selector);
        self
    }

    /// Add a table whose body shows `initial` until a reload starts.
    pub fn with_table(mut self, table: &str, initial: TableFrame) -> Self {
        self.tables.insert(
            table.to_string(),
            ScriptedTable {
                initial,
                timeline: Vec::new(),
            },
        );
        self
    }

    /// Frames shown at offsets after the apply trigger is clicked.
    pub fn reload_timeline(mut self, table: &str, mut frames: Vec<(Duration, TableFrame)>) -> Self {
        frames.sort_by_key(|(at, _)| *at);
        self.tables
            .entry(table.to_string())
            .or_insert_with(|| ScriptedTable {
                initial: TableFrame::empty(),
                timeline: Vec::new(),
            })
            .timeline = frames;
        self
    }

    /// Where the page goes after the search is submitted; `None` never redirects.
    pub fn redirect_to(mut self, url: Option<&str>) -> Self {
        self.redirect_to = url.map(str::to_string);
        self
    }

    pub fn redirect_after(mut self, delay: Duration) -> Self {
        self.redirect_after = delay;
        self
    }

    pub fn failing_navigation(mut self) -> Self {
        self.fail_navigation = true;
        self
    }

    pub fn checked(&self, selector: &str) -> Option<bool> {
        self.checked.get(selector).copied()
    }

    pub fn selected(&self, selector: &str) -> Option<String> {
        self.selected.get(selector).cloned()
    }

    pub fn typed(&self, selector: &str) -> Option<String> {
        self.typed.get(selector).cloned()
    }

    pub fn clicks(&self) -> &[String] {
        &self.clicks
    }

    pub fn change_events(&self) -> usize {
        self.change_events
    }

    fn table_for(&self, selector: &str, suffix: &str) -> Option<&ScriptedTable> {
        selector
            .strip_suffix(suffix)
            .and_then(|table| self.tables.get(table))
    }

    fn frame(&self, table: &ScriptedTable) -> TableFrame {
        let Some(started) = self.reload_started else {
            return table.initial.clone();
        };
        let elapsed = started.elapsed();
        table
            .timeline
            .iter()
            .rev()
            .find(|(at, _)| *at <= elapsed)
            .map(|(_, frame)| frame.clone())
            .unwrap_or_else(|| table.initial.clone())
    }
}

#[async_trait]
impl PageSession for ScriptedPage {
    async fn navigate(&mut self, url: &str, _timeout: Duration) -> EngineResult<()> {
        if self.fail_navigation {
            return Err(EngineError::SessionFailure(format!(
                "navigation failed: net::ERR_NAME_NOT_RESOLVED at {url}"
            )));
        }
        self.url = url.to_string();
        Ok(())
    }

    async fn current_url(&self) -> EngineResult<String> {
        if let (Some(at), Some(target)) = (self.submitted_at, &self.redirect_to) {
            if at.elapsed() >= self.redirect_after {
                return Ok(target.clone());
            }
        }
        Ok(self.url.clone())
    }

    async fn exists(&self, selector: &str) -> EngineResult<bool> {
        Ok(self.elements.contains(selector) || self.table_for(selector, " tbody").is_some())
    }

    async fn type_text(
        &mut self,
        selector: &str,
        text: &str,
        key_delay: Duration,
    ) -> EngineResult<()> {
        if !self.elements.contains(selector) {
            return Err(EngineError::ControlNotFound(selector.to_string()));
        }
        let keys = text.chars().count() as u32;
        tokio::time::sleep(key_delay * keys).await;
        self.typed
            .entry(selector.to_string())
            .or_default()
            .push_str(text);
        Ok(())
    }

    async fn click(&mut self, selector: &str) -> EngineResult<bool> {
        if !self.elements.contains(selector) {
            return Ok(false);
        }
        match selector {
            selectors::SEARCH_SUBMIT => self.submitted_at = Some(Instant::now()),
            selectors::APPLY_CONFIG => self.reload_started = Some(Instant::now()),
            _ => {}
        }
        self.clicks.push(selector.to_string());
        Ok(true)
    }

    async fn set_checked(&mut self, selector: &str, checked: bool) -> EngineResult<bool> {
        if !self.elements.contains(selector) {
            return Ok(false);
        }
        self.checked.insert(selector.to_string(), checked);
        self.change_events += 1;
        Ok(true)
    }

    async fn select_value(&mut self, selector: &str, value: &str) -> EngineResult<bool> {
        if !self.elements.contains(selector) {
            return Ok(false);
        }
        self.selected.insert(selector.to_string(), value.to_string());
        self.change_events += 1;
        Ok(true)
    }

    async fn text_content(&self, selector: &str) -> EngineResult<Option<String>> {
        if let Some(table) = self.table_for(selector, " tbody") {
            return Ok(Some(self.frame(table).text()));
        }
        Ok(self.elements.contains(selector).then(String::new))
    }

    async fn count(&self, selector: &str) -> EngineResult<usize> {
        if let Some(table) = self.table_for(selector, " tbody tr") {
            return Ok(self.frame(table).rows.len());
        }
        Ok(usize::from(self.elements.contains(selector)))
    }

    async fn row_cells(&self, row_selector: &str, limit: usize) -> EngineResult<Vec<Vec<String>>> {
        Ok(self
            .table_for(row_selector, " tbody tr")
            .map(|table| self.frame(table).rows.into_iter().take(limit).collect())
            .unwrap_or_default())
    }

    async fn close(self: Box<Self>) -> EngineResult<()> {
        if let Some(closes) = &self.closes {
            closes.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

/// Hands out clones of a scripted page and counts session lifecycles.
pub struct ScriptedFactory {
    template: ScriptedPage,
    fail_open: bool,
    opens: Arc<AtomicUsize>,
    closes: Arc<AtomicUsize>,
}

impl ScriptedFactory {
    pub fn new(template: ScriptedPage) -> Self {
        Self {
            template,
            fail_open: false,
            opens: Arc::new(AtomicUsize::new(0)),
            closes: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A factory whose browser never starts.
    pub fn failing() -> Self {
        Self {
            fail_open: true,
            ..Self::new(ScriptedPage::blank())
        }
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionFactory for ScriptedFactory {
    async fn open(&self) -> EngineResult<Box<dyn PageSession>> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        if self.fail_open {
            return Err(EngineError::SessionFailure(
                "failed to launch Chromium: executable not found".to_string(),
            ));
        }
        let mut page = self.template.clone();
        page.closes = Some(Arc::clone(&self.closes));
        Ok(Box::new(page))
    }
}
