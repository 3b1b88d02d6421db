//! Chromium-backed page sessions using chromiumoxide.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use tokio::task::JoinHandle;

use crate::config::BrowserOptions;
use crate::error::{EngineError, EngineResult};
use crate::page::{PageSession, SessionFactory};

/// How long `close` waits for the browser process before killing it.
const BROWSER_EXIT_GRACE: Duration = Duration::from_secs(5);

/// Launches one headless Chromium per session.
pub struct ChromiumSessionFactory {
    options: BrowserOptions,
}

impl ChromiumSessionFactory {
    pub fn new(options: BrowserOptions) -> Self {
        Self { options }
    }

    fn build_config(&self, profile_dir: &Path) -> EngineResult<BrowserConfig> {
        let mut builder = BrowserConfig::builder()
            .user_data_dir(profile_dir)
            .arg("--no-sandbox")
            .arg("--disable-setuid-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions");

        if let Some(path) = &self.options.executable {
            builder = builder.chrome_executable(path);
        }
        if !self.options.headless {
            builder = builder.with_head();
        }
        for arg in &self.options.extra_args {
            builder = builder.arg(arg.as_str());
        }

        builder
            .build()
            .map_err(|e| EngineError::session("failed to build browser config", e))
    }
}

#[async_trait]
impl SessionFactory for ChromiumSessionFactory {
    async fn open(&self) -> EngineResult<Box<dyn PageSession>> {
        let profile_dir =
            std::env::temp_dir().join(format!("mirtl-profile-{}", uuid::Uuid::new_v4()));
        let config = self.build_config(&profile_dir)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| EngineError::session("failed to launch Chromium", e))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("CDP handler event error: {e}");
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                let session = ChromiumSession {
                    browser,
                    page: None,
                    handler_task,
                    profile_dir,
                };
                if let Err(close_err) = Box::new(session).close().await {
                    tracing::debug!("cleanup after failed page open: {close_err}");
                }
                return Err(EngineError::session("failed to open page", e));
            }
        };

        tracing::debug!("Chromium session opened (profile {})", profile_dir.display());

        Ok(Box::new(ChromiumSession {
            browser,
            page: Some(page),
            handler_task,
            profile_dir,
        }))
    }
}

/// A browser process and its single page.
pub struct ChromiumSession {
    browser: Browser,
    page: Option<Page>,
    handler_task: JoinHandle<()>,
    profile_dir: PathBuf,
}

impl ChromiumSession {
    fn page(&self) -> EngineResult<&Page> {
        self.page
            .as_ref()
            .ok_or_else(|| EngineError::SessionFailure("page already closed".to_string()))
    }

    async fn eval<T: DeserializeOwned>(&self, script: String) -> EngineResult<T> {
        let result = self
            .page()?
            .evaluate(script.as_str())
            .await
            .map_err(|e| EngineError::session("script evaluation failed", e))?;

        result
            .into_value()
            .map_err(|e| EngineError::session("unexpected script result", e))
    }
}

/// Run one navigation step within `budget`; an elapsed budget is `NavigationTimeout`.
async fn within_navigation_budget<F: Future>(
    budget: Duration,
    detail: String,
    step: F,
) -> EngineResult<F::Output> {
    tokio::time::timeout(budget, step)
        .await
        .map_err(|_| EngineError::NavigationTimeout {
            detail,
            waited_ms: budget.as_millis() as u64,
        })
}

/// Quote a value as a JavaScript string literal.
fn js_str(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

#[async_trait]
impl PageSession for ChromiumSession {
    async fn navigate(&mut self, url: &str, timeout: Duration) -> EngineResult<()> {
        let page = self.page()?;
        let load = async {
            page.goto(url)
                .await
                .map_err(|e| EngineError::session("navigation failed", e))?;
            if let Err(e) = page.wait_for_navigation().await {
                tracing::debug!("navigation wait for {url} ended with: {e}");
            }
            Ok::<(), EngineError>(())
        };
        within_navigation_budget(timeout, format!("loading {url}"), load).await?
    }

    async fn current_url(&self) -> EngineResult<String> {
        let url = self
            .page()?
            .url()
            .await
            .map_err(|e| EngineError::session("failed to read URL", e))?;
        Ok(url.unwrap_or_default())
    }

    async fn exists(&self, selector: &str) -> EngineResult<bool> {
        self.eval(format!(
            "document.querySelector({}) !== null",
            js_str(selector)
        ))
        .await
    }

    async fn type_text(
        &mut self,
        selector: &str,
        text: &str,
        key_delay: Duration,
    ) -> EngineResult<()> {
        let element = self
            .page()?
            .find_element(selector)
            .await
            .map_err(|_| EngineError::ControlNotFound(selector.to_string()))?;
        element
            .click()
            .await
            .map_err(|e| EngineError::session("failed to focus input", e))?;

        let mut buf = [0u8; 4];
        for ch in text.chars() {
            element
                .type_str(ch.encode_utf8(&mut buf))
                .await
                .map_err(|e| EngineError::session("failed to type", e))?;
            tokio::time::sleep(key_delay).await;
        }
        Ok(())
    }

    async fn click(&mut self, selector: &str) -> EngineResult<bool> {
        self.eval(format!(
            "(() => {{ const el = document.querySelector({}); \
             if (!el) return false; el.click(); return true; }})()",
            js_str(selector)
        ))
        .await
    }

    async fn set_checked(&mut self, selector: &str, checked: bool) -> EngineResult<bool> {
        self.eval(format!(
            "(() => {{ const el = document.querySelector({}); \
             if (!el) return false; el.checked = {checked}; \
             el.dispatchEvent(new Event('change', {{ bubbles: true }})); return true; }})()",
            js_str(selector)
        ))
        .await
    }

    async fn select_value(&mut self, selector: &str, value: &str) -> EngineResult<bool> {
        self.eval(format!(
            "(() => {{ const el = document.querySelector({}); \
             if (!el) return false; el.value = {}; \
             el.dispatchEvent(new Event('input', {{ bubbles: true }})); \
             el.dispatchEvent(new Event('change', {{ bubbles: true }})); return true; }})()",
            js_str(selector),
            js_str(value)
        ))
        .await
    }

    async fn text_content(&self, selector: &str) -> EngineResult<Option<String>> {
        self.eval(format!(
            "(() => {{ const el = document.querySelector({}); \
             return el ? (el.textContent || '') : null; }})()",
            js_str(selector)
        ))
        .await
    }

    async fn count(&self, selector: &str) -> EngineResult<usize> {
        self.eval(format!(
            "document.querySelectorAll({}).length",
            js_str(selector)
        ))
        .await
    }

    async fn row_cells(&self, row_selector: &str, limit: usize) -> EngineResult<Vec<Vec<String>>> {
        self.eval(format!(
            "Array.from(document.querySelectorAll({})).slice(0, {limit}).map(tr => \
             Array.from(tr.querySelectorAll('td')).map(td => td.textContent || ''))",
            js_str(row_selector)
        ))
        .await
    }

    async fn close(self: Box<Self>) -> EngineResult<()> {
        let mut this = *self;

        if let Some(page) = this.page.take() {
            if let Err(e) = page.close().await {
                tracing::debug!("page close failed: {e}");
            }
        }

        let closed = this.browser.close().await;
        let exited = tokio::time::timeout(BROWSER_EXIT_GRACE, this.browser.wait()).await;
        match exited {
            Ok(status) => tracing::debug!("Chromium exited: {status:?}"),
            Err(_) => {
                let killed = this.browser.kill().await;
                tracing::debug!(
                    "Chromium still running after {BROWSER_EXIT_GRACE:?}, killed: {killed:?}"
                );
            }
        }
        this.handler_task.abort();

        if let Err(e) = std::fs::remove_dir_all(&this.profile_dir) {
            tracing::debug!(
                "could not remove profile {}: {e}",
                this.profile_dir.display()
            );
        }

        closed
            .map(|_| ())
            .map_err(|e| EngineError::session("failed to close browser", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::selectors;

    #[test]
    fn test_js_str_escapes_quotes() {
        assert_eq!(js_str("#layoutSelect"), "\"#layoutSelect\"");
        assert_eq!(js_str("a\"b"), "\"a\\\"b\"");
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_navigation_step_times_out() {
        let err = within_navigation_budget(
            Duration::from_secs(60),
            "loading https://example.org".to_string(),
            std::future::pending::<()>(),
        )
        .await
        .unwrap_err();

        match err {
            EngineError::NavigationTimeout { detail, waited_ms } => {
                assert_eq!(detail, "loading https://example.org");
                assert_eq!(waited_ms, 60_000);
            }
            other => panic!("expected NavigationTimeout, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_navigation_step_within_budget_passes_through() {
        let out = within_navigation_budget(Duration::from_secs(1), String::new(), async {
            tokio::time::sleep(Duration::from_millis(400)).await;
            Err::<(), _>(EngineError::SessionFailure("navigation failed".into()))
        })
        .await
        .unwrap();
        assert!(matches!(out, Err(EngineError::SessionFailure(_))));
    }

    #[tokio::test]
    #[ignore] // Requires Chromium to be installed
    async fn test_chromium_reads_a_data_url_table() {
        let factory = ChromiumSessionFactory::new(BrowserOptions::default());
        let mut session = factory.open().await.expect("failed to open session");

        session
            .navigate(
                "data:text/html,<table id='interactionTable'><tbody>\
                 <tr><td> hsa-miR-21-5p </td><td>PTEN</td></tr>\
                 <tr><td>hsa-miR-21-5p</td></tr></tbody></table>\
                 <input type='checkbox' id='targetCheckboxWeak'>",
                Duration::from_secs(10),
            )
            .await
            .expect("navigation failed");

        let rows = session
            .row_cells(&selectors::rows(selectors::INTERACTION_TABLE), 10)
            .await
            .expect("row read failed");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].len(), 1);

        assert!(session
            .set_checked("#targetCheckboxWeak", true)
            .await
            .unwrap());
        assert!(!session.set_checked("#missing", true).await.unwrap());

        session.close().await.expect("close failed");
    }
}
