//! Reload synchronization: infer when the page's asynchronous table refresh is done.
//!
//! The page exposes no completion event, so completion is inferred from
//! three signals sampled in sequence, each with its own budget:
//!
//! 1. the loading placeholder appears in the table body (soft: a fast
//!    reload may never show it, so its timeout is swallowed);
//! 2. the placeholder is gone again (hard);
//! 3. at least one row is present (hard);
//!
//! followed by a fixed settling pause for trailing layout writes.

use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;

use crate::config::ReloadTimings;
use crate::error::{EngineError, EngineResult, ReloadPhase};
use crate::page::{selectors, PageSession};
use crate::types::ReloadState;

/// Snapshot of a table's text, taken before a reload is triggered.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Capture the current text of a table body (empty if absent).
    pub async fn capture(session: &dyn PageSession, table: &str) -> EngineResult<Self> {
        let text = session
            .text_content(&selectors::body(table))
            .await?
            .unwrap_or_default();
        Ok(Self(text))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// One observation of the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TableSample {
    present: bool,
    loading: bool,
    rows: usize,
}

impl TableSample {
    fn state(&self) -> ReloadState {
        if self.loading {
            ReloadState::LoadingIndicatorVisible
        } else if self.rows > 0 {
            ReloadState::ContentRefreshed
        } else {
            ReloadState::Idle
        }
    }
}

/// What the synchronizer observed during a successful wait.
#[derive(Debug, Clone, Serialize)]
pub struct ReloadReport {
    pub saw_loading: bool,
    pub rows: usize,
    pub elapsed_ms: u64,
    pub final_state: ReloadState,
    /// `false` when the refreshed text equals the pre-reload fingerprint.
    pub content_changed: bool,
}

/// Waits for the table identified by `table` to finish reloading.
pub struct ReloadSynchronizer {
    table: String,
    timings: ReloadTimings,
}

impl ReloadSynchronizer {
    pub fn new(table: &str, timings: ReloadTimings) -> Self {
        Self {
            table: table.to_string(),
            timings,
        }
    }

    /// Synchronizer for the primary interaction table.
    pub fn interactions(timings: ReloadTimings) -> Self {
        Self::new(selectors::INTERACTION_TABLE, timings)
    }

    /// Block until the reload has demonstrably finished.
    ///
    /// Never returns `Ok` while the table has zero rows. `previous` is only
    /// compared for the report; identical content after a real reload is a
    /// legitimate outcome.
    pub async fn await_reload(
        &self,
        session: &dyn PageSession,
        previous: &Fingerprint,
    ) -> EngineResult<ReloadReport> {
        let started = Instant::now();
        tracing::info!("Waiting for {} reload", self.table);

        let saw_loading = self
            .wait_until(session, self.timings.loading_appear(), |s| s.loading)
            .await?
            .is_some();
        if !saw_loading {
            tracing::debug!("Loading placeholder never observed; continuing");
        }

        self.wait_until(session, self.timings.reload(), |s| s.present && !s.loading)
            .await?
            .ok_or_else(|| self.timeout(ReloadPhase::LoadingClearance, self.timings.reload()))?;

        let sample = self
            .wait_until(session, self.timings.row_population(), |s| s.rows > 0)
            .await?
            .ok_or_else(|| {
                self.timeout(ReloadPhase::RowPopulation, self.timings.row_population())
            })?;

        tokio::time::sleep(self.timings.settle()).await;

        let after = Fingerprint::capture(session, &self.table).await?;
        let content_changed = after != *previous;
        if !content_changed {
            tracing::warn!(
                "{} content unchanged after reload (same configuration re-applied?)",
                self.table
            );
        }

        let rows = session.count(&selectors::rows(&self.table)).await?;
        let report = ReloadReport {
            saw_loading,
            rows,
            elapsed_ms: started.elapsed().as_millis() as u64,
            final_state: sample.state(),
            content_changed,
        };

        tracing::info!(
            "Table reloaded successfully ({} rows, {}ms)",
            report.rows,
            report.elapsed_ms
        );
        Ok(report)
    }

    async fn sample(&self, session: &dyn PageSession) -> EngineResult<TableSample> {
        let text = session.text_content(&selectors::body(&self.table)).await?;
        let rows = session.count(&selectors::rows(&self.table)).await?;
        Ok(TableSample {
            present: text.is_some(),
            loading: text
                .as_deref()
                .is_some_and(|t| t.contains(selectors::LOADING_PLACEHOLDER)),
            rows,
        })
    }

    /// Poll until `done` holds or `budget` elapses; `None` on timeout.
    async fn wait_until<F>(
        &self,
        session: &dyn PageSession,
        budget: Duration,
        done: F,
    ) -> EngineResult<Option<TableSample>>
    where
        F: Fn(&TableSample) -> bool,
    {
        let deadline = Instant::now() + budget;
        loop {
            let sample = self.sample(session).await?;
            if done(&sample) {
                return Ok(Some(sample));
            }
            let now = Instant::now();
            if now >= deadline {
                tracing::debug!(state = ?ReloadState::TimedOut, last = ?sample.state(), "phase budget spent");
                return Ok(None);
            }
            tokio::time::sleep(self.timings.poll_interval().min(deadline - now)).await;
        }
    }

    fn timeout(&self, phase: ReloadPhase, budget: Duration) -> EngineError {
        tracing::warn!("{} reload stalled in {phase} phase", self.table);
        EngineError::ReloadTimeout {
            phase,
            waited_ms: budget.as_millis() as u64,
        }
    }
}
