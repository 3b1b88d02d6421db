//! Query orchestration: one query, one session, one linear pass.
//!
//! `Start → Navigated → Submitted → ResultsPageResolved → ConfigApplied →
//! Reloaded → Extracted → Done`, with any stage able to fail. The session is
//! closed exactly once whichever way the pass ends.

use std::fmt;
use std::sync::Arc;

use crate::chromium::ChromiumSessionFactory;
use crate::config::EngineConfig;
use crate::controls::{apply_all, trigger_reload};
use crate::error::{EngineError, EngineResult, ReloadPhase};
use crate::export::{NetworkExport, NetworkExportClient};
use crate::extract::{extract_rows, Extraction, TableStatus};
use crate::page::{selectors, wait_for_results_url, wait_for_selector, PageSession, SessionFactory};
use crate::reload::{Fingerprint, ReloadSynchronizer};
use crate::types::{
    AnalysisResult, ControlId, InteractionRecord, Mode, NodeAnnotationRecord, Query,
};

/// Forward-only progress of one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Start,
    Navigated,
    Submitted,
    ResultsPageResolved,
    ConfigApplied,
    Reloaded,
    Extracted,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Start => "start",
            Stage::Navigated => "navigated",
            Stage::Submitted => "submitted",
            Stage::ResultsPageResolved => "results-page-resolved",
            Stage::ConfigApplied => "config-applied",
            Stage::Reloaded => "reloaded",
            Stage::Extracted => "extracted",
            Stage::Done => "done",
        };
        f.write_str(s)
    }
}

/// Everything read off the page before the session is released.
struct PageOutcome {
    interactions: Extraction<InteractionRecord>,
    nodes: Extraction<NodeAnnotationRecord>,
    skipped: Vec<ControlId>,
}

/// Runs queries against the remote site, one fresh session each.
pub struct QueryOrchestrator {
    config: EngineConfig,
    factory: Arc<dyn SessionFactory>,
    export: NetworkExportClient,
}

impl QueryOrchestrator {
    pub fn new(config: EngineConfig, factory: Arc<dyn SessionFactory>) -> Self {
        let export = NetworkExportClient::new(&config.export);
        Self {
            config,
            factory,
            export,
        }
    }

    /// An orchestrator backed by locally launched Chromium.
    pub fn with_chromium(config: EngineConfig) -> Self {
        let factory = Arc::new(ChromiumSessionFactory::new(config.browser.clone()));
        Self::new(config, factory)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn export_client(&self) -> &NetworkExportClient {
        &self.export
    }

    /// Validate raw invocation arguments, then run. Invalid input never opens a session.
    pub async fn run_raw(&self, term: &str, mode: Option<&str>) -> EngineResult<AnalysisResult> {
        let query = Query::parse(term, mode)?;
        self.run(&query).await
    }

    /// Run several queries strictly one after another, each in its own session.
    pub async fn run_batch(&self, queries: &[Query]) -> Vec<EngineResult<AnalysisResult>> {
        let mut outcomes = Vec::with_capacity(queries.len());
        for query in queries {
            outcomes.push(self.run(query).await);
        }
        outcomes
    }

    /// Run one query end to end.
    pub async fn run(&self, query: &Query) -> EngineResult<AnalysisResult> {
        tracing::info!(
            "Starting miRTargetLink analysis for '{}' (mode: {})",
            query.term(),
            query.mode()
        );

        let mut session = self.factory.open().await?;
        let mut stage = Stage::Start;
        let outcome = self.drive(session.as_mut(), query, &mut stage).await;

        if let Err(e) = session.close().await {
            tracing::warn!("Failed to release browser session: {e}");
        }

        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(stage = %stage, kind = %e.kind(), "Query '{}' failed: {e}", query.term());
                return Err(e);
            }
        };

        let network = match query.mode() {
            Mode::Network => Some(self.fetch_export(query.term()).await),
            _ => None,
        };

        let message = compose_message(query, &outcome, network.as_ref());
        advance(&mut stage, Stage::Done);

        Ok(AnalysisResult {
            success: true,
            query: query.term().to_string(),
            mode: query.mode(),
            message,
            interactions: Some(outcome.interactions.records),
            nodes: Some(outcome.nodes.records),
            skipped_controls: outcome.skipped,
            network,
        })
    }

    async fn drive(
        &self,
        session: &mut dyn PageSession,
        query: &Query,
        stage: &mut Stage,
    ) -> EngineResult<PageOutcome> {
        let cfg = &self.config;
        let poll = cfg.reload.poll_interval();

        session
            .navigate(&cfg.base_url, cfg.navigation_timeout())
            .await?;
        advance(stage, Stage::Navigated);

        if !wait_for_selector(session, selectors::SEARCH_INPUT, cfg.selector_timeout(), poll).await? {
            return Err(EngineError::NavigationTimeout {
                detail: format!("search input {} never appeared", selectors::SEARCH_INPUT),
                waited_ms: cfg.selector_timeout_ms,
            });
        }
        session
            .type_text(selectors::SEARCH_INPUT, query.term(), cfg.key_delay())
            .await?;
        if !session.click(selectors::SEARCH_SUBMIT).await? {
            return Err(EngineError::NavigationTimeout {
                detail: format!("search submit {} not present", selectors::SEARCH_SUBMIT),
                waited_ms: 0,
            });
        }
        advance(stage, Stage::Submitted);

        let url = wait_for_results_url(session, cfg.results_page_timeout(), poll)
            .await?
            .ok_or_else(|| EngineError::NavigationTimeout {
                detail: "no network or unidirectional-search view was reached".to_string(),
                waited_ms: cfg.results_page_timeout_ms,
            })?;
        let body = selectors::body(selectors::INTERACTION_TABLE);
        if !wait_for_selector(session, &body, cfg.selector_timeout(), poll).await? {
            return Err(EngineError::NavigationTimeout {
                detail: format!("{body} never rendered on {url}"),
                waited_ms: cfg.selector_timeout_ms,
            });
        }
        tracing::info!("Results page: {url}");
        advance(stage, Stage::ResultsPageResolved);

        let fingerprint = Fingerprint::capture(session, selectors::INTERACTION_TABLE).await?;
        let mut skipped = apply_all(session, &query.mode().control_settings()).await?;
        match trigger_reload(session).await {
            Ok(()) => {}
            Err(EngineError::ControlNotFound(detail)) => {
                tracing::warn!("Skipping control: {detail}");
                skipped.push(ControlId::ApplyTrigger);
            }
            Err(e) => return Err(e),
        }
        advance(stage, Stage::ConfigApplied);

        let synchronizer = ReloadSynchronizer::interactions(cfg.reload.clone());
        match synchronizer.await_reload(session, &fingerprint).await {
            Ok(_) => {}
            // Table rendered and cleared but stayed empty: this mode has no data.
            Err(EngineError::ReloadTimeout {
                phase: ReloadPhase::RowPopulation,
                waited_ms,
            }) => {
                tracing::warn!(
                    "{} still empty after {waited_ms}ms; treating as no data",
                    selectors::INTERACTION_TABLE
                );
            }
            Err(e) => return Err(e),
        }
        advance(stage, Stage::Reloaded);

        let interactions =
            extract_rows(session, selectors::INTERACTION_TABLE, cfg.row_limit).await?;
        let nodes = extract_rows(session, selectors::NODE_TABLE, cfg.row_limit).await?;
        advance(stage, Stage::Extracted);

        Ok(PageOutcome {
            interactions,
            nodes,
            skipped,
        })
    }

    async fn fetch_export(&self, term: &str) -> NetworkExport {
        match self.export.fetch(term).await {
            Ok(export) => export,
            Err(e) => {
                tracing::warn!("Network export failed for '{term}': {e}");
                NetworkExport::Unavailable {
                    http_status: None,
                    reason: e.to_string(),
                }
            }
        }
    }
}

fn advance(stage: &mut Stage, next: Stage) {
    debug_assert!(next > *stage);
    tracing::info!(stage = %next, "stage reached");
    *stage = next;
}

fn compose_message(
    query: &Query,
    outcome: &PageOutcome,
    network: Option<&NetworkExport>,
) -> String {
    let mut message = format!(
        "miRTargetLink 2.0 analysis completed successfully for '{}' in mode '{}'.",
        query.term(),
        query.mode()
    );

    match outcome.interactions.status {
        TableStatus::Populated => {}
        TableStatus::Empty => message.push_str(" No interaction data available for this mode."),
        TableStatus::Absent => message.push_str(" Interaction table was not found on the page."),
    }
    match outcome.nodes.status {
        TableStatus::Populated => {}
        TableStatus::Empty | TableStatus::Absent => {
            message.push_str(" No node annotations available.")
        }
    }
    if !outcome.skipped.is_empty() {
        let names: Vec<&str> = outcome.skipped.iter().map(ControlId::as_str).collect();
        message.push_str(&format!(" Skipped controls: {}.", names.join(", ")));
    }
    if let Some(NetworkExport::Unavailable { reason, .. }) = network {
        message.push_str(&format!(" Network export unavailable: {reason}."));
    }

    message
}
