//! Core data types: queries, modes, control settings, and extracted records.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::export::NetworkExport;

/// Longest search term the remote search box is fed.
pub const MAX_TERM_LEN: usize = 256;

/// Which evidence configuration is applied before extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Validated,
    Predicted,
    Network,
}

impl Mode {
    pub const ALL: [Mode; 3] = [Mode::Validated, Mode::Predicted, Mode::Network];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Validated => "validated",
            Mode::Predicted => "predicted",
            Mode::Network => "network",
        }
    }

    /// The ordered control settings this mode applies before a reload.
    ///
    /// `Network` drives the page with the validated configuration; the
    /// network export is fetched separately by the orchestrator.
    pub fn control_settings(&self) -> Vec<ControlSetting> {
        let (weak, strong, predicted) = match self {
            Mode::Validated | Mode::Network => (true, true, false),
            Mode::Predicted => (false, false, true),
        };

        vec![
            ControlSetting::toggle(ControlId::WeakEvidence, weak),
            ControlSetting::toggle(ControlId::StrongEvidence, strong),
            ControlSetting::toggle(ControlId::PredictedEvidence, predicted),
            ControlSetting::toggle(ControlId::PathwayOverlay, true),
            ControlSetting::toggle(ControlId::NeighborExpansion, true),
            ControlSetting::choice(ControlId::Layout, "euler"),
        ]
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "validated" => Ok(Mode::Validated),
            "predicted" => Ok(Mode::Predicted),
            "network" => Ok(Mode::Network),
            other => Err(EngineError::Validation(format!(
                "Unknown mode '{other}'. Use 'validated', 'predicted' or 'network'."
            ))),
        }
    }
}

/// An immutable lookup request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Query {
    term: String,
    mode: Mode,
}

impl Query {
    /// Build a query, rejecting empty or malformed terms.
    pub fn new(term: &str, mode: Option<Mode>) -> EngineResult<Self> {
        let term = term.trim();
        if term.is_empty() {
            return Err(EngineError::Validation(
                "Query term must not be empty".to_string(),
            ));
        }
        if term.chars().count() > MAX_TERM_LEN {
            return Err(EngineError::Validation(format!(
                "Query term exceeds {MAX_TERM_LEN} characters"
            )));
        }
        if term.chars().any(char::is_control) {
            return Err(EngineError::Validation(
                "Query term must not contain control characters".to_string(),
            ));
        }

        Ok(Self {
            term: term.to_string(),
            mode: mode.unwrap_or_default(),
        })
    }

    /// Build a query from raw invocation arguments.
    pub fn parse(term: &str, mode: Option<&str>) -> EngineResult<Self> {
        let mode = mode.map(str::parse).transpose()?;
        Self::new(term, mode)
    }

    pub fn term(&self) -> &str {
        &self.term
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }
}

/// A named interactive element on the results page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ControlId {
    WeakEvidence,
    StrongEvidence,
    PredictedEvidence,
    PathwayOverlay,
    NeighborExpansion,
    Layout,
    ApplyTrigger,
}

impl ControlId {
    /// DOM selector of the element on the remote page.
    pub fn selector(&self) -> &'static str {
        match self {
            ControlId::WeakEvidence => "#targetCheckboxWeak",
            ControlId::StrongEvidence => "#targetCheckboxStrong",
            ControlId::PredictedEvidence => "#targetCheckboxPredicted",
            ControlId::PathwayOverlay => "#miRNAPathwaySwitch",
            ControlId::NeighborExpansion => "#neighboursSwitch",
            ControlId::Layout => "#layoutSelect",
            ControlId::ApplyTrigger => crate::page::selectors::APPLY_CONFIG,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ControlId::WeakEvidence => "weak-evidence",
            ControlId::StrongEvidence => "strong-evidence",
            ControlId::PredictedEvidence => "predicted-evidence",
            ControlId::PathwayOverlay => "pathway-overlay",
            ControlId::NeighborExpansion => "neighbor-expansion",
            ControlId::Layout => "layout",
            ControlId::ApplyTrigger => "apply-trigger",
        }
    }
}

impl fmt::Display for ControlId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Desired value of a control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ControlValue {
    Toggle(bool),
    Choice(String),
}

/// One control to set before a reload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlSetting {
    pub control: ControlId,
    pub value: ControlValue,
}

impl ControlSetting {
    pub fn toggle(control: ControlId, on: bool) -> Self {
        Self {
            control,
            value: ControlValue::Toggle(on),
        }
    }

    pub fn choice(control: ControlId, value: &str) -> Self {
        Self {
            control,
            value: ControlValue::Choice(value.to_string()),
        }
    }
}

/// Observed condition of the live page's primary data table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReloadState {
    Idle,
    LoadingIndicatorVisible,
    ContentRefreshed,
    TimedOut,
}

/// A fixed-width table row shape with positional column mapping.
pub trait RowShape: Sized {
    /// Number of columns read from each row.
    const COLUMNS: usize;

    /// Build a record from normalized cells; `cells.len() == COLUMNS`.
    fn from_cells(cells: Vec<String>) -> Self;
}

/// One row of the interaction table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionRecord {
    pub source_entity: String,
    pub target_entity: String,
    pub support_level: String,
    pub source_database: String,
    pub experiment_info: String,
    pub reference: String,
}

impl RowShape for InteractionRecord {
    const COLUMNS: usize = 6;

    fn from_cells(cells: Vec<String>) -> Self {
        let mut it = cells.into_iter();
        let mut next = || it.next().unwrap_or_default();
        Self {
            source_entity: next(),
            target_entity: next(),
            support_level: next(),
            source_database: next(),
            experiment_info: next(),
            reference: next(),
        }
    }
}

/// One row of the node annotation table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeAnnotationRecord {
    pub source: String,
    pub category_set: String,
    pub category: String,
    pub node_type: String,
    pub covered_entities: String,
}

impl RowShape for NodeAnnotationRecord {
    const COLUMNS: usize = 5;

    fn from_cells(cells: Vec<String>) -> Self {
        let mut it = cells.into_iter();
        let mut next = || it.next().unwrap_or_default();
        Self {
            source: next(),
            category_set: next(),
            category: next(),
            node_type: next(),
            covered_entities: next(),
        }
    }
}

/// The orchestrator's output for one invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub success: bool,
    pub query: String,
    pub mode: Mode,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interactions: Option<Vec<InteractionRecord>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nodes: Option<Vec<NodeAnnotationRecord>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped_controls: Vec<ControlId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<NetworkExport>,
}
