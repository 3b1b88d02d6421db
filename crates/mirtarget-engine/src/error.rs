//! Engine error taxonomy.

use std::fmt;

use serde::Serialize;

/// Which hard phase of a reload exceeded its budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReloadPhase {
    LoadingClearance,
    RowPopulation,
}

impl fmt::Display for ReloadPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReloadPhase::LoadingClearance => f.write_str("loading-clearance"),
            ReloadPhase::RowPopulation => f.write_str("row-population"),
        }
    }
}

/// Errors raised by the lookup engine.
#[derive(thiserror::Error, Debug)]
pub enum EngineError {
    #[error("Invalid query: {0}")]
    Validation(String),

    #[error("Results page did not resolve within {waited_ms}ms: {detail}")]
    NavigationTimeout { detail: String, waited_ms: u64 },

    #[error("Control not found: {0}")]
    ControlNotFound(String),

    #[error("Table reload did not complete: {phase} phase exceeded {waited_ms}ms")]
    ReloadTimeout { phase: ReloadPhase, waited_ms: u64 },

    #[error("Browser session failure: {0}")]
    SessionFailure(String),

    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),
}

/// Stable kind tags surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ValidationError,
    NavigationTimeout,
    ControlNotFound,
    ReloadTimeout,
    SessionFailure,
    UpstreamUnavailable,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ValidationError => "validation_error",
            ErrorKind::NavigationTimeout => "navigation_timeout",
            ErrorKind::ControlNotFound => "control_not_found",
            ErrorKind::ReloadTimeout => "reload_timeout",
            ErrorKind::SessionFailure => "session_failure",
            ErrorKind::UpstreamUnavailable => "upstream_unavailable",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::Validation(_) => ErrorKind::ValidationError,
            EngineError::NavigationTimeout { .. } => ErrorKind::NavigationTimeout,
            EngineError::ControlNotFound(_) => ErrorKind::ControlNotFound,
            EngineError::ReloadTimeout { .. } => ErrorKind::ReloadTimeout,
            EngineError::SessionFailure(_) => ErrorKind::SessionFailure,
            EngineError::UpstreamUnavailable(_) => ErrorKind::UpstreamUnavailable,
        }
    }

    /// Wrap any browser-layer failure as a session failure.
    pub fn session(context: &str, err: impl fmt::Display) -> Self {
        EngineError::SessionFailure(format!("{context}: {err}"))
    }
}

/// Convenience result type.
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_tags_are_stable() {
        let err = EngineError::ReloadTimeout {
            phase: ReloadPhase::RowPopulation,
            waited_ms: 30_000,
        };
        assert_eq!(err.kind().as_str(), "reload_timeout");
        assert_eq!(
            err.to_string(),
            "Table reload did not complete: row-population phase exceeded 30000ms"
        );
        assert_eq!(
            serde_json::to_value(ErrorKind::ValidationError).unwrap(),
            "validation_error"
        );
    }
}
