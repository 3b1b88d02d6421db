//! miRTargetLink engine: drives the miRTargetLink 2.0 web application to look up
//! miRNA–target interactions and node annotations for a search term.

pub mod chromium;
pub mod config;
pub mod controls;
pub mod error;
pub mod export;
pub mod extract;
pub mod orchestrator;
pub mod page;
pub mod reload;
pub mod types;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use chromium::ChromiumSessionFactory;
pub use config::{resolve_browser_path, BrowserOptions, EngineConfig, ExportOptions, ReloadTimings};
pub use controls::{apply_all, apply_control, trigger_reload};
pub use error::{EngineError, EngineResult, ErrorKind, ReloadPhase};
pub use export::{NetworkExport, NetworkExportClient};
pub use extract::{extract_rows, normalize_cell, Extraction, TableStatus, DEFAULT_ROW_LIMIT};
pub use orchestrator::{QueryOrchestrator, Stage};
pub use page::{PageSession, SessionFactory};
pub use reload::{Fingerprint, ReloadReport, ReloadSynchronizer};
pub use types::*;
