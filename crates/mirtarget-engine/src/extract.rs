//! Table extraction into fixed-shape records.

use serde::Serialize;

use crate::error::EngineResult;
use crate::page::{selectors, PageSession};
use crate::types::RowShape;

/// Default number of rows sampled per table.
pub const DEFAULT_ROW_LIMIT: usize = 10;

/// Whether a table had data, had none, or was never rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TableStatus {
    Populated,
    Empty,
    Absent,
}

/// Records read from one table, capped at the requested limit.
#[derive(Debug, Clone)]
pub struct Extraction<R> {
    pub records: Vec<R>,
    pub status: TableStatus,
}

impl<R> Extraction<R> {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Collapse runs of whitespace to single spaces and trim the ends.
pub fn normalize_cell(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Read up to `limit` rows of `table` into records of shape `R`, in document order.
///
/// Missing trailing cells become empty strings; extra cells are ignored.
/// An empty or absent table yields no records and a diagnostic, not an error.
pub async fn extract_rows<R: RowShape>(
    session: &dyn PageSession,
    table: &str,
    limit: usize,
) -> EngineResult<Extraction<R>> {
    if !session.exists(&selectors::body(table)).await? {
        tracing::warn!("{table} is absent from the page");
        return Ok(Extraction {
            records: Vec::new(),
            status: TableStatus::Absent,
        });
    }

    let rows = session.row_cells(&selectors::rows(table), limit).await?;
    if rows.is_empty() || is_empty_placeholder(session, table, &rows).await? {
        tracing::warn!("{table} is empty (no data available for this mode)");
        return Ok(Extraction {
            records: Vec::new(),
            status: TableStatus::Empty,
        });
    }

    let records: Vec<R> = rows
        .into_iter()
        .take(limit)
        .map(|cells| {
            let mut cells: Vec<String> = cells
                .iter()
                .take(R::COLUMNS)
                .map(|c| normalize_cell(c))
                .collect();
            cells.resize(R::COLUMNS, String::new());
            R::from_cells(cells)
        })
        .collect();

    tracing::debug!("Extracted {} rows from {table}", records.len());
    Ok(Extraction {
        records,
        status: TableStatus::Populated,
    })
}

/// A lone single-cell row carrying the grid's "no data" marker.
async fn is_empty_placeholder(
    session: &dyn PageSession,
    table: &str,
    rows: &[Vec<String>],
) -> EngineResult<bool> {
    if rows.len() != 1 || rows[0].len() > 1 {
        return Ok(false);
    }
    session.exists(&selectors::empty_marker(table)).await
}
