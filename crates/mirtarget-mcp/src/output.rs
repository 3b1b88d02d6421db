//! Terminal rendering of lookup results for the `query` subcommand.

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};

use mirtarget_engine::{AnalysisResult, InteractionRecord, NodeAnnotationRecord};

pub const INTERACTION_HEADERS: [&str; 6] =
    ["miRNA", "Target", "Support", "Source", "Experiments", "Reference"];
pub const NODE_HEADERS: [&str; 5] =
    ["Source", "CategorySet", "Category", "NodeType", "CoveredEntities"];

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn styled_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(headers.iter().map(|h| header_cell(h)).collect::<Vec<_>>());
    table
}

pub fn interaction_table(records: &[InteractionRecord]) -> Table {
    let mut table = styled_table(&INTERACTION_HEADERS);
    for r in records {
        table.add_row(vec![
            &r.source_entity,
            &r.target_entity,
            &r.support_level,
            &r.source_database,
            &r.experiment_info,
            &r.reference,
        ]);
    }
    table
}

pub fn node_table(records: &[NodeAnnotationRecord]) -> Table {
    let mut table = styled_table(&NODE_HEADERS);
    for r in records {
        table.add_row(vec![
            &r.source,
            &r.category_set,
            &r.category,
            &r.node_type,
            &r.covered_entities,
        ]);
    }
    table
}

/// Render a full result: message, then each non-empty table.
pub fn render_result(result: &AnalysisResult) -> String {
    let mut out = format!("{}\n", result.message);

    match result.interactions.as_deref() {
        Some(rows) if !rows.is_empty() => {
            out.push_str(&format!("\nInteractions (top {}):\n", rows.len()));
            out.push_str(&interaction_table(rows).to_string());
            out.push('\n');
        }
        _ => out.push_str("\nNo interaction rows.\n"),
    }
    match result.nodes.as_deref() {
        Some(rows) if !rows.is_empty() => {
            out.push_str(&format!("\nNode annotations (top {}):\n", rows.len()));
            out.push_str(&node_table(rows).to_string());
            out.push('\n');
        }
        _ => out.push_str("\nNo node annotation rows.\n"),
    }
    out
}
