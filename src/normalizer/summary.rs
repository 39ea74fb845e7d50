//! Textual summaries of flat tables.

use super::model::FlatTable;

/// One-paragraph description of a sheet.
pub fn describe_sheet(name: &str, table: &FlatTable) -> String {
    format!(
        "Sheet \"{}\": {} data rows x {} columns, {} non-empty cells. Columns: {}.",
        name,
        table.row_count(),
        table.column_count(),
        table.non_empty_cells(),
        table.headers.join(", ")
    )
}

/// Per-row `label:value` lines for the first `limit` data rows.
///
/// Empty cells are left out; rows with nothing left produce no line.
pub fn row_lines(name: &str, table: &FlatTable, limit: usize) -> Vec<String> {
    table
        .rows
        .iter()
        .take(limit)
        .enumerate()
        .filter_map(|(i, row)| {
            let pairs: Vec<String> = table
                .headers
                .iter()
                .zip(row)
                .filter(|(_, value)| !value.trim().is_empty())
                .map(|(label, value)| format!("{}:{}", label, flatten_whitespace(value)))
                .collect();
            if pairs.is_empty() {
                return None;
            }
            Some(format!("Sheet: {} | Row: {} | {}", name, i + 1, pairs.join(", ")))
        })
        .collect()
}

fn flatten_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}
