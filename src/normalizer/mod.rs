//! Spreadsheet normalizer subsystem.
//!
//! # Data Flow
//! ```text
//! workbook bytes
//!     → workbook.rs (calamine, merged regions)
//!     → merge.rs    (anchor value copied across each merge)
//!     → header.rs   (header band detection, label flattening)
//!     → table.rs    (drop empty rows/columns, one header row)
//!     → summary.rs  (description + per-row label:value lines)
//!     → render.rs   (HTML fragment per sheet, combined document)
//!     → NormalizedDocument
//! ```
//!
//! # Design Decisions
//! - Pure and synchronous; callers on an async runtime use `spawn_blocking`
//! - Sheets without a single populated cell are skipped, and a workbook with
//!   nothing left is an error rather than an empty document
//! - `service.rs` exposes the same operation over HTTP for the gateway

pub mod error;
pub mod header;
pub mod merge;
pub mod model;
pub mod render;
pub mod service;
pub mod summary;
pub mod table;
pub mod workbook;

pub use error::{Error, Result};
pub use model::{
    FlatTable, MergedRegion, NormalizeOptions, NormalizedDocument, NormalizedSheet, Sheet,
    SpreadsheetDocument,
};
pub use service::NormalizerServer;

/// Normalize workbook bytes.
pub fn normalize(bytes: &[u8], filename: &str, options: &NormalizeOptions) -> Result<NormalizedDocument> {
    let document = workbook::read_workbook(bytes)?;
    normalize_document(document, filename, options)
}

/// Normalize an already parsed workbook.
pub fn normalize_document(
    document: SpreadsheetDocument,
    filename: &str,
    options: &NormalizeOptions,
) -> Result<NormalizedDocument> {
    let mut sheets: Vec<NormalizedSheet> = Vec::with_capacity(document.sheets.len());

    for mut sheet in document.sheets {
        merge::expand_merged_regions(&mut sheet);

        let Some(span) = header::detect_header_span(&sheet, options) else {
            tracing::debug!(filename = %filename, sheet = %sheet.name, "Skipping empty sheet");
            continue;
        };
        let table = table::build_table(&sheet, &span);

        let anchor = format!("sheet-{}", sheets.len() + 1);
        let description = summary::describe_sheet(&sheet.name, &table);
        let lines = summary::row_lines(&sheet.name, &table, options.summary_rows);
        let markup = render::sheet_fragment(&anchor, &sheet.name, &table, &description, &lines, options);

        tracing::debug!(
            filename = %filename,
            sheet = %sheet.name,
            header_rows = span.rows,
            rows = table.row_count(),
            columns = table.column_count(),
            "Normalized sheet"
        );

        sheets.push(NormalizedSheet {
            name: sheet.name,
            anchor,
            markup,
            summary: description,
            rows: table.row_count(),
            columns: table.column_count(),
        });
    }

    if sheets.iter().all(|s| s.markup.trim().is_empty()) {
        return Err(Error::EmptyResult);
    }

    let combined = render::document(filename, &sheets);
    let summary = sheets
        .iter()
        .map(|s| s.summary.as_str())
        .collect::<Vec<_>>()
        .join("\n");

    Ok(NormalizedDocument {
        filename: filename.to_string(),
        sheets,
        combined,
        summary: Some(summary),
    })
}
