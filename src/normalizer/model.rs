//! In-memory workbook model and normalization output.

use serde::Serialize;

use crate::config::NormalizerConfig;

/// A rectangular block of cells displayed as one cell. Coordinates are
/// 0-based and inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergedRegion {
    pub first_row: usize,
    pub first_col: usize,
    pub last_row: usize,
    pub last_col: usize,
}

impl MergedRegion {
    pub fn new(first_row: usize, first_col: usize, last_row: usize, last_col: usize) -> Self {
        Self {
            first_row: first_row.min(last_row),
            first_col: first_col.min(last_col),
            last_row: first_row.max(last_row),
            last_col: first_col.max(last_col),
        }
    }

    pub fn contains(&self, row: usize, col: usize) -> bool {
        (self.first_row..=self.last_row).contains(&row) && (self.first_col..=self.last_col).contains(&col)
    }

    pub fn row_span(&self) -> usize {
        self.last_row - self.first_row + 1
    }

    pub fn col_span(&self) -> usize {
        self.last_col - self.first_col + 1
    }

    /// The region limited to a `height` x `width` grid, if any of it is inside.
    pub fn clipped(&self, height: usize, width: usize) -> Option<Self> {
        if self.first_row >= height || self.first_col >= width {
            return None;
        }
        Some(Self {
            last_row: self.last_row.min(height - 1),
            last_col: self.last_col.min(width - 1),
            ..*self
        })
    }
}

/// One worksheet as a rectangular grid of cell texts.
#[derive(Debug, Clone, Default)]
pub struct Sheet {
    pub name: String,
    /// Row-major cell texts; every row has the same width.
    pub cells: Vec<Vec<String>>,
    pub merges: Vec<MergedRegion>,
    /// Header height declared for this sheet, overriding detection.
    pub header_rows: Option<usize>,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Build a sheet from literal rows, padding them to equal width.
    pub fn from_rows<R, C>(name: impl Into<String>, rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        let mut cells: Vec<Vec<String>> = rows
            .into_iter()
            .map(|row| row.into_iter().map(Into::into).collect())
            .collect();
        let width = cells.iter().map(Vec::len).max().unwrap_or(0);
        for row in &mut cells {
            row.resize(width, String::new());
        }
        Self {
            name: name.into(),
            cells,
            ..Default::default()
        }
    }

    pub fn with_merge(mut self, region: MergedRegion) -> Self {
        self.merges.push(region);
        self
    }

    pub fn height(&self) -> usize {
        self.cells.len()
    }

    pub fn width(&self) -> usize {
        self.cells.first().map(Vec::len).unwrap_or(0)
    }

    /// Cell text, or "" outside the grid.
    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.cells
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn is_row_empty(&self, row: usize) -> bool {
        self.cells
            .get(row)
            .map(|r| r.iter().all(|c| c.trim().is_empty()))
            .unwrap_or(true)
    }

    pub fn first_populated_row(&self) -> Option<usize> {
        (0..self.height()).find(|&r| !self.is_row_empty(r))
    }

    pub fn non_empty_cells(&self) -> usize {
        self.cells
            .iter()
            .flatten()
            .filter(|c| !c.trim().is_empty())
            .count()
    }
}

/// A parsed workbook.
#[derive(Debug, Clone, Default)]
pub struct SpreadsheetDocument {
    pub sheets: Vec<Sheet>,
}

/// A sheet reduced to one header row and its data rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlatTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl FlatTable {
    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn non_empty_cells(&self) -> usize {
        self.rows
            .iter()
            .flatten()
            .filter(|c| !c.trim().is_empty())
            .count()
    }
}

/// Rendered output for one sheet.
#[derive(Debug, Clone, Serialize)]
pub struct NormalizedSheet {
    pub name: String,
    /// Element id of the sheet section inside the combined document.
    pub anchor: String,
    pub markup: String,
    pub summary: String,
    pub rows: usize,
    pub columns: usize,
}

/// Result of normalizing one workbook.
#[derive(Debug, Clone, Serialize)]
pub struct NormalizedDocument {
    pub filename: String,
    pub sheets: Vec<NormalizedSheet>,
    /// The full HTML document.
    pub combined: String,
    pub summary: Option<String>,
}

impl NormalizedDocument {
    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }
}

/// Tunables for the normalization algorithm.
#[derive(Debug, Clone)]
pub struct NormalizeOptions {
    pub max_markdown_rows: usize,
    pub max_preview_rows: usize,
    pub summary_rows: usize,
    pub header_rows: Option<usize>,
    pub max_header_rows: usize,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self::from(&NormalizerConfig::default())
    }
}

impl From<&NormalizerConfig> for NormalizeOptions {
    fn from(config: &NormalizerConfig) -> Self {
        Self {
            max_markdown_rows: config.max_markdown_rows,
            max_preview_rows: config.max_preview_rows,
            summary_rows: config.summary_rows,
            header_rows: config.header_rows,
            max_header_rows: config.max_header_rows,
        }
    }
}
