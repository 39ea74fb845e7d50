//! Header detection and flattening.
//!
//! # Detection order
//! 1. An explicit header height (per sheet, then from options)
//! 2. Merged regions anchored inside the header band: a region spanning
//!    several rows extends the band to its last row, and a region spanning
//!    several columns is a group label with one sub-label row beneath it.
//!    Applied until the band stops growing, capped by `max_header_rows`.
//! 3. A sparse first row (under half of the populated columns labelled)
//!    followed by more rows: two header rows, group labels filled rightwards
//! 4. Otherwise a single header row

use std::collections::{HashMap, HashSet};

use super::model::{NormalizeOptions, Sheet};

/// Separator placed between header levels.
pub const LEVEL_SEPARATOR: &str = "_";

/// Location of the header band inside a sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderSpan {
    /// First populated row; everything above it is dropped.
    pub top: usize,
    pub rows: usize,
    /// Forward-fill group labels on every level but the last.
    pub fill_groups: bool,
}

impl HeaderSpan {
    /// First data row.
    pub fn data_start(&self) -> usize {
        self.top + self.rows
    }
}

/// Work out where the header is. `None` for a sheet with no populated cell.
pub fn detect_header_span(sheet: &Sheet, options: &NormalizeOptions) -> Option<HeaderSpan> {
    let top = sheet.first_populated_row()?;
    let available = sheet.height() - top;

    if let Some(rows) = sheet.header_rows.or(options.header_rows) {
        return Some(HeaderSpan {
            top,
            rows: rows.clamp(1, available),
            fill_groups: false,
        });
    }

    let limit = options.max_header_rows.clamp(1, available);
    let mut rows = 1;
    let mut from_merges = false;

    loop {
        let mut grown = rows;
        for region in &sheet.merges {
            if region.first_row < top || region.first_row >= top + rows {
                continue;
            }
            let mut needed = region.last_row + 1 - top;
            if region.col_span() > 1 {
                needed = needed.max(region.last_row + 2 - top);
            }
            if needed > rows && needed <= limit {
                grown = grown.max(needed);
                from_merges = true;
            }
        }
        if grown == rows {
            break;
        }
        rows = grown;
    }

    if from_merges {
        return Some(HeaderSpan {
            top,
            rows,
            fill_groups: false,
        });
    }

    if available > 2 && limit >= 2 && is_sparse_row(sheet, top) {
        return Some(HeaderSpan {
            top,
            rows: 2,
            fill_groups: true,
        });
    }

    Some(HeaderSpan {
        top,
        rows: 1,
        fill_groups: false,
    })
}

fn is_sparse_row(sheet: &Sheet, row: usize) -> bool {
    let populated: Vec<usize> = (0..sheet.width())
        .filter(|&c| (row..sheet.height()).any(|r| !sheet.cell(r, c).trim().is_empty()))
        .collect();
    if populated.len() < 2 {
        return false;
    }
    let empty = populated
        .iter()
        .filter(|&&c| sheet.cell(row, c).trim().is_empty())
        .count();
    empty * 2 >= populated.len()
}

/// Fill empty labels with the nearest label to their left.
pub fn forward_fill(level: &mut [String]) {
    let mut current: Option<String> = None;
    for label in level.iter_mut() {
        if label.trim().is_empty() {
            if let Some(value) = &current {
                label.clone_from(value);
            }
        } else {
            current = Some(label.clone());
        }
    }
}

/// Collapse header levels into one unique label per column.
///
/// `levels[i][c]` is the label of column `c` on header row `i`.
pub fn flatten_header(levels: &[Vec<String>], width: usize) -> Vec<String> {
    let labels = (0..width)
        .map(|col| {
            let mut parts: Vec<&str> = Vec::with_capacity(levels.len());
            for level in levels {
                let label = level.get(col).map(|s| s.trim()).unwrap_or("");
                if label.is_empty() || parts.last() == Some(&label) {
                    continue;
                }
                parts.push(label);
            }
            if parts.is_empty() {
                format!("Column {}", col + 1)
            } else {
                parts.join(LEVEL_SEPARATOR)
            }
        })
        .collect();

    disambiguate(labels)
}

/// Suffix repeated labels with `_2`, `_3`, ... without colliding with
/// labels that already exist.
fn disambiguate(labels: Vec<String>) -> Vec<String> {
    let mut taken: HashSet<String> = labels.iter().cloned().collect();
    let mut seen: HashMap<String, usize> = HashMap::new();

    labels
        .into_iter()
        .map(|label| {
            let count = seen.entry(label.clone()).or_insert(0);
            *count += 1;
            if *count == 1 {
                return label;
            }
            let mut n = *count;
            loop {
                let candidate = format!("{}{}{}", label, LEVEL_SEPARATOR, n);
                if taken.insert(candidate.clone()) {
                    return candidate;
                }
                n += 1;
            }
        })
        .collect()
}
