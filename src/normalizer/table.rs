//! Reduction of an expanded sheet to a flat table.

use super::header::{flatten_header, forward_fill, HeaderSpan};
use super::model::{FlatTable, Sheet};

/// Build the flat table for a sheet whose merges are already expanded.
///
/// Rows above the header band, fully empty data rows and fully empty columns
/// are dropped. Column order is preserved.
pub fn build_table(sheet: &Sheet, span: &HeaderSpan) -> FlatTable {
    let header_rows = span.top..span.data_start().min(sheet.height());
    let data_rows: Vec<usize> = (span.data_start()..sheet.height())
        .filter(|&r| !sheet.is_row_empty(r))
        .collect();

    let columns: Vec<usize> = (0..sheet.width())
        .filter(|&c| {
            header_rows
                .clone()
                .chain(data_rows.iter().copied())
                .any(|r| !sheet.cell(r, c).trim().is_empty())
        })
        .collect();

    let mut levels: Vec<Vec<String>> = header_rows
        .map(|r| columns.iter().map(|&c| sheet.cell(r, c).to_string()).collect())
        .collect();
    if span.fill_groups {
        let last = levels.len().saturating_sub(1);
        for level in &mut levels[..last] {
            forward_fill(level);
        }
    }

    let headers = flatten_header(&levels, columns.len());
    let rows = data_rows
        .iter()
        .map(|&r| columns.iter().map(|&c| sheet.cell(r, c).to_string()).collect())
        .collect();

    FlatTable { headers, rows }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::header::detect_header_span;
    use crate::normalizer::merge::expand_merged_regions;
    use crate::normalizer::model::{MergedRegion, NormalizeOptions};

    fn table_for(mut sheet: Sheet) -> FlatTable {
        expand_merged_regions(&mut sheet);
        let span = detect_header_span(&sheet, &NormalizeOptions::default()).unwrap();
        build_table(&sheet, &span)
    }

    #[test]
    fn test_merged_two_row_header() {
        let sheet = Sheet::from_rows(
            "s",
            vec![vec!["Region", "Sales", ""], vec!["", "Q1", "Q2"], vec!["North", "10", "20"]],
        )
        .with_merge(MergedRegion::new(0, 0, 1, 0))
        .with_merge(MergedRegion::new(0, 1, 0, 2));

        let table = table_for(sheet);
        assert_eq!(table.headers, vec!["Region", "Sales_Q1", "Sales_Q2"]);
        assert_eq!(table.rows, vec![vec!["North", "10", "20"]]);
    }

    #[test]
    fn test_trims_empty_rows_and_columns() {
        let sheet = Sheet::from_rows(
            "s",
            vec![
                vec!["", "", "", ""],
                vec!["", "Name", "", "Age"],
                vec!["", "Ann", "", "31"],
                vec!["", "", "", ""],
                vec!["", "Bob", "", "42"],
            ],
        );

        let table = table_for(sheet);
        assert_eq!(table.headers, vec!["Name", "Age"]);
        assert_eq!(table.rows, vec![vec!["Ann", "31"], vec!["Bob", "42"]]);
    }

    #[test]
    fn test_sparse_header_fills_groups() {
        let sheet = Sheet::from_rows(
            "s",
            vec![
                vec!["", "Sales", "", ""],
                vec!["Region", "Q1", "Q2", "Q3"],
                vec!["North", "1", "2", "3"],
            ],
        );

        let table = table_for(sheet);
        assert_eq!(table.headers, vec!["Region", "Sales_Q1", "Sales_Q2", "Sales_Q3"]);
    }

    #[test]
    fn test_vertical_merge_in_data_is_repeated() {
        let sheet = Sheet::from_rows(
            "s",
            vec![vec!["Team", "Member"], vec!["Core", "Ann"], vec!["", "Bob"]],
        )
        .with_merge(MergedRegion::new(1, 0, 2, 0));

        let table = table_for(sheet);
        assert_eq!(table.rows, vec![vec!["Core", "Ann"], vec!["Core", "Bob"]]);
    }

    #[test]
    fn test_header_only_sheet() {
        let table = table_for(Sheet::from_rows("s", vec![vec!["a", "b"]]));
        assert_eq!(table.headers, vec!["a", "b"]);
        assert!(table.rows.is_empty());
    }
}
