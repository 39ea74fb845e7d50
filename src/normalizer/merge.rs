//! Merged-region expansion.

use super::model::Sheet;

/// Copy each merged region's anchor value into every cell it covers.
///
/// Regions are clipped to the populated grid; cells outside it hold nothing
/// and the grid is never grown for them.
pub fn expand_merged_regions(sheet: &mut Sheet) {
    let (height, width) = (sheet.height(), sheet.width());

    for region in &sheet.merges {
        let Some(region) = region.clipped(height, width) else {
            continue;
        };
        let anchor = sheet.cells[region.first_row][region.first_col].clone();
        for row in &mut sheet.cells[region.first_row..=region.last_row] {
            for cell in &mut row[region.first_col..=region.last_col] {
                cell.clone_from(&anchor);
            }
        }
    }
}
