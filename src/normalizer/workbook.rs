//! Workbook loading.
//!
//! Format detection is done by calamine from the bytes themselves, so a
//! workbook with a misleading extension still opens. Each worksheet becomes a
//! [`Sheet`] whose grid starts at the first cell of the used range, so memory
//! follows the data rather than its distance from A1. Merged regions are
//! shifted into the same coordinates.

use std::io::{Cursor, Read, Seek};

use calamine::{open_workbook_auto_from_rs, Data, Dimensions, Range, Reader, SheetType, Sheets};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use super::error::{Error, Result};
use super::model::{MergedRegion, Sheet, SpreadsheetDocument};

/// Parse workbook bytes into the in-memory model.
pub fn read_workbook(bytes: &[u8]) -> Result<SpreadsheetDocument> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;

    if let Sheets::Xlsx(xlsx) = &mut workbook {
        xlsx.load_merged_regions()
            .map_err(|e| Error::Unreadable(format!("failed to load merged regions: {}", e)))?;
    }

    let names: Vec<String> = workbook
        .sheets_metadata()
        .iter()
        .filter(|meta| meta.typ == SheetType::WorkSheet)
        .map(|meta| meta.name.clone())
        .collect();

    let mut sheets = Vec::with_capacity(names.len());
    for name in names {
        let range = workbook.worksheet_range(&name).map_err(|e| Error::Sheet {
            sheet: name.clone(),
            message: e.to_string(),
        })?;
        let merges = merged_regions(&mut workbook, &name)?;
        tracing::debug!(
            sheet = %name,
            merges = merges.len(),
            "Loaded worksheet"
        );
        sheets.push(sheet_from_range(name, &range, merges));
    }

    Ok(SpreadsheetDocument { sheets })
}

fn merged_regions<RS: Read + Seek>(workbook: &mut Sheets<RS>, name: &str) -> Result<Vec<MergedRegion>> {
    let dimensions: Vec<Dimensions> = match workbook {
        Sheets::Xlsx(xlsx) => xlsx
            .worksheet_merge_cells(name)
            .unwrap_or(Ok(Vec::new()))
            .map_err(|e| Error::Sheet {
                sheet: name.to_string(),
                message: e.to_string(),
            })?,
        Sheets::Xls(xls) => xls.worksheet_merge_cells(name).unwrap_or_default(),
        _ => Vec::new(),
    };

    Ok(dimensions
        .iter()
        .map(|d| {
            MergedRegion::new(
                d.start.0 as usize,
                d.start.1 as usize,
                d.end.0 as usize,
                d.end.1 as usize,
            )
        })
        .collect())
}

fn sheet_from_range(name: String, range: &Range<Data>, merges: Vec<MergedRegion>) -> Sheet {
    let mut sheet = Sheet::new(name);

    let Some((row0, col0)) = range.start() else {
        return sheet;
    };
    let (row0, col0) = (row0 as usize, col0 as usize);

    sheet.cells = range
        .rows()
        .map(|row| row.iter().map(cell_text).collect())
        .collect();
    sheet.merges = merges
        .iter()
        .filter_map(|region| relative_to(region, row0, col0))
        .collect();
    sheet
}

// Regions ending above or left of the used range carry no value and are dropped.
fn relative_to(region: &MergedRegion, row0: usize, col0: usize) -> Option<MergedRegion> {
    if region.last_row < row0 || region.last_col < col0 {
        return None;
    }
    Some(MergedRegion::new(
        region.first_row.saturating_sub(row0),
        region.first_col.saturating_sub(col0),
        region.last_row - row0,
        region.last_col - col0,
    ))
}

/// Display text of a cell value.
///
/// Dates print as `YYYY-MM-DD`, with ` HH:MM:SS` appended when the time is
/// not midnight. Durations print as `H:MM:SS`.
pub fn cell_text(value: &Data) -> String {
    match value {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Bool(true) => "TRUE".to_string(),
        Data::Bool(false) => "FALSE".to_string(),
        Data::Float(f) => format_number(*f),
        Data::Int(i) => i.to_string(),
        Data::DateTime(dt) if dt.is_duration() => match dt.as_duration() {
            Some(duration) => format_duration(duration.num_seconds()),
            None => format_number(dt.as_f64()),
        },
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(datetime) => format_datetime(datetime),
            None => format_number(dt.as_f64()),
        },
        Data::DateTimeIso(s) => format_iso_datetime(s.trim()),
        Data::DurationIso(s) => s.trim().to_string(),
        other => other.to_string().trim().to_string(),
    }
}

// Whole floats print without a fractional part, matching how Excel shows them.
fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

fn format_datetime(datetime: NaiveDateTime) -> String {
    if datetime.time() == NaiveTime::MIN {
        datetime.date().format("%Y-%m-%d").to_string()
    } else {
        datetime.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

fn format_duration(total_seconds: i64) -> String {
    let sign = if total_seconds < 0 { "-" } else { "" };
    let seconds = total_seconds.unsigned_abs();
    format!("{}{}:{:02}:{:02}", sign, seconds / 3600, seconds / 60 % 60, seconds % 60)
}

// ODS stores dates as ISO text; unparseable values are kept as written.
fn format_iso_datetime(raw: &str) -> String {
    let trimmed = raw.trim_end_matches('Z');
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return date.format("%Y-%m-%d").to_string();
    }
    match NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f") {
        Ok(datetime) => format_datetime(datetime),
        Err(_) => raw.to_string(),
    }
}
