//! Readers for the rule authoring sheet (CSV or XLSX).

use std::io::Cursor;

use calamine::{Reader, Xlsx};
use tracing::debug;

use crate::error::GlRulesError;
use crate::rules::schema::{RuleRow, COLUMNS};

/// Read authored rule rows from CSV. The first record is the header row.
pub fn read_csv(bytes: &[u8]) -> Result<Vec<RuleRow>, GlRulesError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let headers: Vec<String> = rdr.headers()?.iter().map(normalize_header).collect();
    check_headers(headers.iter().map(String::as_str))?;

    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record?;
        // short records leave the remaining columns empty
        let mut row = RuleRow {
            line: record.position().map(|p| p.line() as usize).unwrap_or(0),
            ..Default::default()
        };
        for (column, value) in headers.iter().zip(record.iter()) {
            row.set(column, value.to_string());
        }
        rows.push(row);
    }

    debug!(rows = rows.len(), "read rule rows from csv");
    Ok(rows)
}

/// Read authored rule rows from the first worksheet of an XLSX workbook.
pub fn read_xlsx(bytes: &[u8]) -> Result<Vec<RuleRow>, GlRulesError> {
    let cursor = Cursor::new(bytes);
    let mut workbook: Xlsx<_> = calamine::open_workbook_from_rs(cursor)
        .map_err(|e| GlRulesError::Spreadsheet(format!("failed to open xlsx: {e}")))?;

    let sheet = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| GlRulesError::Spreadsheet("workbook has no worksheets".into()))?
        .map_err(|e| GlRulesError::Spreadsheet(format!("failed to read first worksheet: {e}")))?;

    let first_row = sheet.start().map(|(row, _)| row as usize).unwrap_or(0);
    let mut sheet_rows = sheet.rows();

    let headers: Vec<String> = match sheet_rows.next() {
        Some(cells) => cells
            .iter()
            .map(|c| normalize_header(&cell_as_string(c).unwrap_or_default()))
            .collect(),
        None => return Ok(Vec::new()),
    };
    check_headers(headers.iter().map(String::as_str))?;

    let mut rows = Vec::new();
    for (idx, cells) in sheet_rows.enumerate() {
        let mut row = RuleRow {
            // +1 for the header row, +1 for 1-based numbering
            line: first_row + idx + 2,
            ..Default::default()
        };
        for (column, cell) in headers.iter().zip(cells) {
            if let Some(value) = cell_as_string(cell) {
                row.set(column, value);
            }
        }
        rows.push(row);
    }

    debug!(rows = rows.len(), "read rule rows from xlsx");
    Ok(rows)
}

/// The merchant pattern and GL account columns are required; the others
/// default to empty when absent.
fn check_headers<'a>(headers: impl Iterator<Item = &'a str>) -> Result<(), GlRulesError> {
    let present: Vec<&str> = headers.collect();
    for required in ["merchant_pattern", "gl_account"] {
        if !present.contains(&required) {
            return Err(GlRulesError::RuleInvalid(format!(
                "missing required column '{required}' (expected columns: {})",
                COLUMNS.join(", ")
            )));
        }
    }
    Ok(())
}

fn normalize_header(name: &str) -> String {
    name.trim().to_lowercase()
}

fn cell_as_string(cell: &calamine::Data) -> Option<String> {
    match cell {
        calamine::Data::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        calamine::Data::Float(f) => Some(f.to_string()),
        calamine::Data::Int(i) => Some(i.to_string()),
        calamine::Data::Bool(b) => Some(b.to_string()),
        calamine::Data::Empty => None,
        _ => Some(format!("{cell}")),
    }
}
