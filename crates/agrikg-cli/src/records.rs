//! Record loading for structured extraction
//!
//! JSON files hold either an array of objects or `{"records": [...]}`.
//! CSV files and spreadsheets (first sheet) use the first row as header.

use std::path::Path;

use agrikg_core::{ExtractionResult, Record};
use anyhow::{bail, Context, Result};
use calamine::{open_workbook_auto, Data, Reader};
use serde::Deserialize;

#[derive(Deserialize)]
#[serde(untagged)]
enum RecordsFile {
    List(Vec<Record>),
    Wrapped { records: Vec<Record> },
}

/// Load records, choosing the reader by file extension
pub fn load_records(path: &Path) -> Result<Vec<Record>> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    let records = match extension.as_str() {
        "json" => load_json(path)?,
        "csv" => load_csv(path)?,
        "xlsx" | "xlsm" | "xls" | "ods" => load_spreadsheet(path)?,
        other => bail!(
            "unsupported records file {} (extension {:?}), expected .json, .csv, .xlsx or .xls",
            path.display(),
            other
        ),
    };

    tracing::debug!(path = %path.display(), records = records.len(), "records loaded");
    Ok(records)
}

fn load_json(path: &Path) -> Result<Vec<Record>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let file: RecordsFile = serde_json::from_str(&content)
        .with_context(|| format!("{} is not a list of records", path.display()))?;

    Ok(match file {
        RecordsFile::List(records) | RecordsFile::Wrapped { records } => records,
    })
}

fn load_csv(path: &Path) -> Result<Vec<Record>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;

    let headers: Vec<String> = reader
        .headers()
        .with_context(|| format!("failed to read header row of {}", path.display()))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    for (line, row) in reader.records().enumerate() {
        let row = row.with_context(|| format!("bad CSV row {} in {}", line + 2, path.display()))?;
        rows.push(row.iter().map(str::to_string).collect());
    }

    Ok(records_from_rows(&headers, rows))
}

fn load_spreadsheet(path: &Path) -> Result<Vec<Record>> {
    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("failed to open workbook {}", path.display()))?;

    let Some(sheet) = workbook.sheet_names().first().cloned() else {
        return Ok(Vec::new());
    };
    let range = workbook
        .worksheet_range(&sheet)
        .with_context(|| format!("failed to read sheet {sheet:?}"))?;

    let mut rows = range.rows();
    let headers: Vec<String> = rows
        .next()
        .map(|row| row.iter().map(cell_to_string).collect())
        .unwrap_or_default();
    let rows: Vec<Vec<String>> = rows
        .map(|row| row.iter().map(cell_to_string).collect())
        .collect();

    Ok(records_from_rows(&headers, rows))
}

/// Zip header names onto each row. Blank rows and unnamed columns are dropped.
fn records_from_rows(headers: &[String], rows: Vec<Vec<String>>) -> Vec<Record> {
    rows.into_iter()
        .filter(|row| !row.iter().all(|cell| cell.trim().is_empty()))
        .map(|row| {
            headers
                .iter()
                .zip(row)
                .filter(|(header, _)| !header.trim().is_empty())
                .map(|(header, cell)| (header.trim().to_string(), cell))
                .collect()
        })
        .collect()
}

/// Convert a cell to its display string
fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) => {
            if f.fract() == 0.0 {
                format!("{}", *f as i64)
            } else {
                format!("{f}")
            }
        }
        Data::Int(i) => format!("{i}"),
        Data::Bool(b) => b.to_string(),
        Data::Error(e) => format!("#ERROR: {e:?}"),
        Data::DateTime(dt) => format!("{dt}"),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
    }
}

/// Read a previously saved extraction result
pub fn load_processed(path: &Path) -> Result<ExtractionResult> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("{} is not an extraction result", path.display()))
}
