//! CSV ingest of measured polarization curves.
//!
//! The input is a delimited file with a header row. Two columns are read by
//! name: potential (default `E`) and current (default `I`). Any other
//! columns are ignored.
//!
//! - header names are matched case-insensitively, with whitespace and a UTF-8
//!   BOM stripped
//! - every data row must hold a parseable number in both columns; the first
//!   bad cell is reported with its 1-based line number
//! - no filtering happens here: zero currents, ordering and IR correction are
//!   the curve constructor's job

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use csv::StringRecord;
use tracing::debug;

use crate::error::{PolError, Result};

/// Which header names hold the potential and current columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurveColumns {
    pub potential: String,
    pub current: String,
}

impl Default for CurveColumns {
    fn default() -> Self {
        Self {
            potential: "E".to_string(),
            current: "I".to_string(),
        }
    }
}

/// Raw measurement as read from disk.
#[derive(Debug, Clone, PartialEq)]
pub struct CurveData {
    pub potential: Vec<f64>,
    pub current: Vec<f64>,
}

/// Read the `(E, I)` columns of a CSV file.
pub fn load_curve_csv(path: &Path, columns: &CurveColumns) -> Result<CurveData> {
    let file = File::open(path)
        .map_err(|e| PolError::io(format!("failed to open CSV '{}'", path.display()), e))?;
    let data = read_curve(file, columns, &path.display().to_string())?;
    debug!(path = %path.display(), rows = data.potential.len(), "curve CSV loaded");
    Ok(data)
}

/// Read the `(E, I)` columns from any reader (used by the file loader and tests).
pub fn read_curve<R: std::io::Read>(reader: R, columns: &CurveColumns, source: &str) -> Result<CurveData> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| PolError::csv(format!("failed to read CSV headers of {source}"), e))?
        .clone();
    let header_map = build_header_map(&headers);

    let e_idx = column_index(&header_map, &columns.potential, source)?;
    let i_idx = column_index(&header_map, &columns.current, source)?;

    let mut potential = Vec::new();
    let mut current = Vec::new();
    for record in reader.records() {
        // The csv error carries its own position.
        let record = record.map_err(|e| PolError::csv(format!("failed to read CSV rows of {source}"), e))?;
        // Quoted fields may span lines, so take the line from the record itself.
        let line = record.position().map_or(0, |p| p.line());
        potential.push(parse_cell(&record, e_idx, &columns.potential, line, source)?);
        current.push(parse_cell(&record, i_idx, &columns.current, line, source)?);
    }

    if potential.is_empty() {
        return Err(PolError::validation(format!("{source}: no data rows found")));
    }

    Ok(CurveData { potential, current })
}

/// Write `(E, I)` columns with a header row.
pub fn write_curve_csv(path: &Path, columns: &CurveColumns, potential: &[f64], current: &[f64]) -> Result<()> {
    let context = || format!("failed to write CSV '{}'", path.display());
    let mut writer = csv::Writer::from_path(path).map_err(|e| PolError::csv(context(), e))?;
    writer
        .write_record([columns.potential.as_str(), columns.current.as_str()])
        .map_err(|e| PolError::csv(context(), e))?;
    for (e, i) in potential.iter().zip(current.iter()) {
        writer
            .write_record([format!("{e}"), format!("{i:e}")])
            .map_err(|err| PolError::csv(context(), err))?;
    }
    writer.flush().map_err(|e| PolError::io(context(), e))?;
    Ok(())
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports often prefix the first header with a BOM.
    name.trim().trim_start_matches('\u{feff}').to_lowercase()
}

fn column_index(header_map: &HashMap<String, usize>, name: &str, source: &str) -> Result<usize> {
    header_map
        .get(&normalize_header_name(name))
        .copied()
        .ok_or_else(|| {
            let mut found: Vec<&str> = header_map.keys().map(String::as_str).collect();
            found.sort_unstable();
            PolError::validation(format!(
                "{source}: missing column '{name}' (found: {})",
                found.join(", ")
            ))
        })
}

fn parse_cell(record: &StringRecord, idx: usize, name: &str, line: u64, source: &str) -> Result<f64> {
    let raw = record.get(idx).unwrap_or("");
    raw.parse::<f64>().map_err(|_| {
        PolError::validation(format!(
            "{source}, line {line}: column '{name}' is not a number ('{raw}')"
        ))
    })
}
