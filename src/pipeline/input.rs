//! Input loading: salary file bytes → one rectangular sheet of cells.
//!
//! The workbook format is sniffed from its leading bytes and then opened with
//! calamine straight from memory, so uploads never touch the disk. The first
//! row of the chosen sheet is the header row; every later row that is not
//! entirely blank is a data row.

use crate::config::SheetSelection;
use crate::error::PayslipError;
use crate::pipeline::coerce::CellValue;
use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use chrono::{NaiveDate, NaiveDateTime};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// The selected worksheet before header normalisation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSheet {
    /// Sheet name as stored in the workbook.
    pub name: String,
    /// Header text, one entry per column. Blank headers become `Unnamed: <n>`.
    pub headers: Vec<String>,
    /// Data rows, each padded to `headers.len()`.
    pub rows: Vec<Vec<CellValue>>,
}

/// Container formats calamine can open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkbookKind {
    /// Zip container: `.xlsx`, `.xlsm`, `.xlsb` or `.ods`.
    Zip,
    /// OLE compound file: legacy `.xls`.
    Ole,
}

/// Identify a workbook by its magic bytes.
pub fn sniff_workbook(bytes: &[u8]) -> Option<WorkbookKind> {
    if bytes.starts_with(b"PK\x03\x04") {
        Some(WorkbookKind::Zip)
    } else if bytes.starts_with(&[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1]) {
        Some(WorkbookKind::Ole)
    } else {
        None
    }
}

/// Read a salary file from disk, mapping I/O failures to typed errors.
pub fn read_salary_file(path: &Path) -> Result<Vec<u8>, PayslipError> {
    let path_buf = PathBuf::from(path);

    if !path.exists() {
        return Err(PayslipError::FileNotFound { path: path_buf });
    }

    match std::fs::read(path) {
        Ok(bytes) => {
            debug!("Read salary file {} ({} bytes)", path.display(), bytes.len());
            Ok(bytes)
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            Err(PayslipError::PermissionDenied { path: path_buf })
        }
        Err(_) => Err(PayslipError::FileNotFound { path: path_buf }),
    }
}

/// Open a workbook from memory and extract the selected sheet.
pub fn read_spreadsheet(
    bytes: &[u8],
    selection: &SheetSelection,
) -> Result<RawSheet, PayslipError> {
    if bytes.is_empty() {
        return Err(PayslipError::UnreadableSpreadsheet {
            detail: "the file is empty".into(),
        });
    }
    let kind = sniff_workbook(bytes).ok_or_else(|| {
        let head: Vec<String> = bytes.iter().take(4).map(|b| format!("{b:02x}")).collect();
        PayslipError::UnreadableSpreadsheet {
            detail: format!("not an Excel workbook (starts with {})", head.join(" ")),
        }
    })?;
    debug!("Detected workbook container: {:?}", kind);

    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes)).map_err(|e| {
        PayslipError::UnreadableSpreadsheet {
            detail: e.to_string(),
        }
    })?;

    let sheet_names = workbook.sheet_names().to_vec();
    let name = match selection.resolve(&sheet_names) {
        Some(name) => name.to_string(),
        None if sheet_names.is_empty() => return Err(PayslipError::EmptySpreadsheet),
        None => {
            return Err(PayslipError::SheetNotFound {
                sheet: selection.to_string(),
            })
        }
    };

    let range = workbook
        .worksheet_range(&name)
        .map_err(|e| PayslipError::UnreadableSpreadsheet {
            detail: format!("sheet '{}': {}", name, e),
        })?;

    let sheet = range_to_sheet(&name, &range)?;
    info!(
        "Loaded sheet '{}': {} columns, {} data rows",
        sheet.name,
        sheet.headers.len(),
        sheet.rows.len()
    );
    Ok(sheet)
}

/// Split a calamine range into a header row and data rows.
fn range_to_sheet(name: &str, range: &Range<Data>) -> Result<RawSheet, PayslipError> {
    let mut rows = range.rows();
    let header_cells = rows.next().ok_or(PayslipError::EmptySpreadsheet)?;

    let headers: Vec<String> = header_cells
        .iter()
        .enumerate()
        .map(|(idx, cell)| header_text(idx, cell))
        .collect();
    if headers.iter().all(|h| h.starts_with("Unnamed: ")) {
        return Err(PayslipError::EmptySpreadsheet);
    }

    let mut data = Vec::new();
    for (offset, cells) in rows.enumerate() {
        let mut values: Vec<CellValue> = cells.iter().map(cell_value).collect();
        values.resize(headers.len(), CellValue::Empty);
        if values.iter().all(CellValue::is_blank) {
            // Sheet row numbers are 1-based and the header occupies the first.
            warn!("Skipping blank row {} in sheet '{}'", offset + 2, name);
            continue;
        }
        data.push(values);
    }

    Ok(RawSheet {
        name: name.to_string(),
        headers,
        rows: data,
    })
}

fn header_text(idx: usize, cell: &Data) -> String {
    let value = cell_value(cell);
    if value.is_blank() {
        format!("Unnamed: {idx}")
    } else {
        value.to_string()
    }
}

/// Map one calamine cell to a [`CellValue`].
pub fn cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty | Data::Error(_) => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Float(f) => CellValue::Float(*f),
        Data::Int(i) => CellValue::Int(*i),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(naive) => CellValue::DateTime(naive),
            None => CellValue::Float(dt.as_f64()),
        },
        Data::DateTimeIso(s) => parse_iso(s).unwrap_or_else(|| CellValue::Text(s.clone())),
        Data::DurationIso(s) => CellValue::Text(s.clone()),
    }
}

fn parse_iso(s: &str) -> Option<CellValue> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(CellValue::DateTime)
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .map(CellValue::from)
        })
}
