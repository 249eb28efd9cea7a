//! Error types for the xlsx2payslip library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`PayslipError`]: **Fatal.** the batch cannot proceed at all
//!   (unreadable workbook, missing required columns, a row that failed to
//!   render). Returned as `Err(PayslipError)` from the top-level `generate*`
//!   functions. Nothing is partially produced.
//!
//! * [`LogoError`]: **Non-fatal.** the company logo could not be decoded.
//!   Stored inside [`crate::pipeline::logo::LogoOutcome::Skipped`] and the
//!   payslips are produced without a logo.
//!
//! Malformed cells are not errors at all: they are absorbed by the coercion
//! helpers in [`crate::pipeline::coerce`].

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the xlsx2payslip library.
#[derive(Debug, Error)]
pub enum PayslipError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Salary file was not found at the given path.
    #[error("Salary file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The bytes are not a workbook calamine can open.
    #[error("Could not read the salary spreadsheet: {detail}\nUpload a valid Excel file (.xlsx or .xls).")]
    UnreadableSpreadsheet { detail: String },

    /// The configured sheet does not exist in the workbook.
    #[error("Sheet '{sheet}' not found in the workbook")]
    SheetNotFound { sheet: String },

    /// The selected sheet has no header row.
    #[error("The salary spreadsheet is empty (no header row found)")]
    EmptySpreadsheet,

    // ── Schema errors ─────────────────────────────────────────────────────
    /// One or more required canonical columns are absent. `columns` is sorted.
    #[error("Missing required columns in Excel: {}", columns.join(", "))]
    MissingColumns { columns: Vec<String> },

    /// The header row is present but every data row is blank.
    #[error("The salary spreadsheet has no employee rows")]
    NoDataRows,

    // ── Rendering errors ──────────────────────────────────────────────────
    /// A single row could not be turned into a document. Fatal to the batch.
    #[error("Failed to render payslip for row {row}: {detail}")]
    RenderFailed { row: usize, detail: String },

    /// Bundling the per-row documents into a zip failed.
    #[error("Failed to build payslip archive: {detail}")]
    ArchiveFailed { detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PayslipError {
    /// Build a [`PayslipError::MissingColumns`] with the names sorted.
    pub fn missing_columns<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        columns.sort();
        columns.dedup();
        PayslipError::MissingColumns { columns }
    }
}

/// A non-fatal logo failure. The document renders without a logo.
#[derive(Debug, Clone, Error, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum LogoError {
    /// Zero-length logo upload.
    #[error("Logo is empty")]
    Empty,

    /// The image crate could not decode the bytes.
    #[error("Logo could not be decoded: {detail}")]
    Decode { detail: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_columns_message_is_sorted() {
        let e = PayslipError::missing_columns(["month", "employee_id"]);
        assert_eq!(
            e.to_string(),
            "Missing required columns in Excel: employee_id, month"
        );
    }

    #[test]
    fn missing_columns_dedups() {
        let e = PayslipError::missing_columns(vec!["month".to_string(), "month".to_string()]);
        match e {
            PayslipError::MissingColumns { columns } => assert_eq!(columns, vec!["month"]),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn render_failed_display() {
        let e = PayslipError::RenderFailed {
            row: 3,
            detail: "boom".into(),
        };
        assert!(e.to_string().contains("row 3"));
        assert!(e.to_string().contains("boom"));
    }

    #[test]
    fn logo_error_display() {
        let e = LogoError::Decode {
            detail: "bad header".into(),
        };
        assert!(e.to_string().contains("bad header"));
        assert_eq!(LogoError::Empty.to_string(), "Logo is empty");
    }
}
