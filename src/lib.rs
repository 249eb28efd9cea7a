//! # xlsx2payslip
//!
//! Turn a monthly salary spreadsheet into one PDF payslip per employee.
//!
//! Payroll sheets are maintained by hand, so the same column shows up as
//! `Emp Code`, `EMPLOYEE_ID` or `Employee No`, and amount cells hold numbers,
//! numeric text, `-` or nothing. This crate folds every header onto a
//! canonical field name, coerces each cell defensively, computes the totals
//! and net pay (with net pay spelled out on the Indian numbering scale) and
//! lays out an A4 payslip per row.
//!
//! ## Pipeline Overview
//!
//! ```text
//! .xlsx / .xls / .ods bytes
//!  │
//!  ├─ 1. Input     open the workbook from memory (calamine)
//!  ├─ 2. Columns   fold headers onto canonical names, check required ones
//!  ├─ 3. Render    figures + A4 page per row (lopdf, spawn_blocking)
//!  ├─ 4. Package   one row → PDF; several rows → zip (first PDF as preview)
//!  └─ 5. Output    BatchResult + stats, optionally written to a directory
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use xlsx2payslip::{generate, CompanyInfo, GenerationConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let sheet = std::fs::read("salary_jan.xlsx")?;
//!     let company = CompanyInfo::new("Acme Pvt Ltd", "12 MG Road\nPune 411001")
//!         .with_email("hr@acme.example");
//!     let result = generate(&sheet, &company, None, &GenerationConfig::default()).await?;
//!     let primary = result.primary();
//!     std::fs::write(&primary.filename, &primary.content)?;
//!     eprintln!("{} payslips, {} bytes", result.stats.documents, result.stats.primary_bytes);
//!     Ok(())
//! }
//! ```
//!
//! ## Required Columns
//!
//! `employee_id`, `employee_name` and `month` (under any of their accepted
//! spellings, see [`pipeline::columns::COLUMN_ALIASES`]). A sheet missing any
//! of them fails with one error naming all missing columns.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `xlsx2payslip` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! xlsx2payslip = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod generate;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod store;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{GenerationConfig, GenerationConfigBuilder, SheetSelection};
pub use error::{LogoError, PayslipError};
pub use generate::{generate, generate_sync, generate_to_dir, inspect, write_batch};
pub use output::{
    BatchOutput, BatchResult, BatchStats, ColumnMapping, CompanyInfo, PayslipDocument,
    SheetReport, PDF_CONTENT_TYPE, ZIP_CONTENT_TYPE,
};
pub use pipeline::render::PayslipFigures;
pub use progress::{GenerationProgressCallback, NoopProgressCallback, ProgressCallback};
pub use store::{FileStore, PreviewError, StoredBatch};
