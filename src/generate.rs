//! Batch entry points: spreadsheet bytes → payslip PDF or zip.
//!
//! A batch is all-or-nothing. Missing columns fail before anything renders,
//! and a row that fails to render fails the whole batch, so a payroll run
//! never ships with employees silently left out.

use crate::config::GenerationConfig;
use crate::error::PayslipError;
use crate::output::{
    BatchOutput, BatchResult, BatchStats, ColumnMapping, CompanyInfo, PayslipDocument,
    SheetReport,
};
use crate::pipeline::coerce::{display_value, CellValue};
use crate::pipeline::columns::{self, NormalizedRow};
use crate::pipeline::{archive, input, logo, render};
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Generate one payslip per data row.
///
/// This is the primary entry point for the library.
///
/// # Arguments
/// * `spreadsheet`: raw `.xlsx` / `.xls` / `.ods` bytes
/// * `company`    : employer details printed in every header
/// * `logo`       : optional PNG/JPEG bytes; undecodable logos are skipped
/// * `config`     : generation configuration
///
/// # Returns
/// A single PDF when the sheet has one row, otherwise a zip of all PDFs with
/// the first row's PDF as preview.
///
/// # Errors
/// - unreadable workbook or unknown sheet
/// - required columns missing (all of them named in one error)
/// - no data rows
/// - any row failing to render
pub async fn generate(
    spreadsheet: &[u8],
    company: &CompanyInfo,
    logo: Option<&[u8]>,
    config: &GenerationConfig,
) -> Result<BatchResult, PayslipError> {
    let total_start = Instant::now();
    info!("Starting payslip batch ({} bytes)", spreadsheet.len());

    // ── Step 1: Parse workbook ───────────────────────────────────────────
    let parse_start = Instant::now();
    let sheet = load_sheet(spreadsheet, config).await?;
    let normalized = columns::normalize_sheet(&sheet);
    let parse_duration_ms = parse_start.elapsed().as_millis() as u64;

    // ── Step 2: Validate ─────────────────────────────────────────────────
    columns::validate_columns(&normalized.columns)?;
    let rows = normalized.rows;
    if rows.is_empty() {
        return Err(PayslipError::NoDataRows);
    }
    let total_rows = rows.len();
    debug!("Validated {} rows in sheet '{}'", total_rows, sheet.name);

    // ── Step 3: Prepare shared inputs ────────────────────────────────────
    let (logo_w, logo_h) = config.logo_box_points();
    let logo = Arc::new(logo::prepare_logo(logo, logo_w, logo_h));
    let logo_error = logo.error().cloned();
    let company = Arc::new(company.clone());
    let filenames = assign_filenames(&rows);

    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_start(total_rows);
    }

    // ── Step 4: Render rows ──────────────────────────────────────────────
    let render_start = Instant::now();
    let results = render_rows(rows, filenames, &company, &logo, config).await;
    let render_duration_ms = render_start.elapsed().as_millis() as u64;

    let success = results.iter().filter(|r| r.is_ok()).count();
    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_complete(total_rows, success);
    }
    let documents = results.into_iter().collect::<Result<Vec<_>, _>>()?;
    info!(
        "Rendered {} payslips in {}ms",
        documents.len(),
        render_duration_ms
    );

    // ── Step 5: Package ──────────────────────────────────────────────────
    let output = package(documents, &config.archive_filename)?;

    let stats = BatchStats {
        rows: total_rows,
        documents: output.document_count(),
        primary_bytes: output.primary().len(),
        parse_duration_ms,
        render_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };
    info!(
        "Batch complete: {} ({} bytes, {}ms total)",
        output.primary().filename,
        stats.primary_bytes,
        stats.total_duration_ms
    );

    Ok(BatchResult {
        output,
        stats,
        logo_error,
    })
}

/// Synchronous wrapper around [`generate`].
///
/// Creates a temporary tokio runtime internally.
pub fn generate_sync(
    spreadsheet: &[u8],
    company: &CompanyInfo,
    logo: Option<&[u8]>,
    config: &GenerationConfig,
) -> Result<BatchResult, PayslipError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| PayslipError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(generate(spreadsheet, company, logo, config))
}

/// Generate a batch and write it into `out_dir`.
///
/// Writes the primary artifact and, for archives, the preview PDF next to
/// it. Uses atomic writes (temp file + rename) to prevent partial files.
pub async fn generate_to_dir(
    spreadsheet: &[u8],
    company: &CompanyInfo,
    logo: Option<&[u8]>,
    out_dir: impl AsRef<Path>,
    config: &GenerationConfig,
) -> Result<BatchStats, PayslipError> {
    let result = generate(spreadsheet, company, logo, config).await?;
    write_batch(&result, out_dir).await?;
    Ok(result.stats)
}

/// Write a batch's artifacts into `out_dir`, returning the written paths.
pub async fn write_batch(
    result: &BatchResult,
    out_dir: impl AsRef<Path>,
) -> Result<Vec<PathBuf>, PayslipError> {
    let dir = out_dir.as_ref();
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| PayslipError::OutputWriteFailed {
            path: dir.to_path_buf(),
            source: e,
        })?;

    let mut written = vec![write_atomic(dir, result.primary()).await?];
    if result.output.is_archive() {
        written.push(write_atomic(dir, result.preview()).await?);
    }
    Ok(written)
}

async fn write_atomic(dir: &Path, doc: &PayslipDocument) -> Result<PathBuf, PayslipError> {
    let path = dir.join(&doc.filename);
    let tmp_path = dir.join(format!("{}.tmp", doc.filename));
    let write_err = |e: std::io::Error| PayslipError::OutputWriteFailed {
        path: path.clone(),
        source: e,
    };

    tokio::fs::write(&tmp_path, &doc.content)
        .await
        .map_err(write_err)?;
    tokio::fs::rename(&tmp_path, &path)
        .await
        .map_err(write_err)?;

    debug!("Wrote {} ({} bytes)", path.display(), doc.len());
    Ok(path)
}

/// Report how a workbook's headers map to canonical columns.
///
/// Renders nothing and does not fail on missing columns; those are listed in
/// [`SheetReport::missing_required`].
pub async fn inspect(
    spreadsheet: &[u8],
    config: &GenerationConfig,
) -> Result<SheetReport, PayslipError> {
    let sheet = load_sheet(spreadsheet, config).await?;
    let mapping: Vec<ColumnMapping> = sheet
        .headers
        .iter()
        .map(|raw| ColumnMapping {
            raw: raw.clone(),
            canonical: columns::canonical_name(raw),
            recognized: columns::is_recognized(raw),
        })
        .collect();
    let missing_required = columns::missing_columns(mapping.iter().map(|m| m.canonical.as_str()))
        .into_iter()
        .map(String::from)
        .collect();

    Ok(SheetReport {
        sheet_name: sheet.name,
        columns: mapping,
        data_rows: sheet.rows.len(),
        missing_required,
    })
}

// ── Naming ───────────────────────────────────────────────────────────────

/// `payslip_<name>_<id>.pdf` for one row.
pub fn payslip_filename(row: &NormalizedRow) -> String {
    let name = filename_part(row.get("employee_name"), "employee");
    let id = filename_part(row.get("employee_id"), "id");
    format!("payslip_{name}_{id}.pdf")
}

fn filename_part(value: &CellValue, fallback: &str) -> String {
    if value.is_blank() {
        return fallback.to_string();
    }
    display_value(value).trim().replace([' ', '/', '\\'], "_")
}

/// Filenames for every row, with `_2`, `_3`, ... appended to repeats.
pub fn assign_filenames(rows: &[NormalizedRow]) -> Vec<String> {
    let mut used: HashSet<String> = HashSet::with_capacity(rows.len());
    rows.iter()
        .map(|row| {
            let base = payslip_filename(row);
            if used.insert(base.clone()) {
                return base;
            }
            let stem = base.trim_end_matches(".pdf");
            let unique = (2..)
                .map(|n| format!("{stem}_{n}.pdf"))
                .find(|candidate| !used.contains(candidate))
                .unwrap_or_else(|| format!("{stem}_{}.pdf", row.row_number));
            warn!(
                "Row {}: filename '{}' already used, writing '{}'",
                row.row_number, base, unique
            );
            used.insert(unique.clone());
            unique
        })
        .collect()
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Parse the workbook off the async executor; calamine is blocking.
async fn load_sheet(
    spreadsheet: &[u8],
    config: &GenerationConfig,
) -> Result<input::RawSheet, PayslipError> {
    let bytes = spreadsheet.to_vec();
    let selection = config.sheet.clone();
    tokio::task::spawn_blocking(move || input::read_spreadsheet(&bytes, &selection))
        .await
        .map_err(|e| PayslipError::Internal(format!("Spreadsheet task panicked: {}", e)))?
}

/// Render rows concurrently, keeping sheet order in the result.
async fn render_rows(
    rows: Vec<NormalizedRow>,
    filenames: Vec<String>,
    company: &Arc<CompanyInfo>,
    logo: &Arc<logo::LogoOutcome>,
    config: &GenerationConfig,
) -> Vec<Result<PayslipDocument, PayslipError>> {
    let total_rows = rows.len();
    stream::iter(rows.into_iter().zip(filenames).map(|(row, filename)| {
        let company = Arc::clone(company);
        let logo = Arc::clone(logo);
        let config_clone = config.clone();
        async move {
            let row_num = row.row_number;
            let callback = config_clone.progress_callback.clone();
            if let Some(ref cb) = callback {
                cb.on_row_start(row_num, total_rows);
            }

            let result = tokio::task::spawn_blocking(move || {
                render::render_payslip(&row, &company, &logo, &config_clone)
            })
            .await
            .map_err(|e| PayslipError::Internal(format!("Render task panicked: {}", e)))
            .and_then(|rendered| rendered)
            .map(|bytes| PayslipDocument::pdf(filename, bytes));

            if let Some(ref cb) = callback {
                match &result {
                    Ok(doc) => cb.on_row_complete(row_num, total_rows, &doc.filename, doc.len()),
                    Err(e) => cb.on_row_error(row_num, total_rows, &e.to_string()),
                }
            }
            result
        }
    }))
    .buffered(config.concurrency.max(1))
    .collect()
    .await
}

/// One document is returned as-is; several are zipped with the first as preview.
pub fn package(
    mut documents: Vec<PayslipDocument>,
    archive_filename: &str,
) -> Result<BatchOutput, PayslipError> {
    if documents.len() == 1 {
        if let Some(doc) = documents.pop() {
            return Ok(BatchOutput::Single(doc));
        }
    }
    let preview = documents.first().cloned().ok_or(PayslipError::NoDataRows)?;
    let bytes = archive::build_archive(&documents)?;
    let members = documents.into_iter().map(|d| d.filename).collect();
    Ok(BatchOutput::Archive {
        archive: PayslipDocument::zip(archive_filename, bytes),
        preview,
        members,
    })
}
