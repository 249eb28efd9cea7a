//! CLI binary for xlsx2payslip.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `GenerationConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;
use xlsx2payslip::pipeline::input::read_salary_file;
use xlsx2payslip::{
    generate, inspect, write_batch, CompanyInfo, GenerationConfig, GenerationProgressCallback,
    ProgressCallback, SheetReport, SheetSelection,
};

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a live bar plus one log line per row. Rows
/// may finish out of order.
struct CliProgressCallback {
    bar: ProgressBar,
    start_times: Mutex<HashMap<usize, Instant>>,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    /// Spinner until `on_batch_start` tells us the row count.
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);

        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Reading spreadsheet…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            start_times: Mutex::new(HashMap::new()),
            errors: AtomicUsize::new(0),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} rows  \
             ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Rendering");
        self.bar.reset_eta();
    }

    fn elapsed_ms(&self, row: usize) -> u128 {
        self.start_times
            .lock()
            .map(|mut m| m.remove(&row))
            .ok()
            .flatten()
            .map(|t| t.elapsed().as_millis())
            .unwrap_or(0)
    }
}

impl GenerationProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total_rows: usize) {
        self.activate_bar(total_rows);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Generating {total_rows} payslips…"))
        ));
    }

    fn on_row_start(&self, row: usize, _total: usize) {
        if let Ok(mut m) = self.start_times.lock() {
            m.insert(row, Instant::now());
        }
        self.bar.set_message(format!("row {row}"));
    }

    fn on_row_complete(&self, row: usize, total: usize, filename: &str, bytes: usize) {
        let elapsed_ms = self.elapsed_ms(row);
        self.bar.println(format!(
            "  {} Row {:>3}/{:<3}  {}  {}",
            green("✓"),
            row,
            total,
            filename,
            dim(&format!(
                "{:>6} bytes  {:.2}s",
                bytes,
                elapsed_ms as f64 / 1000.0
            )),
        ));
        self.bar.inc(1);
    }

    fn on_row_error(&self, row: usize, total: usize, error: &str) {
        let elapsed_ms = self.elapsed_ms(row);
        self.errors.fetch_add(1, Ordering::SeqCst);

        let msg: String = if error.chars().count() > 80 {
            error.chars().take(79).chain(['…']).collect()
        } else {
            error.to_string()
        };

        self.bar.println(format!(
            "  {} Row {:>3}/{:<3}  {}  {}",
            red("✗"),
            row,
            total,
            red(&msg),
            dim(&format!("{:.2}s", elapsed_ms as f64 / 1000.0)),
        ));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, total_rows: usize, success_count: usize) {
        self.bar.finish_and_clear();
        let failed = self.errors.load(Ordering::SeqCst);
        if let Some(line) = batch_failure_line(total_rows, success_count, failed) {
            eprintln!("{line}");
        }
    }
}

/// Summary for an aborted batch. Successful batches are reported by `main`
/// once the files are on disk.
fn batch_failure_line(total_rows: usize, success_count: usize, failed: usize) -> Option<String> {
    (success_count < total_rows).then(|| {
        format!(
            "{} {}/{} rows rendered  ({} failed, batch aborted)",
            red("✘"),
            bold(&success_count.to_string()),
            total_rows,
            red(&failed.to_string()),
        )
    })
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # One PDF per employee, zipped when the sheet has several rows
  xlsx2payslip salary_jan.xlsx --company-name "Acme Pvt Ltd" \
      --company-address "12 MG Road, Pune" -o out/

  # With contact line and logo
  xlsx2payslip salary.xlsx --company-name Acme --company-address "Pune" \
      --company-email hr@acme.example --company-phone "+91 20 5555 0000" \
      --logo logo.png -o out/

  # Pick a sheet by name or 0-based index
  xlsx2payslip salary.xlsx --sheet March --company-name Acme --company-address Pune

  # Show how headers map to fields, without rendering
  xlsx2payslip --inspect-only salary.xlsx

REQUIRED COLUMNS (any accepted spelling):
  employee_id     Emp Code, Employee No, EmployeeID, …
  employee_name   Employee Name, Emp Name
  month           Month, Pay Month, Payslip for the month of

OUTPUT:
  One data row   payslip_<name>_<id>.pdf
  Several rows   payslips.zip plus the first row's PDF as preview

ENVIRONMENT VARIABLES:
  XLSX2PAYSLIP_COMPANY_NAME, XLSX2PAYSLIP_COMPANY_ADDRESS,
  XLSX2PAYSLIP_COMPANY_EMAIL, XLSX2PAYSLIP_COMPANY_PHONE,
  XLSX2PAYSLIP_LOGO, XLSX2PAYSLIP_OUTPUT, XLSX2PAYSLIP_SHEET,
  XLSX2PAYSLIP_CONCURRENCY   Defaults for the matching flags
  RUST_LOG                   Override log filtering
"#;

/// Generate per-employee PDF payslips from a salary spreadsheet.
#[derive(Parser, Debug)]
#[command(
    name = "xlsx2payslip",
    version,
    about = "Generate per-employee PDF payslips from a salary spreadsheet",
    long_about = "Read a monthly salary workbook (.xlsx, .xls or .ods), map its columns onto \
canonical payroll fields, and write one A4 PDF payslip per employee row. Several rows are \
bundled into a zip.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Salary spreadsheet (.xlsx, .xls, .ods).
    salary_file: PathBuf,

    /// Company name printed in every header.
    #[arg(long, env = "XLSX2PAYSLIP_COMPANY_NAME", required_unless_present = "inspect_only")]
    company_name: Option<String>,

    /// Company address; `\n` separates lines.
    #[arg(long, env = "XLSX2PAYSLIP_COMPANY_ADDRESS", required_unless_present = "inspect_only")]
    company_address: Option<String>,

    /// Contact email shown under the address.
    #[arg(long, env = "XLSX2PAYSLIP_COMPANY_EMAIL")]
    company_email: Option<String>,

    /// Contact phone shown under the address.
    #[arg(long, env = "XLSX2PAYSLIP_COMPANY_PHONE")]
    company_phone: Option<String>,

    /// Logo image (PNG or JPEG). Undecodable logos are skipped with a warning.
    #[arg(long, env = "XLSX2PAYSLIP_LOGO")]
    logo: Option<PathBuf>,

    /// Directory to write the PDF or zip into.
    #[arg(short, long, env = "XLSX2PAYSLIP_OUTPUT", default_value = ".")]
    output: PathBuf,

    /// Worksheet name or 0-based index. Default: first sheet.
    #[arg(long, env = "XLSX2PAYSLIP_SHEET")]
    sheet: Option<String>,

    /// Rows rendered in parallel.
    #[arg(short, long, env = "XLSX2PAYSLIP_CONCURRENCY", default_value_t = 4)]
    concurrency: usize,

    /// Print the column mapping only, no rendering.
    #[arg(long)]
    inspect_only: bool,

    /// Print a JSON summary instead of text.
    #[arg(long, env = "XLSX2PAYSLIP_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "XLSX2PAYSLIP_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "XLSX2PAYSLIP_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "XLSX2PAYSLIP_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Library INFO logs are hidden while the progress bar is drawing.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.inspect_only;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let spreadsheet = read_salary_file(&cli.salary_file)
        .with_context(|| format!("Failed to read {}", cli.salary_file.display()))?;

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let config = build_config(&cli, None)?;
        let report = inspect(&spreadsheet, &config)
            .await
            .context("Failed to inspect spreadsheet")?;
        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&report).context("Failed to serialize report")?
            );
        } else {
            print_report(&cli.salary_file, &report);
        }
        return Ok(());
    }

    // ── Build inputs ─────────────────────────────────────────────────────
    let company = build_company(&cli)?;
    let logo = match cli.logo {
        Some(ref path) => Some(
            tokio::fs::read(path)
                .await
                .with_context(|| format!("Failed to read logo {}", path.display()))?,
        ),
        None => None,
    };

    let progress_cb: Option<ProgressCallback> = if show_progress {
        let cb = CliProgressCallback::new_dynamic();
        Some(cb as Arc<dyn GenerationProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;

    // ── Generate ─────────────────────────────────────────────────────────
    let result = generate(&spreadsheet, &company, logo.as_deref(), &config)
        .await
        .context("Payslip generation failed")?;
    let written = write_batch(&result, &cli.output)
        .await
        .context("Failed to write output")?;

    if cli.json {
        let summary = serde_json::json!({
            "stats": result.stats,
            "files": written,
            "preview": result.preview().filename,
            "logo_error": result.logo_error.as_ref().map(|e| e.to_string()),
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).context("Failed to serialise summary")?
        );
        return Ok(());
    }

    if !cli.quiet {
        if let Some(ref e) = result.logo_error {
            eprintln!("{} {}", yellow("⚠"), yellow(&format!("Logo skipped: {e}")));
        }
        eprintln!(
            "{}  {} payslips  {}ms  →  {}",
            green("✔"),
            result.stats.documents,
            result.stats.total_duration_ms,
            bold(&written[0].display().to_string()),
        );
        if let Some(preview) = written.get(1) {
            eprintln!("   preview: {}", dim(&preview.display().to_string()));
        }
    }

    Ok(())
}

fn build_company(cli: &Cli) -> Result<CompanyInfo> {
    let name = cli
        .company_name
        .clone()
        .filter(|s| !s.trim().is_empty())
        .context("--company-name is required")?;
    let address = cli
        .company_address
        .clone()
        .context("--company-address is required")?
        .replace("\\n", "\n");

    let mut company = CompanyInfo::new(name, address);
    company.email = cli.company_email.clone().filter(|s| !s.trim().is_empty());
    company.phone = cli.company_phone.clone().filter(|s| !s.trim().is_empty());
    Ok(company)
}

/// Map CLI args to `GenerationConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<GenerationConfig> {
    let sheet = cli
        .sheet
        .as_deref()
        .map(SheetSelection::parse)
        .unwrap_or_default();

    let mut builder = GenerationConfig::builder()
        .sheet(sheet)
        .concurrency(cli.concurrency);
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }
    builder.build().context("Invalid configuration")
}

fn print_report(path: &Path, report: &SheetReport) {
    println!("File:        {}", path.display());
    println!("Sheet:       {}", report.sheet_name);
    println!("Data rows:   {}", report.data_rows);
    println!();
    for col in &report.columns {
        let marker = if col.recognized {
            green("✓")
        } else {
            dim("·")
        };
        println!("  {} {:<32} → {}", marker, col.raw, col.canonical);
    }
    println!();
    if report.missing_required.is_empty() {
        println!("{} all required columns present", green("✔"));
    } else {
        println!(
            "{} missing required columns: {}",
            red("✘"),
            report.missing_required.join(", ")
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn successful_batch_has_no_callback_summary() {
        assert_eq!(batch_failure_line(3, 3, 0), None);
    }

    #[test]
    fn aborted_batch_reports_failures() {
        let line = batch_failure_line(3, 2, 1).unwrap();
        assert!(line.contains("rows rendered"));
        assert!(line.contains("batch aborted"));
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let cli = Cli::parse_from(["xlsx2payslip", "salary.xlsx", "--inspect-only", "-c", "0"]);
        assert!(build_config(&cli, None).is_err());
    }
}
