//! Row rendering: one normalised row → one A4 payslip PDF.
//!
//! Rendering happens in two steps. [`PayslipView::from_row`] is pure: it
//! resolves every string and amount that will appear on the page, including
//! the [`PayslipFigures`] totals. [`render_payslip`] then lays the view out
//! with [`PageBuilder`]. Only the second step can fail, and only when lopdf
//! cannot serialise the document.
//!
//! ## Totals
//!
//! Explicit sheet totals win over derived ones, but only when nonzero: a
//! `gross_salary` of `0` (or blank, or `-`) falls back to the sum of the
//! earnings columns, and likewise for `total_deductions` and `net_payable`.

use crate::config::GenerationConfig;
use crate::error::PayslipError;
use crate::output::CompanyInfo;
use crate::pipeline::coerce::{
    display_value, format_amount, format_money, format_month, pick_value, safe_number,
};
use crate::pipeline::columns::{NormalizedRow, DEDUCTION_COLUMNS, EARNING_COLUMNS};
use crate::pipeline::layout::{fit_size, fit_text, Font, PageBuilder, MM, PAGE_HEIGHT};
use crate::pipeline::logo::LogoOutcome;
use crate::pipeline::words::number_to_words;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Synonyms for the days-worked figure, most specific first.
const WORK_DAY_COLUMNS: [&str; 4] = [
    "effective_work_days",
    "present_days",
    "pay_days",
    "total_working_days",
];

// ── Figures ──────────────────────────────────────────────────────────────

/// Monetary results computed for one row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayslipFigures {
    /// Sum of the earnings columns.
    pub earnings_total: f64,
    /// Sum of the deduction columns.
    pub deductions_total: f64,
    pub gross_salary: f64,
    pub total_deductions: f64,
    pub net_payable: f64,
    /// `net_payable` in words, without the `Rupees`/`Only` wrapper.
    pub net_in_words: String,
}

impl PayslipFigures {
    pub fn from_row(row: &NormalizedRow) -> Self {
        let earnings_total: f64 = EARNING_COLUMNS.iter().map(|c| safe_number(row.get(c))).sum();
        let deductions_total: f64 = DEDUCTION_COLUMNS
            .iter()
            .map(|c| safe_number(row.get(c)))
            .sum();

        let gross_salary = explicit_or(row, "gross_salary", earnings_total);
        let total_deductions = explicit_or(row, "total_deductions", deductions_total);
        let net_payable = explicit_or(row, "net_payable", gross_salary - total_deductions);

        Self {
            earnings_total,
            deductions_total,
            gross_salary,
            total_deductions,
            net_payable,
            net_in_words: number_to_words(net_payable),
        }
    }
}

fn explicit_or(row: &NormalizedRow, key: &str, derived: f64) -> f64 {
    let explicit = safe_number(row.get(key));
    if explicit != 0.0 {
        explicit
    } else {
        derived
    }
}

/// `transport_allowances` → `Transport Allowances`.
pub fn field_label(field: &str) -> String {
    field
        .split('_')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

// ── View ─────────────────────────────────────────────────────────────────

/// One line of the earnings or deductions column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmountLine {
    pub label: String,
    /// Earnings only: the `<field>_master` amount, or `-`.
    pub master: Option<String>,
    pub actual: String,
}

/// Every string printed on a payslip, resolved from one row.
#[derive(Debug, Clone, PartialEq)]
pub struct PayslipView {
    pub month_label: String,
    /// Two label/value pairs per line.
    pub identity: Vec<[(String, String); 2]>,
    pub earnings: Vec<AmountLine>,
    pub deductions: Vec<AmountLine>,
    pub figures: PayslipFigures,
}

impl PayslipView {
    pub fn from_row(row: &NormalizedRow) -> Self {
        let value = |key: &str| display_value(row.get(key));
        let work_days = pick_value(row, &WORK_DAY_COLUMNS)
            .map(display_value)
            .unwrap_or_else(|| "-".to_string());

        let pair = |a: &str, av: String, b: &str, bv: String| {
            [(a.to_string(), av), (b.to_string(), bv)]
        };
        let identity = vec![
            pair("Name", value("employee_name"), "Employee No", value("employee_id")),
            pair("Joining Date", value("joining_date"), "Bank Name", value("bank_name")),
            pair("Designation", value("designation"), "Bank Account No", value("account_number")),
            pair("Department", value("department"), "PAN Number", value("pan_number")),
            pair("Location", value("location"), "PF No", value("pf_no")),
            pair("Effective Work Days", work_days, "PF UAN", value("pf_uan")),
            pair("LOP", value("lop_days"), "", String::new()),
        ];

        let earnings = EARNING_COLUMNS
            .iter()
            .filter(|c| row.contains(c))
            .map(|c| {
                let master = safe_number(row.get(&format!("{c}_master")));
                AmountLine {
                    label: field_label(c),
                    master: Some(if master != 0.0 {
                        format_amount(master)
                    } else {
                        "-".to_string()
                    }),
                    actual: format_money(row.get(c)),
                }
            })
            .collect();

        let deductions = DEDUCTION_COLUMNS
            .iter()
            .filter(|c| row.contains(c))
            .map(|c| AmountLine {
                label: field_label(c),
                master: None,
                actual: format_money(row.get(c)),
            })
            .collect();

        Self {
            month_label: format_month(row.get("month")),
            identity,
            earnings,
            deductions,
            figures: PayslipFigures::from_row(row),
        }
    }

    pub fn title_line(&self) -> String {
        format!("Payslip for the month of {}", self.month_label)
    }

    pub fn net_pay_line(&self) -> String {
        format!(
            "Net Pay for the month ( Total Earnings - Total Deductions ):  {}",
            format_amount(self.figures.net_payable)
        )
    }

    pub fn words_line(&self) -> String {
        format!("(Rupees {} Only)", self.figures.net_in_words)
    }

    /// Lines in the earnings/deductions table body, at least one.
    pub fn table_rows(&self) -> usize {
        self.earnings.len().max(self.deductions.len()).max(1)
    }
}

// ── Layout ───────────────────────────────────────────────────────────────

const MARGIN: f32 = 20.0 * MM;
const CONTENT_WIDTH: f32 = 170.0 * MM;
const CELL_PAD: f32 = 3.0;
const ROW_HEIGHT: f32 = 6.0 * MM;
const BODY_SIZE: f32 = 9.0;
const BORDER: f32 = 0.5;
const GRID: f32 = 0.25;
const BORDER_GRAY: f32 = 0.5;
const GRID_GRAY: f32 = 0.83;

/// Baseline that vertically centres `size`-point text in a row.
fn baseline(row_bottom: f32, row_height: f32, size: f32) -> f32 {
    row_bottom + (row_height - size * 0.72) / 2.0
}

/// Render one row to PDF bytes.
pub fn render_payslip(
    row: &NormalizedRow,
    company: &CompanyInfo,
    logo: &LogoOutcome,
    config: &GenerationConfig,
) -> Result<Vec<u8>, PayslipError> {
    let view = PayslipView::from_row(row);
    let mut page = PageBuilder::new();

    let mut top = PAGE_HEIGHT - MARGIN;
    top = draw_header(&mut page, top, company, logo, &view);
    top -= 6.0;
    top = draw_identity(&mut page, top, &view);
    top -= 8.0;
    top = draw_amounts(&mut page, top, &view);
    top -= 8.0;
    top = draw_net(&mut page, top, &view);
    page.text(MARGIN, top - 16.0, 8.0, Font::Regular, &config.footer_note);

    let title = format!(
        "Payslip {} {}",
        display_value(row.get("employee_name")),
        view.month_label
    );
    let bytes = page
        .finish(&title, logo.image(), config.compress_documents)
        .map_err(|e| PayslipError::RenderFailed {
            row: row.row_number,
            detail: e.to_string(),
        })?;
    debug!("Row {} rendered ({} bytes)", row.row_number, bytes.len());
    Ok(bytes)
}

fn draw_header(
    page: &mut PageBuilder,
    top: f32,
    company: &CompanyInfo,
    logo: &LogoOutcome,
    view: &PayslipView,
) -> f32 {
    let left_w = 140.0 * MM;

    let address: Vec<&str> = company
        .address
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    let contact = company.contact_line();
    let text_lines = address.len() + usize::from(contact.is_some());
    let needed = 8.0 + 18.0 + 11.0 * text_lines as f32 + 6.0;
    let logo_h = logo.image().map_or(0.0, |img| img.height as f32 + 4.0);
    let band_h = (24.0 * MM).max(needed).max(logo_h);
    let title_h = 8.0 * MM;
    let bottom = top - band_h - title_h;

    // Company block, vertically centred in the band.
    let block_h = 16.0 + 11.0 * text_lines as f32;
    let mut y = top - (band_h - block_h) / 2.0 - 14.0;
    let name_size = fit_size(&company.name, left_w - 2.0 * CELL_PAD, 16.0, 9.0, Font::Bold);
    page.text(MARGIN + CELL_PAD, y, name_size, Font::Bold, &company.name);
    for line in address.iter().copied().chain(contact.as_deref()) {
        y -= 11.0;
        let fitted = fit_text(line, left_w - 2.0 * CELL_PAD, BODY_SIZE, Font::Regular);
        page.text(MARGIN + CELL_PAD, y, BODY_SIZE, Font::Regular, &fitted);
    }

    if let Some(img) = logo.image() {
        let (w, h) = (img.width as f32, img.height as f32);
        let x = MARGIN + CONTENT_WIDTH - 2.0 - w;
        let y = top - band_h + (band_h - h) / 2.0;
        page.logo(x, y, w, h);
    }

    page.text_centered(
        MARGIN + CONTENT_WIDTH / 2.0,
        baseline(bottom, title_h, 11.0),
        11.0,
        Font::Bold,
        &view.title_line(),
    );

    page.stroke_gray(GRID_GRAY);
    page.line(MARGIN, top - band_h, MARGIN + CONTENT_WIDTH, top - band_h, GRID);
    page.line(MARGIN + left_w, top, MARGIN + left_w, top - band_h, GRID);
    page.stroke_gray(BORDER_GRAY);
    page.rect(MARGIN, bottom, CONTENT_WIDTH, band_h + title_h, BORDER);
    bottom
}

fn draw_identity(page: &mut PageBuilder, top: f32, view: &PayslipView) -> f32 {
    let widths = [35.0 * MM, 50.0 * MM, 35.0 * MM, 50.0 * MM];
    let xs = column_offsets(&widths);
    let rows = view.identity.len();
    let bottom = top - ROW_HEIGHT * rows as f32;

    for (i, pairs) in view.identity.iter().enumerate() {
        let row_bottom = top - ROW_HEIGHT * (i + 1) as f32;
        let y = baseline(row_bottom, ROW_HEIGHT, BODY_SIZE);
        let cells = [&pairs[0].0, &pairs[0].1, &pairs[1].0, &pairs[1].1];
        for (col, text) in cells.iter().enumerate() {
            let fitted = fit_text(text, widths[col] - 2.0 * CELL_PAD, BODY_SIZE, Font::Regular);
            page.text(xs[col] + CELL_PAD, y, BODY_SIZE, Font::Regular, &fitted);
        }
    }

    draw_grid(page, top, bottom, rows, &xs, None);
    bottom
}

fn draw_amounts(page: &mut PageBuilder, top: f32, view: &PayslipView) -> f32 {
    let widths = [55.0 * MM, 20.0 * MM, 20.0 * MM, 55.0 * MM, 20.0 * MM];
    let xs = column_offsets(&widths);
    let body = view.table_rows();
    let rows = body + 2;
    let bottom = top - ROW_HEIGHT * rows as f32;

    page.fill_rect(MARGIN, top - ROW_HEIGHT, CONTENT_WIDTH, ROW_HEIGHT, 0.95);
    let head_y = baseline(top - ROW_HEIGHT, ROW_HEIGHT, BODY_SIZE);
    for (col, title) in ["Earnings", "Master", "Actual", "Deductions", "Actual"]
        .iter()
        .enumerate()
    {
        page.text(xs[col] + CELL_PAD, head_y, BODY_SIZE, Font::Bold, title);
    }

    for i in 0..body {
        let row_bottom = top - ROW_HEIGHT * (i + 2) as f32;
        let y = baseline(row_bottom, ROW_HEIGHT, BODY_SIZE);
        if let Some(line) = view.earnings.get(i) {
            let label = fit_text(
                &line.label,
                widths[0] - 2.0 * CELL_PAD,
                BODY_SIZE,
                Font::Regular,
            );
            page.text(xs[0] + CELL_PAD, y, BODY_SIZE, Font::Regular, &label);
            if let Some(master) = &line.master {
                amount_cell(page, xs[1], widths[1], y, master, Font::Regular);
            }
            amount_cell(page, xs[2], widths[2], y, &line.actual, Font::Regular);
        }
        if let Some(line) = view.deductions.get(i) {
            let label = fit_text(
                &line.label,
                widths[3] - 2.0 * CELL_PAD,
                BODY_SIZE,
                Font::Regular,
            );
            page.text(xs[3] + CELL_PAD, y, BODY_SIZE, Font::Regular, &label);
            amount_cell(page, xs[4], widths[4], y, &line.actual, Font::Regular);
        }
    }

    let totals_y = baseline(bottom, ROW_HEIGHT, BODY_SIZE);
    let gross = format_amount(view.figures.gross_salary);
    let deductions = format_amount(view.figures.total_deductions);
    page.text(xs[0] + CELL_PAD, totals_y, BODY_SIZE, Font::Bold, "Total Earnings: INR.");
    amount_cell(page, xs[2], widths[2], totals_y, &gross, Font::Bold);
    page.text(xs[3] + CELL_PAD, totals_y, BODY_SIZE, Font::Bold, "Total Deductions: INR.");
    amount_cell(page, xs[4], widths[4], totals_y, &deductions, Font::Bold);

    // The totals label spans the first two columns.
    draw_grid(page, top, bottom, rows, &xs, Some((1, bottom + ROW_HEIGHT)));
    bottom
}

/// Right-aligned amount, shrunk rather than truncated when the cell is narrow.
fn amount_cell(page: &mut PageBuilder, x: f32, width: f32, y: f32, text: &str, font: Font) {
    let size = fit_size(text, width - 2.0 * CELL_PAD, BODY_SIZE, 6.0, font);
    page.text_right(x + width - CELL_PAD, y, size, font, text);
}

fn draw_net(page: &mut PageBuilder, top: f32, view: &PayslipView) -> f32 {
    let row_h = 7.0 * MM;
    let bottom = top - 2.0 * row_h;
    let x = MARGIN + CELL_PAD;
    let avail = CONTENT_WIDTH - 2.0 * CELL_PAD;

    let net = view.net_pay_line();
    let size = fit_size(&net, avail, 10.0, 7.0, Font::Bold);
    page.text(x, baseline(top - row_h, row_h, 10.0), size, Font::Bold, &net);
    let words = view.words_line();
    let size = fit_size(&words, avail, 10.0, 6.0, Font::Regular);
    page.text(x, baseline(bottom, row_h, 10.0), size, Font::Regular, &words);

    page.stroke_gray(BORDER_GRAY);
    page.rect(MARGIN, bottom, CONTENT_WIDTH, 2.0 * row_h, BORDER);
    bottom
}

/// Left edges of each column, starting at the margin.
fn column_offsets<const N: usize>(widths: &[f32; N]) -> [f32; N] {
    let mut xs = [MARGIN; N];
    for i in 1..N {
        xs[i] = xs[i - 1] + widths[i - 1];
    }
    xs
}

/// Inner grid plus outer box. `short_divider` stops the vertical line at
/// column `.0` above height `.1` so a bottom cell can span two columns.
fn draw_grid<const N: usize>(
    page: &mut PageBuilder,
    top: f32,
    bottom: f32,
    rows: usize,
    xs: &[f32; N],
    short_divider: Option<(usize, f32)>,
) {
    let right = MARGIN + CONTENT_WIDTH;
    page.stroke_gray(GRID_GRAY);
    for i in 1..rows {
        let y = top - ROW_HEIGHT * i as f32;
        page.line(MARGIN, y, right, y, GRID);
    }
    for (col, &x) in xs.iter().enumerate().skip(1) {
        let end = match short_divider {
            Some((c, y)) if c == col => y,
            _ => bottom,
        };
        page.line(x, top, x, end, GRID);
    }
    page.stroke_gray(BORDER_GRAY);
    page.rect(MARGIN, bottom, CONTENT_WIDTH, top - bottom, BORDER);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::coerce::CellValue;
    use crate::pipeline::logo::LogoImage;

    fn jane() -> NormalizedRow {
        NormalizedRow::from_raw_pairs(
            1,
            [
                ("Emp Code", CellValue::from("E001")),
                ("Employee Name", CellValue::from("Jane Doe")),
                ("Month", CellValue::from("2026-01-01")),
                ("Basic", CellValue::Float(30000.0)),
                ("HRA", CellValue::Float(5000.0)),
                ("PF Employee", CellValue::Float(1800.0)),
            ],
        )
    }

    fn uncompressed() -> GenerationConfig {
        GenerationConfig::builder().compress_documents(false).build().unwrap()
    }

    #[test]
    fn figures_derive_totals() {
        let f = PayslipFigures::from_row(&jane());
        assert_eq!(f.earnings_total, 35000.0);
        assert_eq!(f.deductions_total, 1800.0);
        assert_eq!(f.gross_salary, 35000.0);
        assert_eq!(f.total_deductions, 1800.0);
        assert_eq!(f.net_payable, 33200.0);
        assert_eq!(f.net_in_words, "Thirty Three Thousand Two Hundred");
    }

    #[test]
    fn explicit_totals_win_when_nonzero() {
        let mut row = jane();
        row.insert("gross_salary".into(), CellValue::Float(40000.0));
        row.insert("net_payable".into(), CellValue::from("-"));
        let f = PayslipFigures::from_row(&row);
        assert_eq!(f.gross_salary, 40000.0);
        assert_eq!(f.net_payable, 38200.0);

        let mut row = jane();
        row.insert("net_payable".into(), CellValue::Float(1.0));
        assert_eq!(PayslipFigures::from_row(&row).net_payable, 1.0);
    }

    #[test]
    fn zero_explicit_total_falls_back() {
        let mut row = jane();
        row.insert("total_deductions".into(), CellValue::Float(0.0));
        assert_eq!(PayslipFigures::from_row(&row).total_deductions, 1800.0);
    }

    #[test]
    fn garbage_amounts_count_as_zero() {
        let row = NormalizedRow::from_raw_pairs(
            1,
            [("basic", CellValue::from("abc")), ("hra", CellValue::Empty)],
        );
        let f = PayslipFigures::from_row(&row);
        assert_eq!(f.net_payable, 0.0);
        assert_eq!(f.net_in_words, "Zero");
    }

    #[test]
    fn labels_are_title_cased() {
        assert_eq!(field_label("transport_allowances"), "Transport Allowances");
        assert_eq!(field_label("pf_employee"), "Pf Employee");
        assert_eq!(field_label("tds"), "Tds");
        assert_eq!(field_label("salary_arrear_allowance"), "Salary Arrear Allowance");
    }

    #[test]
    fn view_lists_only_present_amount_columns() {
        let view = PayslipView::from_row(&jane());
        let labels: Vec<&str> = view.earnings.iter().map(|l| l.label.as_str()).collect();
        assert_eq!(labels, vec!["Basic", "Hra"]);
        assert_eq!(view.deductions.len(), 1);
        assert_eq!(view.deductions[0].actual, "1,800.00");
        assert_eq!(view.earnings[0].master.as_deref(), Some("-"));
        assert_eq!(view.table_rows(), 2);
    }

    #[test]
    fn amount_lines_match_money_formatting() {
        let mut row = jane();
        row.insert("tds".into(), CellValue::from("-"));
        row.insert("da".into(), CellValue::from("2500.5"));
        let view = PayslipView::from_row(&row);
        for line in view.earnings.iter().chain(view.deductions.iter()) {
            let key = line.label.to_lowercase().replace(' ', "_");
            assert_eq!(line.actual, format_money(row.get(&key)), "line {}", line.label);
        }
        let tds = view.deductions.iter().find(|l| l.label == "Tds").unwrap();
        assert_eq!(tds.actual, "0.00");
        let da = view.earnings.iter().find(|l| l.label == "Da").unwrap();
        assert_eq!(da.actual, "2,500.50");
    }

    #[test]
    fn view_uses_master_column_when_nonzero() {
        let mut row = jane();
        row.insert("basic_master".into(), CellValue::Float(32000.0));
        let view = PayslipView::from_row(&row);
        assert_eq!(view.earnings[0].master.as_deref(), Some("32,000.00"));
    }

    #[test]
    fn view_identity_and_lines() {
        let mut row = jane();
        row.insert("pay_days".into(), CellValue::Float(26.0));
        let view = PayslipView::from_row(&row);
        assert_eq!(view.month_label, "JAN 2026");
        assert_eq!(view.identity[0][0], ("Name".to_string(), "Jane Doe".to_string()));
        assert_eq!(view.identity[0][1].1, "E001");
        assert_eq!(view.identity[1][0].1, "-");
        assert_eq!(view.identity[5][0].1, "26");
        assert_eq!(view.title_line(), "Payslip for the month of JAN 2026");
        assert_eq!(
            view.net_pay_line(),
            "Net Pay for the month ( Total Earnings - Total Deductions ):  33,200.00"
        );
        assert_eq!(view.words_line(), "(Rupees Thirty Three Thousand Two Hundred Only)");
    }

    #[test]
    fn empty_amount_table_keeps_one_row() {
        let row = NormalizedRow::from_raw_pairs(1, [("employee_id", "E9")]);
        assert_eq!(PayslipView::from_row(&row).table_rows(), 1);
    }

    #[test]
    fn render_produces_pdf_with_words_line() {
        let company =
            CompanyInfo::new("Acme Pvt Ltd", "12 MG Road\nPune").with_email("hr@acme.test");
        let bytes =
            render_payslip(&jane(), &company, &LogoOutcome::Absent, &uncompressed()).unwrap();
        assert!(bytes.starts_with(b"%PDF-"));
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("Rupees Thirty Three Thousand Two Hundred Only"));
        assert!(text.contains("Payslip for the month of JAN 2026"));
        assert!(text.contains("Acme Pvt Ltd"));
        assert!(text.contains("hr@acme.test"));
    }

    #[test]
    fn render_with_logo_embeds_image() {
        let logo = LogoOutcome::Embedded(LogoImage {
            width: 4,
            height: 2,
            rgb: vec![0; 24],
        });
        let company = CompanyInfo::new("Acme", "Pune");
        let bytes = render_payslip(&jane(), &company, &logo, &uncompressed()).unwrap();
        let doc = lopdf::Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
        assert!(String::from_utf8_lossy(&bytes).contains("/Im1"));
    }

    #[test]
    fn render_is_deterministic_for_same_row() {
        let company = CompanyInfo::new("Acme", "Pune");
        let config = uncompressed();
        let a = render_payslip(&jane(), &company, &LogoOutcome::Absent, &config).unwrap();
        let b = render_payslip(&jane(), &company, &LogoOutcome::Absent, &config).unwrap();
        assert_eq!(a.len(), b.len());
    }
}
