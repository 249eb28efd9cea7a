//! Defensive coercion of loosely typed spreadsheet cells.
//!
//! Payroll sheets are typed by hand. A salary cell may hold `30000`,
//! `"30000"`, `"-"`, a stray space or nothing at all. None of these may abort
//! a batch: every helper here is total and falls back to `0.0` for numbers
//! or `"-"` for display.

use crate::pipeline::columns::NormalizedRow;
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One cell as read from the workbook.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
}

impl CellValue {
    /// Null, NaN or whitespace-only text.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Float(f) => f.is_nan(),
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<f64> for CellValue {
    fn from(f: f64) -> Self {
        CellValue::Float(f)
    }
}

impl From<i64> for CellValue {
    fn from(i: i64) -> Self {
        CellValue::Int(i)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

impl From<NaiveDateTime> for CellValue {
    fn from(dt: NaiveDateTime) -> Self {
        CellValue::DateTime(dt)
    }
}

impl From<NaiveDate> for CellValue {
    fn from(d: NaiveDate) -> Self {
        CellValue::DateTime(d.and_time(chrono::NaiveTime::MIN))
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&display_value(self))
    }
}

/// Numeric value of a cell, `0.0` when it is blank, `-`, non-numeric or non-finite.
pub fn safe_number(value: &CellValue) -> f64 {
    let n = match value {
        CellValue::Empty | CellValue::DateTime(_) => 0.0,
        CellValue::Int(i) => *i as f64,
        CellValue::Float(f) => *f,
        CellValue::Bool(b) => f64::from(u8::from(*b)),
        CellValue::Text(s) => {
            let t = s.trim();
            if t.is_empty() || t == "-" {
                0.0
            } else {
                t.parse::<f64>().unwrap_or(0.0)
            }
        }
    };
    if n.is_finite() {
        n
    } else {
        0.0
    }
}

/// Human-facing rendering of a cell.
///
/// Blank → `-`; whole floats lose their `.0`; dates render `YYYY-MM-DD`;
/// text carrying a midnight timestamp keeps only its date part.
pub fn display_value(value: &CellValue) -> String {
    match value {
        v if v.is_blank() => "-".to_string(),
        CellValue::Float(f) if f.is_finite() && f.fract() == 0.0 => {
            if *f == 0.0 {
                "0".to_string()
            } else {
                format!("{f:.0}")
            }
        }
        CellValue::Float(f) => f.to_string(),
        CellValue::Int(i) => i.to_string(),
        CellValue::Bool(true) => "True".to_string(),
        CellValue::Bool(false) => "False".to_string(),
        CellValue::DateTime(dt) => dt.format("%Y-%m-%d").to_string(),
        CellValue::Text(s) if s.contains("00:00:00") => {
            s.split(' ').next().unwrap_or_default().to_string()
        }
        CellValue::Text(s) => s.clone(),
        CellValue::Empty => "-".to_string(),
    }
}

/// `safe_number` with comma grouping and two decimals, e.g. `33,200.00`.
pub fn format_money(value: &CellValue) -> String {
    format_amount(safe_number(value))
}

/// Comma-grouped, two-decimal rendering of an amount.
pub fn format_amount(amount: f64) -> String {
    let fixed = format!("{:.2}", amount.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut out = String::with_capacity(fixed.len() + int_part.len() / 3 + 1);
    if amount < 0.0 {
        out.push('-');
    }
    let len = int_part.len();
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out.push('.');
    out.push_str(frac_part);
    out
}

/// Pay month as `JAN 2026`, or [`display_value`] when the cell is not a date.
pub fn format_month(value: &CellValue) -> String {
    if value.is_blank() {
        return "-".to_string();
    }
    match parse_date(value) {
        Some(date) => date.format("%b %Y").to_string().to_uppercase(),
        None => display_value(value),
    }
}

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%d %b %Y",
    "%d %B %Y",
    "%b %d, %Y",
    "%B %d, %Y",
];

// Month-year spellings; parsed by prefixing a day. Dash forms come first so
// `Jan-2026` never reads as `Jan` followed by year -2026.
const MONTH_FORMATS: &[&str] = &["%b-%Y", "%B-%Y", "%b %Y", "%B %Y", "%Y-%m", "%m/%Y", "%b'%Y"];

/// Interpret a cell as a calendar date when it plausibly is one.
pub fn parse_date(value: &CellValue) -> Option<NaiveDate> {
    match value {
        CellValue::DateTime(dt) => Some(dt.date()),
        CellValue::Text(s) => parse_date_text(s.trim()),
        _ => None,
    }
}

fn parse_date_text(s: &str) -> Option<NaiveDate> {
    if s.is_empty() {
        return None;
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|f| {
            NaiveDateTime::parse_from_str(s, f)
                .ok()
                .map(|dt| dt.date())
                .filter(four_digit_year)
        })
        .or_else(|| {
            DATE_FORMATS.iter().find_map(|f| {
                NaiveDate::parse_from_str(s, f)
                    .ok()
                    .filter(four_digit_year)
            })
        })
        .or_else(|| {
            let prefixed = format!("01|{s}");
            MONTH_FORMATS.iter().find_map(|f| {
                NaiveDate::parse_from_str(&prefixed, &format!("%d|{f}"))
                    .ok()
                    .filter(four_digit_year)
            })
        })
}

// chrono accepts signed and short years for `%Y`; payslips need `1..=9999`.
fn four_digit_year(date: &NaiveDate) -> bool {
    (1..=9999).contains(&date.year())
}

/// First candidate column holding a non-blank value.
///
/// Used for synonym columns such as effective work days, which fall back to
/// present days, then pay days, then total working days.
pub fn pick_value<'a>(row: &'a NormalizedRow, keys: &[&str]) -> Option<&'a CellValue> {
    keys.iter().map(|k| row.get(k)).find(|v| !v.is_blank())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> CellValue {
        CellValue::from(s)
    }

    #[test]
    fn safe_number_is_total() {
        assert_eq!(safe_number(&CellValue::Empty), 0.0);
        assert_eq!(safe_number(&text("")), 0.0);
        assert_eq!(safe_number(&text("   ")), 0.0);
        assert_eq!(safe_number(&text("-")), 0.0);
        assert_eq!(safe_number(&text(" - ")), 0.0);
        assert_eq!(safe_number(&CellValue::Float(f64::NAN)), 0.0);
        assert_eq!(safe_number(&CellValue::Float(f64::INFINITY)), 0.0);
        assert_eq!(safe_number(&text("abc")), 0.0);
        assert_eq!(safe_number(&text("inf")), 0.0);
        assert_eq!(safe_number(&text("1,234")), 0.0);
    }

    #[test]
    fn safe_number_parses_numbers() {
        assert_eq!(safe_number(&text("1234.5")), 1234.5);
        assert_eq!(safe_number(&text(" 1234.5 ")), 1234.5);
        assert_eq!(safe_number(&CellValue::Float(1234.5)), 1234.5);
        assert_eq!(safe_number(&CellValue::Int(42)), 42.0);
        assert_eq!(safe_number(&text("-250")), -250.0);
        assert_eq!(safe_number(&CellValue::Bool(true)), 1.0);
    }

    #[test]
    fn display_value_rules() {
        assert_eq!(display_value(&CellValue::Empty), "-");
        assert_eq!(display_value(&text("  ")), "-");
        assert_eq!(display_value(&CellValue::Float(f64::NAN)), "-");
        assert_eq!(display_value(&CellValue::Float(26.0)), "26");
        assert_eq!(display_value(&CellValue::Float(-0.0)), "0");
        assert_eq!(display_value(&CellValue::Float(1234.5)), "1234.5");
        assert_eq!(display_value(&CellValue::Int(1001)), "1001");
        assert_eq!(display_value(&CellValue::Bool(false)), "False");
        assert_eq!(display_value(&text("ABCDE1234F")), "ABCDE1234F");
    }

    #[test]
    fn display_value_dates() {
        let d = NaiveDate::from_ymd_opt(2021, 4, 5).unwrap();
        assert_eq!(display_value(&CellValue::from(d)), "2021-04-05");
        assert_eq!(display_value(&text("2021-04-05 00:00:00")), "2021-04-05");
    }

    #[test]
    fn format_money_groups_thousands() {
        assert_eq!(format_money(&CellValue::Float(33200.0)), "33,200.00");
        assert_eq!(format_money(&CellValue::Float(1234567.891)), "1,234,567.89");
        assert_eq!(format_money(&CellValue::Float(999.0)), "999.00");
        assert_eq!(format_money(&text("-")), "0.00");
        assert_eq!(format_money(&CellValue::Float(-1500.5)), "-1,500.50");
        assert_eq!(format_amount(100000.0), "100,000.00");
    }

    #[test]
    fn format_month_renders_upper_month_year() {
        assert_eq!(format_month(&text("2026-01-01")), "JAN 2026");
        assert_eq!(format_month(&text("2026-01-01 00:00:00")), "JAN 2026");
        assert_eq!(format_month(&text("March 2025")), "MAR 2025");
        assert_eq!(format_month(&text("Feb-2024")), "FEB 2024");
        assert_eq!(format_month(&text("Jan 2026")), "JAN 2026");
        assert_eq!(format_month(&text("2026-01")), "JAN 2026");
        assert_eq!(format_month(&text("01/2026")), "JAN 2026");
        assert_eq!(format_month(&text("15-01-2026")), "JAN 2026");
        let d = NaiveDate::from_ymd_opt(2025, 12, 31).unwrap();
        assert_eq!(format_month(&CellValue::from(d)), "DEC 2025");
    }

    #[test]
    fn dashed_month_year_keeps_positive_year() {
        for input in ["Jan-2026", "January-2026", "jan-2026"] {
            assert_eq!(format_month(&text(input)), "JAN 2026", "input {input:?}");
            assert_eq!(
                parse_date(&text(input)),
                NaiveDate::from_ymd_opt(2026, 1, 1),
                "input {input:?}"
            );
        }
    }

    #[test]
    fn datetime_cells_serialize() {
        let dt = NaiveDate::from_ymd_opt(2026, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let json = serde_json::to_string(&CellValue::DateTime(dt)).unwrap();
        let back: CellValue = serde_json::from_str(&json).unwrap();
        assert_eq!(back, CellValue::DateTime(dt));
    }

    #[test]
    fn signed_years_are_not_dates() {
        assert_eq!(parse_date(&text("Jan -2026")), None);
        assert_eq!(format_month(&text("Jan -2026")), "Jan -2026");
    }

    #[test]
    fn format_month_falls_back_to_display() {
        assert_eq!(format_month(&CellValue::Empty), "-");
        assert_eq!(format_month(&text("Q1 payroll")), "Q1 payroll");
        assert_eq!(format_month(&CellValue::Float(3.0)), "3");
    }

    #[test]
    fn pick_value_skips_blank_candidates() {
        let row = NormalizedRow::from_raw_pairs(
            1,
            [
                ("effective_work_days", text(" ")),
                ("present_days", CellValue::Empty),
                ("pay_days", CellValue::Float(26.0)),
                ("total_working_days", CellValue::Float(30.0)),
            ],
        );
        let picked = pick_value(
            &row,
            &["effective_work_days", "present_days", "pay_days", "total_working_days"],
        );
        assert_eq!(picked, Some(&CellValue::Float(26.0)));
        assert_eq!(pick_value(&row, &["lop_days", "present_days"]), None);
    }
}
