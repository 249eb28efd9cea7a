//! Column normalisation: map human-entered header text to canonical fields.
//!
//! Payroll sheets arrive with headers like `Emp Code`, `EMPLOYEE_ID` or
//! `A/C #`. Every header is folded to a snake_case key and looked up in a
//! reverse alias index built once from [`COLUMN_ALIASES`]. Unknown headers
//! pass through under their folded name, so extra columns such as
//! `Basic Master` survive as `basic_master` instead of being dropped.

use crate::error::PayslipError;
use crate::pipeline::coerce::CellValue;
use crate::pipeline::input::RawSheet;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, warn};

/// Columns a batch cannot do without.
pub const REQUIRED_COLUMNS: [&str; 3] = ["employee_id", "employee_name", "month"];

/// Columns summed into the earnings total, in display order.
pub const EARNING_COLUMNS: [&str; 8] = [
    "basic",
    "da",
    "hra",
    "transport_allowances",
    "food_allowances",
    "internet_allowances",
    "other_allowances",
    "salary_arrear_allowance",
];

/// Columns summed into the deductions total, in display order.
pub const DEDUCTION_COLUMNS: [&str; 6] = [
    "pf_employee",
    "esi_employee",
    "professional_tax",
    "salary_advance",
    "tds",
    "other_deduction",
];

/// Canonical field → accepted header spellings.
///
/// Alias sets must not overlap across canonical names. If they ever do, the
/// canonical name listed first wins.
pub static COLUMN_ALIASES: &[(&str, &[&str])] = &[
    (
        "employee_id",
        &[
            "emp_id",
            "employeeid",
            "emp code",
            "employee code",
            "employee no",
            "employee number",
            "emp no",
        ],
    ),
    ("employee_name", &["employee name", "emp_name", "emp name"]),
    ("department", &["dept"]),
    ("designation", &["role"]),
    ("gender", &[]),
    ("joining_date", &["date_of_joining", "doj", "joining date"]),
    ("bank_name", &["bank"]),
    (
        "account_number",
        &[
            "account_no",
            "a/c",
            "a/c #",
            "ac no",
            "ac_no",
            "bank account no",
            "bank account number",
        ],
    ),
    ("ifsc_code", &["ifsc"]),
    ("pan_number", &["pan", "pan no", "pan number"]),
    ("pf_no", &["pf number", "pf no"]),
    ("pf_uan", &["uan", "pf uan"]),
    ("location", &[]),
    ("effective_work_days", &["effective work days"]),
    (
        "month",
        &["pay_month", "payslip_month", "payslip for the month of"],
    ),
    ("total_working_days", &["total working days"]),
    ("present_days", &["present days"]),
    ("lop_days", &["lop days", "lwp", "loss of pay", "lop"]),
    ("pay_days", &["pay days", "paid_days", "pay days(26)"]),
    ("days_in_month", &["days in month"]),
    ("basic", &[]),
    ("da", &["dearness allowance"]),
    ("hra", &["house rent allowance"]),
    ("transport_allowances", &["transport allowance", "ta"]),
    ("food_allowances", &["food allowance"]),
    ("internet_allowances", &["internet allowance"]),
    ("other_allowances", &["other allowance"]),
    (
        "salary_arrear_allowance",
        &["salary arrier / allowance", "salary arrear allowance"],
    ),
    ("gross_salary", &["gross salary"]),
    ("pf_employee", &["pf employee", "provident fund"]),
    ("pf_employer", &["pf employer"]),
    ("esi_employee", &["esi employee"]),
    ("esi_employer", &["esi employer"]),
    ("professional_tax", &["professional tax"]),
    ("salary_advance", &["salary advance"]),
    ("tds", &[]),
    ("other_deduction", &["other deduction"]),
    ("total_deductions", &["total deductions"]),
    ("net_payable", &["net payable", "net pay"]),
];

static RE_PARENS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[()]").unwrap());
static RE_NON_ALNUM: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

/// Reverse index: folded spelling → canonical name. Built once, never written.
static ALIAS_INDEX: Lazy<HashMap<String, &'static str>> = Lazy::new(|| {
    let mut index = HashMap::new();
    for (canonical, aliases) in COLUMN_ALIASES {
        index.entry(fold_header(canonical)).or_insert(*canonical);
        for alias in aliases.iter() {
            index.entry(fold_header(alias)).or_insert(*canonical);
        }
    }
    index
});

/// Fold header text to a snake_case key.
///
/// Lower-case and trim, turn `/` and `#` and parentheses into spaces, collapse
/// every run of non `[a-z0-9]` characters to `_`, then trim underscores.
pub fn fold_header(name: &str) -> String {
    let cleaned = name.trim().to_lowercase().replace(['/', '#'], " ");
    let cleaned = RE_PARENS.replace_all(&cleaned, " ");
    let cleaned = RE_NON_ALNUM.replace_all(&cleaned, "_");
    cleaned.trim_matches('_').to_string()
}

/// Canonical name for one raw header, or its folded form when unknown.
pub fn canonical_name(raw: &str) -> String {
    let key = fold_header(raw);
    match ALIAS_INDEX.get(&key) {
        Some(canonical) => (*canonical).to_string(),
        None => key,
    }
}

/// Normalise a header row. Order is preserved.
pub fn normalize<S: AsRef<str>>(raw_headers: &[S]) -> Vec<String> {
    raw_headers
        .iter()
        .map(|h| {
            let canonical = canonical_name(h.as_ref());
            debug!("Column '{}' → '{}'", h.as_ref(), canonical);
            canonical
        })
        .collect()
}

/// Whether a header maps through the alias table (as opposed to passthrough).
pub fn is_recognized(raw: &str) -> bool {
    ALIAS_INDEX.contains_key(&fold_header(raw))
}

/// Required canonical columns absent from `present`, sorted.
pub fn missing_columns<'a, I>(present: I) -> Vec<&'static str>
where
    I: IntoIterator<Item = &'a str>,
{
    let present: BTreeSet<&str> = present.into_iter().collect();
    let mut missing: Vec<&'static str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|c| !present.contains(c))
        .collect();
    missing.sort_unstable();
    missing
}

/// Fail the whole batch when any required column is missing.
pub fn validate_columns(columns: &[String]) -> Result<(), PayslipError> {
    let missing = missing_columns(columns.iter().map(String::as_str));
    if missing.is_empty() {
        Ok(())
    } else {
        Err(PayslipError::missing_columns(missing))
    }
}

// ── Normalised rows ──────────────────────────────────────────────────────────

static EMPTY_CELL: CellValue = CellValue::Empty;

/// One spreadsheet row keyed by canonical field name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedRow {
    /// 1-based position among the data rows of the sheet.
    pub row_number: usize,
    fields: HashMap<String, CellValue>,
}

impl NormalizedRow {
    pub fn new(row_number: usize) -> Self {
        Self {
            row_number,
            fields: HashMap::new(),
        }
    }

    /// Build a row from `(header, value)` pairs, normalising each header.
    pub fn from_raw_pairs<K, V, I>(row_number: usize, pairs: I) -> Self
    where
        K: AsRef<str>,
        V: Into<CellValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut row = Self::new(row_number);
        for (k, v) in pairs {
            row.insert(canonical_name(k.as_ref()), v.into());
        }
        row
    }

    /// Insert a field. A canonical name that is already present keeps its first value.
    pub fn insert(&mut self, key: String, value: CellValue) -> bool {
        if self.fields.contains_key(&key) {
            return false;
        }
        self.fields.insert(key, value);
        true
    }

    /// Cell for `key`; [`CellValue::Empty`] when the column is absent.
    pub fn get(&self, key: &str) -> &CellValue {
        self.fields.get(key).unwrap_or(&EMPTY_CELL)
    }

    /// Whether the sheet carried this column at all (even if the cell is blank).
    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// A whole sheet after header normalisation.
#[derive(Debug, Clone, Default)]
pub struct NormalizedSheet {
    /// Canonical column names in source order.
    pub columns: Vec<String>,
    pub rows: Vec<NormalizedRow>,
}

/// Normalise headers and re-key every data row.
pub fn normalize_sheet(sheet: &RawSheet) -> NormalizedSheet {
    let columns = normalize(&sheet.headers);

    let mut seen = BTreeSet::new();
    for (raw, canonical) in sheet.headers.iter().zip(&columns) {
        if !seen.insert(canonical.as_str()) {
            warn!(
                "Header '{}' duplicates column '{}'; the first occurrence is used",
                raw, canonical
            );
        }
    }

    let rows = sheet
        .rows
        .iter()
        .enumerate()
        .map(|(i, cells)| {
            let mut row = NormalizedRow::new(i + 1);
            for (col, canonical) in columns.iter().enumerate() {
                let value = cells.get(col).cloned().unwrap_or_default();
                row.insert(canonical.clone(), value);
            }
            row
        })
        .collect();

    NormalizedSheet { columns, rows }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fold_header_rules() {
        assert_eq!(fold_header("  Emp Code "), "emp_code");
        assert_eq!(fold_header("A/C #"), "a_c");
        assert_eq!(fold_header("Pay Days(26)"), "pay_days_26");
        assert_eq!(fold_header("Salary Arrier / Allowance"), "salary_arrier_allowance");
        assert_eq!(fold_header("__Net--Pay__"), "net_pay");
        assert_eq!(fold_header("???"), "");
    }

    #[test]
    fn employee_id_aliases_converge() {
        for raw in [
            "Emp Code",
            "EMPLOYEE_ID",
            "employee no",
            "Employee Number",
            "emp-no",
            "EmployeeID",
        ] {
            assert_eq!(canonical_name(raw), "employee_id", "header {raw:?}");
        }
    }

    #[test]
    fn alias_spellings_map_to_their_canonical_name() {
        assert_eq!(canonical_name("A/C #"), "account_number");
        assert_eq!(canonical_name("Bank Account No."), "account_number");
        assert_eq!(canonical_name("Pay Days(26)"), "pay_days");
        assert_eq!(canonical_name("Payslip for the month of"), "month");
        assert_eq!(canonical_name("Provident Fund"), "pf_employee");
        assert_eq!(canonical_name("TA"), "transport_allowances");
        assert_eq!(canonical_name("Net Pay"), "net_payable");
        assert_eq!(canonical_name("Salary Arrier / Allowance"), "salary_arrear_allowance");
    }

    #[test]
    fn unknown_headers_pass_through_folded() {
        assert_eq!(canonical_name("Basic Master"), "basic_master");
        assert_eq!(canonical_name("Cost Centre (HQ)"), "cost_centre_hq");
        assert!(!is_recognized("Basic Master"));
        assert!(is_recognized("Emp Code"));
    }

    #[test]
    fn normalize_is_idempotent_on_canonical_names() {
        let canonical: Vec<String> = COLUMN_ALIASES.iter().map(|(c, _)| c.to_string()).collect();
        assert_eq!(normalize(&canonical), canonical);
        let twice = normalize(&normalize(&["Emp Name", "Basic Master", "A/C #"]));
        assert_eq!(twice, vec!["employee_name", "basic_master", "account_number"]);
    }

    #[test]
    fn normalize_preserves_order() {
        let out = normalize(&["Month", "Emp Name", "Emp Code"]);
        assert_eq!(out, vec!["month", "employee_name", "employee_id"]);
    }

    #[test]
    fn alias_sets_do_not_overlap() {
        let mut owner: HashMap<String, &str> = HashMap::new();
        for (canonical, aliases) in COLUMN_ALIASES {
            for spelling in std::iter::once(*canonical).chain(aliases.iter().copied()) {
                let key = fold_header(spelling);
                if let Some(prev) = owner.insert(key.clone(), *canonical) {
                    assert_eq!(prev, *canonical, "'{key}' claimed by {prev} and {canonical}");
                }
            }
        }
    }

    #[test]
    fn missing_columns_empty_when_required_present_under_aliases() {
        let cols = normalize(&["Emp Code", "Employee Name", "Pay Month", "Basic", "Whatever"]);
        assert!(missing_columns(cols.iter().map(String::as_str)).is_empty());
        assert!(validate_columns(&cols).is_ok());
    }

    #[test]
    fn missing_columns_sorted() {
        let cols = normalize(&["Basic", "HRA"]);
        assert_eq!(
            missing_columns(cols.iter().map(String::as_str)),
            vec!["employee_id", "employee_name", "month"]
        );
        let err = validate_columns(&cols).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Missing required columns in Excel: employee_id, employee_name, month"
        );
    }

    #[test]
    fn row_get_absent_is_empty_and_first_duplicate_wins() {
        let row = NormalizedRow::from_raw_pairs(
            1,
            [("Emp Code", CellValue::from("E1")), ("employee_id", CellValue::from("E2"))],
        );
        assert_eq!(row.get("employee_id"), &CellValue::from("E1"));
        assert_eq!(row.get("basic"), &CellValue::Empty);
        assert!(!row.contains("basic"));
        assert_eq!(row.len(), 1);
    }

    #[test]
    fn normalize_sheet_rekeys_rows() {
        let sheet = RawSheet {
            name: "Sheet1".into(),
            headers: vec!["Emp Name".into(), "Basic".into()],
            rows: vec![
                vec![CellValue::from("Jane"), CellValue::Float(100.0)],
                vec![CellValue::from("Raj")],
            ],
        };
        let normalized = normalize_sheet(&sheet);
        assert_eq!(normalized.columns, vec!["employee_name", "basic"]);
        assert_eq!(normalized.rows.len(), 2);
        assert_eq!(normalized.rows[0].get("basic"), &CellValue::Float(100.0));
        assert!(normalized.rows[1].contains("basic"));
        assert_eq!(normalized.rows[1].get("basic"), &CellValue::Empty);
        assert_eq!(normalized.rows[1].row_number, 2);
    }
}
