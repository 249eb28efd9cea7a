//! Configuration types for payslip generation.
//!
//! All batch behaviour is controlled through [`GenerationConfig`], built via
//! its [`GenerationConfigBuilder`]. One struct holds every knob so a config
//! can be cloned into each row-rendering task and logged as a whole.

use crate::error::PayslipError;
use crate::pipeline::layout::MM;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Configuration for one spreadsheet-to-payslips batch.
///
/// Built via [`GenerationConfig::builder()`] or using
/// [`GenerationConfig::default()`].
///
/// # Example
/// ```rust
/// use xlsx2payslip::{GenerationConfig, SheetSelection};
///
/// let config = GenerationConfig::builder()
///     .sheet(SheetSelection::Named("March".into()))
///     .concurrency(2)
///     .archive_filename("march_payslips.zip")
///     .build()
///     .unwrap();
/// assert_eq!(config.concurrency, 2);
/// ```
#[derive(Clone)]
pub struct GenerationConfig {
    /// Which worksheet holds the payroll rows. Default: the first sheet.
    pub sheet: SheetSelection,

    /// Width of the logo bounding box in millimetres. Default: 26.
    ///
    /// The logo is scaled down (never up) to fit the box, keeping its aspect
    /// ratio.
    pub logo_max_width_mm: f32,

    /// Height of the logo bounding box in millimetres. Default: 18.
    pub logo_max_height_mm: f32,

    /// File name of the zip returned for multi-row batches. Default: `payslips.zip`.
    pub archive_filename: String,

    /// Rows rendered at the same time. Default: 4.
    ///
    /// Rows share nothing mutable, so any value ≥ 1 produces identical
    /// output; order always follows the sheet.
    pub concurrency: usize,

    /// Deflate PDF content streams. Default: true.
    pub compress_documents: bool,

    /// Line printed under the net-pay box.
    pub footer_note: String,

    /// Optional per-row progress callback.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            sheet: SheetSelection::default(),
            logo_max_width_mm: 26.0,
            logo_max_height_mm: 18.0,
            archive_filename: "payslips.zip".to_string(),
            concurrency: 4,
            compress_documents: true,
            footer_note: "This is a system generated payslip and does not require signature."
                .to_string(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for GenerationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationConfig")
            .field("sheet", &self.sheet)
            .field("logo_max_width_mm", &self.logo_max_width_mm)
            .field("logo_max_height_mm", &self.logo_max_height_mm)
            .field("archive_filename", &self.archive_filename)
            .field("concurrency", &self.concurrency)
            .field("compress_documents", &self.compress_documents)
            .field("footer_note", &self.footer_note)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn GenerationProgressCallback>"),
            )
            .finish()
    }
}

impl GenerationConfig {
    /// Create a new builder for `GenerationConfig`.
    pub fn builder() -> GenerationConfigBuilder {
        GenerationConfigBuilder {
            config: Self::default(),
        }
    }

    /// Logo bounding box in whole PDF points (1 pt = 1 logo pixel on the page).
    pub fn logo_box_points(&self) -> (u32, u32) {
        (
            (self.logo_max_width_mm * MM) as u32,
            (self.logo_max_height_mm * MM) as u32,
        )
    }
}

/// Builder for [`GenerationConfig`].
#[derive(Debug)]
pub struct GenerationConfigBuilder {
    config: GenerationConfig,
}

impl GenerationConfigBuilder {
    pub fn sheet(mut self, sheet: SheetSelection) -> Self {
        self.config.sheet = sheet;
        self
    }

    pub fn logo_max_size_mm(mut self, width: f32, height: f32) -> Self {
        self.config.logo_max_width_mm = width;
        self.config.logo_max_height_mm = height;
        self
    }

    pub fn archive_filename(mut self, name: impl Into<String>) -> Self {
        self.config.archive_filename = name.into();
        self
    }

    /// Rows rendered at the same time. Zero is rejected by [`build`](Self::build).
    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n;
        self
    }

    pub fn compress_documents(mut self, v: bool) -> Self {
        self.config.compress_documents = v;
        self
    }

    pub fn footer_note(mut self, note: impl Into<String>) -> Self {
        self.config.footer_note = note.into();
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<GenerationConfig, PayslipError> {
        let c = &self.config;
        if !(c.logo_max_width_mm > 0.0 && c.logo_max_height_mm > 0.0) {
            return Err(PayslipError::InvalidConfig(format!(
                "Logo box must be positive, got {}×{} mm",
                c.logo_max_width_mm, c.logo_max_height_mm
            )));
        }
        if c.concurrency == 0 {
            return Err(PayslipError::InvalidConfig("Concurrency must be ≥ 1".into()));
        }
        let name = c.archive_filename.trim();
        if name.len() <= ".zip".len() || !name.to_ascii_lowercase().ends_with(".zip") {
            return Err(PayslipError::InvalidConfig(format!(
                "Archive filename must end with .zip, got '{}'",
                c.archive_filename
            )));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Which worksheet of the workbook to read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SheetSelection {
    /// The first worksheet (default).
    #[default]
    First,
    /// A worksheet by 0-based position.
    Index(usize),
    /// A worksheet by name (exact match first, then case-insensitive).
    Named(String),
}

impl SheetSelection {
    /// Pick the matching sheet name out of the workbook's sheet list.
    pub fn resolve<'a>(&self, sheet_names: &'a [String]) -> Option<&'a str> {
        match self {
            SheetSelection::First => sheet_names.first().map(String::as_str),
            SheetSelection::Index(i) => sheet_names.get(*i).map(String::as_str),
            SheetSelection::Named(name) => sheet_names
                .iter()
                .find(|s| *s == name)
                .or_else(|| sheet_names.iter().find(|s| s.eq_ignore_ascii_case(name)))
                .map(String::as_str),
        }
    }

    /// Parse a CLI value: a number selects by index, anything else by name.
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        if s.is_empty() {
            return SheetSelection::First;
        }
        match s.parse::<usize>() {
            Ok(i) => SheetSelection::Index(i),
            Err(_) => SheetSelection::Named(s.to_string()),
        }
    }
}

impl fmt::Display for SheetSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SheetSelection::First => write!(f, "first sheet"),
            SheetSelection::Index(i) => write!(f, "sheet #{i}"),
            SheetSelection::Named(n) => write!(f, "{n}"),
        }
    }
}
