//! Output types: company profile, generated documents and batch results.

use crate::error::LogoError;
use serde::{Deserialize, Serialize};

/// MIME type of a single payslip.
pub const PDF_CONTENT_TYPE: &str = "application/pdf";
/// MIME type of a multi-row archive.
pub const ZIP_CONTENT_TYPE: &str = "application/zip";

/// Employer details printed in every payslip header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyInfo {
    pub name: String,
    /// May span several lines.
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl CompanyInfo {
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            email: None,
            phone: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    /// `email | phone`, skipping blank parts. `None` when both are blank.
    pub fn contact_line(&self) -> Option<String> {
        let parts: Vec<&str> = [self.email.as_deref(), self.phone.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" | "))
        }
    }
}

/// One generated artifact: bytes plus how to serve them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayslipDocument {
    pub filename: String,
    pub content_type: String,
    #[serde(skip)]
    pub content: Vec<u8>,
}

impl PayslipDocument {
    pub fn pdf(filename: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            content_type: PDF_CONTENT_TYPE.to_string(),
            content,
        }
    }

    pub fn zip(filename: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            content_type: ZIP_CONTENT_TYPE.to_string(),
            content,
        }
    }

    pub fn is_pdf(&self) -> bool {
        self.content_type == PDF_CONTENT_TYPE
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

/// The deliverable of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOutput {
    /// Exactly one row: the document is both download and preview.
    Single(PayslipDocument),
    /// Several rows bundled in a zip. `preview` is the first row's document.
    Archive {
        archive: PayslipDocument,
        preview: PayslipDocument,
        /// Archive member names in sheet order.
        members: Vec<String>,
    },
}

impl BatchOutput {
    /// What the user downloads.
    pub fn primary(&self) -> &PayslipDocument {
        match self {
            BatchOutput::Single(doc) => doc,
            BatchOutput::Archive { archive, .. } => archive,
        }
    }

    /// Always a PDF.
    pub fn preview(&self) -> &PayslipDocument {
        match self {
            BatchOutput::Single(doc) => doc,
            BatchOutput::Archive { preview, .. } => preview,
        }
    }

    pub fn is_archive(&self) -> bool {
        matches!(self, BatchOutput::Archive { .. })
    }

    /// Number of payslips the batch produced.
    pub fn document_count(&self) -> usize {
        match self {
            BatchOutput::Single(_) => 1,
            BatchOutput::Archive { members, .. } => members.len(),
        }
    }
}

/// Timing and size figures for one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchStats {
    /// Data rows read from the sheet.
    pub rows: usize,
    /// Payslips produced (equals `rows` on success).
    pub documents: usize,
    /// Size of the primary artifact in bytes.
    pub primary_bytes: usize,
    pub parse_duration_ms: u64,
    pub render_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// Everything [`crate::generate`] returns.
#[derive(Debug, Clone)]
pub struct BatchResult {
    pub output: BatchOutput,
    pub stats: BatchStats,
    /// Set when a logo was supplied but could not be used.
    pub logo_error: Option<LogoError>,
}

impl BatchResult {
    pub fn primary(&self) -> &PayslipDocument {
        self.output.primary()
    }

    pub fn preview(&self) -> &PayslipDocument {
        self.output.preview()
    }
}

/// How one raw header was interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    pub raw: String,
    pub canonical: String,
    /// False when the header passed through without an alias match.
    pub recognized: bool,
}

/// Result of [`crate::inspect`]: what a batch would see, without rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetReport {
    pub sheet_name: String,
    pub columns: Vec<ColumnMapping>,
    pub data_rows: usize,
    /// Sorted canonical names; empty when the sheet is usable.
    pub missing_required: Vec<String>,
}

impl SheetReport {
    pub fn is_valid(&self) -> bool {
        self.missing_required.is_empty() && self.data_rows > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contact_line_joins_present_parts() {
        let c = CompanyInfo::new("Acme", "1 Road");
        assert_eq!(c.contact_line(), None);
        let c = c.with_email("hr@acme.test");
        assert_eq!(c.contact_line().as_deref(), Some("hr@acme.test"));
        let c = c.with_phone("+91 99999 00000");
        assert_eq!(
            c.contact_line().as_deref(),
            Some("hr@acme.test | +91 99999 00000")
        );
        let c = CompanyInfo::new("Acme", "").with_email("  ").with_phone("123");
        assert_eq!(c.contact_line().as_deref(), Some("123"));
    }

    #[test]
    fn single_output_is_its_own_preview() {
        let doc = PayslipDocument::pdf("payslip_Jane_Doe_E001.pdf", b"%PDF-1.5".to_vec());
        let out = BatchOutput::Single(doc.clone());
        assert_eq!(out.primary(), &doc);
        assert_eq!(out.preview(), &doc);
        assert!(!out.is_archive());
        assert_eq!(out.document_count(), 1);
    }

    #[test]
    fn archive_output_previews_first_document() {
        let first = PayslipDocument::pdf("a.pdf", b"%PDF-a".to_vec());
        let out = BatchOutput::Archive {
            archive: PayslipDocument::zip("payslips.zip", b"PK".to_vec()),
            preview: first.clone(),
            members: vec!["a.pdf".into(), "b.pdf".into()],
        };
        assert_eq!(out.primary().content_type, ZIP_CONTENT_TYPE);
        assert_eq!(out.preview(), &first);
        assert!(out.preview().is_pdf());
        assert_eq!(out.document_count(), 2);
    }

    #[test]
    fn company_info_serde_skips_missing_contact() {
        let json = serde_json::to_string(&CompanyInfo::new("Acme", "Pune")).unwrap();
        assert_eq!(json, r#"{"name":"Acme","address":"Pune"}"#);
        let back: CompanyInfo = serde_json::from_str(&json).unwrap();
        assert_eq!(back.email, None);
    }
}
