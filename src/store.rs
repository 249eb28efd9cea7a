//! In-memory token store for generated artifacts.
//!
//! A web front end generates a batch, then serves the preview and the
//! download through separate requests. [`FileStore`] hands out an opaque
//! token per artifact so those requests only carry the token. Entries live
//! until removed; eviction is the caller's concern.

use crate::output::{BatchOutput, PayslipDocument, PDF_CONTENT_TYPE};
use std::collections::HashMap;
use std::sync::RwLock;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

/// Why a preview lookup failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreviewError {
    #[error("Preview not found")]
    NotFound,
    /// The token names something other than a PDF.
    #[error("Preview is not a PDF (content type '{content_type}')")]
    NotPdf { content_type: String },
}

/// Tokens for the two artifacts of a stored batch.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct StoredBatch {
    pub preview_token: String,
    pub download_token: String,
}

/// Thread-safe token → document map.
#[derive(Debug, Default)]
pub struct FileStore {
    entries: RwLock<HashMap<String, PayslipDocument>>,
}

impl FileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store raw bytes with their content type and download name.
    pub fn put(
        &self,
        content: Vec<u8>,
        content_type: impl Into<String>,
        filename: impl Into<String>,
    ) -> String {
        self.put_document(PayslipDocument {
            filename: filename.into(),
            content_type: content_type.into(),
            content,
        })
    }

    /// Store a document and return its token (32 lowercase hex chars).
    pub fn put_document(&self, document: PayslipDocument) -> String {
        let token = Uuid::new_v4().simple().to_string();
        debug!("Stored '{}' under token {}", document.filename, token);
        self.write().insert(token.clone(), document);
        token
    }

    /// Store a batch's download and preview separately.
    pub fn put_batch(&self, output: &BatchOutput) -> StoredBatch {
        StoredBatch {
            download_token: self.put_document(output.primary().clone()),
            preview_token: self.put_document(output.preview().clone()),
        }
    }

    pub fn get(&self, token: &str) -> Option<PayslipDocument> {
        self.read().get(token).cloned()
    }

    /// Like [`get`](Self::get) but only for documents that really are PDFs:
    /// the content type must be `application/pdf` and the bytes must start
    /// with `%PDF-`.
    pub fn get_preview(&self, token: &str) -> Result<PayslipDocument, PreviewError> {
        let doc = self.get(token).ok_or(PreviewError::NotFound)?;
        if doc.content_type != PDF_CONTENT_TYPE || !doc.content.starts_with(b"%PDF-") {
            return Err(PreviewError::NotPdf {
                content_type: doc.content_type,
            });
        }
        Ok(doc)
    }

    pub fn remove(&self, token: &str) -> Option<PayslipDocument> {
        self.write().remove(token)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // A poisoned lock only means another thread panicked mid-insert; the
    // map itself is still usable.
    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, PayslipDocument>> {
        self.entries.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, PayslipDocument>> {
        self.entries.write().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn pdf(name: &str) -> PayslipDocument {
        PayslipDocument::pdf(name, b"%PDF-1.5 body".to_vec())
    }

    #[test]
    fn put_get_remove() {
        let store = FileStore::new();
        let token = store.put(b"%PDF-1.5".to_vec(), "application/pdf", "a.pdf");
        assert_eq!(token.len(), 32);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(store.get(&token).unwrap().filename, "a.pdf");
        assert_eq!(store.len(), 1);
        assert!(store.remove(&token).is_some());
        assert!(store.get(&token).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn tokens_are_unique() {
        let store = FileStore::new();
        let a = store.put_document(pdf("a.pdf"));
        let b = store.put_document(pdf("a.pdf"));
        assert_ne!(a, b);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn preview_rejects_non_pdf() {
        let store = FileStore::new();
        let zip = store.put_document(PayslipDocument::zip("payslips.zip", b"PK\x03\x04".to_vec()));
        assert!(matches!(
            store.get_preview(&zip),
            Err(PreviewError::NotPdf { .. })
        ));

        let fake = store.put_document(PayslipDocument::pdf("fake.pdf", b"<html>".to_vec()));
        assert!(store.get_preview(&fake).is_err());

        assert_eq!(store.get_preview("missing"), Err(PreviewError::NotFound));

        let real = store.put_document(pdf("real.pdf"));
        assert_eq!(store.get_preview(&real).unwrap().filename, "real.pdf");
    }

    #[test]
    fn put_batch_stores_download_and_preview() {
        let store = FileStore::new();
        let output = BatchOutput::Archive {
            archive: PayslipDocument::zip("payslips.zip", b"PK".to_vec()),
            preview: pdf("first.pdf"),
            members: vec!["first.pdf".into(), "second.pdf".into()],
        };
        let tokens = store.put_batch(&output);
        assert_ne!(tokens.preview_token, tokens.download_token);
        assert_eq!(store.get(&tokens.download_token).unwrap().filename, "payslips.zip");
        assert!(store.get_preview(&tokens.preview_token).is_ok());
        assert!(store.get_preview(&tokens.download_token).is_err());
    }

    #[test]
    fn concurrent_puts() {
        let store = Arc::new(FileStore::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || store.put_document(pdf(&format!("{i}.pdf"))))
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(store.len(), 8);
    }
}
