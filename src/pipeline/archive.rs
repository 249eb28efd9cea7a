//! Zip bundling for multi-row batches.

use crate::error::PayslipError;
use crate::output::PayslipDocument;
use std::io::{Cursor, Write};
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Deflate every document into one archive, members in the given order.
///
/// Member names must already be unique; a duplicate is reported as
/// [`PayslipError::ArchiveFailed`].
pub fn build_archive(documents: &[PayslipDocument]) -> Result<Vec<u8>, PayslipError> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for doc in documents {
        writer
            .start_file(doc.filename.as_str(), options)
            .map_err(|e| archive_error(&doc.filename, e))?;
        writer
            .write_all(&doc.content)
            .map_err(|e| archive_error(&doc.filename, e))?;
    }

    let cursor = writer.finish().map_err(|e| PayslipError::ArchiveFailed {
        detail: e.to_string(),
    })?;
    let bytes = cursor.into_inner();
    debug!("Archived {} documents into {} bytes", documents.len(), bytes.len());
    Ok(bytes)
}

fn archive_error(member: &str, e: impl std::fmt::Display) -> PayslipError {
    PayslipError::ArchiveFailed {
        detail: format!("{member}: {e}"),
    }
}
