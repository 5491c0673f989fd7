//! Document text extraction for deid.
//!
//! Turns uploaded documents into a single string for the redaction pipeline.
//! Formatting, images and layout are discarded.
//!
//! # Formats
//!
//! - `txt`: UTF-8 text, a leading byte order mark is dropped
//! - `pdf`: the text layer of each page, one block per page
//! - `docx`: body paragraphs from `word/document.xml`, one line per paragraph
//!
//! # Example
//!
//! ```no_run
//! use deid_extract::{extract_text, DocumentFormat};
//!
//! let bytes = std::fs::read("letter.docx").unwrap();
//! let text = extract_text(&bytes, DocumentFormat::Docx);
//! if text.trim().is_empty() {
//!     eprintln!("nothing to redact");
//! }
//! ```

pub mod docx;
pub mod error;
pub mod format;
pub mod pdf;
pub mod plain;

pub use error::{ExtractError, Result};
pub use format::DocumentFormat;

use std::path::Path;
use tracing::warn;

/// Extract text, returning the cause on failure.
pub fn try_extract_text(bytes: &[u8], format: DocumentFormat) -> Result<String> {
    match format {
        DocumentFormat::PlainText => plain::extract(bytes),
        DocumentFormat::Pdf => pdf::extract(bytes),
        DocumentFormat::Docx => docx::extract(bytes),
    }
}

/// Extract text from a document.
///
/// Never fails: unreadable documents yield an empty string and a warning.
pub fn extract_text(bytes: &[u8], format: DocumentFormat) -> String {
    match try_extract_text(bytes, format) {
        Ok(text) => text,
        Err(e) => {
            warn!(
                event = "extract.failed",
                format = %format,
                bytes = bytes.len(),
                error = %e,
                "Could not extract text from document"
            );
            String::new()
        }
    }
}

/// Read a file and extract its text, choosing the format by extension.
pub fn extract_file(path: &Path) -> Result<String> {
    let format = DocumentFormat::from_filename(path)
        .ok_or_else(|| ExtractError::UnsupportedFormat(path.display().to_string()))?;
    let bytes = std::fs::read(path)?;
    try_extract_text(&bytes, format)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_garbage_yields_empty() {
        let garbage = [0u8, 159, 146, 150, 1, 2, 3];
        assert_eq!(extract_text(&garbage, DocumentFormat::PlainText), "");
        assert_eq!(extract_text(&garbage, DocumentFormat::Pdf), "");
        assert_eq!(extract_text(&garbage, DocumentFormat::Docx), "");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(extract_text(b"", DocumentFormat::PlainText), "");
        assert_eq!(extract_text(b"", DocumentFormat::Docx), "");
    }

    #[test]
    fn test_extract_file_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.rtf");
        std::fs::write(&path, "{\\rtf1}").unwrap();
        let err = extract_file(&path).unwrap_err();
        assert!(matches!(err, ExtractError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_extract_file_txt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "Call Anna").unwrap();
        assert_eq!(extract_file(&path).unwrap(), "Call Anna");
    }
}
