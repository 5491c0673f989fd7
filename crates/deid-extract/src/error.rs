//! Error types for text extraction.

use thiserror::Error;

/// Errors that can occur while extracting text from a document.
#[derive(Error, Debug)]
pub enum ExtractError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// ZIP container error (DOCX)
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Malformed WordprocessingML
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// PDF parsing or text decoding error
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    /// Plain text is not valid UTF-8
    #[error("text is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// Missing required part in a DOCX package
    #[error("missing required part: {0}")]
    MissingPart(String),

    /// Encrypted PDFs are not supported
    #[error("document is encrypted")]
    Encrypted,

    /// File extension or format tag not recognized
    #[error("unsupported document format: {0}")]
    UnsupportedFormat(String),
}

/// Result type alias for extraction operations.
pub type Result<T> = std::result::Result<T, ExtractError>;
