//! Supported document formats.

use crate::ExtractError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Declared format of an uploaded document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    /// UTF-8 plain text (`.txt`)
    #[serde(rename = "txt")]
    PlainText,
    /// Portable Document Format (`.pdf`)
    Pdf,
    /// Office Open XML word processing document (`.docx`)
    Docx,
}

impl DocumentFormat {
    /// Canonical tag, also the file extension.
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentFormat::PlainText => "txt",
            DocumentFormat::Pdf => "pdf",
            DocumentFormat::Docx => "docx",
        }
    }

    /// Parse a format tag (case-insensitive).
    pub fn parse_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "txt" | "text" | "plain" => Some(DocumentFormat::PlainText),
            "pdf" => Some(DocumentFormat::Pdf),
            "docx" => Some(DocumentFormat::Docx),
            _ => None,
        }
    }

    /// Infer the format from a file name's extension.
    pub fn from_filename(name: impl AsRef<Path>) -> Option<Self> {
        let ext = name.as_ref().extension()?.to_str()?;
        match ext.to_ascii_lowercase().as_str() {
            "txt" => Some(DocumentFormat::PlainText),
            "pdf" => Some(DocumentFormat::Pdf),
            "docx" => Some(DocumentFormat::Docx),
            _ => None,
        }
    }
}

impl std::fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for DocumentFormat {
    type Err = ExtractError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        DocumentFormat::parse_str(s).ok_or_else(|| ExtractError::UnsupportedFormat(s.to_string()))
    }
}
