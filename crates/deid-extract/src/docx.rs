//! DOCX text extraction.
//!
//! Reads `word/document.xml` from the package and emits one line per
//! paragraph. Run-level tabs and breaks are kept as `\t` and `\n`; all
//! other formatting is discarded.

use crate::{ExtractError, Result};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::{Cursor, Read};
use tracing::debug;
use zip::ZipArchive;

/// Main document part inside the package.
pub const DOCUMENT_PART: &str = "word/document.xml";

/// Extract paragraph text from DOCX bytes.
pub fn extract(bytes: &[u8]) -> Result<String> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;

    let mut xml = String::new();
    {
        let mut part = archive
            .by_name(DOCUMENT_PART)
            .map_err(|_| ExtractError::MissingPart(DOCUMENT_PART.to_string()))?;
        part.read_to_string(&mut xml)?;
    }

    let text = paragraphs_text(&xml)?;
    debug!(
        xml_bytes = xml.len(),
        text_bytes = text.len(),
        "Extracted DOCX body"
    );
    Ok(text)
}

/// Walk WordprocessingML and collect run text per paragraph.
fn paragraphs_text(xml: &str) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    let mut out = String::new();
    let mut run_depth = 0usize;
    let mut in_text = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"r" => run_depth += 1,
                b"t" if run_depth > 0 => in_text = true,
                _ => {}
            },
            Event::End(e) => match e.local_name().as_ref() {
                b"r" => run_depth = run_depth.saturating_sub(1),
                b"t" => in_text = false,
                b"p" => out.push('\n'),
                _ => {}
            },
            // Tab stops in paragraph properties are also `w:tab`; only
            // run-level tabs and breaks produce text.
            Event::Empty(e) => match e.local_name().as_ref() {
                b"tab" if run_depth > 0 => out.push('\t'),
                b"br" | b"cr" if run_depth > 0 => out.push('\n'),
                b"p" => out.push('\n'),
                _ => {}
            },
            Event::Text(t) if in_text => out.push_str(&t.unescape()?),
            Event::CData(t) if in_text => out.push_str(&String::from_utf8_lossy(&t)),
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(out)
}
