//! PDF text extraction.

use crate::{ExtractError, Result};
use lopdf::Document;
use tracing::{debug, warn};

/// Extract the text layer of every page, one block per page.
///
/// Pages whose text cannot be decoded, or that have none, are skipped.
pub fn extract(bytes: &[u8]) -> Result<String> {
    let document = Document::load_mem(bytes)?;
    if document.is_encrypted() {
        return Err(ExtractError::Encrypted);
    }

    let pages = document.get_pages();
    let mut out = String::new();
    let mut skipped = 0usize;

    for &page_number in pages.keys() {
        match document.extract_text(&[page_number]) {
            Ok(text) => {
                let text = text.trim_end();
                if text.is_empty() {
                    skipped += 1;
                    continue;
                }
                out.push_str(text);
                out.push('\n');
            }
            Err(e) => {
                warn!(page = page_number, error = %e, "Skipping page without extractable text");
                skipped += 1;
            }
        }
    }

    debug!(pages = pages.len(), skipped, "Extracted PDF text");
    Ok(out)
}
