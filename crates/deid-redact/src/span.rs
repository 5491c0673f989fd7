//! Candidate PII spans produced by recognizers.

use crate::{Category, RedactionError, Result};
use serde::{Deserialize, Serialize};

/// A detected occurrence of a category over a fixed input text.
///
/// Offsets are UTF-8 byte offsets into the text, half-open `[start, end)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    /// Detected category.
    pub category: Category,
    /// Start offset (inclusive).
    pub start: usize,
    /// End offset (exclusive).
    pub end: usize,
    /// Recognizer confidence in `[0, 1]`.
    pub score: f64,
}

impl Match {
    /// Create a new match.
    pub fn new(category: Category, start: usize, end: usize, score: f64) -> Self {
        Self {
            category,
            start,
            end,
            score,
        }
    }

    /// Check the span invariants against `text`.
    ///
    /// Requires `start < end <= text.len()` with both offsets on `char`
    /// boundaries.
    pub fn validate(&self, text: &str) -> Result<()> {
        if self.start >= self.end {
            return Err(RedactionError::invalid_match(self, "empty or inverted span"));
        }
        if self.end > text.len() {
            return Err(RedactionError::invalid_match(self, "span exceeds text length"));
        }
        if !text.is_char_boundary(self.start) || !text.is_char_boundary(self.end) {
            return Err(RedactionError::invalid_match(self, "span splits a character"));
        }
        Ok(())
    }

    /// The matched substring, if the span is valid for `text`.
    pub fn text<'a>(&self, text: &'a str) -> Option<&'a str> {
        text.get(self.start..self.end)
    }
}
