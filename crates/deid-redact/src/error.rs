//! Error types for recognition and redaction.

use crate::Category;
use thiserror::Error;

/// Result type for redaction operations.
pub type Result<T> = std::result::Result<T, RedactionError>;

/// Errors that can occur during recognition, bootstrap or redaction.
#[derive(Error, Debug)]
pub enum RedactionError {
    /// A candidate match violates the span invariants for its text.
    ///
    /// The whole redaction call is aborted; nothing is partially applied.
    #[error("invalid match {category} [{start}, {end}): {reason}")]
    InvalidMatch {
        category: Category,
        start: usize,
        end: usize,
        reason: &'static str,
    },

    /// No operator is configured for a category and the rules reject
    /// unmapped categories.
    #[error("no operator configured for category {0}")]
    MissingOperator(Category),

    /// No recognizer model could be loaded at startup.
    #[error("no recognizer model available (tried: {})", tried.join(", "))]
    ModelUnavailable { tried: Vec<String> },

    /// Failed to load or parse the operator rules.
    #[error("policy error: {0}")]
    PolicyError(String),

    /// Failed to load or generate the hashing key.
    #[error("key error: {0}")]
    KeyError(String),

    /// A lexicon file is malformed or unusable.
    #[error("lexicon error: {0}")]
    LexiconError(String),

    /// Failed to compile a regex pattern.
    #[error("pattern error: {0}")]
    PatternError(String),

    /// I/O error during key, lexicon or policy file operations.
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON parsing error.
    #[error("json error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl RedactionError {
    /// Build an `InvalidMatch` error for a match.
    pub fn invalid_match(m: &crate::Match, reason: &'static str) -> Self {
        RedactionError::InvalidMatch {
            category: m.category,
            start: m.start,
            end: m.end,
            reason,
        }
    }
}
