//! Redaction engine.
//!
//! Resolves overlapping candidate matches into a non-overlapping span set and
//! rewrites each accepted span with the operator its category resolves to.

use crate::{Category, KeyMaterial, Match, OperatorKind, OperatorRules, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::debug;

/// One accepted span and the text that replaced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedRewrite {
    /// Category of the accepted match.
    pub category: Category,
    /// Matched substring of the original text.
    pub original_text: String,
    /// Start offset in the original text.
    pub start: usize,
    /// End offset in the original text.
    pub end: usize,
    /// Text written in place of the span.
    pub replacement_text: String,
    /// Operator that produced the replacement.
    pub operator: OperatorKind,
    /// Start offset of the replacement in the redacted text.
    pub redacted_start: usize,
    /// End offset of the replacement in the redacted text.
    pub redacted_end: usize,
}

/// Output of a redaction call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedactionResult {
    /// The rewritten text.
    pub redacted_text: String,
    /// Accepted rewrites, ordered by original start offset.
    pub applied: Vec<AppliedRewrite>,
}

impl RedactionResult {
    /// A result that leaves `text` untouched.
    pub fn unchanged(text: &str) -> Self {
        Self {
            redacted_text: text.to_string(),
            applied: Vec::new(),
        }
    }

    /// Whether any rewrite changed the text.
    pub fn is_modified(&self) -> bool {
        self.applied
            .iter()
            .any(|a| a.original_text != a.replacement_text)
    }

    /// Rebuild the redacted text from `original` and the applied rewrites.
    ///
    /// Returns `None` if the rewrites do not describe ordered,
    /// non-overlapping spans of `original`.
    pub fn reconstruct(&self, original: &str) -> Option<String> {
        let mut out = String::with_capacity(original.len());
        let mut cursor = 0;
        for rewrite in &self.applied {
            if rewrite.start < cursor {
                return None;
            }
            out.push_str(original.get(cursor..rewrite.start)?);
            out.push_str(&rewrite.replacement_text);
            cursor = rewrite.end;
        }
        out.push_str(original.get(cursor..)?);
        Some(out)
    }
}

/// The redaction engine.
///
/// Holds only the hashing key; the engine is immutable and can be shared
/// across threads.
#[derive(Debug, Clone)]
pub struct RedactionEngine {
    key: KeyMaterial,
}

impl RedactionEngine {
    /// Create an engine with a fresh random hashing key.
    pub fn new() -> Result<Self> {
        Ok(Self {
            key: KeyMaterial::random()?,
        })
    }

    /// Create an engine with explicit key material.
    pub fn with_key(key: KeyMaterial) -> Self {
        Self { key }
    }

    /// Redact `text` using candidate `matches` and operator `rules`.
    ///
    /// Every match is validated first; a single malformed match fails the
    /// whole call and nothing is rewritten.
    pub fn redact(
        &self,
        text: &str,
        matches: &[Match],
        rules: &OperatorRules,
    ) -> Result<RedactionResult> {
        for m in matches {
            m.validate(text)?;
        }

        let accepted = resolve_overlaps(matches);

        let mut redacted_text = String::with_capacity(text.len());
        let mut applied = Vec::with_capacity(accepted.len());
        let mut cursor = 0;

        for m in accepted {
            let original = &text[m.start..m.end];
            let operator = rules.resolve(m.category)?;
            let replacement =
                operator.apply(original, m.category, &self.key, rules.hash_truncation_bytes);

            redacted_text.push_str(&text[cursor..m.start]);
            let redacted_start = redacted_text.len();
            redacted_text.push_str(&replacement);

            applied.push(AppliedRewrite {
                category: m.category,
                original_text: original.to_string(),
                start: m.start,
                end: m.end,
                replacement_text: replacement,
                operator: operator.kind(),
                redacted_start,
                redacted_end: redacted_text.len(),
            });
            cursor = m.end;
        }
        redacted_text.push_str(&text[cursor..]);

        debug!(
            candidates = matches.len(),
            applied = applied.len(),
            "Redaction finished"
        );

        Ok(RedactionResult {
            redacted_text,
            applied,
        })
    }
}

/// Order matches by start, then longer span first, then category name.
fn span_order(a: &Match, b: &Match) -> Ordering {
    a.start
        .cmp(&b.start)
        .then_with(|| b.end.cmp(&a.end))
        .then_with(|| a.category.as_str().cmp(b.category.as_str()))
}

/// Select a non-overlapping, leftmost-longest subset of `matches`.
///
/// Matches starting before the end of the last accepted span are dropped;
/// accepted spans are never merged, even when contiguous.
pub fn resolve_overlaps(matches: &[Match]) -> Vec<&Match> {
    let mut sorted: Vec<&Match> = matches.iter().collect();
    sorted.sort_by(|a, b| span_order(a, b));

    let mut accepted = Vec::with_capacity(sorted.len());
    let mut cursor = 0;
    for m in sorted {
        if m.start < cursor {
            continue;
        }
        cursor = m.end;
        accepted.push(m);
    }
    accepted
}
