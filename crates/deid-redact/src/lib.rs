//! PII recognition and redaction engine.
//!
//! This crate turns free text into a de-identified copy in two steps:
//! recognizers propose candidate spans, and the redaction engine resolves
//! overlaps and rewrites the surviving spans with per-category operators.
//!
//! # Key Features
//!
//! - **Pluggable recognizers**: regex patterns for structured PII plus a
//!   lexicon model for names, places and groups, behind one `Recognizer` trait.
//! - **Deterministic conflict resolution**: leftmost-longest span selection
//!   with a stable tie-break on category name.
//! - **Per-category operators**: replace, redact, mask, keyed hash or keep,
//!   with an explicit policy for categories that have no rule.
//! - **Fail-closed**: a malformed match aborts the call; nothing is
//!   partially rewritten.
//!
//! # Example
//!
//! ```no_run
//! use deid_redact::{CategorySet, ModelCandidate, OperatorRules, RedactionEngine, bootstrap_model};
//!
//! let adapter = bootstrap_model(&[ModelCandidate::BuiltinLexicon])
//!     .unwrap()
//!     .into_adapter(&[], 0.0)
//!     .unwrap();
//! let engine = RedactionEngine::new().unwrap();
//!
//! let text = "Contact John Smith at john@x.com";
//! let matches = adapter.detect(text, &CategorySet::default_enabled());
//! let result = engine.redact(text, &matches, &OperatorRules::tags()).unwrap();
//! assert_eq!(result.redacted_text, "Contact [PERSON] at [EMAIL]");
//! ```

pub mod category;
pub mod engine;
pub mod error;
pub mod hash;
pub mod operator;
pub mod recognizer;
pub mod rules;
pub mod span;

pub use category::{Category, CategorySet};
pub use engine::{resolve_overlaps, AppliedRewrite, RedactionEngine, RedactionResult};
pub use error::{RedactionError, Result};
pub use hash::{KeyFile, KeyMaterial, KEY_FILE_SCHEMA_VERSION};
pub use operator::{Operator, OperatorKind};
pub use recognizer::{
    bootstrap_model, ExclusiveRecognizer, Lexicon, LexiconRecognizer, LoadedModel,
    ModelCandidate, PatternRecognizer, PatternSpec, Recognizer, RecognizerAdapter, Serialized,
};
pub use rules::{DefaultPolicy, OperatorRules, RULES_SCHEMA_VERSION};
pub use span::Match;
