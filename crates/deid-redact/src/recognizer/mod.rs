//! Pluggable entity recognizers and the adapter that combines them.
//!
//! A [`Recognizer`] turns text into candidate [`Match`]es for the categories
//! it supports. The [`RecognizerAdapter`] fans a detection call out to every
//! relevant recognizer and drops candidates that are malformed, disabled or
//! below the score threshold. Overlaps are left for the redaction engine.

pub mod bootstrap;
pub mod lexicon;
pub mod pattern;

pub use bootstrap::{bootstrap_model, LoadedModel, ModelCandidate};
pub use lexicon::{Lexicon, LexiconRecognizer, LEXICON_SCHEMA_VERSION};
pub use pattern::{PatternRecognizer, PatternSpec};

use crate::{Category, CategorySet, Match};
use std::sync::Mutex;
use tracing::{debug, warn};

/// A thread-safe entity recognizer.
pub trait Recognizer: Send + Sync {
    /// Stable name used in logs and `check` output.
    fn name(&self) -> &str;

    /// Categories this recognizer can emit.
    fn supported_categories(&self) -> &[Category];

    /// Find candidate matches for the enabled categories.
    fn analyze(&self, text: &str, categories: &CategorySet) -> Vec<Match>;
}

/// A recognizer that needs exclusive access while analyzing.
///
/// Wrap it in [`Serialized`] to share it across threads.
pub trait ExclusiveRecognizer: Send {
    fn name(&self) -> &str;

    fn supported_categories(&self) -> &[Category];

    fn analyze(&mut self, text: &str, categories: &CategorySet) -> Vec<Match>;
}

/// Serializes calls into an [`ExclusiveRecognizer`] behind a mutex.
pub struct Serialized<R> {
    name: String,
    categories: Vec<Category>,
    inner: Mutex<R>,
}

impl<R: ExclusiveRecognizer> Serialized<R> {
    pub fn new(inner: R) -> Self {
        Self {
            name: inner.name().to_string(),
            categories: inner.supported_categories().to_vec(),
            inner: Mutex::new(inner),
        }
    }
}

impl<R: ExclusiveRecognizer> Recognizer for Serialized<R> {
    fn name(&self) -> &str {
        &self.name
    }

    fn supported_categories(&self) -> &[Category] {
        &self.categories
    }

    fn analyze(&self, text: &str, categories: &CategorySet) -> Vec<Match> {
        let mut guard = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!(recognizer = %self.name, "Recognizer lock poisoned; recovering");
                poisoned.into_inner()
            }
        };
        guard.analyze(text, categories)
    }
}

/// Combines recognizers into a single detection capability.
///
/// Built once at startup and shared as `Arc<RecognizerAdapter>`.
pub struct RecognizerAdapter {
    recognizers: Vec<Box<dyn Recognizer>>,
    score_threshold: f64,
}

impl RecognizerAdapter {
    pub fn new(recognizers: Vec<Box<dyn Recognizer>>) -> Self {
        Self {
            recognizers,
            score_threshold: 0.0,
        }
    }

    /// Drop candidates scoring below `threshold`.
    pub fn with_score_threshold(mut self, threshold: f64) -> Self {
        self.score_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    /// Names of the configured recognizers, in call order.
    pub fn recognizer_names(&self) -> Vec<&str> {
        self.recognizers.iter().map(|r| r.name()).collect()
    }

    /// Union of the categories the recognizers can emit.
    pub fn supported_categories(&self) -> CategorySet {
        self.recognizers
            .iter()
            .flat_map(|r| r.supported_categories().iter().copied())
            .collect()
    }

    /// Detect candidate matches for `enabled` categories in `text`.
    ///
    /// Empty text or an empty category set returns no matches without
    /// invoking any recognizer. Output order is unspecified.
    pub fn detect(&self, text: &str, enabled: &CategorySet) -> Vec<Match> {
        if text.is_empty() || enabled.is_empty() {
            return Vec::new();
        }

        let mut matches = Vec::new();
        for recognizer in &self.recognizers {
            if !enabled.intersects(recognizer.supported_categories()) {
                continue;
            }

            let mut dropped = 0usize;
            for m in recognizer.analyze(text, enabled) {
                if !enabled.contains(m.category) {
                    dropped += 1;
                    continue;
                }
                if let Err(e) = m.validate(text) {
                    debug!(recognizer = recognizer.name(), error = %e, "Dropping malformed candidate");
                    dropped += 1;
                    continue;
                }
                if m.score < self.score_threshold {
                    dropped += 1;
                    continue;
                }
                matches.push(m);
            }

            if dropped > 0 {
                debug!(
                    recognizer = recognizer.name(),
                    dropped, "Dropped candidates from recognizer"
                );
            }
        }

        debug!(
            event = "detect.finished",
            candidates = matches.len(),
            "Detection finished"
        );
        matches
    }
}

impl std::fmt::Debug for RecognizerAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecognizerAdapter")
            .field("recognizers", &self.recognizer_names())
            .field("score_threshold", &self.score_threshold)
            .finish()
    }
}
