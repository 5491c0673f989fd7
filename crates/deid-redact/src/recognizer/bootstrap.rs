//! Startup model selection.
//!
//! Candidates are tried in order; the first that loads becomes the active
//! model. When none load, startup fails with `ModelUnavailable` so no
//! adapter is ever built without a working model.

use super::{Lexicon, LexiconRecognizer, PatternRecognizer, PatternSpec, Recognizer, RecognizerAdapter};
use crate::{RedactionError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// One entry in the ordered model candidate list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelCandidate {
    /// A lexicon JSON file on disk.
    LexiconFile { name: String, path: PathBuf },
    /// The lexicon compiled into the binary.
    BuiltinLexicon,
}

impl ModelCandidate {
    pub fn name(&self) -> &str {
        match self {
            ModelCandidate::LexiconFile { name, .. } => name,
            ModelCandidate::BuiltinLexicon => "builtin-lexicon",
        }
    }

    fn load(&self) -> Result<LexiconRecognizer> {
        let lexicon = match self {
            ModelCandidate::LexiconFile { path, .. } => Lexicon::load(path)?,
            ModelCandidate::BuiltinLexicon => Lexicon::builtin(),
        };
        debug!(model = self.name(), terms = lexicon.term_count(), "Lexicon read");
        LexiconRecognizer::new(&lexicon)
    }
}

/// The model selected at startup.
pub struct LoadedModel {
    /// Name of the candidate that loaded.
    pub name: String,
    /// Position of that candidate in the list.
    pub index: usize,
    pub recognizer: LexiconRecognizer,
}

impl LoadedModel {
    /// Whether an earlier candidate failed and a fallback is active.
    pub fn is_fallback(&self) -> bool {
        self.index > 0
    }

    /// Build the detection adapter: the loaded model plus pattern recognizers.
    pub fn into_adapter(
        self,
        custom_patterns: &[PatternSpec],
        score_threshold: f64,
    ) -> Result<RecognizerAdapter> {
        let patterns = PatternRecognizer::with_custom(custom_patterns)?;
        debug!(patterns = ?patterns.pattern_names(), "Pattern recognizer compiled");
        let recognizers: Vec<Box<dyn Recognizer>> = vec![Box::new(self.recognizer), Box::new(patterns)];
        Ok(RecognizerAdapter::new(recognizers).with_score_threshold(score_threshold))
    }
}

/// Try each candidate in order and return the first that loads.
pub fn bootstrap_model(candidates: &[ModelCandidate]) -> Result<LoadedModel> {
    let mut tried = Vec::with_capacity(candidates.len());

    for (index, candidate) in candidates.iter().enumerate() {
        match candidate.load() {
            Ok(recognizer) => {
                if index > 0 {
                    warn!(
                        event = "model.fallback",
                        model = candidate.name(),
                        failed = ?tried,
                        "Switched to fallback model"
                    );
                }
                info!(
                    event = "model.loaded",
                    model = candidate.name(),
                    "Recognizer model ready"
                );
                return Ok(LoadedModel {
                    name: candidate.name().to_string(),
                    index,
                    recognizer,
                });
            }
            Err(e) => {
                warn!(
                    event = "model.load_failed",
                    model = candidate.name(),
                    error = %e,
                    "Failed to load recognizer model"
                );
                tried.push(candidate.name().to_string());
            }
        }
    }

    Err(RedactionError::ModelUnavailable { tried })
}
