//! Detection + redaction pipeline.
//!
//! A [`Pipeline`] owns a shared, read-only recognizer adapter and a
//! redaction engine. Each call is independent: nothing is cached between
//! calls, so one pipeline can serve any number of threads.

use crate::config::ResolvedConfig;
use crate::logging::{event_names, stage_span, Stage};
use deid_extract::{try_extract_text, DocumentFormat, ExtractError};
use deid_redact::{
    bootstrap_model, CategorySet, OperatorRules, RecognizerAdapter, RedactionEngine,
    RedactionError, RedactionResult,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors from document redaction.
///
/// Extraction and redaction failures stay distinct so callers can tell
/// unreadable documents apart from detection problems.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("could not extract text from {format} document: {source}")]
    Extraction {
        format: DocumentFormat,
        #[source]
        source: ExtractError,
    },

    #[error("document contains no text")]
    EmptyDocument { format: DocumentFormat },

    #[error("could not redact text: {0}")]
    Redaction(#[from] RedactionError),
}

/// Extracted document text and its redaction.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentOutcome {
    pub format: DocumentFormat,
    /// Text as extracted, before redaction.
    pub original: String,
    pub result: RedactionResult,
}

/// Shared detection + redaction pipeline.
#[derive(Debug, Clone)]
pub struct Pipeline {
    adapter: Arc<RecognizerAdapter>,
    engine: RedactionEngine,
    model: String,
    fallback: bool,
}

impl Pipeline {
    pub fn new(adapter: Arc<RecognizerAdapter>, engine: RedactionEngine) -> Self {
        Pipeline {
            adapter,
            engine,
            model: String::from("custom"),
            fallback: false,
        }
    }

    /// Bootstrap the model candidates from `config` and build a pipeline.
    ///
    /// Fails with `ModelUnavailable` when no candidate loads.
    pub fn from_config(config: &ResolvedConfig) -> Result<Self, RedactionError> {
        let _stage = stage_span(Stage::Load).entered();

        let loaded = bootstrap_model(&config.models.candidates)?;
        let model = loaded.name.clone();
        let fallback = loaded.is_fallback();
        let adapter = loaded.into_adapter(
            &config.models.custom_patterns,
            config.models.score_threshold,
        )?;
        let engine = match &config.key {
            Some(key) => RedactionEngine::with_key(key.clone()),
            None => RedactionEngine::new()?,
        };

        Ok(Pipeline {
            adapter: Arc::new(adapter),
            engine,
            model,
            fallback,
        })
    }

    /// Name of the active recognizer model.
    pub fn model_name(&self) -> &str {
        &self.model
    }

    /// Whether a preferred model failed and a fallback is active.
    pub fn is_fallback(&self) -> bool {
        self.fallback
    }

    pub fn adapter(&self) -> &RecognizerAdapter {
        &self.adapter
    }

    pub fn engine(&self) -> &RedactionEngine {
        &self.engine
    }

    /// Detect and redact PII in `text`.
    ///
    /// Empty text is returned unchanged without running detection.
    pub fn redact_text(
        &self,
        text: &str,
        enabled: &CategorySet,
        rules: &OperatorRules,
    ) -> Result<RedactionResult, RedactionError> {
        if text.is_empty() {
            debug!("Empty input, nothing to redact");
            return Ok(RedactionResult::unchanged(text));
        }

        let matches = {
            let _stage = stage_span(Stage::Detect).entered();
            self.adapter.detect(text, enabled)
        };

        let _stage = stage_span(Stage::Redact).entered();
        let result = match self.engine.redact(text, &matches, rules) {
            Ok(result) => result,
            Err(e) => {
                warn!(event = event_names::REDACT_FAILED, error = %e, "Redaction failed");
                return Err(e);
            }
        };

        let mut per_category: BTreeMap<&'static str, u64> = BTreeMap::new();
        for rewrite in &result.applied {
            *per_category.entry(rewrite.category.as_str()).or_default() += 1;
        }
        info!(
            event = event_names::REDACT_FINISHED,
            input_bytes = text.len() as u64,
            candidates = matches.len() as u64,
            applied = result.applied.len() as u64,
            categories = ?per_category,
            "Redaction complete"
        );

        Ok(result)
    }

    /// Extract text from a document and redact it.
    ///
    /// Whitespace-only text counts as empty.
    pub fn redact_document(
        &self,
        bytes: &[u8],
        format: DocumentFormat,
        enabled: &CategorySet,
        rules: &OperatorRules,
    ) -> Result<DocumentOutcome, PipelineError> {
        let original = {
            let _stage = stage_span(Stage::Extract).entered();
            let text = try_extract_text(bytes, format).map_err(|source| {
                warn!(
                    event = event_names::EXTRACT_FAILED,
                    format = %format,
                    bytes = bytes.len() as u64,
                    error = %source,
                    "Could not extract text from document"
                );
                PipelineError::Extraction { format, source }
            })?;
            if text.trim().is_empty() {
                warn!(event = event_names::EXTRACT_FAILED, format = %format, "Document has no text");
                return Err(PipelineError::EmptyDocument { format });
            }
            debug!(
                event = event_names::EXTRACT_FINISHED,
                format = %format,
                text_bytes = text.len() as u64,
                "Extracted document text"
            );
            text
        };

        let result = self.redact_text(&original, enabled, rules)?;
        Ok(DocumentOutcome {
            format,
            original,
            result,
        })
    }
}
