//! Structured event vocabulary.
//!
//! Event names are stable; log consumers match on them. Events carry
//! categories, counts and offsets only. Span text never appears in a log
//! record.

use serde::{Deserialize, Serialize};

/// Log levels as written to JSONL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<tracing::Level> for Level {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::TRACE => Level::Trace,
            tracing::Level::DEBUG => Level::Debug,
            tracing::Level::INFO => Level::Info,
            tracing::Level::WARN => Level::Warn,
            tracing::Level::ERROR => Level::Error,
        }
    }
}

/// Pipeline stage a log record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Startup and configuration.
    Init,
    /// Recognizer model bootstrap.
    Load,
    /// Document text extraction.
    Extract,
    /// Candidate detection.
    Detect,
    /// Span resolution and rewriting.
    Redact,
    /// Payload rendering.
    Output,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Init => "init",
            Stage::Load => "load",
            Stage::Extract => "extract",
            Stage::Detect => "detect",
            Stage::Redact => "redact",
            Stage::Output => "output",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Standard event names used in logging.
pub mod event_names {
    // Run lifecycle
    pub const RUN_STARTED: &str = "run.started";
    pub const RUN_FINISHED: &str = "run.finished";

    // Config
    pub const CONFIG_LOADED: &str = "config.loaded";
    pub const CONFIG_DEFAULT_USED: &str = "config.default_used";
    pub const CONFIG_ERROR: &str = "config.error";

    // Model bootstrap (emitted by deid-redact)
    pub const MODEL_LOADED: &str = "model.loaded";
    pub const MODEL_FALLBACK: &str = "model.fallback";
    pub const MODEL_LOAD_FAILED: &str = "model.load_failed";

    // Pipeline
    pub const EXTRACT_FINISHED: &str = "extract.finished";
    pub const EXTRACT_FAILED: &str = "extract.failed";
    pub const DETECT_FINISHED: &str = "detect.finished";
    pub const REDACT_FINISHED: &str = "redact.finished";
    pub const REDACT_FAILED: &str = "redact.failed";

    pub const INTERNAL_ERROR: &str = "internal_error";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_serialization_matches_display() {
        for stage in [Stage::Init, Stage::Load, Stage::Extract, Stage::Detect, Stage::Redact, Stage::Output] {
            let json = serde_json::to_string(&stage).unwrap();
            assert_eq!(json, format!("\"{}\"", stage));
        }
    }

    #[test]
    fn test_level_from_tracing() {
        assert_eq!(Level::from(tracing::Level::INFO), Level::Info);
        assert_eq!(Level::from(tracing::Level::TRACE), Level::Trace);
        assert_eq!(serde_json::to_string(&Level::Warn).unwrap(), "\"warn\"");
    }
}
