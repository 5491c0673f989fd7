//! deid core library.
//!
//! Wires the recognizer adapter, redaction engine and text extractors into
//! a pipeline, and provides the ambient pieces the CLI needs:
//! - Exit codes for CLI operations
//! - Configuration loading and provenance snapshots
//! - Structured logging (human or JSONL on stderr)
//! - Payload rendering
//!
//! The binary entry point is in `main.rs`.

pub mod config;
pub mod exit_codes;
pub mod logging;
pub mod output;
pub mod pipeline;

pub use config::{load_config, ConfigError, ConfigOptions, ResolvedConfig};
pub use exit_codes::ExitCode;
pub use pipeline::{DocumentOutcome, Pipeline, PipelineError};
