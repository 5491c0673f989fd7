//! Structured logging for deid.
//!
//! Two modes:
//! - Human-readable console output for interactive use
//! - Machine-parseable JSONL for batch and service use
//!
//! # Usage
//!
//! ```no_run
//! use deid_core::logging::{init_logging, LogConfig, Stage};
//!
//! init_logging(&LogConfig::from_env(None, None));
//! let run = deid_core::logging::run_span(Stage::Init);
//! let _guard = run.enter();
//! tracing::info!(event = "run.started", "Starting");
//! ```
//!
//! stdout is reserved for command payloads; every log line goes to stderr.
//! Log records never include input text or matched spans.

pub mod config;
pub mod events;
pub mod layer;

pub use config::{LogConfig, LogFormat, LogLevel};
pub use events::{event_names, Level, Stage};
pub use layer::JsonlLayer;

use std::io::IsTerminal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Crates whose records are kept by the default filter.
const LOG_TARGETS: &[&str] = &["deid_core", "deid_redact", "deid_extract"];

/// Filter directive applying `level` to every deid crate.
pub fn default_directive(level: LogLevel) -> String {
    LOG_TARGETS
        .iter()
        .map(|target| format!("{}={}", target, level))
        .collect::<Vec<_>>()
        .join(",")
}

/// Initialize the logging subsystem.
///
/// Call once at startup, before any logging. `RUST_LOG` overrides the
/// level from `config` when set. A second call is a no-op.
pub fn init_logging(config: &LogConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(config.level)));

    let result = match config.format {
        LogFormat::Human => {
            let use_ansi = config.ansi && std::io::stderr().is_terminal();
            let fmt_layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_ansi(use_ansi);

            if config.timestamps {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt_layer)
                    .try_init()
            } else {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt_layer.without_time())
                    .try_init()
            }
        }
        LogFormat::Jsonl => tracing_subscriber::registry()
            .with(filter)
            .with(JsonlLayer::stderr())
            .try_init(),
    };

    if result.is_err() {
        tracing::debug!("Logging already initialized");
    }
}

/// Generate a unique run ID for this invocation.
pub fn generate_run_id() -> String {
    let uuid = uuid::Uuid::new_v4().simple().to_string();
    format!("run-{}", &uuid[..12])
}

/// Root span carrying the run ID; enter it for the whole invocation.
pub fn run_span(stage: Stage) -> tracing::Span {
    tracing::info_span!("run", run_id = %generate_run_id(), stage = %stage)
}

/// Nested span marking a pipeline stage.
pub fn stage_span(stage: Stage) -> tracing::Span {
    tracing::info_span!("stage", stage = %stage)
}
