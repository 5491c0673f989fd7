//! deid-core: detect and redact PII in text and documents.
//!
//! All payloads go to stdout in the selected format; logs go to stderr.

use clap::{Args, Parser, Subcommand};
use deid_core::config::{self, ConfigError, ConfigOptions, ResolvedConfig, CONFIG_ENV};
use deid_core::exit_codes::ExitCode;
use deid_core::logging::{event_names, init_logging, run_span, LogConfig, LogLevel, Stage};
use deid_core::output::{self, OutputFormat, Rendered, SCHEMA_VERSION};
use deid_core::pipeline::{Pipeline, PipelineError};
use deid_extract::DocumentFormat;
use deid_redact::{Category, CategorySet, KeyFile, RedactionError, RedactionResult};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Message shown when a document yields no text.
const UNREADABLE_DOCUMENT: &str = "File is empty or could not be read.";

/// Input used by `check` to exercise the loaded pipeline.
const SELF_TEST_TEXT: &str = "Contact jane.doe@example.com";

#[derive(Parser)]
#[command(name = "deid-core")]
#[command(about = "Detect and redact personally identifiable information")]
#[command(version, propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

#[derive(Args, Debug)]
struct GlobalOpts {
    /// Override config directory
    #[arg(long, global = true, env = CONFIG_ENV)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "json")]
    format: OutputFormat,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Decrease verbosity (errors only)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Disable colored log output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Redact PII in a text string
    Anonymize(AnonymizeArgs),
    /// Extract text from a document and redact it
    File(FileArgs),
    /// Load configuration and model, then run a self-test
    Check,
    /// Configuration management
    Config(ConfigArgs),
    /// Print version information
    Version,
}

#[derive(Args, Debug)]
struct AnonymizeArgs {
    /// Text to redact
    #[arg(conflicts_with = "stdin")]
    text: Option<String>,

    /// Read the text from stdin
    #[arg(long)]
    stdin: bool,

    /// Categories to detect (comma-separated, e.g. PERSON,EMAIL_ADDRESS)
    #[arg(long, value_delimiter = ',')]
    categories: Vec<String>,
}

#[derive(Args, Debug)]
struct FileArgs {
    /// Document to redact (.txt, .pdf or .docx)
    path: PathBuf,

    /// Treat the file as this format instead of guessing from the extension
    #[arg(long = "as", value_name = "FORMAT", value_parser = parse_document_format)]
    as_format: Option<DocumentFormat>,

    /// Categories to detect (comma-separated)
    #[arg(long, value_delimiter = ',')]
    categories: Vec<String>,
}

#[derive(Args, Debug)]
struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Show the resolved configuration and where each part came from
    Show,
    /// Write a new hashing key to the config directory
    InitKey {
        /// Replace an existing key file
        #[arg(long)]
        force: bool,
    },
}

fn parse_document_format(s: &str) -> Result<DocumentFormat, String> {
    DocumentFormat::parse_str(s).ok_or_else(|| format!("unsupported format '{}' (expected txt, pdf or docx)", s))
}

fn main() {
    let cli = Cli::parse();

    let level = LogLevel::from_verbosity(cli.global.verbose, cli.global.quiet);
    let log_config = LogConfig::from_env(level, None).with_ansi(!cli.global.no_color);
    init_logging(&log_config);

    let run = run_span(Stage::Init);
    let exit_code = run.in_scope(|| {
        info!(
            event = event_names::RUN_STARTED,
            version = env!("CARGO_PKG_VERSION"),
            "Starting"
        );
        let code = match &cli.command {
            Commands::Anonymize(args) => run_anonymize(&cli.global, args),
            Commands::File(args) => run_file(&cli.global, args),
            Commands::Check => run_check(&cli.global),
            Commands::Config(args) => match &args.command {
                ConfigCommands::Show => run_config_show(&cli.global),
                ConfigCommands::InitKey { force } => run_config_init_key(&cli.global, *force),
            },
            Commands::Version => {
                print_version(&cli.global);
                ExitCode::Clean
            }
        };
        info!(event = event_names::RUN_FINISHED, exit_code = %code, "Finished");
        code
    });

    std::process::exit(exit_code.as_i32());
}

fn config_options(global: &GlobalOpts) -> ConfigOptions {
    ConfigOptions {
        config_dir: global.config.clone(),
    }
}

fn load_config(global: &GlobalOpts) -> Result<ResolvedConfig, ExitCode> {
    config::load_config(&config_options(global)).map_err(|e| output_config_error(global, &e))
}

fn build_pipeline(global: &GlobalOpts, config: &ResolvedConfig) -> Result<Pipeline, ExitCode> {
    Pipeline::from_config(config).map_err(|e| {
        let code = match &e {
            RedactionError::ModelUnavailable { .. } => ExitCode::CapabilityError,
            RedactionError::PatternError(_) => ExitCode::ArgsError,
            _ => ExitCode::InternalError,
        };
        error!(event = event_names::INTERNAL_ERROR, error = %e, "Pipeline setup failed");
        output::error(code, &e.to_string()).eprint(global.format);
        code
    })
}

/// Categories from `--categories`, or the configured defaults when empty.
///
/// Unknown names are ignored.
fn resolve_categories(requested: &[String], config: &ResolvedConfig) -> CategorySet {
    if requested.is_empty() {
        return config.models.enabled_categories.clone();
    }
    requested
        .iter()
        .filter_map(|name| {
            let category = Category::parse_str(name);
            if category.is_none() {
                warn!(category = %name, "Ignoring unknown category");
            }
            category
        })
        .collect()
}

/// `Clean` only when some span was actually rewritten; spans kept by a
/// `keep` or pass-through operator do not count.
fn outcome_code(result: &RedactionResult) -> ExitCode {
    if result.is_modified() {
        ExitCode::Clean
    } else {
        ExitCode::NothingFound
    }
}

fn run_anonymize(global: &GlobalOpts, args: &AnonymizeArgs) -> ExitCode {
    let text = match (&args.text, args.stdin) {
        (Some(text), _) => text.clone(),
        (None, true) => {
            let mut buf = String::new();
            if let Err(e) = std::io::stdin().read_to_string(&mut buf) {
                let code = ExitCode::IoError;
                output::error(code, &format!("failed to read stdin: {}", e)).eprint(global.format);
                return code;
            }
            buf
        }
        (None, false) => {
            let code = ExitCode::ArgsError;
            output::error(code, "no input: pass TEXT or --stdin").eprint(global.format);
            return code;
        }
    };

    let config = match load_config(global) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let pipeline = match build_pipeline(global, &config) {
        Ok(p) => p,
        Err(code) => return code,
    };
    let enabled = resolve_categories(&args.categories, &config);

    match pipeline.redact_text(&text, &enabled, &config.operators) {
        Ok(result) => {
            output::redaction(&text, &result, None).print(global.format);
            outcome_code(&result)
        }
        Err(e) => {
            let code = ExitCode::RedactError;
            output::error(code, &e.to_string()).eprint(global.format);
            code
        }
    }
}

fn run_file(global: &GlobalOpts, args: &FileArgs) -> ExitCode {
    let format = match args.as_format.or_else(|| DocumentFormat::from_filename(&args.path)) {
        Some(f) => f,
        None => {
            let code = ExitCode::ArgsError;
            let message = format!(
                "cannot tell the format of {}; pass --as txt|pdf|docx",
                args.path.display()
            );
            output::error(code, &message).eprint(global.format);
            return code;
        }
    };

    let bytes = match std::fs::read(&args.path) {
        Ok(b) => b,
        Err(e) => {
            let code = ExitCode::IoError;
            let message = format!("failed to read {}: {}", args.path.display(), e);
            output::error(code, &message).eprint(global.format);
            return code;
        }
    };

    let config = match load_config(global) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let pipeline = match build_pipeline(global, &config) {
        Ok(p) => p,
        Err(code) => return code,
    };
    let enabled = resolve_categories(&args.categories, &config);

    match pipeline.redact_document(&bytes, format, &enabled, &config.operators) {
        Ok(outcome) => {
            let name = display_name(&args.path);
            output::redaction(&outcome.original, &outcome.result, Some(&name)).print(global.format);
            outcome_code(&outcome.result)
        }
        Err(PipelineError::Extraction { .. }) | Err(PipelineError::EmptyDocument { .. }) => {
            let code = ExitCode::ExtractError;
            output::error(code, UNREADABLE_DOCUMENT).eprint(global.format);
            code
        }
        Err(PipelineError::Redaction(e)) => {
            let code = ExitCode::RedactError;
            output::error(code, &e.to_string()).eprint(global.format);
            code
        }
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn run_check(global: &GlobalOpts) -> ExitCode {
    let mut checks: Vec<serde_json::Value> = Vec::new();
    let mut exit_code = ExitCode::Clean;

    let config = match config::load_config(&config_options(global)) {
        Ok(config) => {
            let snapshot = config.snapshot();
            checks.push(serde_json::json!({
                "check": "config",
                "status": "ok",
                "config_dir": snapshot.config_dir,
                "operators": snapshot.operators_path,
                "models": snapshot.models_path,
                "using_defaults": snapshot.operators_path.is_none() && snapshot.models_path.is_none(),
            }));
            Some(config)
        }
        Err(e) => {
            exit_code = config_error_code(&e);
            checks.push(serde_json::json!({
                "check": "config",
                "status": "error",
                "error": e.to_string(),
            }));
            None
        }
    };

    let pipeline = config.as_ref().and_then(|config| match Pipeline::from_config(config) {
        Ok(pipeline) => {
            checks.push(serde_json::json!({
                "check": "model",
                "status": if pipeline.is_fallback() { "info" } else { "ok" },
                "model": pipeline.model_name(),
                "fallback": pipeline.is_fallback(),
                "recognizers": pipeline.adapter().recognizer_names(),
                "supported_categories": pipeline.adapter().supported_categories(),
                "note": if pipeline.is_fallback() {
                    "Preferred model unavailable; using fallback"
                } else {
                    "Preferred model loaded"
                },
            }));
            Some(pipeline)
        }
        Err(e) => {
            exit_code = match e {
                RedactionError::ModelUnavailable { .. } => ExitCode::CapabilityError,
                _ => ExitCode::ArgsError,
            };
            checks.push(serde_json::json!({
                "check": "model",
                "status": "error",
                "error": e.to_string(),
            }));
            None
        }
    });

    if let (Some(config), Some(pipeline)) = (&config, &pipeline) {
        let enabled: CategorySet = [Category::EmailAddress].into_iter().collect();
        match pipeline.redact_text(SELF_TEST_TEXT, &enabled, &config.operators) {
            Ok(result) if result.applied.iter().any(|a| a.category == Category::EmailAddress) => {
                checks.push(serde_json::json!({
                    "check": "self_test",
                    "status": "ok",
                    "applied": result.applied.len(),
                }));
            }
            Ok(_) => {
                exit_code = ExitCode::InternalError;
                checks.push(serde_json::json!({
                    "check": "self_test",
                    "status": "error",
                    "error": "sample e-mail address was not detected",
                }));
            }
            Err(e) => {
                exit_code = ExitCode::RedactError;
                checks.push(serde_json::json!({
                    "check": "self_test",
                    "status": "error",
                    "error": e.to_string(),
                }));
            }
        }
    }

    let all_ok = exit_code == ExitCode::Clean;
    let json = serde_json::json!({
        "schema_version": SCHEMA_VERSION,
        "generated_at": chrono::Utc::now().to_rfc3339(),
        "status": if all_ok { "ok" } else { "error" },
        "checks": checks,
    });

    let mut markdown = String::from("# deid-core check\n\n");
    for check in &checks {
        let name = check.get("check").and_then(|v| v.as_str()).unwrap_or("?");
        let status = check.get("status").and_then(|v| v.as_str()).unwrap_or("?");
        let symbol = match status {
            "ok" => "✓",
            "info" => "ℹ",
            _ => "✗",
        };
        markdown.push_str(&format!("{} {}: {}\n", symbol, name, status));
        if let Some(model) = check.get("model").and_then(|v| v.as_str()) {
            markdown.push_str(&format!("  Model: {}\n", model));
        }
        if let Some(note) = check.get("note").and_then(|v| v.as_str()) {
            markdown.push_str(&format!("  {}\n", note));
        }
        if let Some(error) = check.get("error").and_then(|v| v.as_str()) {
            markdown.push_str(&format!("  Error: {}\n", error));
        }
    }

    let summary = format!(
        "check: {}{}",
        if all_ok { "OK" } else { "FAILED" },
        pipeline
            .as_ref()
            .map(|p| format!(" (model {})", p.model_name()))
            .unwrap_or_default()
    );

    Rendered {
        json,
        summary,
        markdown,
    }
    .print(global.format);
    exit_code
}

/// Display the resolved configuration (including defaults if no files present).
fn run_config_show(global: &GlobalOpts) -> ExitCode {
    let config = match load_config(global) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let snapshot = config.snapshot();

    let json = serde_json::json!({
        "schema_version": SCHEMA_VERSION,
        "generated_at": chrono::Utc::now().to_rfc3339(),
        "source": &snapshot,
        "operators": &config.operators,
        "models": &config.models,
    });

    let mut markdown = String::from("# deid-core configuration\n\n");
    markdown.push_str(&format!("Config dir: `{}`\n\n", snapshot.config_dir.display()));
    for (label, path, hash) in [
        (config::OPERATORS_FILE, &snapshot.operators_path, &snapshot.operators_hash),
        (config::MODELS_FILE, &snapshot.models_path, &snapshot.models_hash),
    ] {
        match (path, hash) {
            (Some(p), Some(h)) => {
                markdown.push_str(&format!("- {}: `{}` (sha256 {})\n", label, p.display(), &h[..12]))
            }
            _ => markdown.push_str(&format!("- {}: built-in defaults\n", label)),
        }
    }
    markdown.push_str(&format!(
        "- {}: {}\n",
        config::KEY_FILE,
        snapshot.key_id.as_deref().unwrap_or("absent (random key per run)")
    ));
    markdown.push_str(&format!("\nModels: {}\n", snapshot.model_candidates.join(" > ")));

    let summary = format!(
        "config: {} ({} model candidate(s), {} categories)",
        snapshot.config_dir.display(),
        snapshot.model_candidates.len(),
        snapshot.enabled_categories.len()
    );

    Rendered {
        json,
        summary,
        markdown,
    }
    .print(global.format);
    ExitCode::Clean
}

/// Generate a key file so hash replacements stay stable across runs.
fn run_config_init_key(global: &GlobalOpts, force: bool) -> ExitCode {
    let config = match load_config(global) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let path = config.config_dir.join(config::KEY_FILE);

    if path.exists() && !force {
        let code = ExitCode::ArgsError;
        let message = format!("{} already exists; pass --force to replace it", path.display());
        output::error(code, &message).eprint(global.format);
        return code;
    }

    let result = std::fs::create_dir_all(&config.config_dir)
        .map_err(RedactionError::from)
        .and_then(|_| KeyFile::generate())
        .and_then(|file| file.save(&path).map(|_| file.key_id));
    match result {
        Ok(key_id) => {
            info!(event = event_names::CONFIG_LOADED, key_id = %key_id, "Wrote hashing key");
            let json = serde_json::json!({
                "schema_version": SCHEMA_VERSION,
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "status": "ok",
                "path": path,
                "key_id": key_id,
            });
            Rendered {
                summary: format!("wrote key {} to {}", key_id, path.display()),
                markdown: format!("# Key created\n\n- Path: `{}`\n- Key ID: {}\n", path.display(), key_id),
                json,
            }
            .print(global.format);
            ExitCode::Clean
        }
        Err(e) => {
            let code = ExitCode::IoError;
            output::error(code, &e.to_string()).eprint(global.format);
            code
        }
    }
}

fn config_error_code(error: &ConfigError) -> ExitCode {
    match error {
        ConfigError::NotFound { .. } | ConfigError::ParseError { .. } | ConfigError::Invalid { .. } => {
            ExitCode::ArgsError
        }
        ConfigError::IoError { .. } => ExitCode::IoError,
        ConfigError::VersionMismatch { .. } => ExitCode::VersionError,
    }
}

fn output_config_error(global: &GlobalOpts, error: &ConfigError) -> ExitCode {
    let code = config_error_code(error);
    error!(event = event_names::CONFIG_ERROR, error = %error, "Configuration error");
    output::error(code, &error.to_string()).eprint(global.format);
    code
}

fn print_version(global: &GlobalOpts) {
    let json = serde_json::json!({
        "schema_version": SCHEMA_VERSION,
        "deid_core_version": env!("CARGO_PKG_VERSION"),
        "rust_version": env!("CARGO_PKG_RUST_VERSION"),
    });
    Rendered {
        summary: format!("deid-core {}", env!("CARGO_PKG_VERSION")),
        markdown: format!(
            "deid-core {}\nschema version: {}\n",
            env!("CARGO_PKG_VERSION"),
            SCHEMA_VERSION
        ),
        json,
    }
    .print(global.format);
}
