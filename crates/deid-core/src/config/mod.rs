//! Configuration loading for deid-core.
//!
//! This module handles:
//! - Config directory resolution (CLI > env > XDG > defaults)
//! - Loading operators.json, models.json and redaction.key
//! - Schema version checks and semantic validation
//! - Config snapshots (path + SHA-256 per loaded file)
//!
//! Every file is optional. A missing file falls back to built-in defaults;
//! a present but broken file is an error.

use deid_redact::{
    Category, CategorySet, KeyFile, KeyMaterial, ModelCandidate, OperatorRules, PatternSpec,
    RULES_SCHEMA_VERSION,
};
use serde::{Deserialize, Deserializer, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Schema version for models.json.
pub const CONFIG_SCHEMA_VERSION: &str = "1.0.0";

/// Environment variable naming the config directory.
pub const CONFIG_ENV: &str = "DEID_CONFIG";

/// Default XDG config directory name.
const CONFIG_DIR_NAME: &str = "deid";

pub const OPERATORS_FILE: &str = "operators.json";
pub const MODELS_FILE: &str = "models.json";
pub const KEY_FILE: &str = "redaction.key";

/// Preferred lexicon, looked up inside the config directory.
pub const LARGE_LEXICON_FILE: &str = "lexicon.json";

/// Errors that can occur during config loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config directory not found: {path}")]
    NotFound { path: PathBuf },

    #[error("Invalid JSON in config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("I/O error reading {path}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Schema version mismatch in {path}: expected {expected}, got {actual}")]
    VersionMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    #[error("Invalid config file {path}: {message}")]
    Invalid { path: PathBuf, message: String },
}

/// Model selection and detection settings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelConfig {
    pub schema_version: String,
    /// Recognizer models in preference order.
    pub candidates: Vec<ModelCandidate>,
    /// Minimum score for a detected match to be kept.
    pub score_threshold: f64,
    /// Categories analyzed when the caller does not choose.
    pub enabled_categories: CategorySet,
    /// Extra regex recognizers.
    pub custom_patterns: Vec<PatternSpec>,
}

impl ModelConfig {
    /// Defaults for a config directory: its large lexicon, then the builtin one.
    pub fn defaults_for(config_dir: &Path) -> Self {
        ModelConfig {
            schema_version: CONFIG_SCHEMA_VERSION.to_string(),
            candidates: default_candidates(config_dir),
            score_threshold: 0.0,
            enabled_categories: CategorySet::default_enabled(),
            custom_patterns: Vec::new(),
        }
    }
}

fn default_candidates(config_dir: &Path) -> Vec<ModelCandidate> {
    vec![
        ModelCandidate::LexiconFile {
            name: "lexicon-large".to_string(),
            path: config_dir.join(LARGE_LEXICON_FILE),
        },
        ModelCandidate::BuiltinLexicon,
    ]
}

/// models.json as written on disk.
#[derive(Debug, Deserialize)]
struct ModelsFile {
    schema_version: String,
    #[serde(default)]
    candidates: Vec<ModelCandidate>,
    #[serde(default)]
    score_threshold: f64,
    #[serde(default, deserialize_with = "deserialize_categories")]
    enabled_categories: Option<CategorySet>,
    #[serde(default)]
    custom_patterns: Vec<PatternSpec>,
}

/// Known category names become the set; unknown names are logged and dropped.
fn deserialize_categories<'de, D>(deserializer: D) -> Result<Option<CategorySet>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Vec<String>> = Option::deserialize(deserializer)?;
    Ok(raw.map(|names| {
        names
            .iter()
            .filter_map(|name| {
                let category = Category::parse_str(name);
                if category.is_none() {
                    warn!(category = %name, "Ignoring unknown category in models.json");
                }
                category
            })
            .collect()
    }))
}

/// Fully resolved configuration.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// The config directory used for resolution.
    pub config_dir: PathBuf,

    /// Operator rules applied by the CLI.
    pub operators: OperatorRules,
    pub operators_path: Option<PathBuf>,
    pub operators_hash: Option<String>,

    /// Model selection settings.
    pub models: ModelConfig,
    pub models_path: Option<PathBuf>,
    pub models_hash: Option<String>,

    /// Hashing key; a fresh random key is used per run when absent.
    pub key: Option<KeyMaterial>,
    pub key_path: Option<PathBuf>,
}

impl ResolvedConfig {
    /// Summarize provenance for `config show` and run logs.
    pub fn snapshot(&self) -> ConfigSnapshot {
        ConfigSnapshot {
            config_dir: self.config_dir.clone(),
            operators_path: self.operators_path.clone(),
            operators_hash: self.operators_hash.clone(),
            operators_schema_version: self.operators.schema_version.clone(),
            models_path: self.models_path.clone(),
            models_hash: self.models_hash.clone(),
            models_schema_version: self.models.schema_version.clone(),
            model_candidates: self.models.candidates.iter().map(|c| c.name().to_string()).collect(),
            enabled_categories: self.models.enabled_categories.clone(),
            score_threshold: self.models.score_threshold,
            key_path: self.key_path.clone(),
            key_id: self.key.as_ref().map(|k| k.key_id.clone()),
        }
    }
}

/// Config provenance summary. Never contains key material.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    pub config_dir: PathBuf,
    pub operators_path: Option<PathBuf>,
    pub operators_hash: Option<String>,
    pub operators_schema_version: String,
    pub models_path: Option<PathBuf>,
    pub models_hash: Option<String>,
    pub models_schema_version: String,
    pub model_candidates: Vec<String>,
    pub enabled_categories: CategorySet,
    pub score_threshold: f64,
    pub key_path: Option<PathBuf>,
    pub key_id: Option<String>,
}

/// Configuration resolution options.
#[derive(Debug, Default)]
pub struct ConfigOptions {
    /// Explicit config directory (highest priority).
    pub config_dir: Option<PathBuf>,
}

/// Load configuration with the standard resolution order.
///
/// Resolution order (highest to lowest priority):
/// 1. Explicit CLI flag (via ConfigOptions)
/// 2. Environment variable (DEID_CONFIG)
/// 3. XDG config home (~/.config/deid/)
/// 4. Built-in defaults
///
/// A directory named explicitly (1 or 2) must exist.
pub fn load_config(options: &ConfigOptions) -> Result<ResolvedConfig, ConfigError> {
    let (config_dir, explicit) = resolve_config_dir(options);
    if explicit && !config_dir.is_dir() {
        return Err(ConfigError::NotFound { path: config_dir });
    }

    let (operators, operators_path, operators_hash) = load_operators(&config_dir)?;
    let (models, models_path, models_hash) = load_models(&config_dir)?;
    let (key, key_path) = load_key(&config_dir)?;

    Ok(ResolvedConfig {
        config_dir,
        operators,
        operators_path,
        operators_hash,
        models,
        models_path,
        models_hash,
        key,
        key_path,
    })
}

/// Resolve the config directory, and whether it was named explicitly.
fn resolve_config_dir(options: &ConfigOptions) -> (PathBuf, bool) {
    if let Some(dir) = &options.config_dir {
        return (dir.clone(), true);
    }

    if let Ok(dir) = std::env::var(CONFIG_ENV) {
        if !dir.is_empty() {
            return (PathBuf::from(dir), true);
        }
    }

    let xdg_config = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config")
        });

    (xdg_config.join(CONFIG_DIR_NAME), false)
}

/// Read a config file, returning its content and SHA-256, or None if absent.
fn read_optional(path: &Path) -> Result<Option<(String, String)>, ConfigError> {
    if !path.exists() {
        debug!(event = "config.default_used", file = %path.display(), "Config file absent");
        return Ok(None);
    }
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError {
        path: path.to_path_buf(),
        source: e,
    })?;
    let hash = compute_hash(&content);
    info!(event = "config.loaded", file = %path.display(), sha256 = %hash, "Loaded config file");
    Ok(Some((content, hash)))
}

fn parse_json<T: serde::de::DeserializeOwned>(path: &Path, content: &str) -> Result<T, ConfigError> {
    serde_json::from_str(content).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })
}

fn check_version(path: &Path, expected: &str, actual: &str) -> Result<(), ConfigError> {
    if actual != expected {
        return Err(ConfigError::VersionMismatch {
            path: path.to_path_buf(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        });
    }
    Ok(())
}

/// Load operator rules; the CLI default replaces every category with its tag.
fn load_operators(
    config_dir: &Path,
) -> Result<(OperatorRules, Option<PathBuf>, Option<String>), ConfigError> {
    let path = config_dir.join(OPERATORS_FILE);
    let Some((content, hash)) = read_optional(&path)? else {
        return Ok((OperatorRules::tags(), None, None));
    };

    let rules: OperatorRules = parse_json(&path, &content)?;
    check_version(&path, RULES_SCHEMA_VERSION, &rules.schema_version)?;
    if rules.hash_truncation_bytes == 0 || rules.hash_truncation_bytes > 32 {
        return Err(ConfigError::Invalid {
            path,
            message: format!(
                "hash_truncation_bytes must be in 1..=32, got {}",
                rules.hash_truncation_bytes
            ),
        });
    }
    Ok((rules, Some(path), Some(hash)))
}

/// Load model settings, filling unset fields from the defaults.
fn load_models(
    config_dir: &Path,
) -> Result<(ModelConfig, Option<PathBuf>, Option<String>), ConfigError> {
    let path = config_dir.join(MODELS_FILE);
    let Some((content, hash)) = read_optional(&path)? else {
        return Ok((ModelConfig::defaults_for(config_dir), None, None));
    };

    let file: ModelsFile = parse_json(&path, &content)?;
    check_version(&path, CONFIG_SCHEMA_VERSION, &file.schema_version)?;

    if !(0.0..=1.0).contains(&file.score_threshold) {
        return Err(ConfigError::Invalid {
            path,
            message: format!("score_threshold must be in [0, 1], got {}", file.score_threshold),
        });
    }

    let candidates = if file.candidates.is_empty() {
        default_candidates(config_dir)
    } else {
        file.candidates
            .into_iter()
            .map(|candidate| match candidate {
                ModelCandidate::LexiconFile { name, path } if path.is_relative() => {
                    ModelCandidate::LexiconFile {
                        name,
                        path: config_dir.join(path),
                    }
                }
                other => other,
            })
            .collect()
    };

    let models = ModelConfig {
        schema_version: file.schema_version,
        candidates,
        score_threshold: file.score_threshold,
        enabled_categories: file
            .enabled_categories
            .unwrap_or_else(CategorySet::default_enabled),
        custom_patterns: file.custom_patterns,
    };
    Ok((models, Some(path), Some(hash)))
}

/// Load the hashing key, if a key file exists.
///
/// The key file's hash is not recorded.
fn load_key(config_dir: &Path) -> Result<(Option<KeyMaterial>, Option<PathBuf>), ConfigError> {
    let path = config_dir.join(KEY_FILE);
    if !path.exists() {
        return Ok((None, None));
    }

    let invalid = |e: deid_redact::RedactionError| ConfigError::Invalid {
        path: path.clone(),
        message: e.to_string(),
    };
    let key = KeyFile::load(&path)
        .and_then(|file| file.key())
        .map_err(invalid)?;
    info!(event = "config.loaded", file = %path.display(), key_id = %key.key_id, "Loaded hashing key");
    Ok((Some(key), Some(path)))
}

/// SHA-256 of file content, hex encoded.
pub fn compute_hash(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}
