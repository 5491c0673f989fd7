//! Command payload rendering.
//!
//! Payloads go to stdout; errors go to stderr in the same format so
//! scripted callers can parse either stream.

use crate::exit_codes::ExitCode;
use clap::ValueEnum;
use deid_redact::{AppliedRewrite, RedactionResult};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;

/// Schema version stamped on every JSON payload.
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Supported output formats for CLI commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Structured JSON (default)
    #[default]
    Json,
    /// Human-readable Markdown
    Md,
    /// One-line summary
    Summary,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            OutputFormat::Json => "json",
            OutputFormat::Md => "md",
            OutputFormat::Summary => "summary",
        })
    }
}

/// A payload rendered once per output format.
#[derive(Debug, Clone)]
pub struct Rendered {
    pub json: Value,
    pub summary: String,
    pub markdown: String,
}

impl Rendered {
    pub fn render(&self, format: OutputFormat) -> String {
        match format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(&self.json).unwrap_or_else(|_| self.json.to_string())
            }
            OutputFormat::Summary => self.summary.clone(),
            OutputFormat::Md => self.markdown.clone(),
        }
    }

    /// Print to stdout.
    pub fn print(&self, format: OutputFormat) {
        println!("{}", self.render(format));
    }

    /// Print to stderr.
    pub fn eprint(&self, format: OutputFormat) {
        eprintln!("{}", self.render(format));
    }
}

/// Count rewrites that changed their span, per category name.
pub fn category_counts(applied: &[AppliedRewrite]) -> BTreeMap<&'static str, usize> {
    let mut counts = BTreeMap::new();
    for rewrite in applied.iter().filter(|r| r.original_text != r.replacement_text) {
        *counts.entry(rewrite.category.as_str()).or_insert(0) += 1;
    }
    counts
}

/// Render a redaction: `{original, result, applied}`, plus `filename` for files.
pub fn redaction(original: &str, result: &RedactionResult, filename: Option<&str>) -> Rendered {
    let mut json = json!({
        "schema_version": SCHEMA_VERSION,
        "generated_at": chrono::Utc::now().to_rfc3339(),
        "original": original,
        "result": result.redacted_text,
        "applied": result.applied,
    });
    if let Some(name) = filename {
        json["filename"] = Value::from(name);
    }

    let counts = category_counts(&result.applied);
    let summary = if counts.is_empty() {
        "no PII found".to_string()
    } else {
        let parts: Vec<String> = counts.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
        let total: usize = counts.values().sum();
        format!("{} span(s) rewritten ({})", total, parts.join(", "))
    };

    let mut markdown = String::from("# Redaction\n\n");
    if let Some(name) = filename {
        markdown.push_str(&format!("File: `{}`\n\n", name));
    }
    markdown.push_str("```text\n");
    markdown.push_str(&result.redacted_text);
    if !result.redacted_text.ends_with('\n') {
        markdown.push('\n');
    }
    markdown.push_str("```\n");
    if !result.applied.is_empty() {
        markdown.push_str("\n| Category | Span | Operator | Replacement |\n");
        markdown.push_str("|----------|------|----------|-------------|\n");
        for rewrite in &result.applied {
            markdown.push_str(&format!(
                "| {} | {}..{} | {} | `{}` |\n",
                rewrite.category, rewrite.start, rewrite.end, rewrite.operator, rewrite.replacement_text
            ));
        }
    }

    Rendered {
        json,
        summary,
        markdown,
    }
}

/// Render an error with its exit code name.
pub fn error(code: ExitCode, message: &str) -> Rendered {
    let json = json!({
        "schema_version": SCHEMA_VERSION,
        "generated_at": chrono::Utc::now().to_rfc3339(),
        "status": "error",
        "error": {
            "code": code.code_name(),
            "exit_code": code.as_i32(),
            "message": message,
        }
    });
    Rendered {
        json,
        summary: format!("[{}] {}", code.code_name(), message),
        markdown: format!("# Error\n\n{}\n\nExit code: {}\n", message, code),
    }
}
