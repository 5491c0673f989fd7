//! Regex-based recognizers for structured PII.
//!
//! Covers categories with a recognizable surface form: e-mail addresses,
//! phone numbers, payment cards, IPv4 addresses, URLs, dates and US social
//! security numbers. Callers can add their own patterns via [`PatternSpec`].

use super::Recognizer;
use crate::{Category, CategorySet, Match, RedactionError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// A user-supplied detection pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternSpec {
    /// Pattern name, for logs.
    pub name: String,
    /// Category emitted for each match.
    pub category: Category,
    /// Regular expression (Rust `regex` syntax).
    pub pattern: String,
    /// Score assigned to matches.
    #[serde(default = "default_custom_score")]
    pub score: f64,
}

fn default_custom_score() -> f64 {
    0.7
}

/// Compiled pattern.
#[derive(Clone)]
struct DetectionPattern {
    name: String,
    category: Category,
    regex: Regex,
    score: f64,
    validator: Option<fn(&str) -> bool>,
    /// Reject matches that are one part of a longer dotted number.
    standalone: bool,
}

fn builtin(
    name: &str,
    category: Category,
    pattern: &str,
    score: f64,
    validator: Option<fn(&str) -> bool>,
) -> DetectionPattern {
    DetectionPattern {
        name: name.to_string(),
        category,
        regex: Regex::new(pattern).unwrap(),
        score,
        validator,
        standalone: false,
    }
}

impl DetectionPattern {
    fn standalone(mut self) -> Self {
        self.standalone = true;
        self
    }
}

/// Whether `[start, end)` continues a dotted digit run such as `10.0.0.12`.
fn inside_dotted_number(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].as_bytes();
    let after = text[end..].as_bytes();
    let dotted_before = matches!(before, [.., d, b'.'] if d.is_ascii_digit());
    let dotted_after = matches!(after, [b'.', d, ..] if d.is_ascii_digit());
    dotted_before || dotted_after
}

// Pre-compiled built-in patterns
static BUILTIN_PATTERNS: Lazy<Vec<DetectionPattern>> = Lazy::new(|| {
    vec![
        builtin(
            "email",
            Category::EmailAddress,
            r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b",
            0.9,
            None,
        ),
        builtin(
            "phone_full",
            Category::PhoneNumber,
            r"(?:\+\d{1,3}[-.\s]?)?(?:\(\d{3}\)\s?|\b\d{3}[-.\s]?)\d{3}[-.\s]?\d{4}\b",
            0.75,
            None,
        ),
        builtin(
            "phone_local",
            Category::PhoneNumber,
            r"\b\d{3}-\d{4}\b",
            0.5,
            None,
        ),
        builtin(
            "us_ssn",
            Category::NationalId,
            r"\b\d{3}-\d{2}-\d{4}\b",
            0.85,
            Some(valid_ssn),
        ),
        builtin(
            "credit_card",
            Category::CreditCard,
            r"\b(?:\d[ -]?){12,18}\d\b",
            0.9,
            Some(luhn_valid),
        ),
        builtin(
            "ipv4",
            Category::IpAddress,
            r"\b(?:(?:25[0-5]|2[0-4]\d|1?\d?\d)\.){3}(?:25[0-5]|2[0-4]\d|1?\d?\d)\b",
            0.85,
            None,
        ),
        builtin(
            "url",
            Category::Url,
            r#"\b(?:https?://|www\.)[^\s<>"']*[^\s<>"'.,;:!?)\]]"#,
            0.6,
            None,
        ),
        builtin(
            "date_iso",
            Category::DateTime,
            r"\b\d{4}-\d{2}-\d{2}(?:[T ]\d{2}:\d{2}(?::\d{2})?)?\b",
            0.6,
            None,
        ),
        builtin(
            "date_numeric",
            Category::DateTime,
            r"\b\d{1,2}[/.]\d{1,2}[/.]\d{2,4}\b",
            0.6,
            None,
        )
        .standalone(),
        builtin(
            "date_month_name",
            Category::DateTime,
            r"\b(?:\d{1,2}\s+)?(?:January|February|March|April|May|June|July|August|September|October|November|December|Jan|Feb|Mar|Apr|Jun|Jul|Aug|Sept|Sep|Oct|Nov|Dec)\.?(?:\s+\d{1,2}(?:st|nd|rd|th)?)?,?\s+\d{4}\b",
            0.6,
            None,
        ),
    ]
});

/// Luhn checksum over the digits of `candidate`.
fn luhn_valid(candidate: &str) -> bool {
    let digits: Vec<u32> = candidate.chars().filter_map(|c| c.to_digit(10)).collect();
    if !(13..=19).contains(&digits.len()) {
        return false;
    }
    let sum: u32 = digits
        .iter()
        .rev()
        .enumerate()
        .map(|(i, &d)| {
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 {
                    doubled - 9
                } else {
                    doubled
                }
            } else {
                d
            }
        })
        .sum();
    sum % 10 == 0
}

/// Reject SSN area numbers that are never issued.
fn valid_ssn(candidate: &str) -> bool {
    let area = &candidate[..3];
    area != "000" && area != "666" && !area.starts_with('9')
}

/// Recognizer backed by a list of regular expressions.
#[derive(Clone)]
pub struct PatternRecognizer {
    patterns: Vec<DetectionPattern>,
    categories: Vec<Category>,
}

impl PatternRecognizer {
    /// Recognizer with the built-in patterns only.
    pub fn builtin() -> Self {
        Self::from_patterns(BUILTIN_PATTERNS.clone())
    }

    /// Built-in patterns plus caller-supplied ones.
    pub fn with_custom(specs: &[PatternSpec]) -> Result<Self> {
        let mut patterns = BUILTIN_PATTERNS.clone();
        for spec in specs {
            let regex = Regex::new(&spec.pattern).map_err(|e| {
                RedactionError::PatternError(format!("pattern '{}': {}", spec.name, e))
            })?;
            patterns.push(DetectionPattern {
                name: spec.name.clone(),
                category: spec.category,
                regex,
                score: spec.score.clamp(0.0, 1.0),
                validator: None,
                standalone: false,
            });
        }
        Ok(Self::from_patterns(patterns))
    }

    fn from_patterns(patterns: Vec<DetectionPattern>) -> Self {
        let mut categories: Vec<Category> = patterns.iter().map(|p| p.category).collect();
        categories.sort();
        categories.dedup();
        Self {
            patterns,
            categories,
        }
    }

    /// Names of the compiled patterns.
    pub fn pattern_names(&self) -> Vec<&str> {
        self.patterns.iter().map(|p| p.name.as_str()).collect()
    }
}

impl Recognizer for PatternRecognizer {
    fn name(&self) -> &str {
        "patterns"
    }

    fn supported_categories(&self) -> &[Category] {
        &self.categories
    }

    fn analyze(&self, text: &str, categories: &CategorySet) -> Vec<Match> {
        let mut matches = Vec::new();
        for pattern in &self.patterns {
            if !categories.contains(pattern.category) {
                continue;
            }
            for found in pattern.regex.find_iter(text) {
                if found.as_str().is_empty() {
                    continue;
                }
                if let Some(validator) = pattern.validator {
                    if !validator(found.as_str()) {
                        continue;
                    }
                }
                if pattern.standalone && inside_dotted_number(text, found.start(), found.end()) {
                    continue;
                }
                matches.push(Match::new(
                    pattern.category,
                    found.start(),
                    found.end(),
                    pattern.score,
                ));
            }
        }
        matches
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn find(text: &str, category: Category) -> Vec<&str> {
        let recognizer = PatternRecognizer::builtin();
        let enabled: CategorySet = [category].into_iter().collect();
        recognizer
            .analyze(text, &enabled)
            .into_iter()
            .map(|m| &text[m.start..m.end])
            .collect()
    }

    #[test]
    fn test_email() {
        let text = "Contact John Smith at john@x.com or call 555-1234.";
        let matches = PatternRecognizer::builtin()
            .analyze(text, &[Category::EmailAddress].into_iter().collect());
        assert_eq!(matches.len(), 1);
        assert_eq!((matches[0].start, matches[0].end), (22, 32));
    }

    #[test]
    fn test_local_phone() {
        let text = "Contact John Smith at john@x.com or call 555-1234.";
        let matches = PatternRecognizer::builtin()
            .analyze(text, &[Category::PhoneNumber].into_iter().collect());
        assert_eq!(matches.len(), 1);
        assert_eq!((matches[0].start, matches[0].end), (41, 49));
    }

    #[test]
    fn test_full_phone_formats() {
        assert!(find("Call (555) 123-4567 today", Category::PhoneNumber)
            .contains(&"(555) 123-4567"));
        assert!(find("Call +1 555.123.4567", Category::PhoneNumber).contains(&"+1 555.123.4567"));
    }

    #[test]
    fn test_ssn() {
        assert_eq!(find("SSN 123-45-6789", Category::NationalId), vec!["123-45-6789"]);
        assert!(find("SSN 666-45-6789", Category::NationalId).is_empty());
    }

    #[test]
    fn test_credit_card_luhn() {
        assert_eq!(
            find("Card 4111 1111 1111 1111 on file", Category::CreditCard),
            vec!["4111 1111 1111 1111"]
        );
        assert!(find("Card 4111 1111 1111 1112", Category::CreditCard).is_empty());
    }

    #[test]
    fn test_ipv4() {
        assert_eq!(find("from 192.168.1.10 at", Category::IpAddress), vec!["192.168.1.10"]);
        assert!(find("version 999.1.1.1", Category::IpAddress).is_empty());
    }

    #[test]
    fn test_url_trailing_punctuation() {
        assert_eq!(
            find("See https://example.com/a?b=1.", Category::Url),
            vec!["https://example.com/a?b=1"]
        );
    }

    #[test]
    fn test_dates() {
        assert_eq!(find("Due 2024-01-15.", Category::DateTime), vec!["2024-01-15"]);
        assert_eq!(find("Born 03/14/1990", Category::DateTime), vec!["03/14/1990"]);
        assert_eq!(
            find("Signed on March 3, 2021 by", Category::DateTime),
            vec!["March 3, 2021"]
        );
        assert_eq!(find("Since 5 Sept 2019", Category::DateTime), vec!["5 Sept 2019"]);
        assert_eq!(find("Born 14.03.1990.", Category::DateTime), vec!["14.03.1990"]);
    }

    #[test]
    fn test_ip_address_is_not_a_date() {
        assert!(find("Traffic from 10.0.0.12", Category::DateTime).is_empty());
        assert!(find("build 1.2.3.4 shipped", Category::DateTime).is_empty());
        assert_eq!(
            find("Traffic from 10.0.0.12", Category::IpAddress),
            vec!["10.0.0.12"]
        );
    }

    #[test]
    fn test_disabled_categories_skipped() {
        let recognizer = PatternRecognizer::builtin();
        let enabled: CategorySet = [Category::Url].into_iter().collect();
        assert!(recognizer.analyze("mail a@b.io", &enabled).is_empty());
    }

    #[test]
    fn test_custom_pattern() {
        let spec = PatternSpec {
            name: "employee_id".to_string(),
            category: Category::NationalId,
            pattern: r"\bEMP-\d{6}\b".to_string(),
            score: 0.95,
        };
        let recognizer = PatternRecognizer::with_custom(&[spec]).unwrap();
        assert!(recognizer.pattern_names().contains(&"employee_id"));
        let matches = recognizer.analyze(
            "badge EMP-004211",
            &[Category::NationalId].into_iter().collect(),
        );
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].score, 0.95);
    }

    #[test]
    fn test_invalid_custom_pattern() {
        let spec = PatternSpec {
            name: "broken".to_string(),
            category: Category::Url,
            pattern: "(unclosed".to_string(),
            score: 0.5,
        };
        let err = PatternRecognizer::with_custom(&[spec]).err().unwrap();
        assert!(matches!(err, RedactionError::PatternError(_)));
    }

    #[test]
    fn test_luhn() {
        assert!(luhn_valid("4111111111111111"));
        assert!(luhn_valid("5500-0000-0000-0004"));
        assert!(!luhn_valid("1234"));
    }
}
