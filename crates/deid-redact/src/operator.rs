//! Replacement operators applied to accepted spans.

use crate::{Category, KeyMaterial};
use serde::{Deserialize, Serialize};

/// How a matched span is rewritten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Operator {
    /// Replace with a literal value (the category tag when unset).
    Replace {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        new_value: Option<String>,
    },
    /// Remove the span entirely.
    Redact,
    /// Overwrite characters with a fixed masking character.
    Mask {
        #[serde(default = "default_masking_char")]
        masking_char: char,
        /// Number of characters to mask; 0 masks the whole span.
        #[serde(default)]
        chars_to_mask: usize,
        /// Mask from the end of the span instead of the start.
        #[serde(default)]
        from_end: bool,
    },
    /// Replace with a keyed hash `[HASH:key_id:hex]`.
    Hash,
    /// Leave the span unchanged.
    Keep,
}

fn default_masking_char() -> char {
    '*'
}

/// Operator kind, used when reporting applied rewrites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperatorKind {
    Replace,
    Redact,
    Mask,
    Hash,
    Keep,
}

impl Operator {
    /// Replace with a literal string.
    pub fn replace(value: impl Into<String>) -> Self {
        Operator::Replace {
            new_value: Some(value.into()),
        }
    }

    /// Mask the whole span with `masking_char`.
    pub fn mask_all(masking_char: char) -> Self {
        Operator::Mask {
            masking_char,
            chars_to_mask: 0,
            from_end: false,
        }
    }

    pub fn kind(&self) -> OperatorKind {
        match self {
            Operator::Replace { .. } => OperatorKind::Replace,
            Operator::Redact => OperatorKind::Redact,
            Operator::Mask { .. } => OperatorKind::Mask,
            Operator::Hash => OperatorKind::Hash,
            Operator::Keep => OperatorKind::Keep,
        }
    }

    /// Rewrite `original` (the matched substring of `category`).
    pub fn apply(
        &self,
        original: &str,
        category: Category,
        key: &KeyMaterial,
        hash_truncation_bytes: usize,
    ) -> String {
        match self {
            Operator::Replace { new_value } => new_value
                .clone()
                .unwrap_or_else(|| category.default_tag()),
            Operator::Redact => String::new(),
            Operator::Mask {
                masking_char,
                chars_to_mask,
                from_end,
            } => mask_value(original, *masking_char, *chars_to_mask, *from_end),
            Operator::Hash => key.hash(original, hash_truncation_bytes),
            Operator::Keep => original.to_string(),
        }
    }
}

impl std::fmt::Display for OperatorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OperatorKind::Replace => "replace",
            OperatorKind::Redact => "redact",
            OperatorKind::Mask => "mask",
            OperatorKind::Hash => "hash",
            OperatorKind::Keep => "keep",
        };
        write!(f, "{}", s)
    }
}

/// Mask `count` characters of `value` (all of them when `count` is 0).
fn mask_value(value: &str, masking_char: char, count: usize, from_end: bool) -> String {
    let total = value.chars().count();
    let count = if count == 0 { total } else { count.min(total) };

    value
        .chars()
        .enumerate()
        .map(|(i, c)| {
            let masked = if from_end { i >= total - count } else { i < count };
            if masked {
                masking_char
            } else {
                c
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> KeyMaterial {
        KeyMaterial::from_bytes([0u8; 32], "test")
    }

    #[test]
    fn test_replace_default_tag() {
        let op = Operator::Replace { new_value: None };
        assert_eq!(op.apply("John", Category::Person, &key(), 8), "[PERSON]");
    }

    #[test]
    fn test_replace_literal() {
        let op = Operator::replace("<NAME>");
        assert_eq!(op.apply("John", Category::Person, &key(), 8), "<NAME>");
    }

    #[test]
    fn test_redact_is_empty() {
        assert_eq!(Operator::Redact.apply("x@y.io", Category::EmailAddress, &key(), 8), "");
    }

    #[test]
    fn test_mask_all() {
        let op = Operator::mask_all('#');
        assert_eq!(op.apply("555-1234", Category::PhoneNumber, &key(), 8), "########");
    }

    #[test]
    fn test_mask_from_end_is_char_aware() {
        let op = Operator::Mask {
            masking_char: '*',
            chars_to_mask: 2,
            from_end: true,
        };
        assert_eq!(op.apply("Zoé", Category::Person, &key(), 8), "Z**");
    }

    #[test]
    fn test_mask_count_larger_than_value() {
        let op = Operator::Mask {
            masking_char: '*',
            chars_to_mask: 50,
            from_end: false,
        };
        assert_eq!(op.apply("abc", Category::Person, &key(), 8), "***");
    }

    #[test]
    fn test_hash_is_stable_and_hides_value() {
        let a = Operator::Hash.apply("John", Category::Person, &key(), 8);
        let b = Operator::Hash.apply("John", Category::Person, &key(), 8);
        assert_eq!(a, b);
        assert!(a.starts_with("[HASH:test:"));
        assert!(!a.contains("John"));
    }

    #[test]
    fn test_keep() {
        assert_eq!(Operator::Keep.apply("Paris", Category::Location, &key(), 8), "Paris");
    }

    #[test]
    fn test_serde_tagged_form() {
        let op: Operator =
            serde_json::from_str(r#"{"type":"replace","new_value":"[EMAIL]"}"#).unwrap();
        assert_eq!(op, Operator::replace("[EMAIL]"));

        let op: Operator = serde_json::from_str(r#"{"type":"mask"}"#).unwrap();
        assert_eq!(op, Operator::mask_all('*'));

        let json = serde_json::to_string(&Operator::Redact).unwrap();
        assert_eq!(json, r#"{"type":"redact"}"#);
    }
}
