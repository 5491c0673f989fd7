//! Per-category operator configuration.
//!
//! Maps each category to the operator that rewrites its spans, plus an
//! explicit policy for categories with no entry.

use crate::{Category, Operator, RedactionError, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::warn;

/// Schema version for the operator rules file.
pub const RULES_SCHEMA_VERSION: &str = "1.0.0";

/// What happens to accepted spans whose category has no operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefaultPolicy {
    /// Keep the original text.
    #[default]
    PassThrough,
    /// Fail the redaction call with `MissingOperator`.
    Reject,
}

/// Operator rules supplied with each redaction call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatorRules {
    /// Schema version.
    #[serde(default = "default_schema_version")]
    pub schema_version: String,

    /// Policy for categories absent from `operators`.
    #[serde(default)]
    pub default_policy: DefaultPolicy,

    /// Hash truncation bytes (default 8 = 16 hex chars).
    #[serde(default = "default_truncation_bytes")]
    pub hash_truncation_bytes: usize,

    /// Per-category operators. Unknown category names are ignored.
    #[serde(default, deserialize_with = "deserialize_operators")]
    pub operators: BTreeMap<Category, Operator>,
}

fn default_schema_version() -> String {
    RULES_SCHEMA_VERSION.to_string()
}

fn default_truncation_bytes() -> usize {
    crate::hash::DEFAULT_TRUNCATION_BYTES
}

fn deserialize_operators<'de, D>(
    deserializer: D,
) -> std::result::Result<BTreeMap<Category, Operator>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: HashMap<String, Operator> = HashMap::deserialize(deserializer)?;
    let mut operators = BTreeMap::new();
    for (name, operator) in raw {
        match Category::parse_str(&name) {
            Some(category) => {
                operators.insert(category, operator);
            }
            None => {
                warn!(category = %name, "Ignoring operator for unknown category");
            }
        }
    }
    Ok(operators)
}

impl OperatorRules {
    /// Rules with no operators; every span passes through unchanged.
    pub fn pass_through() -> Self {
        Self {
            schema_version: RULES_SCHEMA_VERSION.to_string(),
            default_policy: DefaultPolicy::PassThrough,
            hash_truncation_bytes: default_truncation_bytes(),
            operators: BTreeMap::new(),
        }
    }

    /// Bracket-tag replacement for every category.
    pub fn tags() -> Self {
        let mut rules = Self::pass_through();
        for category in Category::ALL {
            let tag = match category {
                Category::PhoneNumber => "[PHONE]".to_string(),
                Category::EmailAddress => "[EMAIL]".to_string(),
                Category::DateTime => "[DATE]".to_string(),
                Category::Nrp | Category::NationalId => "[ID_NUMBER]".to_string(),
                other => other.default_tag(),
            };
            rules.set_operator(category, Operator::replace(tag));
        }
        rules
    }

    /// Load rules from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse rules from JSON.
    pub fn from_json(content: &str) -> Result<Self> {
        let rules: OperatorRules = serde_json::from_str(content)?;
        if rules.schema_version != RULES_SCHEMA_VERSION {
            return Err(RedactionError::PolicyError(format!(
                "unsupported rules schema version {} (expected {})",
                rules.schema_version, RULES_SCHEMA_VERSION
            )));
        }
        Ok(rules)
    }

    /// Save rules to a JSON file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Set the operator for a category.
    pub fn set_operator(&mut self, category: Category, operator: Operator) {
        self.operators.insert(category, operator);
    }

    /// Explicitly configured operator, if any.
    pub fn operator_for(&self, category: Category) -> Option<&Operator> {
        self.operators.get(&category)
    }

    /// Resolve the operator for a category, applying the default policy.
    pub fn resolve(&self, category: Category) -> Result<Cow<'_, Operator>> {
        if let Some(operator) = self.operators.get(&category) {
            return Ok(Cow::Borrowed(operator));
        }

        match self.default_policy {
            DefaultPolicy::PassThrough => Ok(Cow::Owned(Operator::Keep)),
            DefaultPolicy::Reject => Err(RedactionError::MissingOperator(category)),
        }
    }
}

impl Default for OperatorRules {
    fn default() -> Self {
        Self::tags()
    }
}
