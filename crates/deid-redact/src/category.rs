//! PII categories recognized by the pipeline.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Kind of personally-identifiable information.
///
/// Each category has a default replacement tag, which operator rules
/// can override per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    /// Person name
    Person,
    /// Telephone number
    PhoneNumber,
    /// E-mail address
    EmailAddress,
    /// City, country, region or other place name
    Location,
    /// Absolute or relative date/time expression
    DateTime,
    /// Nationality, religious or political group
    Nrp,
    /// National identity number (SSN and similar)
    NationalId,
    /// Payment card number
    CreditCard,
    /// IPv4 address
    IpAddress,
    /// Web address
    Url,
}

impl Category {
    /// Every category, in declaration order.
    pub const ALL: [Category; 10] = [
        Category::Person,
        Category::PhoneNumber,
        Category::EmailAddress,
        Category::Location,
        Category::DateTime,
        Category::Nrp,
        Category::NationalId,
        Category::CreditCard,
        Category::IpAddress,
        Category::Url,
    ];

    /// Canonical name, as used in configuration files and output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Person => "PERSON",
            Category::PhoneNumber => "PHONE_NUMBER",
            Category::EmailAddress => "EMAIL_ADDRESS",
            Category::Location => "LOCATION",
            Category::DateTime => "DATE_TIME",
            Category::Nrp => "NRP",
            Category::NationalId => "NATIONAL_ID",
            Category::CreditCard => "CREDIT_CARD",
            Category::IpAddress => "IP_ADDRESS",
            Category::Url => "URL",
        }
    }

    /// Parse a category from its canonical name (case-insensitive).
    pub fn parse_str(s: &str) -> Option<Self> {
        let upper = s.trim().to_ascii_uppercase();
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == upper)
    }

    /// Default bracketed replacement tag for this category.
    pub fn default_tag(&self) -> String {
        format!("[{}]", self.as_str())
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Category::parse_str(s).ok_or_else(|| format!("unknown category: {}", s))
    }
}

/// Set of categories enabled for a detection call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategorySet(BTreeSet<Category>);

impl CategorySet {
    /// An empty set (detection short-circuits).
    pub fn empty() -> Self {
        Self(BTreeSet::new())
    }

    /// Every known category.
    pub fn all() -> Self {
        Category::ALL.iter().copied().collect()
    }

    /// Categories analyzed when the caller does not choose.
    pub fn default_enabled() -> Self {
        [
            Category::Person,
            Category::PhoneNumber,
            Category::EmailAddress,
            Category::Location,
            Category::DateTime,
            Category::Nrp,
            Category::NationalId,
        ]
        .into_iter()
        .collect()
    }

    pub fn contains(&self, category: Category) -> bool {
        self.0.contains(&category)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = Category> + '_ {
        self.0.iter().copied()
    }

    /// Whether any category in `other` is also in this set.
    pub fn intersects(&self, other: &[Category]) -> bool {
        other.iter().any(|c| self.0.contains(c))
    }
}

impl FromIterator<Category> for CategorySet {
    fn from_iter<I: IntoIterator<Item = Category>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_roundtrip() {
        for category in Category::ALL {
            assert_eq!(Category::parse_str(category.as_str()), Some(category));
        }
    }

    #[test]
    fn test_parse_case_insensitive() {
        assert_eq!(Category::parse_str("person"), Some(Category::Person));
        assert_eq!(
            Category::parse_str(" phone_number "),
            Some(Category::PhoneNumber)
        );
        assert_eq!(Category::parse_str("PASSPORT"), None);
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&Category::EmailAddress).unwrap();
        assert_eq!(json, "\"EMAIL_ADDRESS\"");
        let parsed: Category = serde_json::from_str("\"DATE_TIME\"").unwrap();
        assert_eq!(parsed, Category::DateTime);
    }

    #[test]
    fn test_default_tag() {
        assert_eq!(Category::Person.default_tag(), "[PERSON]");
        assert_eq!(Category::IpAddress.default_tag(), "[IP_ADDRESS]");
    }

    #[test]
    fn test_default_enabled_set() {
        let set = CategorySet::default_enabled();
        assert!(set.contains(Category::Person));
        assert!(set.contains(Category::Nrp));
        assert!(!set.contains(Category::Url));
        assert_eq!(set.len(), 7);
    }

    #[test]
    fn test_intersects() {
        let set: CategorySet = [Category::Location].into_iter().collect();
        assert!(set.intersects(&[Category::Person, Category::Location]));
        assert!(!set.intersects(&[Category::Person]));
        assert!(!CategorySet::empty().intersects(&Category::ALL));
    }
}
