//! Lexicon-backed recognizer for names, places and groups.
//!
//! Person names are found by anchoring on a known given name (or an
//! honorific) and extending over the capitalized words that follow.
//! Locations and nationality/religious/political groups are matched against
//! gazetteer terms on word boundaries.

use super::Recognizer;
use crate::{Category, CategorySet, Match, RedactionError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Schema version for lexicon files.
pub const LEXICON_SCHEMA_VERSION: &str = "1.0.0";

/// Maximum number of capitalized words following a name anchor.
const MAX_TRAILING_WORDS: usize = 2;

const PERSON_SCORE: f64 = 0.85;
const HONORIFIC_SCORE: f64 = 0.8;
const GAZETTEER_SCORE: f64 = 0.7;

const HONORIFICS: &[&str] = &["Mr", "Mrs", "Ms", "Miss", "Mx", "Dr", "Prof"];

const BUILTIN_GIVEN_NAMES: &[&str] = &[
    "Aaron", "Adam", "Ahmed", "Aisha", "Alex", "Alice", "Amelia", "Ana", "Andrea", "Anna",
    "Anne", "Antonio", "Ben", "Carlos", "Charlotte", "Chen", "Chris", "Daniel", "David",
    "Diego", "Elena", "Elizabeth", "Emily", "Emma", "Fatima", "Francesca", "George", "Hannah",
    "Hans", "Isabel", "Jack", "James", "Jane", "Javier", "Jennifer", "Jessica", "John",
    "Jose", "Juan", "Julia", "Karen", "Laura", "Linda", "Lisa", "Lucas", "Luis", "Maria",
    "Mark", "Martin", "Mary", "Michael", "Mohammed", "Nicolas", "Olivia", "Omar", "Paul",
    "Pedro", "Peter", "Priya", "Rachel", "Robert", "Sarah", "Sofia", "Sophie", "Susan",
    "Thomas", "William", "Wei", "Yuki", "Zoé",
];

const BUILTIN_LOCATIONS: &[&str] = &[
    "Amsterdam", "Athens", "Barcelona", "Beijing", "Berlin", "Boston", "Brazil", "Buenos Aires",
    "Cairo", "California", "Canada", "Chicago", "China", "Dublin", "England", "France",
    "Germany", "India", "Ireland", "Italy", "Japan", "Lisbon", "London", "Los Angeles",
    "Madrid", "Mexico", "Mexico City", "Milan", "Mumbai", "New York", "Oslo", "Paris",
    "Portugal", "Rome", "San Francisco", "Spain", "Sydney", "Texas", "Tokyo", "Toronto",
    "United Kingdom", "United States", "Valencia", "Vienna",
];

const BUILTIN_NRP: &[&str] = &[
    "American", "Brazilian", "British", "Buddhist", "Catholic", "Chinese", "Christian",
    "Conservative", "Democrat", "Dutch", "French", "German", "Hindu", "Indian", "Irish",
    "Italian", "Japanese", "Jewish", "Liberal", "Mexican", "Muslim", "Portuguese",
    "Protestant", "Republican", "Socialist", "Spanish",
];

/// A capitalized word, or a single-letter initial such as `M.`.
static CAPITALIZED_WORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b\p{Lu}(?:[\p{Ll}'’]*\p{Ll}(?:-\p{Lu}\p{Ll}+)?\b\.?|\.\B)").unwrap()
});

fn is_initial(word: &str) -> bool {
    word.ends_with('.') && word.chars().count() == 2
}

/// Word lists backing a [`LexiconRecognizer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lexicon {
    #[serde(default = "default_schema_version")]
    pub schema_version: String,
    /// Model name reported in logs.
    pub name: String,
    #[serde(default)]
    pub given_names: Vec<String>,
    #[serde(default)]
    pub locations: Vec<String>,
    #[serde(default)]
    pub nrp: Vec<String>,
}

fn default_schema_version() -> String {
    LEXICON_SCHEMA_VERSION.to_string()
}

impl Lexicon {
    /// The small lexicon compiled into the binary.
    pub fn builtin() -> Self {
        let owned = |terms: &[&str]| terms.iter().map(|t| t.to_string()).collect();
        Self {
            schema_version: LEXICON_SCHEMA_VERSION.to_string(),
            name: "builtin-lexicon".to_string(),
            given_names: owned(BUILTIN_GIVEN_NAMES),
            locations: owned(BUILTIN_LOCATIONS),
            nrp: owned(BUILTIN_NRP),
        }
    }

    /// Load a lexicon from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let lexicon: Lexicon = serde_json::from_str(&content)?;
        lexicon.validate()?;
        Ok(lexicon)
    }

    fn validate(&self) -> Result<()> {
        if self.schema_version != LEXICON_SCHEMA_VERSION {
            return Err(RedactionError::LexiconError(format!(
                "unsupported lexicon schema version {} (expected {})",
                self.schema_version, LEXICON_SCHEMA_VERSION
            )));
        }
        if self.given_names.is_empty() && self.locations.is_empty() && self.nrp.is_empty() {
            return Err(RedactionError::LexiconError(format!(
                "lexicon '{}' has no terms",
                self.name
            )));
        }
        Ok(())
    }

    pub fn term_count(&self) -> usize {
        self.given_names.len() + self.locations.len() + self.nrp.len()
    }
}

/// Build a `\b(?:a|b|...)\b` alternation, longest terms first.
fn gazetteer_regex(terms: &[String]) -> Result<Option<Regex>> {
    let mut terms: Vec<&str> = terms
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .collect();
    if terms.is_empty() {
        return Ok(None);
    }
    terms.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    terms.dedup();

    let alternation = terms
        .iter()
        .map(|t| regex::escape(t))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"\b(?:{})\b", alternation))
        .map(Some)
        .map_err(|e| RedactionError::PatternError(format!("gazetteer: {}", e)))
}

/// Rule-based recognizer for PERSON, LOCATION and NRP.
pub struct LexiconRecognizer {
    name: String,
    given_names: HashSet<String>,
    locations: Option<Regex>,
    nrp: Option<Regex>,
    categories: Vec<Category>,
}

impl LexiconRecognizer {
    pub fn new(lexicon: &Lexicon) -> Result<Self> {
        let given_names: HashSet<String> = lexicon
            .given_names
            .iter()
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .collect();
        let locations = gazetteer_regex(&lexicon.locations)?;
        let nrp = gazetteer_regex(&lexicon.nrp)?;

        let mut categories = Vec::new();
        if !given_names.is_empty() {
            categories.push(Category::Person);
        }
        if locations.is_some() {
            categories.push(Category::Location);
        }
        if nrp.is_some() {
            categories.push(Category::Nrp);
        }

        Ok(Self {
            name: lexicon.name.clone(),
            given_names,
            locations,
            nrp,
            categories,
        })
    }

    fn find_people(&self, text: &str, out: &mut Vec<Match>) {
        let words: Vec<(usize, usize, &str)> = CAPITALIZED_WORD
            .find_iter(text)
            .map(|m| (m.start(), m.end(), m.as_str()))
            .collect();

        let mut i = 0;
        while i < words.len() {
            let (start, _, word) = words[i];
            let bare = word.trim_end_matches('.');

            let (anchor_end, score) = if HONORIFICS.contains(&bare) {
                // An honorific only counts when a capitalized word follows it.
                if i + 1 < words.len() && single_space_between(text, words[i].1, words[i + 1].0) {
                    (i + 1, HONORIFIC_SCORE)
                } else {
                    i += 1;
                    continue;
                }
            } else if self.given_names.contains(bare) {
                (i, PERSON_SCORE)
            } else {
                i += 1;
                continue;
            };

            let mut last = anchor_end;
            while last + 1 < words.len()
                && last - anchor_end < MAX_TRAILING_WORDS
                && (!words[last].2.ends_with('.') || is_initial(words[last].2))
                && single_space_between(text, words[last].1, words[last + 1].0)
            {
                last += 1;
            }

            let end = word_end(words[last]);
            out.push(Match::new(Category::Person, start, end, score));
            i = last + 1;
        }
    }

    fn find_terms(regex: &Regex, category: Category, text: &str, out: &mut Vec<Match>) {
        for found in regex.find_iter(text) {
            out.push(Match::new(category, found.start(), found.end(), GAZETTEER_SCORE));
        }
    }
}

/// End offset of a word, excluding a trailing period.
fn word_end((_, end, word): (usize, usize, &str)) -> usize {
    if word.ends_with('.') {
        end - 1
    } else {
        end
    }
}

fn single_space_between(text: &str, end: usize, next_start: usize) -> bool {
    text.get(end..next_start) == Some(" ")
}

impl Recognizer for LexiconRecognizer {
    fn name(&self) -> &str {
        &self.name
    }

    fn supported_categories(&self) -> &[Category] {
        &self.categories
    }

    fn analyze(&self, text: &str, categories: &CategorySet) -> Vec<Match> {
        let mut matches = Vec::new();
        if categories.contains(Category::Person) && !self.given_names.is_empty() {
            self.find_people(text, &mut matches);
        }
        if categories.contains(Category::Location) {
            if let Some(regex) = &self.locations {
                Self::find_terms(regex, Category::Location, text, &mut matches);
            }
        }
        if categories.contains(Category::Nrp) {
            if let Some(regex) = &self.nrp {
                Self::find_terms(regex, Category::Nrp, text, &mut matches);
            }
        }
        matches
    }
}
