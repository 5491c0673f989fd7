//! Property-based tests for span resolution and text assembly.
//!
//! Uses proptest to check that arbitrary valid candidate sets always yield
//! an ordered, non-overlapping, reconstructible set of rewrites.

use deid_redact::{Category, KeyMaterial, Match, OperatorRules, RedactionEngine};
use proptest::prelude::*;

fn test_engine() -> RedactionEngine {
    RedactionEngine::with_key(KeyMaterial::from_bytes([0u8; 32], "test"))
}

/// ASCII text plus valid candidate spans over it.
fn text_and_matches() -> impl Strategy<Value = (String, Vec<Match>)> {
    "[a-zA-Z0-9 @.-]{1,120}"
        .prop_flat_map(|text| {
            let len = text.len();
            let spans = prop::collection::vec((0..len, 1..=len, 0..Category::ALL.len()), 0..12);
            (Just(text), spans)
        })
        .prop_map(|(text, spans)| {
            let matches = spans
                .into_iter()
                .map(|(start, width, category)| {
                    let end = (start + width).min(text.len());
                    Match::new(Category::ALL[category], start, end, 0.5)
                })
                .collect();
            (text, matches)
        })
}

// ============================================================================
// Span resolution
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Applied rewrites have strictly increasing starts and never overlap.
    #[test]
    fn applied_spans_ordered_and_disjoint((text, matches) in text_and_matches()) {
        let result = test_engine().redact(&text, &matches, &OperatorRules::tags()).unwrap();
        for pair in result.applied.windows(2) {
            prop_assert!(pair[0].start < pair[1].start);
            prop_assert!(pair[0].end <= pair[1].start,
                "overlap: [{}, {}) and [{}, {})", pair[0].start, pair[0].end, pair[1].start, pair[1].end);
        }
    }

    /// Every candidate is either applied or overlaps an applied span.
    #[test]
    fn every_candidate_is_covered((text, matches) in text_and_matches()) {
        let result = test_engine().redact(&text, &matches, &OperatorRules::tags()).unwrap();
        for m in &matches {
            let covered = result.applied.iter().any(|a| a.start < m.end && m.start < a.end);
            prop_assert!(covered, "candidate [{}, {}) neither applied nor overlapped", m.start, m.end);
        }
    }

    /// Candidate order does not affect the output.
    #[test]
    fn input_order_is_irrelevant((text, matches) in text_and_matches()) {
        let engine = test_engine();
        let rules = OperatorRules::tags();
        let forward = engine.redact(&text, &matches, &rules).unwrap();
        let mut reversed = matches.clone();
        reversed.reverse();
        let backward = engine.redact(&text, &reversed, &rules).unwrap();
        prop_assert_eq!(forward, backward);
    }
}

// ============================================================================
// Text assembly
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// The original text plus the applied rewrites reconstruct the output.
    #[test]
    fn applied_reconstructs_output((text, matches) in text_and_matches()) {
        let result = test_engine().redact(&text, &matches, &OperatorRules::tags()).unwrap();
        prop_assert_eq!(result.reconstruct(&text), Some(result.redacted_text.clone()));
        for a in &result.applied {
            prop_assert_eq!(&result.redacted_text[a.redacted_start..a.redacted_end], a.replacement_text.as_str());
            prop_assert_eq!(&text[a.start..a.end], a.original_text.as_str());
        }
    }

    /// No candidates means the text comes back untouched.
    #[test]
    fn no_matches_is_identity(text in "\\PC{0,200}") {
        let result = test_engine().redact(&text, &[], &OperatorRules::tags()).unwrap();
        prop_assert_eq!(result.redacted_text, text);
        prop_assert!(result.applied.is_empty());
    }

    /// Rules without operators leave the text untouched.
    #[test]
    fn pass_through_rules_keep_text((text, matches) in text_and_matches()) {
        let result = test_engine().redact(&text, &matches, &OperatorRules::pass_through()).unwrap();
        prop_assert_eq!(&result.redacted_text, &text);
        prop_assert!(!result.is_modified());
    }
}
