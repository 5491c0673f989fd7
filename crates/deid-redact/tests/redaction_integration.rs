//! Integration tests for deid-redact.
//!
//! These tests verify:
//! - Known PII values never survive detection plus redaction
//! - The bracket-tag mapping produces the expected output end to end
//! - Operators other than replacement behave consistently across a text
//! - The detection adapter can be shared across threads

use deid_redact::{
    bootstrap_model, Category, CategorySet, DefaultPolicy, KeyMaterial, Match, ModelCandidate,
    Operator, OperatorKind, OperatorRules, RecognizerAdapter, RedactionEngine, RedactionError,
};
use std::sync::Arc;

const EXAMPLE: &str = "Contact John Smith at john@x.com or call 555-1234.";

/// PII values embedded in realistic sentences. None may appear in the output.
const CANARY_PII: &[(&str, &str)] = &[
    ("Please email jane.doe@example.org today.", "jane.doe@example.org"),
    ("His SSN is 123-45-6789, keep it safe.", "123-45-6789"),
    ("Card 4111 1111 1111 1111 was charged.", "4111 1111 1111 1111"),
    ("Traffic from 10.0.0.12 was blocked.", "10.0.0.12"),
    ("Docs at https://intranet.example.com/u/42 now.", "https://intranet.example.com/u/42"),
    ("Call (555) 123-4567 after lunch.", "(555) 123-4567"),
    ("Born on 1990-04-12 in Lisbon.", "1990-04-12"),
    ("Maria Lopez signed the form.", "Maria Lopez"),
    ("She moved to San Francisco last year.", "San Francisco"),
];

fn adapter() -> RecognizerAdapter {
    bootstrap_model(&[ModelCandidate::BuiltinLexicon])
        .unwrap()
        .into_adapter(&[], 0.0)
        .unwrap()
}

fn test_engine() -> RedactionEngine {
    RedactionEngine::with_key(KeyMaterial::from_bytes([0u8; 32], "test"))
}

// ============================================================================
// End-to-end Example
// ============================================================================

#[test]
fn test_example_with_explicit_matches() {
    let matches = vec![
        Match::new(Category::PhoneNumber, 41, 49, 0.5),
        Match::new(Category::Person, 8, 18, 0.85),
        Match::new(Category::EmailAddress, 22, 32, 0.9),
    ];
    let result = test_engine()
        .redact(EXAMPLE, &matches, &OperatorRules::tags())
        .unwrap();

    assert_eq!(result.redacted_text, "Contact [PERSON] at [EMAIL] or call [PHONE].");
    let applied: Vec<(Category, &str, &str)> = result
        .applied
        .iter()
        .map(|a| (a.category, a.original_text.as_str(), a.replacement_text.as_str()))
        .collect();
    assert_eq!(
        applied,
        vec![
            (Category::Person, "John Smith", "[PERSON]"),
            (Category::EmailAddress, "john@x.com", "[EMAIL]"),
            (Category::PhoneNumber, "555-1234", "[PHONE]"),
        ]
    );
}

#[test]
fn test_example_detected_end_to_end() {
    let adapter = adapter();
    let matches = adapter.detect(EXAMPLE, &CategorySet::default_enabled());
    let result = test_engine()
        .redact(EXAMPLE, &matches, &OperatorRules::tags())
        .unwrap();
    assert_eq!(result.redacted_text, "Contact [PERSON] at [EMAIL] or call [PHONE].");
    assert_eq!(result.applied.len(), 3);
}

#[test]
fn test_empty_text_detects_nothing() {
    let adapter = adapter();
    assert!(adapter.detect("", &CategorySet::all()).is_empty());
    let result = test_engine().redact("", &[], &OperatorRules::tags()).unwrap();
    assert_eq!(result.redacted_text, "");
    assert!(result.applied.is_empty());
}

// ============================================================================
// Canary Leak Tests
// ============================================================================

#[test]
fn test_canary_pii_never_leaks() {
    let adapter = adapter();
    let engine = test_engine();
    let rules = OperatorRules::tags();

    for (text, pii) in CANARY_PII {
        let matches = adapter.detect(text, &CategorySet::all());
        let result = engine.redact(text, &matches, &rules).unwrap();
        assert!(
            !result.redacted_text.contains(pii),
            "PII '{}' leaked: {}",
            pii,
            result.redacted_text
        );
    }
}

#[test]
fn test_disabled_category_is_kept() {
    let adapter = adapter();
    let text = "Card 4111 1111 1111 1111 was charged.";
    let matches = adapter.detect(text, &CategorySet::default_enabled());
    assert!(matches.iter().all(|m| m.category != Category::CreditCard));
}

// ============================================================================
// Operators
// ============================================================================

#[test]
fn test_hash_operator_is_consistent_within_text() {
    let text = "Anna called Anna back";
    let matches = vec![
        Match::new(Category::Person, 0, 4, 0.85),
        Match::new(Category::Person, 12, 16, 0.85),
    ];
    let mut rules = OperatorRules::pass_through();
    rules.set_operator(Category::Person, Operator::Hash);

    let result = test_engine().redact(text, &matches, &rules).unwrap();
    assert_eq!(result.applied.len(), 2);
    assert_eq!(result.applied[0].replacement_text, result.applied[1].replacement_text);
    assert_eq!(result.applied[0].operator, OperatorKind::Hash);
    assert!(!result.redacted_text.contains("Anna"));
}

#[test]
fn test_mask_keeps_length_in_chars() {
    let text = "Mail ann@x.io";
    let matches = vec![Match::new(Category::EmailAddress, 5, 13, 0.9)];
    let mut rules = OperatorRules::pass_through();
    rules.set_operator(Category::EmailAddress, Operator::mask_all('*'));

    let result = test_engine().redact(text, &matches, &rules).unwrap();
    assert_eq!(result.redacted_text, "Mail ********");
}

#[test]
fn test_rules_from_json_with_reject() {
    let rules = OperatorRules::from_json(
        r#"{
            "schema_version": "1.0.0",
            "default_policy": "reject",
            "operators": {"PERSON": {"type": "replace"}}
        }"#,
    )
    .unwrap();
    assert_eq!(rules.default_policy, DefaultPolicy::Reject);

    let engine = test_engine();
    let ok = engine
        .redact("Anna", &[Match::new(Category::Person, 0, 4, 0.9)], &rules)
        .unwrap();
    assert_eq!(ok.redacted_text, "[PERSON]");

    let err = engine
        .redact("Oslo", &[Match::new(Category::Location, 0, 4, 0.9)], &rules)
        .unwrap_err();
    assert!(matches!(err, RedactionError::MissingOperator(Category::Location)));
}

// ============================================================================
// Concurrency
// ============================================================================

#[test]
fn test_shared_adapter_across_threads() {
    let adapter = Arc::new(adapter());
    let engine = Arc::new(test_engine());

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let adapter = Arc::clone(&adapter);
            let engine = Arc::clone(&engine);
            std::thread::spawn(move || {
                let matches = adapter.detect(EXAMPLE, &CategorySet::default_enabled());
                engine
                    .redact(EXAMPLE, &matches, &OperatorRules::tags())
                    .unwrap()
                    .redacted_text
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(
            handle.join().unwrap(),
            "Contact [PERSON] at [EMAIL] or call [PHONE]."
        );
    }
}
