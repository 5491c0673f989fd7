//! Integration tests: configuration loading through redaction.

use deid_core::{load_config, ConfigOptions, Pipeline, PipelineError};
use deid_extract::DocumentFormat;
use deid_redact::{Category, CategorySet, OperatorKind, OperatorRules};
use std::sync::Arc;
use tempfile::TempDir;

const EXAMPLE: &str = "Contact John Smith at john@x.com or call 555-1234.";

fn pipeline_in(dir: &TempDir) -> (Pipeline, deid_core::ResolvedConfig) {
    let config = load_config(&ConfigOptions {
        config_dir: Some(dir.path().to_path_buf()),
    })
    .unwrap();
    let pipeline = Pipeline::from_config(&config).unwrap();
    (pipeline, config)
}

#[test]
fn default_config_tags_example() {
    let dir = TempDir::new().unwrap();
    let (pipeline, config) = pipeline_in(&dir);

    assert_eq!(pipeline.model_name(), "builtin-lexicon");
    assert!(pipeline.is_fallback());

    let result = pipeline
        .redact_text(EXAMPLE, &config.models.enabled_categories, &config.operators)
        .unwrap();
    assert_eq!(result.redacted_text, "Contact [PERSON] at [EMAIL] or call [PHONE].");

    let spans: Vec<(Category, usize, usize)> = result
        .applied
        .iter()
        .map(|a| (a.category, a.start, a.end))
        .collect();
    assert_eq!(
        spans,
        vec![
            (Category::Person, 8, 18),
            (Category::EmailAddress, 22, 32),
            (Category::PhoneNumber, 41, 49),
        ]
    );
    assert!(result.applied.iter().all(|a| a.operator == OperatorKind::Replace));
    for applied in &result.applied {
        assert_eq!(&EXAMPLE[applied.start..applied.end], applied.original_text);
    }
}

#[test]
fn library_defaults_pass_through() {
    let dir = TempDir::new().unwrap();
    let (pipeline, config) = pipeline_in(&dir);

    let result = pipeline
        .redact_text(
            EXAMPLE,
            &config.models.enabled_categories,
            &OperatorRules::pass_through(),
        )
        .unwrap();
    assert_eq!(result.redacted_text, EXAMPLE);
    assert_eq!(result.applied.len(), 3);
    assert!(result.applied.iter().all(|a| a.operator == OperatorKind::Keep));
    assert!(!result.is_modified());
}

#[test]
fn lexicon_file_preferred_over_builtin() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("lexicon.json"),
        r#"{"name": "large", "given_names": ["Quillon"], "locations": ["Port Vell"]}"#,
    )
    .unwrap();
    let (pipeline, config) = pipeline_in(&dir);

    assert_eq!(pipeline.model_name(), "lexicon-large");
    assert!(!pipeline.is_fallback());

    let result = pipeline
        .redact_text(
            "Quillon moved to Port Vell.",
            &config.models.enabled_categories,
            &config.operators,
        )
        .unwrap();
    assert_eq!(result.redacted_text, "[PERSON] moved to [LOCATION].");
}

#[test]
fn document_without_text_is_empty() {
    let dir = TempDir::new().unwrap();
    let (pipeline, config) = pipeline_in(&dir);

    let err = pipeline
        .redact_document(b"", DocumentFormat::PlainText, &CategorySet::all(), &config.operators)
        .unwrap_err();
    assert!(matches!(err, PipelineError::EmptyDocument { .. }));
}

#[test]
fn concurrent_callers_share_one_pipeline() {
    let dir = TempDir::new().unwrap();
    let (pipeline, config) = pipeline_in(&dir);
    let pipeline = Arc::new(pipeline);
    let config = Arc::new(config);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let pipeline = Arc::clone(&pipeline);
            let config = Arc::clone(&config);
            std::thread::spawn(move || {
                pipeline
                    .redact_text(EXAMPLE, &config.models.enabled_categories, &config.operators)
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

mod properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn rewrites_are_ordered_and_rebuild_output(
            prefix in "[A-Za-z ,.]{0,40}",
            user in "[a-z]{1,10}",
            tail in "[A-Za-z0-9 ,.-]{0,40}",
        ) {
            let dir = TempDir::new().unwrap();
            let (pipeline, config) = pipeline_in(&dir);
            let text = format!("{} {}@example.com {}", prefix, user, tail);

            let result = pipeline
                .redact_text(&text, &CategorySet::all(), &config.operators)
                .unwrap();

            prop_assert_eq!(result.reconstruct(&text), Some(result.redacted_text.clone()));
            for pair in result.applied.windows(2) {
                prop_assert!(pair[0].end <= pair[1].start);
            }
            let email = format!("{}@example.com", user);
            prop_assert!(!result.redacted_text.contains(&email));
        }
    }
}
