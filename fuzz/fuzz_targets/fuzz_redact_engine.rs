//! Fuzz target for the redaction engine.
//!
//! Arbitrary spans over arbitrary text must either be rejected as invalid
//! or produce a result whose rewrites rebuild the redacted text.

#![no_main]

use arbitrary::Arbitrary;
use deid_redact::{Category, Match, OperatorRules, RedactionEngine};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Input {
    text: String,
    spans: Vec<(u8, u16, u16, u8)>,
}

fuzz_target!(|input: Input| {
    let Ok(engine) = RedactionEngine::new() else {
        return;
    };
    let matches: Vec<Match> = input
        .spans
        .iter()
        .map(|&(category, start, end, score)| {
            Match::new(
                Category::ALL[category as usize % Category::ALL.len()],
                start as usize,
                end as usize,
                score as f64 / 255.0,
            )
        })
        .collect();

    if let Ok(result) = engine.redact(&input.text, &matches, &OperatorRules::tags()) {
        assert_eq!(
            result.reconstruct(&input.text).as_deref(),
            Some(result.redacted_text.as_str())
        );
    }
});
