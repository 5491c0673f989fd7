//! Fuzz target for the builtin recognizers.
//!
//! Every match returned by detection must be a valid span of the input.

#![no_main]

use deid_redact::{bootstrap_model, CategorySet, ModelCandidate};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|text: &str| {
    let Ok(model) = bootstrap_model(&[ModelCandidate::BuiltinLexicon]) else {
        return;
    };
    let Ok(adapter) = model.into_adapter(&[], 0.0) else {
        return;
    };
    for m in adapter.detect(text, &CategorySet::all()) {
        assert!(m.start < m.end);
        assert!(text.get(m.start..m.end).is_some());
    }
});
