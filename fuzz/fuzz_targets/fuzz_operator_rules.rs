//! Fuzz target for operators.json parsing.
//!
//! Tests that rule parsing handles arbitrary input without panicking.

#![no_main]

use deid_redact::OperatorRules;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let _ = serde_json::from_str::<OperatorRules>(s);
    }
});
