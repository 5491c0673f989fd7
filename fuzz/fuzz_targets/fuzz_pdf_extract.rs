#![no_main]

use deid_extract::{try_extract_text, DocumentFormat};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let _ = try_extract_text(data, DocumentFormat::Pdf);
});
