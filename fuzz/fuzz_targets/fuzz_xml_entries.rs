#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Each auxiliary entry parser sees the same text
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let _ = plate_preview::parser::parse_document(text);
    let _ = plate_preview::parser::parse_model_settings(text);
    let _ = plate_preview::parser::parse_plate_json(text);
    let _ = plate_preview::Transform::parse(text);
});
