#![no_main]

use libfuzzer_sys::fuzz_target;

use recordbook_xlsx::shared_strings::parse_shared_strings_xml;
use recordbook_xlsx::worksheet::parse_worksheet_rows;
use recordbook_xlsx::SharedStrings;

/// Keep individual inputs small so the fuzzer explores structure rather than volume.
const MAX_INPUT_BYTES: usize = 64 * 1024;

fuzz_target!(|data: &[u8]| {
    if data.len() > MAX_INPUT_BYTES {
        return;
    }
    let Ok(xml) = std::str::from_utf8(data) else {
        return;
    };

    // Both parsers must reject malformed input with an error, never a panic.
    let shared = parse_shared_strings_xml(xml).unwrap_or_default();
    let _ = parse_worksheet_rows(xml, &shared);
    let _ = parse_worksheet_rows(xml, &SharedStrings::default());
});
