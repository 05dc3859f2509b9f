#![no_main]

use libfuzzer_sys::fuzz_target;

use recordbook_xlsx::cell_ref::{decode, encode};

/// Longest input worth decoding: `$XFD$1048576` plus generous padding.
const MAX_INPUT_BYTES: usize = 64;

fuzz_target!(|data: &[u8]| {
    if data.len() > MAX_INPUT_BYTES {
        return;
    }
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };

    // Anything that decodes must re-encode to a reference that decodes to the same position.
    if let Ok((row, col)) = decode(input) {
        let encoded = encode(row, col).expect("decoded position is in range");
        assert_eq!(decode(&encoded), Ok((row, col)));
    }
});
