#![no_main]
use libfuzzer_sys::fuzz_target;

use fem_align::scalar::banded_edit_distance;
use fem_align::types::FEMArgs;

fuzz_target!(|data: (u8, Vec<u8>, Vec<u8>)| {
    let (raw_threshold, text, extra) = data;
    let Ok(args) = FEMArgs::new(raw_threshold % 16) else {
        return;
    };
    if text.is_empty() {
        return;
    }
    let band = args.band_width() as usize;
    let mut pattern = extra;
    pattern.resize(text.len() + band, b'A');

    // must not panic for any byte content, including bytes outside ACGTN.
    let _ = banded_edit_distance(args, &pattern, &text);
});
