#![no_main]
use libfuzzer_sys::fuzz_target;

use fem_align::scalar::banded_edit_distance;
use fem_align::simd::vectorized_banded_edit_distance;
use fem_align::types::{FEMArgs, NUM_VPU_LANES};

fuzz_target!(|data: (u8, Vec<u8>, [Vec<u8>; 8])| {
    let (raw_threshold, text, patterns_raw) = data;
    let Ok(args) = FEMArgs::new(raw_threshold % 16) else {
        return;
    };
    if text.is_empty() || text.len() > 200 {
        return;
    }
    let band = args.band_width() as usize;

    let mut owned: Vec<Vec<u8>> = Vec::with_capacity(NUM_VPU_LANES);
    for mut p in patterns_raw {
        p.resize(text.len() + band, b'A');
        owned.push(p);
    }
    let patterns: [&[u8]; NUM_VPU_LANES] = core::array::from_fn(|lane| owned[lane].as_slice());

    let mut simd_distances = [0u16; NUM_VPU_LANES];
    let mut simd_ends = [text.len() as i16 - 1; NUM_VPU_LANES];
    vectorized_banded_edit_distance(args, patterns, &text, &mut simd_distances, &mut simd_ends);

    for lane in 0..NUM_VPU_LANES {
        let (scalar_dist, _scalar_end) = banded_edit_distance(args, patterns[lane], &text);
        assert_eq!(
            simd_distances[lane], scalar_dist as u16,
            "lane {lane} disagreed: simd={} scalar={}",
            simd_distances[lane], scalar_dist
        );
    }
});
