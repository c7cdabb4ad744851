//! Scalar banded bit-parallel (Myers) edit distance.
//!
//! `pattern` is the reference window: it must supply `text.len() + 2*e`
//! bytes, starting `e` bases before the candidate position so the band
//! can look `2*e` bases ahead of the current diagonal. `text` is the
//! read. Both conventions are inherited unchanged from the reference
//! implementation this module is ported from.

use enum_map::EnumMap;

use crate::alphabet::{char_to_base, Base};
use crate::types::FEMArgs;

/// One step of the bit-parallel recurrence.
///
/// `x` is `Peq[text[i]] | vn`; returns `(d0, hp, hn, new_vp, new_vn)`.
#[inline]
fn step(x: u32, vp: u32, vn: u32) -> (u32, u32, u32, u32, u32) {
    let d0 = ((vp.wrapping_add(x & vp)) ^ vp) | x;
    let hn = vp & d0;
    let hp = vn | !(vp | d0);
    let x = d0 >> 1;
    let new_vn = x & hp;
    let new_vp = hn | !(x | hp);
    (d0, hp, hn, new_vp, new_vn)
}

/// Computes the banded edit distance of `text` against the reference
/// window `pattern`, returning `(edit_distance, end_position_offset)`.
///
/// `edit_distance` saturates at `error_threshold + 1` once the running
/// error at the band's low edge exceeds `3 * error_threshold` (the same
/// early-termination heuristic as the reference implementation).
///
/// # Panics
///
/// Panics (via `debug_assert!`) if `pattern` is shorter than
/// `text.len() + 2 * error_threshold`.
pub fn banded_edit_distance(args: FEMArgs, pattern: &[u8], text: &[u8]) -> (u8, i32) {
    let band = args.band_width();
    debug_assert!(pattern.len() >= text.len() + band as usize);

    let mut peq: EnumMap<Base, u32> = EnumMap::default();
    for i in 0..band as usize {
        let base = char_to_base(pattern[i]);
        peq[base] |= 1 << i;
    }

    let highest_bit_in_band_mask: u32 = 1 << band;
    let lowest_bit_in_band_mask: u32 = 1;
    let mut vp: u32 = 0;
    let mut vn: u32 = 0;
    let mut d0;
    let mut hp;
    let mut num_errors_at_band_start_position: i32 = 0;

    for (i, &text_byte) in text.iter().enumerate() {
        let pattern_base = char_to_base(pattern[i + band as usize]);
        peq[pattern_base] |= highest_bit_in_band_mask;
        let x = peq[char_to_base(text_byte)] | vn;
        let (new_d0, new_hp, _hn, new_vp, new_vn) = step(x, vp, vn);
        d0 = new_d0;
        hp = new_hp;
        vp = new_vp;
        vn = new_vn;
        let _ = hp;

        num_errors_at_band_start_position += 1 - (d0 & lowest_bit_in_band_mask) as i32;
        if num_errors_at_band_start_position > 3 * i32::from(args.error_threshold()) {
            return (args.error_threshold() + 1, text.len() as i32 - 1);
        }

        for slot in peq.values_mut() {
            *slot >>= 1;
        }
    }

    let band_start_position = text.len() as i32 - 1;
    let mut min_num_errors = num_errors_at_band_start_position;
    let mut end_position = band_start_position;
    for i in 0..band as i32 {
        num_errors_at_band_start_position += ((vp >> i) & 1) as i32;
        num_errors_at_band_start_position -= ((vn >> i) & 1) as i32;
        if num_errors_at_band_start_position < min_num_errors {
            min_num_errors = num_errors_at_band_start_position;
            end_position = band_start_position + 1 + i;
        }
    }
    (min_num_errors as u8, end_position)
}

/// Re-runs the forward recurrence, caching `D0`/`HP` for every column so
/// [`crate::traceback`] can walk the band backwards.
///
/// `d0_cache` and `hp_cache` are cleared and filled to `text.len()`
/// entries; callers own their allocation so it can be reused across
/// reads (see [`crate::verify::VerifyWorkspace`]).
pub(crate) fn banded_forward_trace(
    args: FEMArgs,
    pattern: &[u8],
    text: &[u8],
    d0_cache: &mut Vec<u32>,
    hp_cache: &mut Vec<u32>,
) {
    let band = args.band_width();
    debug_assert!(pattern.len() >= text.len() + band as usize);

    d0_cache.clear();
    hp_cache.clear();

    let mut peq: EnumMap<Base, u32> = EnumMap::default();
    for i in 0..band as usize {
        let base = char_to_base(pattern[i]);
        peq[base] |= 1 << i;
    }

    let highest_bit_in_band_mask: u32 = 1 << band;
    let mut vp: u32 = 0;
    let mut vn: u32 = 0;

    for (i, &text_byte) in text.iter().enumerate() {
        let pattern_base = char_to_base(pattern[i + band as usize]);
        peq[pattern_base] |= highest_bit_in_band_mask;
        let x = peq[char_to_base(text_byte)] | vn;
        let (d0, hp, _hn, new_vp, new_vn) = step(x, vp, vn);
        d0_cache.push(d0);
        hp_cache.push(hp);
        vp = new_vp;
        vn = new_vn;

        for slot in peq.values_mut() {
            *slot >>= 1;
        }
    }
}
