//! The 5-symbol DNA alphabet (`A, C, G, T, N`) used to index `Peq`.

use enum_map::Enum;
use strum_macros::EnumIter;

/// One symbol of the banded recurrence's alphabet.
///
/// `N` stands in for every byte that is not one of the four canonical
/// bases, including ambiguity codes and anything else a FASTA/FASTQ
/// record might contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Enum, EnumIter)]
pub enum Base {
    A,
    C,
    G,
    T,
    N,
}

/// Number of distinct symbols in the alphabet (`A, C, G, T, N`).
pub const ALPHABET_SIZE: usize = 5;

const fn build_lut() -> [Base; 256] {
    let mut lut = [Base::N; 256];
    lut[b'A' as usize] = Base::A;
    lut[b'a' as usize] = Base::A;
    lut[b'C' as usize] = Base::C;
    lut[b'c' as usize] = Base::C;
    lut[b'G' as usize] = Base::G;
    lut[b'g' as usize] = Base::G;
    lut[b'T' as usize] = Base::T;
    lut[b't' as usize] = Base::T;
    lut
}

static LUT: [Base; 256] = build_lut();

/// Maps a raw sequence byte to its `Base`, folding lowercase to the same
/// code as its uppercase counterpart and anything else (including `N`)
/// to `Base::N`.
#[inline]
pub fn char_to_base(byte: u8) -> Base {
    LUT[byte as usize]
}
