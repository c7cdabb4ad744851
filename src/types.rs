//! Shared value types: run parameters, packed candidates, and confirmed
//! mappings.

use bio_types::strand::ReqStrand;
use serde_derive::{Deserialize, Serialize};

use crate::error::Error;

/// Number of candidates a single vectorized call advances in lockstep.
pub const NUM_VPU_LANES: usize = 8;

/// The highest `error_threshold` this crate will accept.
///
/// Kept strictly below 16 so `2*e+1` bits fit a `u32` scalar DP lane and
/// the `1 << 2*e` injection bit fits a `u16` SIMD lane.
pub const MAX_ERROR_THRESHOLD: u8 = 15;

/// BAM `FLAG` bit meaning "read reverse strand".
pub const BAM_FREVERSE: u16 = 0x10;
/// BAM `FLAG` bit meaning "secondary alignment".
pub const BAM_FSECONDARY: u16 = 0x100;

/// Validated run parameters shared by every call into this crate.
///
/// This is the crate's one recoverable configuration boundary: build it
/// once via [`FEMArgs::new`] and pass it by value (it is `Copy`) to every
/// downstream function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FEMArgs {
    error_threshold: u8,
}

impl FEMArgs {
    /// Validates `error_threshold` and builds a new [`FEMArgs`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::ErrorThresholdTooLarge`] if `error_threshold` is
    /// not strictly less than 16.
    pub fn new(error_threshold: u8) -> Result<Self, Error> {
        if error_threshold > MAX_ERROR_THRESHOLD {
            return Err(Error::ErrorThresholdTooLarge {
                max: MAX_ERROR_THRESHOLD,
                got: error_threshold,
            });
        }
        Ok(FEMArgs { error_threshold })
    }

    /// The maximum number of errors (substitutions, insertions, deletions)
    /// a mapping may carry and still be accepted.
    #[inline]
    pub fn error_threshold(self) -> u8 {
        self.error_threshold
    }

    /// Half-width of the band on either side of the diagonal, `2*e`.
    #[inline]
    pub fn band_width(self) -> u32 {
        2 * u32::from(self.error_threshold)
    }
}

/// A candidate alignment location: a reference sequence index and the
/// reference offset at which a banded window starts, packed into a
/// single 64-bit value (`reference_sequence_index << 32 | offset`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Candidate(pub u64);

impl Candidate {
    /// Packs a reference sequence index and window offset into a
    /// [`Candidate`].
    #[inline]
    pub fn new(reference_sequence_index: u32, reference_offset: u32) -> Self {
        Candidate((u64::from(reference_sequence_index) << 32) | u64::from(reference_offset))
    }

    #[inline]
    pub fn reference_sequence_index(self) -> u32 {
        (self.0 >> 32) as u32
    }

    #[inline]
    pub fn reference_offset(self) -> u32 {
        self.0 as u32
    }
}

/// A confirmed alignment: the outcome of [`crate::verify::verify_candidates`]
/// for one candidate that fell within the error budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mapping {
    pub direction: ReqStrand,
    pub edit_distance: u8,
    pub candidate_position: Candidate,
    /// 0-based, inclusive offset (from the start of the banded window)
    /// of the read's last aligned base against the reference.
    pub end_position_offset: i32,
}

impl Mapping {
    /// The 64-bit radix sort key used by [`crate::record::process_mappings`]
    /// to order mappings best-edit-distance-first, ties broken by strand
    /// then by (candidate position + end offset).
    ///
    /// Mirrors the reference implementation's `MappingSortKey` macro
    /// exactly, including letting `end_position_offset` perturb the low
    /// bits of the packed candidate position as a deterministic
    /// tie-breaker. As in the source, the addition is not masked to the
    /// remaining 59 bits: it relies on `reference_sequence_index` staying
    /// well under 2^27 in practice so the sum never carries into the
    /// `direction`/`edit_distance` fields above it.
    pub fn sort_key(self) -> u64 {
        let direction_bit = match self.direction {
            ReqStrand::Forward => 0u64,
            ReqStrand::Reverse => 1u64,
        };
        (u64::from(self.edit_distance) << 60)
            | (direction_bit << 59)
            | self
                .candidate_position
                .0
                .wrapping_add(self.end_position_offset as u64)
    }
}
