//! `VerifyAndEmit` (§4.3): runs the scalar and SIMD banded edit-distance
//! forms over a candidate list and collects the survivors as [`Mapping`]s.

use bio_types::strand::ReqStrand;

use crate::batch::{ReadBatch, ReferenceCollection};
use crate::scalar::banded_edit_distance;
use crate::simd::vectorized_banded_edit_distance;
use crate::traceback::CigarOp;
use crate::types::{Candidate, FEMArgs, Mapping, NUM_VPU_LANES};

/// Verifies every candidate in `candidates` for `read_index` in direction
/// `direction`, appending a [`Mapping`] to `mappings_out` for each one whose
/// edit distance falls within `args.error_threshold()`.
///
/// Candidates are consumed in groups of [`NUM_VPU_LANES`] through the SIMD
/// form (§4.2); the `candidates.len() % NUM_VPU_LANES` remainder runs
/// through the scalar form (§4.1) one candidate at a time. Mappings are
/// appended in the order candidates were consumed; no deduplication is
/// performed.
///
/// Returns the number of Mappings appended.
pub fn verify_candidates<RB, RC>(
    args: FEMArgs,
    read_batch: &RB,
    read_index: usize,
    direction: ReqStrand,
    ref_batch: &RC,
    candidates: &[Candidate],
    mappings_out: &mut Vec<Mapping>,
) -> u32
where
    RB: ReadBatch,
    RC: ReferenceCollection,
{
    let text = read_batch.sequence(read_index, direction);
    let band = args.band_width() as usize;
    let window_len = text.len() + band;
    let threshold = u16::from(args.error_threshold());

    let mut appended = 0u32;

    let mut groups = candidates.chunks_exact(NUM_VPU_LANES);
    for group in &mut groups {
        let windows: [&[u8]; NUM_VPU_LANES] = core::array::from_fn(|lane| {
            ref_batch.window(
                group[lane].reference_sequence_index(),
                group[lane].reference_offset(),
                window_len,
            )
        });

        let mut edit_distances = [0u16; NUM_VPU_LANES];
        let mut end_positions = [text.len() as i16 - 1; NUM_VPU_LANES];
        vectorized_banded_edit_distance(
            args,
            windows,
            text,
            &mut edit_distances,
            &mut end_positions,
        );

        for lane in 0..NUM_VPU_LANES {
            if edit_distances[lane] <= threshold {
                mappings_out.push(Mapping {
                    direction,
                    edit_distance: edit_distances[lane] as u8,
                    candidate_position: group[lane],
                    end_position_offset: i32::from(end_positions[lane]),
                });
                appended += 1;
            }
        }
    }

    for &candidate in groups.remainder() {
        let pattern = ref_batch.window(
            candidate.reference_sequence_index(),
            candidate.reference_offset(),
            window_len,
        );
        let (edit_distance, end_position_offset) = banded_edit_distance(args, pattern, text);
        if edit_distance <= args.error_threshold() {
            mappings_out.push(Mapping {
                direction,
                edit_distance,
                candidate_position: candidate,
                end_position_offset,
            });
            appended += 1;
        }
    }

    appended
}

/// Per-thread scratch reused across reads (§5, §9): a Mapping accumulator,
/// the CIGAR op buffer, the MD-tag string buffer, and the forward-pass
/// `D0`/`HP` traceback caches. A worker owns one of these and calls
/// [`VerifyWorkspace::verify`] for each direction of a read, then
/// [`VerifyWorkspace::process`] once both directions have been verified.
///
/// This is the one new public type this crate introduces beyond what §6
/// lists; it holds scratch only, it is not a new feature.
#[derive(Default)]
pub struct VerifyWorkspace {
    pub mappings: Vec<Mapping>,
    pub cigar: Vec<CigarOp>,
    pub md_tag: String,
    pub(crate) d0_cache: Vec<u32>,
    pub(crate) hp_cache: Vec<u32>,
}

impl VerifyWorkspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Verifies `candidates` and appends survivors to `self.mappings`.
    /// Does not clear previously accumulated mappings: callers verify both
    /// directions of a read into the same workspace before calling
    /// [`VerifyWorkspace::process`].
    pub fn verify<RB, RC>(
        &mut self,
        args: FEMArgs,
        read_batch: &RB,
        read_index: usize,
        direction: ReqStrand,
        ref_batch: &RC,
        candidates: &[Candidate],
    ) -> u32
    where
        RB: ReadBatch,
        RC: ReferenceCollection,
    {
        verify_candidates(
            args,
            read_batch,
            read_index,
            direction,
            ref_batch,
            candidates,
            &mut self.mappings,
        )
    }

    /// Sorts the accumulated mappings and emits one binary alignment
    /// record per mapping into `records_out`, then clears the mapping
    /// accumulator so the workspace can be reused for the next read.
    pub fn process<RB, RC>(
        &mut self,
        args: FEMArgs,
        read_batch: &RB,
        read_index: usize,
        ref_batch: &RC,
        records_out: &mut Vec<noodles::sam::alignment::RecordBuf>,
    ) -> u32
    where
        RB: ReadBatch,
        RC: ReferenceCollection,
    {
        let count = crate::record::process_mappings(
            args,
            read_batch,
            read_index,
            ref_batch,
            &mut self.mappings,
            &mut self.cigar,
            &mut self.md_tag,
            &mut self.d0_cache,
            &mut self.hp_cache,
            records_out,
        );
        self.mappings.clear();
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::fixtures::{OneContig, OneRead};

    fn window(reference: &[u8], band: u32) -> Vec<u8> {
        let mut padded = vec![b'A'; band as usize];
        padded.extend_from_slice(reference);
        padded
    }

    #[test]
    fn scalar_tail_collects_surviving_mappings() {
        let args = FEMArgs::new(2).unwrap();
        let band = args.band_width();
        let read = OneRead {
            forward: b"ACGTACGT".to_vec(),
            reverse_complement: b"ACGTACGT".to_vec(),
            quality: vec![b'I'; 8],
            name: b"read1".to_vec(),
        };

        // three candidates: exact match, one mismatch, hopelessly different
        let mut reference = Vec::new();
        reference.extend(window(b"ACGTACGT", band));
        let mismatch_ref = {
            let mut r = b"ACGTACGT".to_vec();
            r[2] = b'T';
            window(&r, band)
        };
        reference.extend(&mismatch_ref);
        reference.extend(window(b"TTTTTTTT", band));
        let ref_batch = OneContig(reference);

        let window_len = read.forward.len() + band as usize;
        let candidates = [
            Candidate::new(0, 0),
            Candidate::new(0, window_len as u32),
            Candidate::new(0, 2 * window_len as u32),
        ];

        let mut mappings = Vec::new();
        let appended = verify_candidates(
            args,
            &read,
            0,
            ReqStrand::Forward,
            &ref_batch,
            &candidates,
            &mut mappings,
        );

        assert_eq!(appended, 2);
        assert_eq!(mappings.len(), 2);
        assert_eq!(mappings[0].edit_distance, 0);
        assert_eq!(mappings[1].edit_distance, 1);
    }
}
