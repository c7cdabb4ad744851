//! `ProcessAndEmit` (§4.4): radix-sorts a read's confirmed [`Mapping`]s and
//! assembles one binary alignment record per mapping via `noodles-sam`'s
//! in-memory [`RecordBuf`].

use bio_types::strand::ReqStrand;
use noodles::core::Position;
use noodles::sam::alignment::record_buf::{Name, QualityScores, Sequence};
use noodles::sam::alignment::RecordBuf;
use noodles::sam::record::cigar::op::Kind;
use noodles::sam::record::cigar::Op;
use noodles::sam::record::data::field::{tag, Value};
use noodles::sam::record::{Cigar, Flags};

use crate::batch::{ReadBatch, ReferenceCollection};
use crate::traceback::{generate_alignment, CigarKind, CigarOp};
use crate::types::{FEMArgs, Mapping};

const QUALITY_ASCII_OFFSET: u8 = 33;

/// Radix-sorts `mappings` by the ascending §3 key, then appends one
/// [`RecordBuf`] per mapping to `records_out` (the lowest-key mapping is
/// primary, every other mapping is flagged `SECONDARY` and carries an
/// empty sequence/quality payload). Returns the number of records
/// appended.
///
/// `cigar_scratch`/`md_scratch`/`d0_cache`/`hp_cache` are caller-owned
/// traceback scratch (see [`crate::verify::VerifyWorkspace`]), reused
/// across mappings and across reads.
#[allow(clippy::too_many_arguments)]
pub fn process_mappings<RB, RC>(
    args: FEMArgs,
    read_batch: &RB,
    read_index: usize,
    ref_batch: &RC,
    mappings: &mut [Mapping],
    cigar_scratch: &mut Vec<CigarOp>,
    md_scratch: &mut String,
    d0_cache: &mut Vec<u32>,
    hp_cache: &mut Vec<u32>,
    records_out: &mut Vec<RecordBuf>,
) -> u32
where
    RB: ReadBatch,
    RC: ReferenceCollection,
{
    radix_sort_mappings(mappings);

    let name = read_batch.name(read_index);
    let band = args.band_width() as usize;

    for (i, mapping) in mappings.iter().enumerate() {
        let is_primary = i == 0;
        let text = read_batch.sequence(read_index, mapping.direction);
        let window_len = text.len() + band;
        let pattern = ref_batch.window(
            mapping.candidate_position.reference_sequence_index(),
            mapping.candidate_position.reference_offset(),
            window_len,
        );

        let mapping_start_position = generate_alignment(
            args,
            pattern,
            text,
            mapping.edit_distance,
            mapping.end_position_offset,
            cigar_scratch,
            md_scratch,
            d0_cache,
            hp_cache,
        );

        let pos = mapping_start_position + mapping.candidate_position.reference_offset() as i32;

        let mut flags = Flags::empty();
        if mapping.direction == ReqStrand::Reverse {
            flags |= Flags::REVERSE_COMPLEMENTED;
        }
        if !is_primary {
            flags |= Flags::SECONDARY;
        }

        let cigar: Cigar = cigar_scratch
            .iter()
            .map(|op| {
                let kind = match op.op {
                    CigarKind::Match => Kind::Match,
                    CigarKind::Insertion => Kind::Insertion,
                    CigarKind::Deletion => Kind::Deletion,
                };
                Op::new(kind, op.len as usize)
            })
            .collect();

        let mut builder = RecordBuf::builder()
            .set_name(Name::from(name.to_vec()))
            .set_reference_sequence_id(mapping.candidate_position.reference_sequence_index() as usize)
            .set_alignment_start(
                Position::try_from(usize::try_from(pos + 1).expect("pos must be non-negative"))
                    .expect("pos must be non-zero"),
            )
            .set_flags(flags)
            .set_cigar(cigar)
            .set_data(
                [
                    (
                        tag::EDIT_DISTANCE,
                        Value::from(u32::from(mapping.edit_distance)),
                    ),
                    (
                        tag::MISMATCHED_POSITIONS,
                        Value::String(md_scratch.as_str().into()),
                    ),
                ]
                .into_iter()
                .collect(),
            );

        // only the primary record carries seq/qual; secondaries are
        // written with an empty payload (§4.4).
        if is_primary {
            let quality = read_batch.quality(read_index);
            // always forward order, regardless of mapping direction,
            // matching the source's single `read_qual` fetch reused as-is
            // for both directions.
            let quality_scores: Vec<u8> =
                quality.iter().map(|&q| q - QUALITY_ASCII_OFFSET).collect();
            builder = builder
                .set_sequence(Sequence::from(text.to_vec()))
                .set_quality_scores(QualityScores::from(quality_scores));
        }

        records_out.push(builder.build());
    }

    mappings.len() as u32
}

/// LSD radix sort over the 64-bit key of [`Mapping::sort_key`], eight
/// passes of eight bits each. Stable, and linear in the number of
/// mappings, matching the "Radix-sort Mappings" requirement of §4.4.
fn radix_sort_mappings(mappings: &mut [Mapping]) {
    const RADIX_BITS: u32 = 8;
    const BUCKETS: usize = 1 << RADIX_BITS;
    const PASSES: u32 = 64 / RADIX_BITS;

    let n = mappings.len();
    if n <= 1 {
        return;
    }

    let mut src = mappings.to_vec();
    let mut dst = vec![src[0]; n];

    for pass in 0..PASSES {
        let shift = pass * RADIX_BITS;
        let mut counts = [0usize; BUCKETS + 1];
        for m in &src {
            let bucket = ((m.sort_key() >> shift) & (BUCKETS as u64 - 1)) as usize;
            counts[bucket + 1] += 1;
        }
        for i in 0..BUCKETS {
            counts[i + 1] += counts[i];
        }
        for m in &src {
            let bucket = ((m.sort_key() >> shift) & (BUCKETS as u64 - 1)) as usize;
            dst[counts[bucket]] = *m;
            counts[bucket] += 1;
        }
        std::mem::swap(&mut src, &mut dst);
    }

    mappings.copy_from_slice(&src);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::fixtures::{OneContig, OneRead};
    use crate::types::Candidate;

    fn window(reference: &[u8], band: u32) -> Vec<u8> {
        let mut padded = vec![b'A'; band as usize];
        padded.extend_from_slice(reference);
        padded
    }

    #[test]
    fn radix_sort_orders_by_edit_distance_then_direction() {
        let mut mappings = vec![
            Mapping {
                direction: ReqStrand::Reverse,
                edit_distance: 1,
                candidate_position: Candidate::new(0, 100),
                end_position_offset: 10,
            },
            Mapping {
                direction: ReqStrand::Forward,
                edit_distance: 0,
                candidate_position: Candidate::new(0, 50),
                end_position_offset: 10,
            },
            Mapping {
                direction: ReqStrand::Forward,
                edit_distance: 1,
                candidate_position: Candidate::new(0, 10),
                end_position_offset: 5,
            },
        ];
        radix_sort_mappings(&mut mappings);
        assert_eq!(mappings[0].edit_distance, 0);
        assert!(mappings[1].edit_distance <= mappings[2].edit_distance);
        let keys: Vec<u64> = mappings.iter().map(|m| m.sort_key()).collect();
        assert!(keys.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn primary_record_is_unflagged_and_secondary_is_flagged() {
        let args = FEMArgs::new(2).unwrap();
        let band = args.band_width();
        let read = OneRead {
            forward: b"ACGTACGT".to_vec(),
            reverse_complement: b"ACGTACGT".to_vec(),
            quality: vec![b'I'; 8],
            name: b"read1".to_vec(),
        };
        let ref_batch = OneContig(window(b"ACGTACGT", band));

        let mut mappings = vec![
            Mapping {
                direction: ReqStrand::Forward,
                edit_distance: 0,
                candidate_position: Candidate::new(0, 0),
                end_position_offset: 7,
            },
            Mapping {
                direction: ReqStrand::Forward,
                edit_distance: 1,
                candidate_position: Candidate::new(0, 0),
                end_position_offset: 7,
            },
        ];

        let mut cigar = Vec::new();
        let mut md = String::new();
        let mut d0_cache = Vec::new();
        let mut hp_cache = Vec::new();
        let mut records = Vec::new();

        let count = process_mappings(
            args,
            &read,
            0,
            &ref_batch,
            &mut mappings,
            &mut cigar,
            &mut md,
            &mut d0_cache,
            &mut hp_cache,
            &mut records,
        );

        assert_eq!(count, 2);
        assert!(!records[0].flags().is_secondary());
        assert!(records[1].flags().is_secondary());
        assert_eq!(records[0].sequence().len(), 8);
        assert_eq!(records[1].sequence().len(), 0);
    }
}
