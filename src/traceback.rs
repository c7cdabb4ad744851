//! CIGAR and MD-tag reconstruction from a confirmed [`crate::types::Mapping`].
//!
//! This is a semi-global alignment: errors at the two ends of the
//! reference window are not penalized, and the read is aligned in full
//! ("M", "I", "D" only — with an edit-distance model there is no "ID" or
//! "DI" adjacency, and no "=", "X", "N", "H" or "P" operations ever
//! appear). Cigar operations are expressed against the reference.

use crate::types::FEMArgs;

/// One CIGAR operation: BAM op code (0 = M, 1 = I, 2 = D) and length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CigarOp {
    pub op: CigarKind,
    pub len: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CigarKind {
    Match,
    Insertion,
    Deletion,
}

impl CigarOp {
    /// Packs this operation into the BAM `(len << 4) | op` encoding.
    #[inline]
    pub fn to_bam_u32(self) -> u32 {
        let op_code = match self.op {
            CigarKind::Match => 0,
            CigarKind::Insertion => 1,
            CigarKind::Deletion => 2,
        };
        (self.len << 4) | op_code
    }
}

enum TraceOp {
    Match,
    Mismatch,
    Insertion,
    Deletion,
}

/// Reconstructs the CIGAR operations and MD tag for one confirmed
/// mapping, returning the 0-based reference start position of the
/// alignment.
///
/// `pattern` is the same reference window passed to
/// [`crate::scalar::banded_edit_distance`]; `text` is the read in the
/// mapping's reported direction; `edit_distance`/`end_position_offset`
/// are the values [`crate::verify::verify_candidates`] already computed.
///
/// `cigar` and `md_tag` are caller-owned scratch (see
/// [`crate::verify::VerifyWorkspace`]) and are cleared before use.
/// `d0_cache`/`hp_cache` are likewise caller-owned reusable buffers for
/// the forward-pass traceback cache (see [`crate::scalar::banded_forward_trace`]);
/// they are only touched (and reallocated) when the fast path fails.
///
/// # Panics
///
/// Panics if the band's bit-decision table reaches a state the banded
/// recurrence cannot produce (an internal invariant, not a data error) —
/// mirrors the reference implementation's unconditional `assert()`s.
#[allow(clippy::too_many_arguments)]
pub fn generate_alignment(
    args: FEMArgs,
    pattern: &[u8],
    text: &[u8],
    edit_distance: u8,
    end_position_offset: i32,
    cigar: &mut Vec<CigarOp>,
    md_tag: &mut String,
    d0_cache: &mut Vec<u32>,
    hp_cache: &mut Vec<u32>,
) -> i32 {
    cigar.clear();
    md_tag.clear();

    let read_length = text.len() as i32;
    let mut mapping_start_position = end_position_offset - read_length + 1;
    assert!(mapping_start_position >= 0);

    let num_mismatches = (0..text.len())
        .filter(|&i| text[i] != pattern[(mapping_start_position + i as i32) as usize])
        .count();
    if num_mismatches == 0 {
        cigar.push(CigarOp {
            op: CigarKind::Match,
            len: read_length as u32,
        });
        generate_md_tag(pattern, text, mapping_start_position, cigar, md_tag);
        return mapping_start_position;
    }

    crate::scalar::banded_forward_trace(args, pattern, text, d0_cache, hp_cache);

    let mut pattern_bit_position = end_position_offset - read_length + 1;
    let mut text_position = read_length - 1;
    let mut mapping_end_position = end_position_offset;
    let mut num_errors: u8 = 0;

    let bit_set = |value: u32, position: i32| -> bool { (value >> position) & 1 == 1 };

    let classify = |d0_cache: &[u32],
                    hp_cache: &[u32],
                    pattern: &[u8],
                    text: &[u8],
                    text_position: i32,
                    pattern_bit_position: i32,
                    mapping_end_position: i32|
     -> TraceOp {
        let d0_set = bit_set(d0_cache[text_position as usize], pattern_bit_position);
        if d0_set && pattern[mapping_end_position as usize] == text[text_position as usize] {
            TraceOp::Match
        } else if !d0_set {
            TraceOp::Mismatch
        } else if bit_set(hp_cache[text_position as usize], pattern_bit_position) {
            TraceOp::Insertion
        } else {
            TraceOp::Deletion
        }
    };

    let mut pre_operation;
    let mut pre_num_operations;
    match classify(
        &d0_cache,
        &hp_cache,
        pattern,
        text,
        text_position,
        pattern_bit_position,
        mapping_end_position,
    ) {
        TraceOp::Match => {
            text_position -= 1;
            mapping_end_position -= 1;
            pre_operation = 'M';
            pre_num_operations = 1;
        }
        TraceOp::Mismatch => {
            assert_ne!(
                pattern[mapping_end_position as usize],
                text[text_position as usize]
            );
            text_position -= 1;
            mapping_end_position -= 1;
            num_errors += 1;
            // a leading mismatch is folded into a soft clip, matching
            // the reference implementation's handling of the read's 3'
            // end.
            pre_operation = 'S';
            pre_num_operations = 1;
        }
        TraceOp::Insertion => {
            text_position -= 1;
            pattern_bit_position += 1;
            num_errors += 1;
            pre_operation = 'S';
            pre_num_operations = 1;
            mapping_start_position += 1;
        }
        TraceOp::Deletion => unreachable!("leading deletion is impossible for a banded mapping"),
    }

    let mut cigar_operations: Vec<(char, i32)> = Vec::new();
    while text_position >= 0 {
        if num_errors == edit_distance {
            break;
        }
        match classify(
            &d0_cache,
            &hp_cache,
            pattern,
            text,
            text_position,
            pattern_bit_position,
            mapping_end_position,
        ) {
            TraceOp::Match => {
                text_position -= 1;
                mapping_end_position -= 1;
                if pre_operation != 'M' {
                    cigar_operations.push((pre_operation, pre_num_operations));
                    pre_operation = 'M';
                    pre_num_operations = 1;
                } else {
                    pre_num_operations += 1;
                }
            }
            TraceOp::Mismatch => {
                assert_ne!(
                    pattern[mapping_end_position as usize],
                    text[text_position as usize]
                );
                text_position -= 1;
                mapping_end_position -= 1;
                num_errors += 1;
                if pre_operation == 'S' {
                    pre_num_operations += 1;
                } else if pre_operation != 'M' {
                    cigar_operations.push((pre_operation, pre_num_operations));
                    pre_operation = 'M';
                    pre_num_operations = 1;
                } else {
                    pre_num_operations += 1;
                }
            }
            TraceOp::Insertion => {
                text_position -= 1;
                pattern_bit_position += 1;
                num_errors += 1;
                if pre_operation == 'S' {
                    pre_num_operations += 1;
                } else if pre_operation != 'I' {
                    cigar_operations.push((pre_operation, pre_num_operations));
                    pre_operation = 'I';
                    pre_num_operations = 1;
                } else {
                    pre_num_operations += 1;
                }
                mapping_start_position += 1;
            }
            TraceOp::Deletion => {
                pattern_bit_position -= 1;
                mapping_end_position -= 1;
                num_errors += 1;
                if pre_operation != 'D' {
                    cigar_operations.push((pre_operation, pre_num_operations));
                    pre_operation = 'D';
                    pre_num_operations = 1;
                } else {
                    pre_num_operations += 1;
                }
                mapping_start_position -= 1;
            }
        }
    }

    // once every scored error is consumed, everything left must be matches
    if text_position >= 0 {
        if pre_operation != 'M' {
            cigar_operations.push((pre_operation, pre_num_operations));
            cigar_operations.push(('M', text_position + 1));
        } else {
            cigar_operations.push(('M', pre_num_operations + text_position + 1));
        }
    } else {
        cigar_operations.push((pre_operation, pre_num_operations));
    }

    let start = if cigar_operations.first().map(|&(op, _)| op) == Some('S') {
        let (_, clipped) = cigar_operations[0];
        cigar_operations[1].1 += clipped;
        1
    } else {
        0
    };

    for &(op, len) in cigar_operations[start..].iter().rev() {
        let kind = match op {
            'M' => CigarKind::Match,
            'I' => CigarKind::Insertion,
            'D' => CigarKind::Deletion,
            other => unreachable!("unexpected cigar operation {other:?}"),
        };
        cigar.push(CigarOp {
            op: kind,
            len: len as u32,
        });
    }

    generate_md_tag(pattern, text, mapping_start_position, cigar, md_tag);
    mapping_start_position
}

/// Builds the MD tag (mismatching-positions string, SAM spec) for an
/// already-computed CIGAR, matching-bases-then-mismatch-or-deletion.
fn generate_md_tag(
    pattern: &[u8],
    text: &[u8],
    mapping_start_position: i32,
    cigar: &[CigarOp],
    md_tag: &mut String,
) {
    use std::fmt::Write as _;

    let reference = &pattern[mapping_start_position as usize..];
    let mut num_matches = 0u32;
    let mut read_position = 0usize;
    let mut reference_position = 0usize;

    for op in cigar {
        match op.op {
            CigarKind::Match => {
                for _ in 0..op.len {
                    if reference[reference_position] == text[read_position] {
                        num_matches += 1;
                    } else {
                        if num_matches != 0 {
                            let _ = write!(md_tag, "{num_matches}");
                            num_matches = 0;
                        }
                        md_tag.push(reference[reference_position] as char);
                    }
                    reference_position += 1;
                    read_position += 1;
                }
            }
            CigarKind::Insertion => {
                read_position += op.len as usize;
            }
            CigarKind::Deletion => {
                if num_matches != 0 {
                    let _ = write!(md_tag, "{num_matches}");
                    num_matches = 0;
                }
                md_tag.push('^');
                for _ in 0..op.len {
                    md_tag.push(reference[reference_position] as char);
                    reference_position += 1;
                }
            }
        }
    }
    if num_matches != 0 {
        let _ = write!(md_tag, "{num_matches}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scalar::banded_edit_distance;
    use crate::types::FEMArgs;

    fn window(reference: &[u8], band: u32) -> Vec<u8> {
        let mut padded = vec![b'A'; band as usize];
        padded.extend_from_slice(reference);
        padded
    }

    #[test]
    fn exact_match_yields_single_m_op_and_no_md_mismatch() {
        let args = FEMArgs::new(2).unwrap();
        let text: &[u8] = b"ACGTACGTACGT";
        let pattern = window(text, args.band_width());
        let (dist, end) = banded_edit_distance(args, &pattern, text);
        assert_eq!(dist, 0);

        let mut cigar = Vec::new();
        let mut md = String::new();
        let mut d0_cache = Vec::new();
        let mut hp_cache = Vec::new();
        generate_alignment(
            args, &pattern, text, dist, end, &mut cigar, &mut md, &mut d0_cache, &mut hp_cache,
        );

        assert_eq!(cigar.len(), 1);
        assert_eq!(cigar[0].op, CigarKind::Match);
        assert_eq!(cigar[0].len, text.len() as u32);
        assert_eq!(md, text.len().to_string());
    }

    #[test]
    fn single_mismatch_reports_reference_base_in_md() {
        let args = FEMArgs::new(2).unwrap();
        let text: &[u8] = b"ACGTACGTACGT";
        let mut reference = text.to_vec();
        reference[5] = b'T'; // was 'C'
        let pattern = window(&reference, args.band_width());
        let (dist, end) = banded_edit_distance(args, &pattern, text);
        assert_eq!(dist, 1);

        let mut cigar = Vec::new();
        let mut md = String::new();
        let mut d0_cache = Vec::new();
        let mut hp_cache = Vec::new();
        generate_alignment(
            args, &pattern, text, dist, end, &mut cigar, &mut md, &mut d0_cache, &mut hp_cache,
        );

        assert_eq!(cigar.len(), 1);
        assert_eq!(cigar[0].op, CigarKind::Match);
        assert_eq!(md, "5C6");
    }

    #[test]
    fn single_deletion_in_read_produces_d_op() {
        let args = FEMArgs::new(2).unwrap();
        let reference: &[u8] = b"ACGTACGTAA";
        let text: &[u8] = b"ACGACGTAA";
        let pattern = window(reference, args.band_width());
        let (dist, end) = banded_edit_distance(args, &pattern, text);
        assert_eq!(dist, 1);

        let mut cigar = Vec::new();
        let mut md = String::new();
        let mut d0_cache = Vec::new();
        let mut hp_cache = Vec::new();
        generate_alignment(
            args, &pattern, text, dist, end, &mut cigar, &mut md, &mut d0_cache, &mut hp_cache,
        );

        assert!(cigar.iter().any(|op| op.op == CigarKind::Deletion));
    }
}
