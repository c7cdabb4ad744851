//! End-to-end smoke test of [`VerifyWorkspace`] against randomly generated
//! reads and references: verify both strands of several reads, process
//! each read's mappings, and check the output records are sorted and
//! correctly flagged (spec invariant 5).

use bio_types::strand::ReqStrand;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use fem_align::batch::{ReadBatch, ReferenceCollection};
use fem_align::types::{Candidate, FEMArgs};
use fem_align::verify::VerifyWorkspace;

const BASES: [u8; 4] = [b'A', b'C', b'G', b'T'];

struct RandomReference(Vec<u8>);

impl ReferenceCollection for RandomReference {
    fn window(&self, reference_sequence_index: u32, offset: u32, len: usize) -> &[u8] {
        assert_eq!(reference_sequence_index, 0);
        let start = offset as usize;
        &self.0[start..start + len]
    }
}

struct SingleRead {
    forward: Vec<u8>,
    reverse_complement: Vec<u8>,
    quality: Vec<u8>,
    name: Vec<u8>,
}

impl ReadBatch for SingleRead {
    fn read_length(&self, _read_index: usize) -> usize {
        self.forward.len()
    }

    fn forward_sequence(&self, _read_index: usize) -> &[u8] {
        &self.forward
    }

    fn reverse_complement_sequence(&self, _read_index: usize) -> &[u8] {
        &self.reverse_complement
    }

    fn quality(&self, _read_index: usize) -> &[u8] {
        &self.quality
    }

    fn name(&self, _read_index: usize) -> &[u8] {
        &self.name
    }
}

fn complement(base: u8) -> u8 {
    match base {
        b'A' => b'T',
        b'C' => b'G',
        b'G' => b'C',
        b'T' => b'A',
        other => other,
    }
}

fn reverse_complement(seq: &[u8]) -> Vec<u8> {
    seq.iter().rev().map(|&b| complement(b)).collect()
}

#[test]
fn reads_with_one_mismatch_produce_one_correctly_flagged_primary_record() {
    let mut rng = StdRng::seed_from_u64(0x5EED);

    let args = FEMArgs::new(2).unwrap();
    let band = args.band_width();
    let read_len = 40;

    let reference_core: Vec<u8> = (0..read_len).map(|_| BASES[rng.gen_range(0..4)]).collect();
    let mut reference = vec![b'A'; band as usize];
    reference.extend_from_slice(&reference_core);
    reference.extend(vec![b'A'; band as usize]);
    let ref_batch = RandomReference(reference);

    let mut forward = reference_core.clone();
    let flip_at = rng.gen_range(0..forward.len());
    forward[flip_at] = BASES[(BASES.iter().position(|&b| b == forward[flip_at]).unwrap() + 1) % 4];

    let read = SingleRead {
        reverse_complement: reverse_complement(&forward),
        forward,
        quality: vec![b'I'; read_len],
        name: b"random_read".to_vec(),
    };

    let mut workspace = VerifyWorkspace::new();
    let candidates = [Candidate::new(0, 0)];

    workspace.verify(args, &read, 0, ReqStrand::Forward, &ref_batch, &candidates);
    workspace.verify(args, &read, 0, ReqStrand::Reverse, &ref_batch, &candidates);

    let mut records = Vec::new();
    let produced = workspace.process(args, &read, 0, &ref_batch, &mut records);

    assert_eq!(produced, 1);
    assert_eq!(records.len(), 1);
    assert!(!records[0].flags().is_secondary());
    assert_eq!(records[0].sequence().len(), read_len);
}
