//! The two external collaborators this crate borrows from but never owns:
//! the read batch (reads, their reverse complements, qualities and names)
//! and the reference collection (random-access bytes of the genome).
//!
//! Both are out of scope per the crate's own purpose (§1): the FASTA/FASTQ
//! reader and the reverse-complement builder live upstream. These traits
//! exist only so the verification core can be exercised against real
//! batches or small in-memory fixtures without linking either.

/// Per-read accessors a worker needs to verify and emit alignments for one
/// read: both strand orientations of the sequence, the Phred+33 quality
/// string, and the read's name.
pub trait ReadBatch {
    /// Number of bases in the read (same for both orientations).
    fn read_length(&self, read_index: usize) -> usize;

    /// The read as sequenced, 5'→3'.
    fn forward_sequence(&self, read_index: usize) -> &[u8];

    /// The reverse complement of the read, precomputed by the caller.
    fn reverse_complement_sequence(&self, read_index: usize) -> &[u8];

    /// Phred quality scores with the conventional `+33` ASCII offset,
    /// in the same (forward) orientation as [`ReadBatch::forward_sequence`].
    fn quality(&self, read_index: usize) -> &[u8];

    /// The read's name, as it will appear in `qname`.
    fn name(&self, read_index: usize) -> &[u8];

    /// Convenience accessor returning the sequence in the orientation
    /// `direction` describes.
    #[inline]
    fn sequence(&self, read_index: usize, direction: bio_types::strand::ReqStrand) -> &[u8] {
        match direction {
            bio_types::strand::ReqStrand::Forward => self.forward_sequence(read_index),
            bio_types::strand::ReqStrand::Reverse => self.reverse_complement_sequence(read_index),
        }
    }
}

/// Random-access query over a (possibly multi-contig) reference genome.
///
/// Implementations must guarantee that `window` never panics for any
/// `(reference_sequence_index, offset, len)` a well-formed [`crate::types::Candidate`]
/// can produce; the caller (the seeder, out of scope here) is responsible
/// for only ever proposing candidates whose band fits inside the contig.
pub trait ReferenceCollection {
    /// Returns `len` contiguous bytes of reference sequence starting at
    /// `offset` within reference sequence `reference_sequence_index`.
    fn window(&self, reference_sequence_index: u32, offset: u32, len: usize) -> &[u8];
}
