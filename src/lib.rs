//! Banded bit-parallel edit-distance verification and CIGAR/MD-tag
//! alignment-record assembly for short-read DNA mapping.
//!
//! This crate picks up where a seeder (k-mer index, FM-index, whatever
//! out-of-scope candidate generator a caller already has) leaves off: it
//! takes a short list of candidate reference positions for a read, scores
//! each one with Myers' bit-parallel algorithm banded to `2*error_threshold+1`
//! diagonals, and for every candidate within threshold reconstructs a CIGAR
//! string, an MD tag and a `noodles` binary alignment record.
//!
//! Two forms of the scoring recurrence are provided: [`scalar`], a single
//! 32-bit-lane implementation used for the last `< 8` candidates of a batch
//! and whenever the crate is built for a non-`x86_64` target, and [`simd`],
//! an 8-lane SSE2 implementation that verifies eight candidates per read in
//! lockstep. [`verify::verify_candidates`] drives both forms over a batch of
//! candidates; [`record::process_mappings`] turns the survivors into sorted,
//! BAM-ready records.
//!
//! Two collaborator traits ([`batch::ReadBatch`], [`batch::ReferenceCollection`])
//! are the crate's only dependency on the outside world: reading reads and
//! reference sequences off disk, building reverse complements and indexing
//! a reference for seeding are all out of scope here.

pub mod alphabet;
pub mod batch;
pub mod error;
pub mod record;
pub mod scalar;
pub mod simd;
pub mod traceback;
pub mod types;
pub mod verify;

pub use batch::{ReadBatch, ReferenceCollection};
pub use error::Error;
pub use traceback::{generate_alignment, CigarKind, CigarOp};
pub use types::{Candidate, FEMArgs, Mapping};
pub use verify::{verify_candidates, VerifyWorkspace};
