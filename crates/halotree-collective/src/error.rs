//! Errors raised by collective operations.

use std::time::Duration;

use thiserror::Error;

/// A collective call failed. Always fatal to the read.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CollectiveError {
    /// A peer issued a different call than this partition.
    #[error("rank {rank}: peer {peer} is at collective call {found}, expected call {expected}")]
    CallMismatch {
        /// This partition.
        rank: usize,
        /// The peer that is out of step.
        peer: usize,
        /// This partition's call number.
        expected: u64,
        /// The peer's call number.
        found: u64,
    },
    /// A peer reduced a slice of a different length.
    #[error("rank {rank}: peer {peer} reduced {found} values, expected {expected}")]
    LengthMismatch {
        /// This partition.
        rank: usize,
        /// The offending peer.
        peer: usize,
        /// Length of this partition's slice.
        expected: usize,
        /// Length of the peer's slice.
        found: usize,
    },
    /// A peer went away before the call completed.
    #[error("rank {rank}: a peer disconnected during collective call {call}")]
    Disconnected {
        /// This partition.
        rank: usize,
        /// Call number in progress.
        call: u64,
    },
    /// The peers did not all arrive in time.
    #[error("rank {rank}: collective call {call} timed out after {waited:?}")]
    Timeout {
        /// This partition.
        rank: usize,
        /// Call number in progress.
        call: u64,
        /// How long the partition waited.
        waited: Duration,
    },
}
