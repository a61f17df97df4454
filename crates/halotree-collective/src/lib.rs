//! Collective operations across halotree partitions.
//!
//! A tree read may be split across several partitions, each owning a range
//! of forests. The only cross-partition communication is an all-reduce
//! SUM over per-group claim indicators, issued once per snapshot in the
//! same order everywhere. [`Collective`] is that seam:
//!
//! - [`SingleRank`]: the one-partition identity.
//! - [`LocalCluster`]: in-process partitions on threads, connected by
//!   crossbeam channels, for tests and local runs.
//!
//! [`reduce_ownership`] turns the reduced claims into an
//! [`OwnershipReport`].

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod local;
pub mod reducer;
pub mod single;

pub use error::CollectiveError;
pub use local::{LocalCluster, LocalRank};
pub use reducer::{reduce_ownership, OwnershipReport};
pub use single::SingleRank;

/// Collective operations available to one partition.
///
/// Every partition must issue the same sequence of calls with slices of
/// the same length. Implementations report a detected violation as an
/// error instead of blocking forever where they can.
pub trait Collective {
    /// This partition's rank in `0..size()`.
    fn rank(&self) -> usize;

    /// Number of partitions.
    fn size(&self) -> usize;

    /// Replace `values` with the element-wise sum over all partitions.
    fn all_reduce_sum(&mut self, values: &mut [i32]) -> Result<(), CollectiveError>;

    /// Block until every partition reaches this point.
    fn barrier(&mut self) -> Result<(), CollectiveError> {
        self.all_reduce_sum(&mut [])
    }
}

impl<C: Collective + ?Sized> Collective for &mut C {
    fn rank(&self) -> usize {
        (**self).rank()
    }

    fn size(&self) -> usize {
        (**self).size()
    }

    fn all_reduce_sum(&mut self, values: &mut [i32]) -> Result<(), CollectiveError> {
        (**self).all_reduce_sum(values)
    }

    fn barrier(&mut self) -> Result<(), CollectiveError> {
        (**self).barrier()
    }
}
