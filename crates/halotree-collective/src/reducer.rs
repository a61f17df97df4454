//! Per-snapshot group ownership reduction.
//!
//! Each partition marks the groups it placed on one of its forests with a
//! 1. After summing across partitions, every group should be claimed
//! exactly once. Unclaimed and multiply claimed groups are reported but do
//! not stop the read.

use crate::error::CollectiveError;
use crate::Collective;

/// Outcome of one snapshot's ownership reduction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OwnershipReport {
    /// Number of groups reduced.
    pub n_groups: usize,
    /// Groups no partition claimed.
    pub unused: usize,
    /// Groups more than one partition claimed.
    pub multiply_claimed: usize,
}

impl OwnershipReport {
    /// Tally the reduced claim sums.
    pub fn from_sums(sums: &[i32]) -> Self {
        let mut report = Self {
            n_groups: sums.len(),
            ..Self::default()
        };
        for &sum in sums {
            match sum {
                0 => report.unused += 1,
                1 => {}
                _ => report.multiply_claimed += 1,
            }
        }
        report
    }

    /// Whether every group was claimed exactly once.
    pub fn is_clean(&self) -> bool {
        self.unused == 0 && self.multiply_claimed == 0
    }
}

/// Sum `claimed` across all partitions and report the anomalies.
///
/// `claimed` must have the same length on every partition. On return it
/// holds the sums.
pub fn reduce_ownership<C: Collective + ?Sized>(
    comm: &mut C,
    claimed: &mut [i32],
) -> Result<OwnershipReport, CollectiveError> {
    comm.all_reduce_sum(claimed)?;
    let report = OwnershipReport::from_sums(claimed);
    if report.unused > 0 {
        tracing::warn!(
            rank = comm.rank(),
            unused = report.unused,
            n_groups = report.n_groups,
            "groups not claimed by any partition"
        );
    }
    if report.multiply_claimed > 0 {
        tracing::warn!(
            rank = comm.rank(),
            multiply_claimed = report.multiply_claimed,
            n_groups = report.n_groups,
            "groups claimed by more than one partition"
        );
    }
    Ok(report)
}
