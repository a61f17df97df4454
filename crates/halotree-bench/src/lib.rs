//! Benchmark profiles for halotree.
//!
//! - [`reference_profile`]: 32 snapshots of 256 linear trees, no pointer
//!   passes
//! - [`lineage_profile`]: the same snapshot sweep with every pass enabled,
//!   periodic bridge matches and fragment back-matches
//! - [`identity_mapping`]: a mapping that owns every tree of a dataset

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use halotree_core::{HaloKind, TreeCase};
use halotree_forest::ForestMapping;
use halotree_test_utils::fixtures::chain_dataset;
use halotree_test_utils::Dataset;

/// Snapshots read by the reference profiles.
pub const REFERENCE_SNAPS: i32 = 32;
/// Trees per snapshot in the reference profiles.
pub const REFERENCE_TREES: i32 = 256;

/// Linear trees with the optional passes disabled.
pub fn reference_profile() -> Dataset {
    chain_dataset(REFERENCE_SNAPS, REFERENCE_TREES, 4)
}

/// Linear trees with bridge fixing and fragmentation enabled.
///
/// Every seventh group (below the last two snapshots) matched to a bridge
/// whose forematch is two snapshots later. Every eleventh group (above
/// the oldest snapshot) is a new fragment that back-matches the group of
/// the next tree one snapshot earlier.
pub fn lineage_profile(n_snaps: i32, n_trees: i32) -> Dataset {
    let mut ds = chain_dataset(n_snaps, n_trees, 4);
    let config = ds.config().clone().with_all_passes();
    *ds.config_mut() = config;
    for i_file in 0..n_snaps {
        let snap = ds.snapshot_mut(i_file as usize);
        for k in 0..n_trees {
            let index = k as usize;
            if k % 7 == 0 && i_file + 2 < n_snaps {
                snap.group_mut(index).case = TreeCase::MATCHED_TO_BRIDGE;
                snap.set_bridge(HaloKind::Group, index, 2, k);
            }
            if k % 11 == 5 && i_file > 0 && i_file + 1 < n_snaps {
                snap.group_mut(index).case = TreeCase::FRAGMENTED_NEW | TreeCase::EMERGED_CANDIDATE;
                snap.set_backmatch(HaloKind::Group, index, -1, (k + 1) % n_trees);
            }
        }
    }
    ds
}

/// One forest per tree, all owned by a single partition.
pub fn identity_mapping(ds: &Dataset) -> ForestMapping {
    ForestMapping::identity(ds.n_group_trees(), ds.n_subgroup_trees())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_profile_shape() {
        let ds = reference_profile();
        assert_eq!(ds.n_snaps(), REFERENCE_SNAPS as usize);
        assert_eq!(ds.n_group_trees(), REFERENCE_TREES);
        assert!(!ds.config().extended_pointers);
    }

    #[test]
    fn lineage_profile_validates() {
        let ds = lineage_profile(8, 24);
        ds.config().validate().unwrap();
        let p = ds.snapshot(3).pointers();
        assert!(p.groups[0].forematch.is_some());
        assert!(p.groups[5].backmatch.is_some());
        assert!(ds.snapshot(7).pointers().groups[0].forematch.is_none());
    }
}
