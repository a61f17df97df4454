//! Standard datasets.
//!
//! - [`chain_dataset`]: independent linear trees, one group and one
//!   subgroup per tree and snapshot.
//! - [`fragmentation_dataset`]: three snapshots with one fragmented group
//!   that either returns to its own lineage or exchanges into another.
//! - [`bridge_dataset`]: the fragmentation layout plus a halo matched to
//!   a bridge whose forematch is one snapshot later.

use halotree_core::{HaloKind, ReadConfig, TreeCase};

use crate::dataset::{Dataset, GroupSpec, HaloSpec};

/// `n_trees` independent trees over `n_snaps` consecutive snapshots.
///
/// Tree `k` has group id `1000 * i_file + k` and subgroup id
/// `1000 * i_file + 500 + k` at each file index; every halo descends to
/// the same index in the next snapshot, except in the root snapshot.
pub fn chain_dataset(n_snaps: i32, n_trees: i32, n_search: i32) -> Dataset {
    let mut ds = Dataset::new(ReadConfig::new(0, n_snaps - 1, 1, n_search));
    for i_file in 0..n_snaps {
        let root = i_file == n_snaps - 1;
        let snap = ds.snapshot_mut(i_file as usize);
        for k in 0..n_trees {
            let base = 1000 * i_file;
            let mut group = HaloSpec::new(base + k, 200 + k, k);
            let mut sub = HaloSpec::new(base + 500 + k, 100 + k, k);
            if !root {
                group = group.descends_to(1, k, base + 1000 + k);
                sub = sub.descends_to(1, k, base + 1500 + k);
            }
            snap.groups.push(GroupSpec::new(group).with_subgroup(sub));
        }
    }
    ds
}

/// Three snapshots read with every pass enabled and `n_search = 1`.
///
/// Each snapshot has five groups (ids `100 + k`, `100 - k` particles,
/// tree `k`), each owning one subgroup (ids `200 + k`, `50 - k`
/// particles, tree `k`). Halos descend to the same index one snapshot
/// later. Group 4 at file index 1 is a new fragment and an emerged
/// candidate that reappears under tree 5. Its back-match points at group
/// 4 of file index 0, its own main progenitor, when `returned` is set,
/// and at group 3 otherwise.
pub fn fragmentation_dataset(returned: bool) -> Dataset {
    let mut ds = Dataset::new(ReadConfig::new(0, 2, 1, 1).with_all_passes());
    for i_file in 0..3 {
        let root = i_file == 2;
        let snap = ds.snapshot_mut(i_file);
        for k in 0..5 {
            let mut group = HaloSpec::new(100 + k, 100 - k, k);
            let mut sub = HaloSpec::new(200 + k, 50 - k, k);
            if !root {
                group = group.descends_to(1, k, 100 + k);
                sub = sub.descends_to(1, k, 200 + k);
            }
            snap.groups.push(GroupSpec::new(group).with_subgroup(sub));
        }
    }
    let snap = ds.snapshot_mut(1);
    let fragment = snap.group_mut(4);
    fragment.case = TreeCase::FRAGMENTED_NEW | TreeCase::EMERGED_CANDIDATE;
    fragment.tree_id = 5;
    snap.set_backmatch(HaloKind::Group, 4, -1, if returned { 4 } else { 3 });
    ds
}

/// [`fragmentation_dataset`] with group 1 of file index 0 matched to a
/// bridge: its forematch is group 2 of file index 1.
pub fn bridge_dataset() -> Dataset {
    let mut ds = fragmentation_dataset(true);
    let snap = ds.snapshot_mut(0);
    snap.group_mut(1).case = TreeCase::MATCHED_TO_BRIDGE;
    snap.set_bridge(HaloKind::Group, 1, 1, 2);
    ds
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_shape() {
        let ds = chain_dataset(4, 3, 2);
        assert_eq!(ds.n_snaps(), 4);
        assert_eq!(ds.n_group_trees(), 3);
        let last = ds.snapshot(3).entries();
        assert!(last.iter().all(|g| g.record.file_offset == 0));
        let first = ds.snapshot(0).entries();
        assert_eq!(first[2].subgroups[0].index, 2);
        assert_eq!(first[2].record.file_index, 2);
    }

    #[test]
    fn fragment_backmatch_target() {
        let ds = fragmentation_dataset(false);
        let p = ds.snapshot(1).pointers();
        assert_eq!(p.groups.len(), 5);
        assert_eq!(p.subgroups.len(), 5);
        let back = p.groups[4].backmatch.unwrap();
        assert_eq!((back.offset, back.index), (-1, 3));
        assert!(p.groups[..4].iter().all(|r| r.backmatch.is_none()));
        assert_eq!(ds.snapshot(1).groups[4].halo.tree_id, 5);
        assert_eq!(ds.n_group_trees(), 6);
    }
}
