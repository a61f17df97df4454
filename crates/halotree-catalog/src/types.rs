//! Record shapes of the catalog and linkage files.

use halotree_core::{TreeCase, NO_SNAPSHOT};

/// Convert a one-based file offset into the descendant's file index.
///
/// A non-positive offset marks a halo without a descendant (a tree root),
/// giving [`NO_SNAPSHOT`]. Otherwise the descendant lives `offset`
/// snapshots after `i_file`, saturating at `i32::MAX` (which no read
/// contains, so the descendant is simply not found).
pub fn descendant_file(i_file: i32, offset: i32) -> i32 {
    if offset <= 0 {
        NO_SNAPSHOT
    } else {
        i_file.saturating_add(offset)
    }
}

/// Header of a group or subgroup catalog file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CatalogHeader {
    /// Number of halos in the catalog.
    pub n_halos: i32,
    /// Width of the particle offset field in the companion files.
    pub offset_size: i32,
}

/// Header of a horizontal-tree linkage file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LinkageHeader {
    /// Snapshot step the trees were built with.
    pub step: i32,
    /// Search distance the matcher used.
    pub n_search: i32,
    /// Number of groups in this snapshot.
    pub n_groups: i32,
    /// Number of subgroups in this snapshot.
    pub n_subgroups: i32,
    /// Largest group count over all snapshots.
    pub n_groups_max: i32,
    /// Largest subgroup count over all snapshots.
    pub n_subgroups_max: i32,
    /// Number of subgroup trees.
    pub n_trees_subgroup: i32,
    /// Number of group trees.
    pub n_trees_group: i32,
}

impl LinkageHeader {
    /// Number of `i32` fields in the header.
    pub const FIELDS: usize = 8;
}

/// Linkage record of one group.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GroupRecord {
    /// Match id assigned by the horizontal matcher (negative if unmatched).
    pub id: i32,
    /// Raw lineage-case bits.
    pub tree_case: i32,
    /// Match id of the descendant.
    pub descendant_id: i32,
    /// Tree id (negative if undefined).
    pub tree_id: i32,
    /// One-based snapshot offset to the descendant.
    pub file_offset: i32,
    /// File index of the descendant within its snapshot.
    pub file_index: i32,
    /// Number of subgroup records that follow.
    pub n_subgroups: i32,
}

impl GroupRecord {
    /// Number of `i32` fields in the record.
    pub const FIELDS: usize = 7;

    /// Lineage case of the group.
    pub fn case(&self) -> TreeCase {
        TreeCase::from_raw(self.tree_case)
    }
}

/// Linkage record of one subgroup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SubgroupRecord {
    /// Match id assigned by the horizontal matcher (negative if unmatched).
    pub id: i32,
    /// Raw lineage-case bits.
    pub tree_case: i32,
    /// Match id of the descendant.
    pub descendant_id: i32,
    /// Tree id (negative if undefined).
    pub tree_id: i32,
    /// One-based snapshot offset to the descendant.
    pub file_offset: i32,
    /// File index of the descendant within its snapshot.
    pub file_index: i32,
}

impl SubgroupRecord {
    /// Number of `i32` fields in the record.
    pub const FIELDS: usize = 6;

    /// Lineage case of the subgroup.
    pub fn case(&self) -> TreeCase {
        TreeCase::from_raw(self.tree_case)
    }
}

/// A subgroup as read from its catalog and linkage streams.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubgroupEntry {
    /// File index of the subgroup within its snapshot.
    pub index: i32,
    /// Particle count from the subgroup catalog.
    pub particles: i32,
    /// Linkage record.
    pub record: SubgroupRecord,
}

/// A group and its subgroups as read from one snapshot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroupEntry {
    /// File index of the group within its snapshot.
    pub index: i32,
    /// Particle count from the group catalog.
    pub particles: i32,
    /// Linkage record. `record.n_subgroups == subgroups.len()`.
    pub record: GroupRecord,
    /// Subgroups in file order.
    pub subgroups: Vec<SubgroupEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn root_offsets_have_no_descendant() {
        assert_eq!(descendant_file(3, 0), NO_SNAPSHOT);
        assert_eq!(descendant_file(3, -2), NO_SNAPSHOT);
        assert_eq!(descendant_file(3, 1), 4);
    }

    #[test]
    fn corrupt_offset_saturates() {
        assert_eq!(descendant_file(5, i32::MAX), i32::MAX);
    }

    proptest! {
        #[test]
        fn offset_conversion(i_file in 0i32..1000, offset in -50i32..50) {
            let desc = descendant_file(i_file, offset);
            prop_assert_eq!(offset <= 0, desc == NO_SNAPSHOT);
            if offset > 0 {
                prop_assert_eq!(desc, i_file + offset);
                prop_assert!(desc > i_file);
            }
        }
    }
}
