//! Halo kinds and snapshot-local addressing.

use std::fmt;

/// Sentinel file index for "no snapshot" (e.g. a halo with no descendant).
pub const NO_SNAPSHOT: i32 = -1;

/// The two halo populations carried by every snapshot.
///
/// Groups are top-level halos; subgroups are substructures owned by
/// exactly one group of the same snapshot. Each kind has its own file
/// index space, forest mapping, and pointer sets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HaloKind {
    /// A top-level halo (friends-of-friends group).
    Group,
    /// A substructure within a group.
    Subgroup,
}

impl HaloKind {
    /// Both kinds, groups first (the order records appear in a snapshot).
    pub const ALL: [HaloKind; 2] = [HaloKind::Group, HaloKind::Subgroup];

    /// Dense index usable for `[T; 2]` per-kind tables.
    pub fn slot(self) -> usize {
        match self {
            HaloKind::Group => 0,
            HaloKind::Subgroup => 1,
        }
    }

    /// Plural noun used in log messages.
    pub fn plural(self) -> &'static str {
        match self {
            HaloKind::Group => "groups",
            HaloKind::Subgroup => "subgroups",
        }
    }
}

impl fmt::Display for HaloKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HaloKind::Group => write!(f, "group"),
            HaloKind::Subgroup => write!(f, "subgroup"),
        }
    }
}

/// Address of one halo: its snapshot file index and its file-local index.
///
/// File indices count snapshots in read order from the oldest (0) to the
/// most recent (`n_snaps - 1`), independent of the on-disk snapshot
/// numbering and the read step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HaloKey {
    /// Snapshot file index.
    pub file: i32,
    /// Index of the halo within its snapshot's catalog.
    pub index: i32,
}

impl HaloKey {
    /// Create a new key.
    pub fn new(file: i32, index: i32) -> Self {
        Self { file, index }
    }
}

impl fmt::Display for HaloKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_slots_are_dense() {
        assert_eq!(HaloKind::Group.slot(), 0);
        assert_eq!(HaloKind::Subgroup.slot(), 1);
        assert_eq!(HaloKind::ALL[1], HaloKind::Subgroup);
    }

    #[test]
    fn key_orders_by_file_then_index() {
        assert!(HaloKey::new(1, 9) < HaloKey::new(2, 0));
        assert!(HaloKey::new(2, 0) < HaloKey::new(2, 1));
        assert_eq!(HaloKey::new(3, 4).to_string(), "3:4");
    }
}
