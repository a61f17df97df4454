//! Per-snapshot bridge and back-match pointer sets.

use std::io::{Read, Write};

use halotree_core::HaloKind;

use crate::codec::{decode_pointer_record, encode_pointer_record, read_i32_le, write_i32_le};
use crate::error::CatalogError;

/// An offset/index pair naming a halo in another snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PointerTarget {
    /// Snapshot offset from the halo carrying the pointer.
    pub offset: i32,
    /// Index of the target within its snapshot.
    pub index: i32,
}

impl PointerTarget {
    /// File index of the target, given the file index of the source.
    ///
    /// Saturates, so an offset past either end of `i32` gives a file
    /// index that no read contains.
    pub fn target_file(&self, source_file: i32) -> i32 {
        source_file.saturating_add(self.offset)
    }
}

/// Pointers carried by one halo.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PointerRecord {
    /// Later halo an emerged bridge was matched to.
    pub forematch: Option<PointerTarget>,
    /// Earlier halo this one was back-matched from.
    pub backmatch: Option<PointerTarget>,
}

/// One snapshot's pointer file: a record per group, then per subgroup.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PointerSet {
    /// Group records in file order.
    pub groups: Vec<PointerRecord>,
    /// Subgroup records in file order.
    pub subgroups: Vec<PointerRecord>,
}

impl PointerSet {
    /// Records for one halo population.
    pub fn for_kind(&self, kind: HaloKind) -> &[PointerRecord] {
        match kind {
            HaloKind::Group => &self.groups,
            HaloKind::Subgroup => &self.subgroups,
        }
    }

    /// Decode a pointer file. `snapshot` is only used in error messages.
    pub fn decode(r: &mut dyn Read, snapshot: i32) -> Result<Self, CatalogError> {
        let n_groups = read_count(r, snapshot, "pointer group count")?;
        let n_subgroups = read_count(r, snapshot, "pointer subgroup count")?;
        // Counts are unchecked until `check_counts`; reserve nothing from them.
        let mut groups = Vec::new();
        for _ in 0..n_groups {
            groups.push(decode_pointer_record(r)?);
        }
        let mut subgroups = Vec::new();
        for _ in 0..n_subgroups {
            subgroups.push(decode_pointer_record(r)?);
        }
        Ok(Self { groups, subgroups })
    }

    /// Encode in the on-disk layout.
    pub fn encode(&self, w: &mut dyn Write) -> Result<(), CatalogError> {
        write_i32_le(w, self.groups.len() as i32)?;
        write_i32_le(w, self.subgroups.len() as i32)?;
        for rec in self.groups.iter().chain(&self.subgroups) {
            encode_pointer_record(w, rec)?;
        }
        Ok(())
    }

    /// Check that the set has one record per halo of its snapshot.
    pub fn check_counts(
        &self,
        snapshot: i32,
        n_groups: i32,
        n_subgroups: i32,
    ) -> Result<(), CatalogError> {
        for (kind, halos) in [
            (HaloKind::Group, n_groups),
            (HaloKind::Subgroup, n_subgroups),
        ] {
            let pointers = self.for_kind(kind).len() as i32;
            if pointers != halos {
                return Err(CatalogError::PointerCountMismatch {
                    snapshot,
                    kind,
                    pointers,
                    halos,
                });
            }
        }
        Ok(())
    }
}

fn read_count(r: &mut dyn Read, snapshot: i32, what: &'static str) -> Result<usize, CatalogError> {
    let value = read_i32_le(r)?;
    usize::try_from(value).map_err(|_| CatalogError::NegativeCount {
        snapshot,
        what,
        value,
    })
}
