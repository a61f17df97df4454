//! Encoders that produce catalog and linkage files.
//!
//! The tree reader never writes; these exist so fixtures and tests can
//! produce inputs in exactly the layout [`SnapshotReader`](crate::SnapshotReader)
//! consumes.

use std::io::Write;

use crate::codec::{
    encode_catalog_header, encode_group_record, encode_linkage_header, encode_subgroup_record,
    write_i32s_le,
};
use crate::error::CatalogError;
use crate::types::{CatalogHeader, GroupEntry, LinkageHeader};

/// Particle-offset width recorded in catalogs written by this module.
pub const DEFAULT_OFFSET_SIZE: i32 = 4;

/// Write a catalog file: header then one particle count per halo.
pub fn write_catalog(w: &mut dyn Write, particles: &[i32]) -> Result<(), CatalogError> {
    encode_catalog_header(
        w,
        &CatalogHeader {
            n_halos: particles.len() as i32,
            offset_size: DEFAULT_OFFSET_SIZE,
        },
    )?;
    write_i32s_le(w, particles)
}

/// Write a linkage file with an explicit header.
///
/// The header is written as given, so callers can produce inputs whose
/// counts disagree with `entries`.
pub fn write_linkage(
    w: &mut dyn Write,
    header: &LinkageHeader,
    entries: &[GroupEntry],
) -> Result<(), CatalogError> {
    encode_linkage_header(w, header)?;
    for group in entries {
        encode_group_record(w, &group.record)?;
        for sub in &group.subgroups {
            encode_subgroup_record(w, &sub.record)?;
        }
    }
    Ok(())
}

/// Linkage header consistent with `entries`.
pub fn linkage_header_for(step: i32, n_search: i32, entries: &[GroupEntry]) -> LinkageHeader {
    let n_groups = entries.len() as i32;
    let n_subgroups = entries.iter().map(|g| g.subgroups.len() as i32).sum();
    LinkageHeader {
        step,
        n_search,
        n_groups,
        n_subgroups,
        n_groups_max: n_groups,
        n_subgroups_max: n_subgroups,
        n_trees_subgroup: 0,
        n_trees_group: 0,
    }
}

/// Write all three streams of one snapshot from its entries.
pub fn write_snapshot(
    groups: &mut dyn Write,
    subgroups: &mut dyn Write,
    trees: &mut dyn Write,
    step: i32,
    n_search: i32,
    entries: &[GroupEntry],
) -> Result<(), CatalogError> {
    let group_particles: Vec<i32> = entries.iter().map(|g| g.particles).collect();
    let subgroup_particles: Vec<i32> = entries
        .iter()
        .flat_map(|g| g.subgroups.iter().map(|s| s.particles))
        .collect();
    write_catalog(groups, &group_particles)?;
    write_catalog(subgroups, &subgroup_particles)?;
    write_linkage(trees, &linkage_header_for(step, n_search, entries), entries)
}
