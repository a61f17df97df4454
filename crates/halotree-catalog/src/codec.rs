//! Binary encode/decode for the catalog, linkage, and pointer formats.
//!
//! All integers are little-endian `i32`. There is no magic number, no
//! padding, and no version field; consistency is checked across files
//! instead (see [`SnapshotReader`](crate::SnapshotReader)).

use std::io::{Read, Write};

use crate::error::CatalogError;
use crate::pointers::{PointerRecord, PointerTarget};
use crate::types::{CatalogHeader, GroupRecord, LinkageHeader, SubgroupRecord};

// ── Primitives ──────────────────────────────────────────────────

/// Write a little-endian i32.
pub fn write_i32_le(w: &mut dyn Write, v: i32) -> Result<(), CatalogError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

/// Write a run of little-endian i32s.
pub fn write_i32s_le(w: &mut dyn Write, values: &[i32]) -> Result<(), CatalogError> {
    for &v in values {
        write_i32_le(w, v)?;
    }
    Ok(())
}

/// Read a little-endian i32.
pub fn read_i32_le(r: &mut dyn Read) -> Result<i32, CatalogError> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(i32::from_le_bytes(buf))
}

/// Read `N` consecutive little-endian i32s.
pub fn read_i32s_le<const N: usize>(r: &mut dyn Read) -> Result<[i32; N], CatalogError> {
    let mut out = [0i32; N];
    for v in &mut out {
        *v = read_i32_le(r)?;
    }
    Ok(out)
}

// ── Catalog ─────────────────────────────────────────────────────

/// Encode a catalog header.
pub fn encode_catalog_header(w: &mut dyn Write, h: &CatalogHeader) -> Result<(), CatalogError> {
    write_i32s_le(w, &[h.n_halos, h.offset_size])
}

/// Decode a catalog header.
pub fn decode_catalog_header(r: &mut dyn Read) -> Result<CatalogHeader, CatalogError> {
    let [n_halos, offset_size] = read_i32s_le::<2>(r)?;
    Ok(CatalogHeader {
        n_halos,
        offset_size,
    })
}

// ── Linkage ─────────────────────────────────────────────────────

/// Encode a linkage header.
pub fn encode_linkage_header(w: &mut dyn Write, h: &LinkageHeader) -> Result<(), CatalogError> {
    write_i32s_le(
        w,
        &[
            h.step,
            h.n_search,
            h.n_groups,
            h.n_subgroups,
            h.n_groups_max,
            h.n_subgroups_max,
            h.n_trees_subgroup,
            h.n_trees_group,
        ],
    )
}

/// Decode a linkage header.
pub fn decode_linkage_header(r: &mut dyn Read) -> Result<LinkageHeader, CatalogError> {
    let f = read_i32s_le::<{ LinkageHeader::FIELDS }>(r)?;
    Ok(LinkageHeader {
        step: f[0],
        n_search: f[1],
        n_groups: f[2],
        n_subgroups: f[3],
        n_groups_max: f[4],
        n_subgroups_max: f[5],
        n_trees_subgroup: f[6],
        n_trees_group: f[7],
    })
}

/// Encode a group linkage record.
pub fn encode_group_record(w: &mut dyn Write, g: &GroupRecord) -> Result<(), CatalogError> {
    write_i32s_le(
        w,
        &[
            g.id,
            g.tree_case,
            g.descendant_id,
            g.tree_id,
            g.file_offset,
            g.file_index,
            g.n_subgroups,
        ],
    )
}

/// Decode a group linkage record.
pub fn decode_group_record(r: &mut dyn Read) -> Result<GroupRecord, CatalogError> {
    let f = read_i32s_le::<{ GroupRecord::FIELDS }>(r)?;
    Ok(GroupRecord {
        id: f[0],
        tree_case: f[1],
        descendant_id: f[2],
        tree_id: f[3],
        file_offset: f[4],
        file_index: f[5],
        n_subgroups: f[6],
    })
}

/// Encode a subgroup linkage record.
pub fn encode_subgroup_record(w: &mut dyn Write, s: &SubgroupRecord) -> Result<(), CatalogError> {
    write_i32s_le(
        w,
        &[
            s.id,
            s.tree_case,
            s.descendant_id,
            s.tree_id,
            s.file_offset,
            s.file_index,
        ],
    )
}

/// Decode a subgroup linkage record.
pub fn decode_subgroup_record(r: &mut dyn Read) -> Result<SubgroupRecord, CatalogError> {
    let f = read_i32s_le::<{ SubgroupRecord::FIELDS }>(r)?;
    Ok(SubgroupRecord {
        id: f[0],
        tree_case: f[1],
        descendant_id: f[2],
        tree_id: f[3],
        file_offset: f[4],
        file_index: f[5],
    })
}

// ── Pointers ────────────────────────────────────────────────────

fn target_fields(t: Option<PointerTarget>) -> [i32; 2] {
    match t {
        Some(t) => [t.offset, t.index],
        None => [0, -1],
    }
}

fn target_from_fields(offset: i32, index: i32) -> Option<PointerTarget> {
    (index >= 0).then_some(PointerTarget { offset, index })
}

/// Encode one halo's pointer record.
pub fn encode_pointer_record(w: &mut dyn Write, p: &PointerRecord) -> Result<(), CatalogError> {
    let [fo, fi] = target_fields(p.forematch);
    let [bo, bi] = target_fields(p.backmatch);
    write_i32s_le(w, &[fo, fi, bo, bi])
}

/// Decode one halo's pointer record. A negative index means "no pointer".
pub fn decode_pointer_record(r: &mut dyn Read) -> Result<PointerRecord, CatalogError> {
    let [fo, fi, bo, bi] = read_i32s_le::<4>(r)?;
    Ok(PointerRecord {
        forematch: target_from_fields(fo, fi),
        backmatch: target_from_fields(bo, bi),
    })
}
