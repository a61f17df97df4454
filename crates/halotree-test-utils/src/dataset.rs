//! Synthetic snapshot catalogs.

use std::fs::{self, File};

use halotree_catalog::writer::write_snapshot;
use halotree_catalog::{
    CatalogError, FileLayout, GroupEntry, GroupRecord, PointerRecord, PointerSet, PointerTarget,
    SubgroupEntry, SubgroupRecord,
};
use halotree_core::{HaloKind, ReadConfig, TreeCase};

/// One halo's linkage as the matcher would have written it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HaloSpec {
    pub id: i32,
    pub particles: i32,
    pub tree_id: i32,
    pub case: TreeCase,
    pub descendant_id: i32,
    pub file_offset: i32,
    pub file_index: i32,
}

impl HaloSpec {
    /// A halo without a descendant.
    pub fn new(id: i32, particles: i32, tree_id: i32) -> Self {
        Self {
            id,
            particles,
            tree_id,
            case: TreeCase::empty(),
            descendant_id: -1,
            file_offset: 0,
            file_index: -1,
        }
    }

    /// Point the halo at a descendant `offset` snapshots later.
    pub fn descends_to(mut self, offset: i32, index: i32, descendant_id: i32) -> Self {
        self.file_offset = offset;
        self.file_index = index;
        self.descendant_id = descendant_id;
        self
    }

    pub fn with_case(mut self, case: TreeCase) -> Self {
        self.case = case;
        self
    }
}

/// A group and its subgroups.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroupSpec {
    pub halo: HaloSpec,
    pub subgroups: Vec<HaloSpec>,
}

impl GroupSpec {
    pub fn new(halo: HaloSpec) -> Self {
        Self {
            halo,
            subgroups: Vec::new(),
        }
    }

    pub fn with_subgroup(mut self, sub: HaloSpec) -> Self {
        self.subgroups.push(sub);
        self
    }
}

/// Everything stored for one snapshot.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SnapshotData {
    pub groups: Vec<GroupSpec>,
    bridges: Vec<(HaloKind, usize, PointerTarget)>,
    backmatches: Vec<(HaloKind, usize, PointerTarget)>,
}

impl SnapshotData {
    pub fn n_groups(&self) -> usize {
        self.groups.len()
    }

    pub fn n_subgroups(&self) -> usize {
        self.groups.iter().map(|g| g.subgroups.len()).sum()
    }

    /// The group at `index`.
    pub fn group_mut(&mut self, index: usize) -> &mut HaloSpec {
        &mut self.groups[index].halo
    }

    /// The subgroup at file index `index`, counted across groups.
    pub fn subgroup_mut(&mut self, index: usize) -> Option<&mut HaloSpec> {
        self.groups
            .iter_mut()
            .flat_map(|g| g.subgroups.iter_mut())
            .nth(index)
    }

    /// Record a bridge forematch pointer on halo `index`.
    pub fn set_bridge(&mut self, kind: HaloKind, index: usize, offset: i32, target: i32) {
        self.bridges.push((
            kind,
            index,
            PointerTarget {
                offset,
                index: target,
            },
        ));
    }

    /// Record a back-match pointer on halo `index`.
    pub fn set_backmatch(&mut self, kind: HaloKind, index: usize, offset: i32, target: i32) {
        self.backmatches.push((
            kind,
            index,
            PointerTarget {
                offset,
                index: target,
            },
        ));
    }

    /// Entries in file order, subgroup indices running across groups.
    pub fn entries(&self) -> Vec<GroupEntry> {
        let mut next_sub = 0;
        self.groups
            .iter()
            .enumerate()
            .map(|(k, g)| {
                let subgroups = g
                    .subgroups
                    .iter()
                    .map(|s| {
                        let index = next_sub;
                        next_sub += 1;
                        SubgroupEntry {
                            index,
                            particles: s.particles,
                            record: SubgroupRecord {
                                id: s.id,
                                tree_case: s.case.raw(),
                                descendant_id: s.descendant_id,
                                tree_id: s.tree_id,
                                file_offset: s.file_offset,
                                file_index: s.file_index,
                            },
                        }
                    })
                    .collect::<Vec<_>>();
                GroupEntry {
                    index: k as i32,
                    particles: g.halo.particles,
                    record: GroupRecord {
                        id: g.halo.id,
                        tree_case: g.halo.case.raw(),
                        descendant_id: g.halo.descendant_id,
                        tree_id: g.halo.tree_id,
                        file_offset: g.halo.file_offset,
                        file_index: g.halo.file_index,
                        n_subgroups: subgroups.len() as i32,
                    },
                    subgroups,
                }
            })
            .collect()
    }

    /// The pointer file, one record per halo.
    pub fn pointers(&self) -> PointerSet {
        let mut set = PointerSet {
            groups: vec![PointerRecord::default(); self.n_groups()],
            subgroups: vec![PointerRecord::default(); self.n_subgroups()],
        };
        for &(kind, index, target) in &self.bridges {
            if let Some(rec) = record_mut(&mut set, kind, index) {
                rec.forematch = Some(target);
            }
        }
        for &(kind, index, target) in &self.backmatches {
            if let Some(rec) = record_mut(&mut set, kind, index) {
                rec.backmatch = Some(target);
            }
        }
        set
    }
}

fn record_mut(set: &mut PointerSet, kind: HaloKind, index: usize) -> Option<&mut PointerRecord> {
    match kind {
        HaloKind::Group => set.groups.get_mut(index),
        HaloKind::Subgroup => set.subgroups.get_mut(index),
    }
}

/// A synthetic run: a read configuration and one [`SnapshotData`] per
/// file index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Dataset {
    config: ReadConfig,
    snapshots: Vec<SnapshotData>,
}

impl Dataset {
    /// An empty dataset covering every snapshot of `config`.
    pub fn new(config: ReadConfig) -> Self {
        let n = config.n_snaps().max(0) as usize;
        Self {
            config,
            snapshots: vec![SnapshotData::default(); n],
        }
    }

    pub fn config(&self) -> &ReadConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut ReadConfig {
        &mut self.config
    }

    pub fn n_snaps(&self) -> usize {
        self.snapshots.len()
    }

    pub fn snapshot(&self, i_file: usize) -> &SnapshotData {
        &self.snapshots[i_file]
    }

    pub fn snapshot_mut(&mut self, i_file: usize) -> &mut SnapshotData {
        &mut self.snapshots[i_file]
    }

    pub fn snapshots(&self) -> impl Iterator<Item = (usize, &SnapshotData)> {
        self.snapshots.iter().enumerate()
    }

    /// One more than the largest group tree id.
    pub fn n_group_trees(&self) -> i32 {
        self.snapshots
            .iter()
            .flat_map(|s| s.groups.iter().map(|g| g.halo.tree_id))
            .max()
            .map_or(0, |t| t + 1)
    }

    /// One more than the largest subgroup tree id.
    pub fn n_subgroup_trees(&self) -> i32 {
        self.snapshots
            .iter()
            .flat_map(|s| s.groups.iter().flat_map(|g| g.subgroups.iter().map(|h| h.tree_id)))
            .max()
            .map_or(0, |t| t + 1)
    }

    /// Encode every snapshot under `layout`, creating directories.
    pub fn write_to(&self, layout: &FileLayout) -> Result<(), CatalogError> {
        fs::create_dir_all(layout.trees_dir())?;
        if let Some(parent) = layout.halo_root.parent() {
            fs::create_dir_all(parent)?;
        }
        for (i_file, snap) in self.snapshots() {
            let i_read = self.config.snapshot_of(i_file as i32);
            let mut groups = File::create(layout.group_catalog_path(i_read))?;
            let mut subgroups = File::create(layout.subgroup_catalog_path(i_read))?;
            let mut trees = File::create(layout.linkage_path(i_read))?;
            write_snapshot(
                &mut groups,
                &mut subgroups,
                &mut trees,
                self.config.read_step,
                self.config.n_search,
                &snap.entries(),
            )?;
            let mut pointers = File::create(layout.pointers_path(i_read))?;
            snap.pointers().encode(&mut pointers)?;
        }
        Ok(())
    }
}
