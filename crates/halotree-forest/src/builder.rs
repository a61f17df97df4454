//! Forest construction over a descending snapshot sweep.
//!
//! [`TreeBuilder::build`] reads snapshots from the most recent to the
//! oldest. Each snapshot goes through the same steps:
//!
//! 1. Create nodes for the locally owned groups and their subgroups, and
//!    wire each to its (already built) descendant.
//! 2. Reduce group ownership across partitions.
//! 3. Mark the snapshot built, resolving pointers that waited for it.
//! 4. Read the bridge and back-match pointer sets due at this point.
//! 5. Close every snapshot whose search window is now complete.
//!
//! Snapshot `s` closes once file index `s - n_search - 1` has been read,
//! the point after which no further pointer can reach it.

use halotree_catalog::{
    descendant_file, CatalogError, CatalogSource, GroupEntry, GroupRecord, SubgroupRecord,
};
use halotree_collective::{reduce_ownership, Collective, CollectiveError};
use halotree_core::{ConfigError, Detail, HaloKey, HaloKind, LogContext, ReadConfig, TreeCase};
use thiserror::Error;

use crate::arena::{NodeArena, SnapshotLookup};
use crate::classify::{
    classify_fragmented, finalize_progenitors, validate_emerged, ClassifyError, EmergedCounts,
};
use crate::forest::{Forest, ForestMapping};
use crate::node::{NodeId, TreeNode};
use crate::resolver::{PointerClass, Resolver};
use crate::trees::{Maxima, SnapshotSummary, Trees};

/// Errors that stop a tree read.
#[derive(Debug, Error)]
pub enum BuildError {
    /// The read configuration is invalid.
    #[error("invalid read configuration: {0}")]
    Config(#[from] ConfigError),
    /// An input file is missing or inconsistent.
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    /// A collective call failed.
    #[error(transparent)]
    Collective(#[from] CollectiveError),
    /// Classification found an inconsistent node.
    #[error(transparent)]
    Classify(#[from] ClassifyError),
}

/// Reads one partition's merger trees.
#[derive(Debug)]
pub struct TreeBuilder<'a> {
    config: ReadConfig,
    mapping: ForestMapping,
    log: &'a LogContext,
}

/// Mutable state of one build. The lookup lives only as long as this.
struct BuildState {
    arena: NodeArena,
    lookup: SnapshotLookup,
    forests: [Vec<Forest>; 2],
    snapshots: Vec<[Vec<NodeId>; 2]>,
    halo_counts: Vec<(i32, i32)>,
    summaries: Vec<SnapshotSummary>,
}

impl BuildState {
    fn new(config: &ReadConfig, mapping: &ForestMapping) -> Self {
        let n_snaps = config.n_snaps() as usize;
        Self {
            arena: NodeArena::new(),
            lookup: SnapshotLookup::new(n_snaps),
            forests: HaloKind::ALL.map(|kind| Forest::owned(mapping.for_kind(kind))),
            snapshots: (0..n_snaps).map(|_| Default::default()).collect(),
            halo_counts: vec![(0, 0); n_snaps],
            summaries: (0..n_snaps as i32)
                .map(|i_file| SnapshotSummary::new(config.snapshot_of(i_file), i_file))
                .collect(),
        }
    }

    /// Store a node, register it, and wire it to its descendant.
    ///
    /// Returns the handle and whether a descendant was expected but is not
    /// a local node.
    fn place(&mut self, node: TreeNode) -> (NodeId, bool) {
        let kind = node.kind;
        let key = node.key();
        let forest = node.forest;
        let desc = node.descendant_key();
        let id = self.arena.push(node);
        self.lookup.insert(kind, key, id);
        self.forests[kind.slot()][forest].nodes.push(id);
        self.snapshots[key.file as usize][kind.slot()].push(id);

        let Some(desc) = desc else {
            return (id, false);
        };
        match self.lookup.get(kind, desc) {
            Some(d) => {
                self.arena[id].descendant = Some(d);
                self.arena[d].progenitors.push(id);
                (id, false)
            }
            None => (id, true),
        }
    }

    fn into_trees(self, resolver: &mut Resolver) -> Trees {
        let mut trees = Trees {
            arena: self.arena,
            forests: self.forests,
            snapshots: self.snapshots,
            summaries: self.summaries,
            resolver: resolver.finish(),
            maxima: Maxima::default(),
        };
        trees.compute_maxima();
        trees
    }
}

/// Linkage fields shared by group and subgroup records.
struct Link {
    id: i32,
    tree_id: i32,
    case: TreeCase,
    file_offset: i32,
    file_index: i32,
}

impl From<&GroupRecord> for Link {
    fn from(r: &GroupRecord) -> Self {
        Self {
            id: r.id,
            tree_id: r.tree_id,
            case: r.case(),
            file_offset: r.file_offset,
            file_index: r.file_index,
        }
    }
}

impl From<&SubgroupRecord> for Link {
    fn from(r: &SubgroupRecord) -> Self {
        Self {
            id: r.id,
            tree_id: r.tree_id,
            case: r.case(),
            file_offset: r.file_offset,
            file_index: r.file_index,
        }
    }
}

fn node_for(kind: HaloKind, key: HaloKey, forest: usize, particles: i32, link: Link) -> TreeNode {
    let mut node = TreeNode::new(kind, key, forest);
    node.halo_id = link.id;
    node.tree_id = link.tree_id;
    node.n_particles = particles;
    node.case = link.case;
    node.descendant_file = descendant_file(key.file, link.file_offset);
    node.descendant_index = link.file_index;
    node
}

impl<'a> TreeBuilder<'a> {
    /// Create a builder for `config`, owning the forests in `mapping`.
    pub fn new(config: ReadConfig, mapping: ForestMapping, log: &'a LogContext) -> Self {
        Self {
            config,
            mapping,
            log,
        }
    }

    /// The read configuration.
    pub fn config(&self) -> &ReadConfig {
        &self.config
    }

    /// Read every snapshot and return this partition's trees.
    ///
    /// Every partition of a run must call this with the same
    /// configuration and inputs; the collective is used once per snapshot.
    pub fn build<S, C>(&self, source: &S, comm: &mut C) -> Result<Trees, BuildError>
    where
        S: CatalogSource + ?Sized,
        C: Collective + ?Sized,
    {
        self.config.validate()?;
        let config = &self.config;
        let n_snaps = config.n_snaps();
        let _span = tracing::info_span!(
            "read_trees",
            rank = comm.rank(),
            read_start = config.read_start,
            read_stop = config.read_stop,
        )
        .entered();

        let mut state = BuildState::new(config, &self.mapping);
        let mut resolver = Resolver::new(config.n_search, config.fix_bridges);
        let mut next_to_close = n_snaps - 1;

        for i_file in (0..n_snaps).rev() {
            let i_read = config.snapshot_of(i_file);
            let _snap = tracing::info_span!("snapshot", i_read, i_file).entered();

            self.read_snapshot(source, comm, &mut state, i_read, i_file)?;
            resolver.on_snapshot_built(i_file, &mut state.arena, &state.lookup);

            if config.extended_pointers {
                let _backfill = tracing::debug_span!("pointer_backfill").entered();
                let _quiet = self.log.quieter(1);
                self.read_pointers(source, &mut state, &mut resolver, PointerClass::Bridge, i_file)?;
                let i_file_backmatch = i_file.saturating_add(config.n_search);
                if i_file_backmatch < n_snaps {
                    self.read_pointers(
                        source,
                        &mut state,
                        &mut resolver,
                        PointerClass::BackMatch,
                        i_file_backmatch,
                    )?;
                }
            }

            self.log_snapshot(&state.summaries[i_file as usize]);

            while next_to_close >= 0 && next_to_close > i_file.saturating_add(config.n_search) {
                self.close(&mut state, next_to_close)?;
                next_to_close -= 1;
            }
        }

        if config.extended_pointers {
            let _backfill = tracing::debug_span!("pointer_backfill", trailing = true).entered();
            let _quiet = self.log.quieter(1);
            for i_file_backmatch in (0..config.n_search.min(n_snaps)).rev() {
                self.read_pointers(
                    source,
                    &mut state,
                    &mut resolver,
                    PointerClass::BackMatch,
                    i_file_backmatch,
                )?;
            }
        }

        while next_to_close >= 0 {
            self.close(&mut state, next_to_close)?;
            next_to_close -= 1;
        }

        let trees = state.into_trees(&mut resolver);
        if self.log.shows(Detail::Summary) {
            let stats = trees.resolver_stats();
            tracing::info!(
                nodes = trees.arena().len(),
                bridges = stats.bridges,
                backmatches = stats.backmatches,
                deferred = stats.deferred,
                out_of_window = stats.out_of_window,
                unresolved = stats.unresolved,
                "trees read"
            );
        }
        Ok(trees)
    }

    fn read_snapshot<S, C>(
        &self,
        source: &S,
        comm: &mut C,
        state: &mut BuildState,
        i_read: i32,
        i_file: i32,
    ) -> Result<(), BuildError>
    where
        S: CatalogSource + ?Sized,
        C: Collective + ?Sized,
    {
        let mut reader = source.open_snapshot(i_read, i_file, self.config.read_step)?;
        let n_groups = reader.n_groups();
        let n_subgroups = reader.n_subgroups();
        let mut claimed = vec![0i32; n_groups as usize];
        let mut summary = state.summaries[i_file as usize];
        summary.n_groups = n_groups;
        summary.n_subgroups = n_subgroups;

        while let Some(group) = reader.next_group()? {
            let group_node = self.place_group(state, &mut summary, i_file, &group);
            if group_node.is_some() {
                claimed[group.index as usize] = 1;
            }
            for sub in &group.subgroups {
                let Some(forest) = self.mapping.subgroups.local_forest(sub.record.tree_id) else {
                    continue;
                };
                let Some(parent) = group_node else {
                    summary.orphaned_subgroups += 1;
                    continue;
                };
                let mut node = node_for(
                    HaloKind::Subgroup,
                    HaloKey::new(i_file, sub.index),
                    forest,
                    sub.particles,
                    Link::from(&sub.record),
                );
                node.group = Some(parent);
                let (id, missing) = state.place(node);
                state.arena[parent].subgroups.push(id);
                summary.subgroups_local += 1;
                summary.descendants_missing += usize::from(missing);
            }
        }

        summary.ownership = reduce_ownership(comm, &mut claimed)?;
        state.halo_counts[i_file as usize] = (n_groups, n_subgroups);
        state.lookup.mark_built(i_file);

        if summary.orphaned_subgroups > 0 {
            tracing::warn!(
                orphaned = summary.orphaned_subgroups,
                "local subgroups in groups owned elsewhere were not added"
            );
        }
        state.summaries[i_file as usize] = summary;
        Ok(())
    }

    fn place_group(
        &self,
        state: &mut BuildState,
        summary: &mut SnapshotSummary,
        i_file: i32,
        group: &GroupEntry,
    ) -> Option<NodeId> {
        let forest = self.mapping.groups.local_forest(group.record.tree_id)?;
        let node = node_for(
            HaloKind::Group,
            HaloKey::new(i_file, group.index),
            forest,
            group.particles,
            Link::from(&group.record),
        );
        let (id, missing) = state.place(node);
        summary.groups_local += 1;
        summary.descendants_missing += usize::from(missing);
        Some(id)
    }

    fn read_pointers<S>(
        &self,
        source: &S,
        state: &mut BuildState,
        resolver: &mut Resolver,
        class: PointerClass,
        i_file: i32,
    ) -> Result<(), BuildError>
    where
        S: CatalogSource + ?Sized,
    {
        let i_read = self.config.snapshot_of(i_file);
        let set = source.open_pointers(i_read, i_file)?;
        let (n_groups, n_subgroups) = state.halo_counts[i_file as usize];
        set.check_counts(i_read, n_groups, n_subgroups)?;
        resolver.ingest(class, i_file, &set, &mut state.arena, &state.lookup, self.log);
        Ok(())
    }

    /// Finalize, validate, and classify snapshot `s`.
    fn close(&self, state: &mut BuildState, s: i32) -> Result<(), BuildError> {
        let _span = tracing::debug_span!("classify", i_file = s).entered();
        let slot = s as usize;
        for kind in HaloKind::ALL {
            finalize_progenitors(&mut state.arena, &state.snapshots[slot][kind.slot()]);
        }

        let mut emerged = EmergedCounts::default();
        if self.config.extended_pointers {
            for kind in HaloKind::ALL {
                let counts = validate_emerged(
                    &mut state.arena,
                    &state.snapshots[slot][kind.slot()],
                    self.config.n_search,
                )?;
                emerged.valid += counts.valid;
                emerged.invalid += counts.invalid;
            }
        }

        let summary = &mut state.summaries[slot];
        summary.emerged = emerged;
        if self.config.compute_fragmented {
            let is_root = s == self.config.root_file();
            summary.fragmented_groups = classify_fragmented(
                &mut state.arena,
                &state.snapshots[slot][HaloKind::Group.slot()],
                is_root,
            )?;
            summary.fragmented_subgroups = classify_fragmented(
                &mut state.arena,
                &state.snapshots[slot][HaloKind::Subgroup.slot()],
                is_root,
            )?;
        }

        if self.log.shows(Detail::Snapshot) {
            let f_g = summary.fragmented_groups;
            let f_s = summary.fragmented_subgroups;
            if f_g.total() + f_s.total() > 0 {
                tracing::info!(
                    i_read = summary.i_read,
                    group_strayed = f_g.strayed,
                    group_returned = f_g.returned,
                    group_exchanged = f_g.exchanged,
                    subgroup_strayed = f_s.strayed,
                    subgroup_returned = f_s.returned,
                    subgroup_exchanged = f_s.exchanged,
                    "fragmented halos classified"
                );
            }
            if emerged.valid + emerged.invalid > 0 {
                tracing::info!(
                    i_read = summary.i_read,
                    valid = emerged.valid,
                    invalid = emerged.invalid,
                    "emerged back-matches checked"
                );
            }
        }
        Ok(())
    }

    fn log_snapshot(&self, summary: &SnapshotSummary) {
        if !self.log.shows(Detail::Snapshot) {
            return;
        }
        tracing::info!(
            n_groups = summary.n_groups,
            n_subgroups = summary.n_subgroups,
            groups_local = summary.groups_local,
            subgroups_local = summary.subgroups_local,
            descendants_missing = summary.descendants_missing,
            "snapshot read"
        );
    }
}
