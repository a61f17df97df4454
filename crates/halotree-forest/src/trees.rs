//! The result of a tree read.

use halotree_collective::OwnershipReport;
use halotree_core::HaloKind;

use crate::arena::NodeArena;
use crate::classify::{EmergedCounts, FragmentationCounts};
use crate::forest::Forest;
use crate::hash::{case_digest, CaseAssignment};
use crate::node::{NodeId, TreeNode};
use crate::resolver::ResolverStats;

/// What happened while reading and closing one snapshot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SnapshotSummary {
    /// Snapshot number.
    pub i_read: i32,
    /// File index.
    pub i_file: i32,
    /// Groups in the snapshot files.
    pub n_groups: i32,
    /// Subgroups in the snapshot files.
    pub n_subgroups: i32,
    /// Group nodes created locally.
    pub groups_local: usize,
    /// Subgroup nodes created locally.
    pub subgroups_local: usize,
    /// Reduced group ownership.
    pub ownership: OwnershipReport,
    /// Local subgroups whose group belongs to another partition.
    pub orphaned_subgroups: usize,
    /// Local nodes whose descendant is not a local node.
    pub descendants_missing: usize,
    /// Emerged back-matches validated when the snapshot closed.
    pub emerged: EmergedCounts,
    /// Fragmented groups classified when the snapshot closed.
    pub fragmented_groups: FragmentationCounts,
    /// Fragmented subgroups classified when the snapshot closed.
    pub fragmented_subgroups: FragmentationCounts,
}

impl SnapshotSummary {
    pub(crate) fn new(i_read: i32, i_file: i32) -> Self {
        Self {
            i_read,
            i_file,
            ..Self::default()
        }
    }
}

/// Largest local populations, for sizing per-snapshot and per-forest
/// buffers downstream.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Maxima {
    /// Most local groups in one snapshot.
    pub groups_per_snapshot: usize,
    /// Most local subgroups in one snapshot.
    pub subgroups_per_snapshot: usize,
    /// Most groups on one local group forest.
    pub groups_per_forest: usize,
    /// Most subgroups on one local subgroup forest.
    pub subgroups_per_forest: usize,
}

/// Merger trees of one partition.
#[derive(Debug)]
pub struct Trees {
    pub(crate) arena: NodeArena,
    pub(crate) forests: [Vec<Forest>; 2],
    pub(crate) snapshots: Vec<[Vec<NodeId>; 2]>,
    pub(crate) summaries: Vec<SnapshotSummary>,
    pub(crate) resolver: ResolverStats,
    pub(crate) maxima: Maxima,
}

impl Trees {
    pub(crate) fn compute_maxima(&mut self) {
        let per_snap = |slot: usize| self.snapshots.iter().map(|s| s[slot].len()).max().unwrap_or(0);
        let per_forest = |slot: usize| {
            self.forests[slot]
                .iter()
                .map(|f| f.nodes.len())
                .max()
                .unwrap_or(0)
        };
        let maxima = Maxima {
            groups_per_snapshot: per_snap(HaloKind::Group.slot()),
            subgroups_per_snapshot: per_snap(HaloKind::Subgroup.slot()),
            groups_per_forest: per_forest(HaloKind::Group.slot()),
            subgroups_per_forest: per_forest(HaloKind::Subgroup.slot()),
        };
        self.maxima = maxima;
    }

    /// All nodes.
    pub fn arena(&self) -> &NodeArena {
        &self.arena
    }

    /// The node behind `id`.
    pub fn node(&self, id: NodeId) -> &TreeNode {
        &self.arena[id]
    }

    /// Number of snapshots read.
    pub fn n_snaps(&self) -> usize {
        self.snapshots.len()
    }

    /// Local forests of one kind, by local index.
    pub fn forests(&self, kind: HaloKind) -> &[Forest] {
        &self.forests[kind.slot()]
    }

    /// Local nodes of one kind at file index `i_file`, in file order.
    pub fn snapshot_nodes(&self, i_file: usize, kind: HaloKind) -> &[NodeId] {
        self.snapshots
            .get(i_file)
            .map(|s| s[kind.slot()].as_slice())
            .unwrap_or(&[])
    }

    /// The local node of `kind` at (`i_file`, `index`), if any.
    pub fn find(&self, kind: HaloKind, i_file: usize, index: i32) -> Option<NodeId> {
        self.snapshot_nodes(i_file, kind)
            .iter()
            .copied()
            .find(|&id| self.arena[id].index == index)
    }

    /// Per-snapshot summaries by file index.
    pub fn summaries(&self) -> &[SnapshotSummary] {
        &self.summaries
    }

    /// Run-wide pointer statistics.
    pub fn resolver_stats(&self) -> &ResolverStats {
        &self.resolver
    }

    /// Largest local populations.
    pub fn maxima(&self) -> &Maxima {
        &self.maxima
    }

    /// Halo id of `node`, or -1 for none.
    pub fn halo_id(&self, node: Option<NodeId>) -> i32 {
        node.map_or(-1, |id| self.arena[id].halo_id)
    }

    /// Every node's final flags, in creation order.
    pub fn case_assignments(&self) -> Vec<CaseAssignment> {
        self.arena
            .iter()
            .map(|(_, n)| CaseAssignment {
                kind: n.kind,
                key: n.key(),
                case: n.case,
            })
            .collect()
    }

    /// Digest of [`case_assignments`](Self::case_assignments).
    pub fn case_digest(&self) -> u64 {
        case_digest(&self.case_assignments())
    }
}
