//! Tree-to-forest mapping and partition ownership.
//!
//! Every tree id maps to a global forest id. A partition owns a contiguous
//! range `[lo, lo + count)` of forest ids per halo kind. A halo is local
//! when its tree maps into that range; its local forest index is the
//! forest id minus `lo`.

use halotree_core::HaloKind;

use crate::node::NodeId;

/// Tree-to-forest map and owned range for one halo kind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KindMapping {
    tree_to_forest: Vec<i32>,
    forest_lo: i32,
    n_forests_local: i32,
}

impl KindMapping {
    /// Map trees through `tree_to_forest` and own forests
    /// `[forest_lo, forest_lo + n_forests_local)`.
    pub fn new(tree_to_forest: Vec<i32>, forest_lo: i32, n_forests_local: i32) -> Self {
        Self {
            tree_to_forest,
            forest_lo,
            n_forests_local: n_forests_local.max(0),
        }
    }

    /// One forest per tree, all owned locally.
    pub fn identity(n_trees: i32) -> Self {
        Self::new((0..n_trees).collect(), 0, n_trees)
    }

    /// Forest id of `tree_id`, if the tree is defined and mapped.
    pub fn forest_of(&self, tree_id: i32) -> Option<i32> {
        let t = usize::try_from(tree_id).ok()?;
        self.tree_to_forest.get(t).copied().filter(|&f| f >= 0)
    }

    /// Local forest index of `tree_id`, if it is owned by this partition.
    pub fn local_forest(&self, tree_id: i32) -> Option<usize> {
        let local = self.forest_of(tree_id)? - self.forest_lo;
        (0..self.n_forests_local)
            .contains(&local)
            .then_some(local as usize)
    }

    /// First owned forest id.
    pub fn forest_lo(&self) -> i32 {
        self.forest_lo
    }

    /// Number of owned forests.
    pub fn n_forests_local(&self) -> usize {
        self.n_forests_local as usize
    }

    /// Largest forest id any tree maps to, plus one.
    pub fn n_forests(&self) -> i32 {
        self.tree_to_forest.iter().copied().max().map_or(0, |m| m + 1)
    }

    /// The same map with ownership split evenly across `size` partitions.
    ///
    /// Earlier ranks take the remainder, so range sizes differ by at most
    /// one and together cover every forest exactly once.
    pub fn partitioned(&self, rank: usize, size: usize) -> Self {
        let n = self.n_forests().max(0) as usize;
        let size = size.max(1);
        let base = n / size;
        let extra = n % size;
        let lo = rank * base + rank.min(extra);
        let count = base + usize::from(rank < extra);
        Self::new(self.tree_to_forest.clone(), lo as i32, count as i32)
    }
}

/// Forest mappings for both halo kinds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ForestMapping {
    /// Group trees.
    pub groups: KindMapping,
    /// Subgroup trees.
    pub subgroups: KindMapping,
}

impl ForestMapping {
    /// Combine per-kind mappings.
    pub fn new(groups: KindMapping, subgroups: KindMapping) -> Self {
        Self { groups, subgroups }
    }

    /// Identity mappings owning every tree locally.
    pub fn identity(n_group_trees: i32, n_subgroup_trees: i32) -> Self {
        Self::new(
            KindMapping::identity(n_group_trees),
            KindMapping::identity(n_subgroup_trees),
        )
    }

    /// Mapping for one kind.
    pub fn for_kind(&self, kind: HaloKind) -> &KindMapping {
        match kind {
            HaloKind::Group => &self.groups,
            HaloKind::Subgroup => &self.subgroups,
        }
    }

    /// Both kinds split evenly across `size` partitions.
    pub fn partitioned(&self, rank: usize, size: usize) -> Self {
        Self::new(
            self.groups.partitioned(rank, size),
            self.subgroups.partitioned(rank, size),
        )
    }
}

/// One locally owned forest and the nodes placed on it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Forest {
    /// Local forest index.
    pub local: usize,
    /// Global forest id.
    pub forest_id: i32,
    /// Member nodes in creation order.
    pub nodes: Vec<NodeId>,
}

impl Forest {
    /// The owned forests of one kind, all empty.
    pub fn owned(mapping: &KindMapping) -> Vec<Forest> {
        (0..mapping.n_forests_local())
            .map(|local| Forest {
                local,
                forest_id: mapping.forest_lo() + local as i32,
                nodes: Vec::new(),
            })
            .collect()
    }
}
