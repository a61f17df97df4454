//! Tree nodes and their arena handles.

use std::fmt;

use halotree_core::{HaloKey, HaloKind, TreeCase, NO_SNAPSHOT};
use smallvec::SmallVec;

/// Index of a node in a [`NodeArena`](crate::NodeArena).
///
/// Handles stay valid for the lifetime of the arena; nodes are never
/// removed individually.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Position in the arena's backing vector.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A back-match recorded on the earlier (origin) node.
///
/// `node` is the later emerged candidate that matched back onto the
/// origin. The distance `node.snapshot - origin_file` must be positive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BackMatch {
    /// The later candidate.
    pub node: NodeId,
    /// File index of the origin node.
    pub origin_file: i32,
}

/// Inline capacity of per-node edge lists. Most halos have one or two
/// progenitors and a handful of subgroups.
pub const EDGE_INLINE: usize = 4;

/// Edge list type for progenitors and subgroups.
pub type EdgeList = SmallVec<[NodeId; EDGE_INLINE]>;

/// One halo placed on a local forest.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreeNode {
    /// Group or subgroup.
    pub kind: HaloKind,
    /// Snapshot file index.
    pub snapshot: i32,
    /// Index within the snapshot's catalog.
    pub index: i32,
    /// Match id from the linkage file (negative if unmatched).
    pub halo_id: i32,
    /// Tree id from the linkage file.
    pub tree_id: i32,
    /// Local forest index.
    pub forest: usize,
    /// Particle count from the catalog.
    pub n_particles: i32,
    /// Lineage flags.
    pub case: TreeCase,
    /// File index of the descendant, or [`NO_SNAPSHOT`].
    pub descendant_file: i32,
    /// Index of the descendant within its snapshot.
    pub descendant_index: i32,
    /// Resolved descendant, if it is local.
    pub descendant: Option<NodeId>,
    /// Owning group (subgroups only).
    pub group: Option<NodeId>,
    /// Subgroups in file order (groups only).
    pub subgroups: EdgeList,
    /// Local nodes whose descendant is this node.
    pub progenitors: EdgeList,
    /// Progenitor with the most particles.
    pub main_progenitor: Option<NodeId>,
    /// Halo id of the main progenitor, or -1.
    pub main_progenitor_id: i32,
    /// Later halo this bridge's emerged fragment matched to.
    pub bridge_forematch: Option<NodeId>,
    /// Earlier halo this node was back-matched from.
    pub bridge_backmatch: Option<NodeId>,
    /// Later candidate that back-matched onto this node.
    pub back_match: Option<BackMatch>,
}

impl TreeNode {
    /// A node with no edges.
    pub fn new(kind: HaloKind, key: HaloKey, forest: usize) -> Self {
        Self {
            kind,
            snapshot: key.file,
            index: key.index,
            halo_id: -1,
            tree_id: -1,
            forest,
            n_particles: 0,
            case: TreeCase::empty(),
            descendant_file: NO_SNAPSHOT,
            descendant_index: -1,
            descendant: None,
            group: None,
            subgroups: EdgeList::new(),
            progenitors: EdgeList::new(),
            main_progenitor: None,
            main_progenitor_id: -1,
            bridge_forematch: None,
            bridge_backmatch: None,
            back_match: None,
        }
    }

    /// Snapshot address of the node.
    pub fn key(&self) -> HaloKey {
        HaloKey::new(self.snapshot, self.index)
    }

    /// Address of the descendant, if the node has one.
    pub fn descendant_key(&self) -> Option<HaloKey> {
        (self.descendant_file >= 0).then(|| HaloKey::new(self.descendant_file, self.descendant_index))
    }
}
