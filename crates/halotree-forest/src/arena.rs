//! Node storage and the construction-time snapshot lookup.
//!
//! [`NodeArena`] owns every node of a read; edges are [`NodeId`]s into it.
//! [`SnapshotLookup`] maps a snapshot address to the local node created
//! for it and records which snapshots are complete. The lookup belongs to
//! the in-progress build and is dropped before the build returns.

use std::ops::{Index, IndexMut};

use halotree_core::{HaloKey, HaloKind};
use indexmap::IndexMap;

use crate::node::{NodeId, TreeNode};

/// Dense storage for all nodes of one read.
#[derive(Clone, Debug, Default)]
pub struct NodeArena {
    nodes: Vec<TreeNode>,
}

impl NodeArena {
    /// Create an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `node` and return its handle.
    pub fn push(&mut self, node: TreeNode) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// The node behind `id`, if any.
    pub fn get(&self, id: NodeId) -> Option<&TreeNode> {
        self.nodes.get(id.index())
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the arena holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes with their handles, in creation order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &TreeNode)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (NodeId(i as u32), n))
    }
}

impl Index<NodeId> for NodeArena {
    type Output = TreeNode;

    fn index(&self, id: NodeId) -> &TreeNode {
        &self.nodes[id.index()]
    }
}

impl IndexMut<NodeId> for NodeArena {
    fn index_mut(&mut self, id: NodeId) -> &mut TreeNode {
        &mut self.nodes[id.index()]
    }
}

/// Per-snapshot index from file-local halo index to local node.
#[derive(Debug)]
pub struct SnapshotLookup {
    tables: Vec<[IndexMap<i32, NodeId>; 2]>,
    built: Vec<bool>,
}

impl SnapshotLookup {
    /// Create an empty lookup for `n_snaps` snapshots.
    pub fn new(n_snaps: usize) -> Self {
        Self {
            tables: (0..n_snaps).map(|_| Default::default()).collect(),
            built: vec![false; n_snaps],
        }
    }

    fn slot(&self, file: i32) -> Option<usize> {
        usize::try_from(file).ok().filter(|&f| f < self.built.len())
    }

    /// Record the node created for `key`.
    pub fn insert(&mut self, kind: HaloKind, key: HaloKey, id: NodeId) {
        if let Some(f) = self.slot(key.file) {
            self.tables[f][kind.slot()].insert(key.index, id);
        }
    }

    /// The local node at `key`, if one was created.
    pub fn get(&self, kind: HaloKind, key: HaloKey) -> Option<NodeId> {
        let f = self.slot(key.file)?;
        self.tables[f][kind.slot()].get(&key.index).copied()
    }

    /// Mark every node of snapshot `file` as created.
    pub fn mark_built(&mut self, file: i32) {
        if let Some(f) = self.slot(file) {
            self.built[f] = true;
        }
    }

    /// Whether snapshot `file` has been fully created.
    pub fn is_built(&self, file: i32) -> bool {
        self.slot(file).is_some_and(|f| self.built[f])
    }

    /// Whether `file` is a snapshot of this read.
    pub fn contains_file(&self, file: i32) -> bool {
        self.slot(file).is_some()
    }
}
