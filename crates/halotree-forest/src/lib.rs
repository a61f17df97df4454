//! Merger-tree forest construction for halotree.
//!
//! [`TreeBuilder`] sweeps snapshots from the most recent to the oldest,
//! placing each locally owned halo on its forest as a [`TreeNode`] in a
//! [`NodeArena`]. Long-range bridge and back-match pointers are resolved
//! by the [`Resolver`] as their targets appear, and once no further
//! pointer can reach a snapshot its halos are classified (see
//! [`classify`]).
//!
//! The result is a [`Trees`] value holding every node, the local forests,
//! per-snapshot summaries of the soft anomalies found on the way, and a
//! digest of the final lineage flags.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod arena;
pub mod builder;
pub mod classify;
pub mod forest;
pub mod hash;
pub mod node;
pub mod resolver;
pub mod trees;

pub use arena::{NodeArena, SnapshotLookup};
pub use builder::{BuildError, TreeBuilder};
pub use classify::{
    check_emerged_match, ClassifyError, EmergedCounts, FragmentationCounts,
};
pub use forest::{Forest, ForestMapping, KindMapping};
pub use hash::CaseAssignment;
pub use node::{BackMatch, EdgeList, NodeId, TreeNode};
pub use resolver::{PendingPointer, PointerClass, Resolver, ResolverStats};
pub use trees::{Maxima, SnapshotSummary, Trees};
