//! Halotree: distributed merger-tree construction and halo-lineage
//! classification.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all halotree sub-crates. Most users only need `halotree` as a single
//! dependency.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use halotree::prelude::*;
//!
//! let config = ReadConfig::new(0, 63, 1, 4).with_all_passes();
//! let layout = FileLayout::new("out/trees", "out/halos/run");
//! // One forest per tree, everything owned by this process.
//! let mapping = ForestMapping::identity(1024, 4096);
//! let log = LogContext::default();
//!
//! let trees = TreeBuilder::new(config, mapping, &log)
//!     .build(&layout, &mut SingleRank::new())
//!     .unwrap();
//! println!("{} nodes, digest {:016x}", trees.arena().len(), trees.case_digest());
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `halotree-core` | Halo kinds, keys, lineage flags, read configuration, logging context |
//! | [`catalog`] | `halotree-catalog` | Catalog, linkage and pointer file formats |
//! | [`collective`] | `halotree-collective` | Cross-partition reductions |
//! | [`forest`] | `halotree-forest` | Forest construction, pointer resolution, classification |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core vocabulary (`halotree-core`).
///
/// [`types::TreeCase`] is the lineage flag set every node carries;
/// [`types::ReadConfig`] holds the run parameters.
pub use halotree_core as types;

/// Input formats (`halotree-catalog`).
///
/// Read snapshots with [`catalog::SnapshotReader`], or implement
/// [`catalog::CatalogSource`] to serve them from somewhere other than
/// [`catalog::FileLayout`].
pub use halotree_catalog as catalog;

/// Cross-partition collectives (`halotree-collective`).
pub use halotree_collective as collective;

/// Forest construction and lineage classification (`halotree-forest`).
pub use halotree_forest as forest;

/// Common imports for a tree read.
pub mod prelude {
    pub use halotree_core::{
        FragmentOutcome, HaloKey, HaloKind, LogContext, ReadConfig, TreeCase,
    };

    pub use halotree_catalog::{CatalogError, CatalogSource, FileLayout};

    pub use halotree_collective::{Collective, LocalCluster, SingleRank};

    pub use halotree_forest::{
        BuildError, ForestMapping, KindMapping, NodeId, TreeBuilder, TreeNode, Trees,
    };
}
