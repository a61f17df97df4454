//! Halo catalog and horizontal-tree linkage reading for halotree.
//!
//! Every snapshot contributes three streams: a group catalog, a subgroup
//! catalog, and a linkage ("horizontal tree") file. [`SnapshotReader`]
//! validates their headers against each other and then yields one
//! [`GroupEntry`] per group, in file order, each carrying its subgroups.
//! Optional pointer files carry the bridge and back-match sets decoded
//! by [`PointerSet`].
//!
//! # Format
//!
//! All integers are little-endian `i32`:
//!
//! ```text
//! catalog:  [n_halos] [offset_size] [n_particles × n_halos]
//! linkage:  [step] [n_search] [n_groups] [n_subgroups]
//!           [n_groups_max] [n_subgroups_max] [n_trees_subgroup] [n_trees_group]
//!           { [group × 7] { [subgroup × 6] } × n_subgroups } × n_groups
//! pointers: [n_groups] [n_subgroups] { [fore_off] [fore_idx] [back_off] [back_idx] } × (n_groups + n_subgroups)
//! ```
//!
//! The encoders used to produce these files are in [`codec`] and
//! [`writer`]; [`FileLayout`] maps snapshot numbers onto on-disk names.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod codec;
pub mod error;
pub mod layout;
pub mod pointers;
pub mod reader;
pub mod types;
pub mod writer;

pub use error::CatalogError;
pub use layout::{CatalogSource, FileLayout};
pub use pointers::{PointerRecord, PointerSet, PointerTarget};
pub use reader::{GroupIter, SnapshotReader};
pub use types::{
    descendant_file, CatalogHeader, GroupEntry, GroupRecord, LinkageHeader, SubgroupEntry,
    SubgroupRecord,
};
