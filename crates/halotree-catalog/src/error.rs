//! Error types for catalog and linkage reading.
//!
//! Every variant here is fatal to a tree read: the builder cannot place
//! halos on trees when the inputs disagree with each other.

use std::io;
use std::path::PathBuf;

use halotree_core::HaloKind;
use thiserror::Error;

/// Errors that can occur while opening or decoding snapshot files.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// An I/O error occurred, including truncated input.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// A snapshot file could not be opened.
    #[error("could not open {}: {source}", path.display())]
    Open {
        /// The path that failed to open.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: io::Error,
    },
    /// The linkage file was written with a different snapshot step.
    #[error("snapshot {snapshot}: snapshot step sizes don't match (file {found} != configured {configured})")]
    StepMismatch {
        /// Snapshot number being read.
        snapshot: i32,
        /// Step recorded in the linkage header.
        found: i32,
        /// Step in the read configuration.
        configured: i32,
    },
    /// Catalog and linkage files disagree on a halo count.
    #[error("snapshot {snapshot}: {kind} counts don't match between datasets (catalog {catalog} != linkage {linkage})")]
    CountMismatch {
        /// Snapshot number being read.
        snapshot: i32,
        /// Which halo population disagrees.
        kind: HaloKind,
        /// Count from the catalog header.
        catalog: i32,
        /// Count from the linkage header.
        linkage: i32,
    },
    /// A header or record declares a negative count.
    #[error("snapshot {snapshot}: negative {what} ({value})")]
    NegativeCount {
        /// Snapshot number being read.
        snapshot: i32,
        /// Which count was negative.
        what: &'static str,
        /// The value found.
        value: i32,
    },
    /// A group declares more subgroups than the header has left.
    #[error("snapshot {snapshot}: group {group} declares {declared} subgroups but only {remaining} remain")]
    SubgroupOverrun {
        /// Snapshot number being read.
        snapshot: i32,
        /// File index of the offending group.
        group: i32,
        /// Subgroups declared by the group record.
        declared: i32,
        /// Subgroups left according to the header.
        remaining: i32,
    },
    /// Fewer subgroups were attached to groups than the header declares.
    #[error("snapshot {snapshot}: groups own {read} subgroups but the header declares {declared}")]
    SubgroupShortfall {
        /// Snapshot number being read.
        snapshot: i32,
        /// Subgroups consumed by group records.
        read: i32,
        /// Subgroups declared by the header.
        declared: i32,
    },
    /// A pointer file disagrees with its snapshot's halo counts.
    #[error("snapshot {snapshot}: pointer file lists {pointers} {kind} pointers for {halos} halos")]
    PointerCountMismatch {
        /// Snapshot number being read.
        snapshot: i32,
        /// Which halo population disagrees.
        kind: HaloKind,
        /// Records in the pointer file.
        pointers: i32,
        /// Halos in the snapshot.
        halos: i32,
    },
}
