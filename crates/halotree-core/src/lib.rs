//! Core types for the halotree merger-tree engine.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the vocabulary shared by every other halotree crate: halo kinds,
//! snapshot addressing, the [`TreeCase`] lineage flag set, the
//! [`ReadConfig`] run parameters, and the explicit [`LogContext`] handle
//! that is passed through component boundaries.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod case;
pub mod config;
pub mod id;
pub mod log;

pub use case::{FragmentOutcome, TreeCase};
pub use config::{ConfigError, ReadConfig};
pub use id::{HaloKey, HaloKind, NO_SNAPSHOT};
pub use log::{Detail, LogContext, VerbosityGuard};
