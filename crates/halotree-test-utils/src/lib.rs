//! Test utilities for halotree development.
//!
//! Provides a [`Dataset`] builder for synthetic snapshot catalogs, a
//! [`MemorySource`] that serves an encoded dataset through
//! [`CatalogSource`](halotree_catalog::CatalogSource) without touching the
//! disk, and standard fixtures in [`fixtures`].

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod dataset;
pub mod fixtures;
pub mod memory;

pub use dataset::{Dataset, GroupSpec, HaloSpec, SnapshotData};
pub use memory::MemorySource;
