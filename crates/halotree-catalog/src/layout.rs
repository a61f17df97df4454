//! Where snapshot streams come from.
//!
//! The tree builder only asks a [`CatalogSource`] for readers; it never
//! builds paths. [`FileLayout`] is the on-disk naming scheme:
//!
//! ```text
//! {tree_root}/horizontal/trees/horizontal_trees_{i_read:03}.dat
//! {tree_root}/horizontal/trees/horizontal_trees_pointers_{i_read:03}.dat
//! {halo_root}_{i_read:03}.catalog_groups
//! {halo_root}_{i_read:03}.catalog_subgroups
//! ```

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use crate::error::CatalogError;
use crate::pointers::PointerSet;
use crate::reader::SnapshotReader;

/// Supplies per-snapshot readers to the tree builder.
pub trait CatalogSource {
    /// Byte stream type backing the readers.
    type Stream: Read;

    /// Open the group catalog, subgroup catalog, and linkage streams of
    /// snapshot `i_read` (file index `i_file`).
    fn open_snapshot(
        &self,
        i_read: i32,
        i_file: i32,
        step: i32,
    ) -> Result<SnapshotReader<Self::Stream>, CatalogError>;

    /// Read the pointer set of snapshot `i_read`.
    fn open_pointers(&self, i_read: i32, i_file: i32) -> Result<PointerSet, CatalogError>;
}

/// On-disk file naming for a tree run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileLayout {
    /// Root directory of the tree outputs.
    pub tree_root: PathBuf,
    /// Path prefix of the halo catalogs (the snapshot suffix is appended).
    pub halo_root: PathBuf,
}

impl FileLayout {
    /// Create a layout.
    pub fn new(tree_root: impl Into<PathBuf>, halo_root: impl Into<PathBuf>) -> Self {
        Self {
            tree_root: tree_root.into(),
            halo_root: halo_root.into(),
        }
    }

    /// Directory holding the linkage and pointer files.
    pub fn trees_dir(&self) -> PathBuf {
        self.tree_root.join("horizontal").join("trees")
    }

    /// Linkage file of snapshot `i_read`.
    pub fn linkage_path(&self, i_read: i32) -> PathBuf {
        self.trees_dir()
            .join(format!("horizontal_trees_{i_read:03}.dat"))
    }

    /// Pointer file of snapshot `i_read`.
    pub fn pointers_path(&self, i_read: i32) -> PathBuf {
        self.trees_dir()
            .join(format!("horizontal_trees_pointers_{i_read:03}.dat"))
    }

    /// Group catalog of snapshot `i_read`.
    pub fn group_catalog_path(&self, i_read: i32) -> PathBuf {
        self.catalog_path(i_read, "catalog_groups")
    }

    /// Subgroup catalog of snapshot `i_read`.
    pub fn subgroup_catalog_path(&self, i_read: i32) -> PathBuf {
        self.catalog_path(i_read, "catalog_subgroups")
    }

    fn catalog_path(&self, i_read: i32, ext: &str) -> PathBuf {
        let mut name = self.halo_root.clone().into_os_string();
        name.push(format!("_{i_read:03}.{ext}"));
        PathBuf::from(name)
    }
}

fn open_file(path: &Path) -> Result<BufReader<File>, CatalogError> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| CatalogError::Open {
            path: path.to_path_buf(),
            source,
        })
}

impl CatalogSource for FileLayout {
    type Stream = BufReader<File>;

    fn open_snapshot(
        &self,
        i_read: i32,
        i_file: i32,
        step: i32,
    ) -> Result<SnapshotReader<Self::Stream>, CatalogError> {
        let groups = open_file(&self.group_catalog_path(i_read))?;
        let subgroups = open_file(&self.subgroup_catalog_path(i_read))?;
        let trees = open_file(&self.linkage_path(i_read))?;
        SnapshotReader::open(i_read, i_file, step, groups, subgroups, trees)
    }

    fn open_pointers(&self, i_read: i32, _i_file: i32) -> Result<PointerSet, CatalogError> {
        let mut file = open_file(&self.pointers_path(i_read))?;
        PointerSet::decode(&mut file, i_read)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pointers::{PointerRecord, PointerTarget};
    use crate::types::{GroupEntry, GroupRecord};
    use crate::writer::write_snapshot;

    #[test]
    fn paths_follow_naming_scheme() {
        let layout = FileLayout::new("/runs/a", "/halos/subfind");
        assert_eq!(
            layout.linkage_path(7),
            PathBuf::from("/runs/a/horizontal/trees/horizontal_trees_007.dat")
        );
        assert_eq!(
            layout.pointers_path(120),
            PathBuf::from("/runs/a/horizontal/trees/horizontal_trees_pointers_120.dat")
        );
        assert_eq!(
            layout.group_catalog_path(7),
            PathBuf::from("/halos/subfind_007.catalog_groups")
        );
        assert_eq!(
            layout.subgroup_catalog_path(7),
            PathBuf::from("/halos/subfind_007.catalog_subgroups")
        );
    }

    #[test]
    fn missing_file_names_path() {
        let dir = tempfile::tempdir().unwrap();
        let layout = FileLayout::new(dir.path(), dir.path().join("halos"));
        match layout.open_snapshot(3, 0, 1) {
            Err(CatalogError::Open { path, .. }) => {
                assert_eq!(path, layout.group_catalog_path(3));
            }
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("opened a missing snapshot"),
        }
    }

    #[test]
    fn reads_back_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let layout = FileLayout::new(dir.path().join("trees"), dir.path().join("halos"));
        std::fs::create_dir_all(layout.trees_dir()).unwrap();

        let entries = vec![GroupEntry {
            index: 0,
            particles: 64,
            record: GroupRecord {
                id: 1,
                tree_case: 0,
                descendant_id: -1,
                tree_id: 0,
                file_offset: 0,
                file_index: -1,
                n_subgroups: 0,
            },
            subgroups: Vec::new(),
        }];
        let mut groups = File::create(layout.group_catalog_path(5)).unwrap();
        let mut subgroups = File::create(layout.subgroup_catalog_path(5)).unwrap();
        let mut trees = File::create(layout.linkage_path(5)).unwrap();
        write_snapshot(&mut groups, &mut subgroups, &mut trees, 1, 1, &entries).unwrap();

        let pointers = PointerSet {
            groups: vec![PointerRecord {
                forematch: Some(PointerTarget { offset: 1, index: 0 }),
                backmatch: None,
            }],
            subgroups: Vec::new(),
        };
        let mut file = File::create(layout.pointers_path(5)).unwrap();
        pointers.encode(&mut file).unwrap();
        drop((groups, subgroups, trees, file));

        let read: Vec<GroupEntry> = layout
            .open_snapshot(5, 0, 1)
            .unwrap()
            .groups()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(read, entries);
        assert_eq!(layout.open_pointers(5, 0).unwrap(), pointers);
    }
}
