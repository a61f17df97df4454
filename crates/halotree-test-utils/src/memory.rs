//! In-memory [`CatalogSource`] over an encoded [`Dataset`].

use std::collections::BTreeMap;
use std::io::{self, Cursor};
use std::sync::Mutex;

use halotree_catalog::writer::write_snapshot;
use halotree_catalog::{CatalogError, CatalogSource, PointerSet, SnapshotReader};

use crate::dataset::Dataset;

#[derive(Clone, Debug, Default)]
struct Encoded {
    groups: Vec<u8>,
    subgroups: Vec<u8>,
    trees: Vec<u8>,
    pointers: Vec<u8>,
}

/// Serves encoded snapshots by snapshot number.
///
/// Keeps a log of every pointer file read so tests can check the read
/// schedule.
#[derive(Debug, Default)]
pub struct MemorySource {
    snapshots: BTreeMap<i32, Encoded>,
    pointer_reads: Mutex<Vec<i32>>,
}

fn missing(i_read: i32, what: &str) -> CatalogError {
    CatalogError::Open {
        path: format!("memory://{what}/{i_read:03}").into(),
        source: io::Error::from(io::ErrorKind::NotFound),
    }
}

impl MemorySource {
    /// Encode every snapshot of `dataset`.
    pub fn new(dataset: &Dataset) -> Result<Self, CatalogError> {
        let config = dataset.config();
        let mut snapshots = BTreeMap::new();
        for (i_file, snap) in dataset.snapshots() {
            let mut enc = Encoded::default();
            write_snapshot(
                &mut enc.groups,
                &mut enc.subgroups,
                &mut enc.trees,
                config.read_step,
                config.n_search,
                &snap.entries(),
            )?;
            snap.pointers().encode(&mut enc.pointers)?;
            snapshots.insert(config.snapshot_of(i_file as i32), enc);
        }
        Ok(Self {
            snapshots,
            pointer_reads: Mutex::new(Vec::new()),
        })
    }

    /// Replace the linkage stream of snapshot `i_read` with raw bytes.
    pub fn set_linkage(&mut self, i_read: i32, bytes: Vec<u8>) {
        self.snapshots.entry(i_read).or_default().trees = bytes;
    }

    /// Replace the pointer file of snapshot `i_read`.
    pub fn set_pointers(&mut self, i_read: i32, set: &PointerSet) -> Result<(), CatalogError> {
        let enc = self.snapshots.entry(i_read).or_default();
        enc.pointers.clear();
        set.encode(&mut enc.pointers)
    }

    /// Drop snapshot `i_read` entirely.
    pub fn remove(&mut self, i_read: i32) {
        self.snapshots.remove(&i_read);
    }

    /// File indices of the pointer files read so far, in order.
    pub fn pointer_reads(&self) -> Vec<i32> {
        self.pointer_reads
            .lock()
            .map(|log| log.clone())
            .unwrap_or_default()
    }
}

impl CatalogSource for MemorySource {
    type Stream = Cursor<Vec<u8>>;

    fn open_snapshot(
        &self,
        i_read: i32,
        i_file: i32,
        step: i32,
    ) -> Result<SnapshotReader<Self::Stream>, CatalogError> {
        let enc = self
            .snapshots
            .get(&i_read)
            .ok_or_else(|| missing(i_read, "snapshot"))?;
        SnapshotReader::open(
            i_read,
            i_file,
            step,
            Cursor::new(enc.groups.clone()),
            Cursor::new(enc.subgroups.clone()),
            Cursor::new(enc.trees.clone()),
        )
    }

    fn open_pointers(&self, i_read: i32, i_file: i32) -> Result<PointerSet, CatalogError> {
        let enc = self
            .snapshots
            .get(&i_read)
            .ok_or_else(|| missing(i_read, "pointers"))?;
        if let Ok(mut log) = self.pointer_reads.lock() {
            log.push(i_file);
        }
        PointerSet::decode(&mut enc.pointers.as_slice(), i_read)
    }
}
