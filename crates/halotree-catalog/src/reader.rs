//! Snapshot reader over the catalog and linkage streams.
//!
//! [`SnapshotReader`] reads the three headers of one snapshot on
//! construction and checks them against each other. The group and
//! subgroup records are then decoded lazily, one group at a time.

use std::io::Read;

use halotree_core::HaloKind;

use crate::codec::{
    decode_catalog_header, decode_group_record, decode_linkage_header, decode_subgroup_record,
    read_i32_le,
};
use crate::error::CatalogError;
use crate::types::{CatalogHeader, GroupEntry, LinkageHeader, SubgroupEntry};

/// Reads one snapshot's groups and subgroups in file order.
///
/// Generic over `R: Read` so tests can use `&[u8]` and the file layout
/// can use `BufReader<File>`.
pub struct SnapshotReader<R: Read> {
    groups: R,
    subgroups: R,
    trees: R,
    i_read: i32,
    i_file: i32,
    header: LinkageHeader,
    groups_read: i32,
    subgroups_read: i32,
    finished: bool,
}

impl<R: Read> SnapshotReader<R> {
    /// Open a snapshot, reading and validating all three headers.
    pub fn open(
        i_read: i32,
        i_file: i32,
        read_step: i32,
        mut groups: R,
        mut subgroups: R,
        mut trees: R,
    ) -> Result<Self, CatalogError> {
        let group_catalog = decode_catalog_header(&mut groups)?;
        let subgroup_catalog = decode_catalog_header(&mut subgroups)?;
        let header = decode_linkage_header(&mut trees)?;

        if header.step != read_step {
            return Err(CatalogError::StepMismatch {
                snapshot: i_read,
                found: header.step,
                configured: read_step,
            });
        }
        check_count(i_read, HaloKind::Group, &group_catalog, header.n_groups)?;
        check_count(i_read, HaloKind::Subgroup, &subgroup_catalog, header.n_subgroups)?;
        tracing::trace!(
            i_read,
            n_groups = header.n_groups,
            n_subgroups = header.n_subgroups,
            n_search = header.n_search,
            "snapshot headers validated"
        );

        Ok(Self {
            groups,
            subgroups,
            trees,
            i_read,
            i_file,
            header,
            groups_read: 0,
            subgroups_read: 0,
            finished: false,
        })
    }

    /// Snapshot number being read.
    pub fn i_read(&self) -> i32 {
        self.i_read
    }

    /// File index of the snapshot.
    pub fn i_file(&self) -> i32 {
        self.i_file
    }

    /// The validated linkage header.
    pub fn header(&self) -> &LinkageHeader {
        &self.header
    }

    /// Number of groups in the snapshot.
    pub fn n_groups(&self) -> i32 {
        self.header.n_groups
    }

    /// Number of subgroups in the snapshot.
    pub fn n_subgroups(&self) -> i32 {
        self.header.n_subgroups
    }

    /// Read the next group, or `None` after the last one.
    ///
    /// Returning `None` also checks that the groups consumed exactly the
    /// number of subgroups the header declares.
    pub fn next_group(&mut self) -> Result<Option<GroupEntry>, CatalogError> {
        if self.groups_read == self.header.n_groups {
            if !self.finished {
                self.finished = true;
                if self.subgroups_read != self.header.n_subgroups {
                    return Err(CatalogError::SubgroupShortfall {
                        snapshot: self.i_read,
                        read: self.subgroups_read,
                        declared: self.header.n_subgroups,
                    });
                }
            }
            return Ok(None);
        }

        let index = self.groups_read;
        let particles = read_i32_le(&mut self.groups)?;
        let record = decode_group_record(&mut self.trees)?;
        if record.n_subgroups < 0 {
            return Err(CatalogError::NegativeCount {
                snapshot: self.i_read,
                what: "group subgroup count",
                value: record.n_subgroups,
            });
        }
        let remaining = self.header.n_subgroups - self.subgroups_read;
        if record.n_subgroups > remaining {
            return Err(CatalogError::SubgroupOverrun {
                snapshot: self.i_read,
                group: index,
                declared: record.n_subgroups,
                remaining,
            });
        }

        let mut subgroups = Vec::with_capacity(record.n_subgroups as usize);
        for _ in 0..record.n_subgroups {
            let particles = read_i32_le(&mut self.subgroups)?;
            let record = decode_subgroup_record(&mut self.trees)?;
            subgroups.push(SubgroupEntry {
                index: self.subgroups_read,
                particles,
                record,
            });
            self.subgroups_read += 1;
        }
        self.groups_read += 1;

        Ok(Some(GroupEntry {
            index,
            particles,
            record,
            subgroups,
        }))
    }

    /// Convert into a group iterator.
    pub fn groups(self) -> GroupIter<R> {
        GroupIter {
            reader: self,
            done: false,
        }
    }
}

fn check_count(
    snapshot: i32,
    kind: HaloKind,
    catalog: &CatalogHeader,
    linkage: i32,
) -> Result<(), CatalogError> {
    if linkage < 0 {
        return Err(CatalogError::NegativeCount {
            snapshot,
            what: kind.plural(),
            value: linkage,
        });
    }
    if catalog.n_halos != linkage {
        return Err(CatalogError::CountMismatch {
            snapshot,
            kind,
            catalog: catalog.n_halos,
            linkage,
        });
    }
    Ok(())
}

/// Iterator adapter over a snapshot's groups.
///
/// Stops after the first error.
pub struct GroupIter<R: Read> {
    reader: SnapshotReader<R>,
    done: bool,
}

impl<R: Read> Iterator for GroupIter<R> {
    type Item = Result<GroupEntry, CatalogError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.reader.next_group() {
            Ok(Some(group)) => Some(Ok(group)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{GroupRecord, SubgroupRecord};
    use crate::writer::{linkage_header_for, write_catalog, write_linkage, write_snapshot};

    fn group(index: i32, n_sub: i32, first_sub: i32) -> GroupEntry {
        GroupEntry {
            index,
            particles: 100 + index,
            record: GroupRecord {
                id: 10 + index,
                tree_case: 0,
                descendant_id: -1,
                tree_id: index,
                file_offset: 0,
                file_index: -1,
                n_subgroups: n_sub,
            },
            subgroups: (0..n_sub)
                .map(|k| SubgroupEntry {
                    index: first_sub + k,
                    particles: 20 + first_sub + k,
                    record: SubgroupRecord {
                        id: 50 + first_sub + k,
                        tree_case: 0,
                        descendant_id: -1,
                        tree_id: first_sub + k,
                        file_offset: 0,
                        file_index: -1,
                    },
                })
                .collect(),
        }
    }

    fn entries() -> Vec<GroupEntry> {
        vec![group(0, 2, 0), group(1, 0, 2), group(2, 1, 2)]
    }

    struct Streams {
        groups: Vec<u8>,
        subgroups: Vec<u8>,
        trees: Vec<u8>,
    }

    fn encode(step: i32, entries: &[GroupEntry]) -> Streams {
        let mut s = Streams {
            groups: Vec::new(),
            subgroups: Vec::new(),
            trees: Vec::new(),
        };
        write_snapshot(&mut s.groups, &mut s.subgroups, &mut s.trees, step, 2, entries).unwrap();
        s
    }

    fn open(s: &Streams, step: i32) -> Result<SnapshotReader<&[u8]>, CatalogError> {
        SnapshotReader::open(
            9,
            3,
            step,
            s.groups.as_slice(),
            s.subgroups.as_slice(),
            s.trees.as_slice(),
        )
    }

    #[test]
    fn reads_groups_in_file_order() {
        let written = entries();
        let streams = encode(1, &written);
        let reader = open(&streams, 1).unwrap();
        assert_eq!(reader.n_groups(), 3);
        assert_eq!(reader.n_subgroups(), 3);
        let read: Vec<GroupEntry> = reader.groups().collect::<Result<_, _>>().unwrap();
        assert_eq!(read, written);
    }

    #[test]
    fn subgroup_indices_run_across_groups() {
        let streams = encode(1, &entries());
        let mut reader = open(&streams, 1).unwrap();
        let mut seen = Vec::new();
        while let Some(g) = reader.next_group().unwrap() {
            seen.extend(g.subgroups.iter().map(|s| s.index));
        }
        assert_eq!(seen, vec![0, 1, 2]);
        // Exhausted readers keep returning None.
        assert!(reader.next_group().unwrap().is_none());
    }

    #[test]
    fn zero_subgroup_group_is_valid() {
        let streams = encode(1, &[group(0, 0, 0)]);
        let mut reader = open(&streams, 1).unwrap();
        let g = reader.next_group().unwrap().unwrap();
        assert!(g.subgroups.is_empty());
        assert!(reader.next_group().unwrap().is_none());
    }

    #[test]
    fn step_mismatch_is_fatal() {
        let streams = encode(2, &entries());
        let err = open(&streams, 1).err().unwrap();
        assert!(matches!(
            err,
            CatalogError::StepMismatch {
                snapshot: 9,
                found: 2,
                configured: 1
            }
        ));
    }

    #[test]
    fn group_count_mismatch_is_fatal() {
        let written = entries();
        let mut streams = encode(1, &written);
        streams.groups.clear();
        write_catalog(&mut streams.groups, &[1, 2]).unwrap();
        let err = open(&streams, 1).err().unwrap();
        assert!(matches!(
            err,
            CatalogError::CountMismatch {
                kind: HaloKind::Group,
                catalog: 2,
                linkage: 3,
                ..
            }
        ));
    }

    #[test]
    fn subgroup_count_mismatch_is_fatal() {
        let mut streams = encode(1, &entries());
        streams.subgroups.clear();
        write_catalog(&mut streams.subgroups, &[1, 2, 3, 4]).unwrap();
        let err = open(&streams, 1).err().unwrap();
        assert!(matches!(
            err,
            CatalogError::CountMismatch {
                snapshot: 9,
                kind: HaloKind::Subgroup,
                catalog: 4,
                linkage: 3,
            }
        ));
    }

    #[test]
    fn subgroup_overrun_is_fatal() {
        let mut written = entries();
        written[2].record.n_subgroups = 5;
        let mut streams = encode(1, &written);
        streams.trees.clear();
        let header = linkage_header_for(1, 2, &entries());
        write_linkage(&mut streams.trees, &header, &written).unwrap();
        let mut reader = open(&streams, 1).unwrap();
        reader.next_group().unwrap();
        reader.next_group().unwrap();
        let err = reader.next_group().unwrap_err();
        assert!(matches!(
            err,
            CatalogError::SubgroupOverrun {
                group: 2,
                declared: 5,
                remaining: 1,
                ..
            }
        ));
    }

    #[test]
    fn subgroup_shortfall_is_fatal() {
        let written = entries();
        let mut header = linkage_header_for(1, 2, &written);
        header.n_subgroups = 4;
        let mut streams = encode(1, &written);
        streams.trees.clear();
        write_linkage(&mut streams.trees, &header, &written).unwrap();
        streams.subgroups.clear();
        write_catalog(&mut streams.subgroups, &[1, 2, 3, 4]).unwrap();
        let results: Vec<_> = open(&streams, 1).unwrap().groups().collect();
        assert_eq!(results.len(), 4);
        assert!(matches!(
            results[3],
            Err(CatalogError::SubgroupShortfall {
                read: 3,
                declared: 4,
                ..
            })
        ));
    }

    #[test]
    fn truncated_linkage_is_io_error() {
        let mut streams = encode(1, &entries());
        streams.trees.truncate(streams.trees.len() - 4);
        let results: Vec<_> = open(&streams, 1).unwrap().groups().collect();
        assert!(matches!(results.last(), Some(Err(CatalogError::Io(_)))));
    }
}
