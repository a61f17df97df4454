//! Deferred resolution of bridge and back-match pointers.
//!
//! Pointer files address halos by snapshot and index. A pointer whose
//! target snapshot has not been built yet is queued under that snapshot
//! and rewritten to a [`NodeId`] once the builder marks it built. The
//! resolver only fills pointer fields (and, with bridge fixing, moves
//! descendant edges); it never creates nodes.

use std::collections::BTreeMap;

use halotree_catalog::PointerSet;
use halotree_core::{Detail, HaloKey, HaloKind, LogContext};

use crate::arena::{NodeArena, SnapshotLookup};
use crate::node::{BackMatch, NodeId};

/// Which pointer set a pointer came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PointerClass {
    /// Forematch of a halo matched to a bridge. Points forward in time.
    Bridge,
    /// Back-match of an emerged candidate. Points backward in time.
    BackMatch,
}

impl PointerClass {
    fn label(self) -> &'static str {
        match self {
            PointerClass::Bridge => "bridge",
            PointerClass::BackMatch => "back-match",
        }
    }
}

/// A pointer waiting for its target snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingPointer {
    /// Pointer set of origin.
    pub class: PointerClass,
    /// Halo population of both ends.
    pub kind: HaloKind,
    /// Node carrying the pointer.
    pub source: NodeId,
    /// File index of the target.
    pub target_file: i32,
    /// Index of the target within its snapshot.
    pub target_index: i32,
}

/// Run-wide pointer statistics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ResolverStats {
    /// Bridge pointers resolved.
    pub bridges: usize,
    /// Back-match pointers resolved.
    pub backmatches: usize,
    /// Pointers that had to wait for their target snapshot.
    pub deferred: usize,
    /// Bridge pointers whose target lay outside the search window.
    pub out_of_window: usize,
    /// Pointers whose target never became a local node.
    pub unresolved: usize,
    /// Descendant edges moved onto a bridge forematch.
    pub redirected: usize,
}

/// Resolves pointer sets against the nodes of one build.
#[derive(Debug)]
pub struct Resolver {
    n_search: i32,
    fix_bridges: bool,
    pending: BTreeMap<i32, Vec<PendingPointer>>,
    stats: ResolverStats,
}

impl Resolver {
    /// Create a resolver for a read with search distance `n_search`.
    pub fn new(n_search: i32, fix_bridges: bool) -> Self {
        Self {
            n_search,
            fix_bridges,
            pending: BTreeMap::new(),
            stats: ResolverStats::default(),
        }
    }

    /// Statistics so far.
    pub fn stats(&self) -> &ResolverStats {
        &self.stats
    }

    /// Number of pointers still queued.
    pub fn pending(&self) -> usize {
        self.pending.values().map(Vec::len).sum()
    }

    /// Take one pointer class from the pointer set of snapshot `i_file`.
    ///
    /// Records of halos that have no local node are ignored.
    pub fn ingest(
        &mut self,
        class: PointerClass,
        i_file: i32,
        set: &PointerSet,
        arena: &mut NodeArena,
        lookup: &SnapshotLookup,
        log: &LogContext,
    ) {
        let before = self.stats;
        let mut read = 0usize;
        for kind in HaloKind::ALL {
            for (index, rec) in set.for_kind(kind).iter().enumerate() {
                let target = match class {
                    PointerClass::Bridge => rec.forematch,
                    PointerClass::BackMatch => rec.backmatch,
                };
                let Some(target) = target else {
                    continue;
                };
                let Some(source) = lookup.get(kind, HaloKey::new(i_file, index as i32)) else {
                    continue;
                };
                read += 1;
                let target_file = target.target_file(i_file);
                if class == PointerClass::Bridge
                    && !(i_file < target_file && target_file <= i_file.saturating_add(self.n_search))
                {
                    self.stats.out_of_window += 1;
                    continue;
                }
                let pointer = PendingPointer {
                    class,
                    kind,
                    source,
                    target_file,
                    target_index: target.index,
                };
                if lookup.is_built(target_file) {
                    self.resolve(pointer, arena, lookup);
                } else if lookup.contains_file(target_file) {
                    self.pending.entry(target_file).or_default().push(pointer);
                    self.stats.deferred += 1;
                } else {
                    self.stats.unresolved += 1;
                }
            }
        }
        if log.shows(Detail::Pointers) {
            tracing::debug!(
                class = class.label(),
                i_file,
                read,
                deferred = self.stats.deferred - before.deferred,
                out_of_window = self.stats.out_of_window - before.out_of_window,
                "pointers ingested"
            );
        }
    }

    /// Resolve every pointer queued on snapshot `file`.
    pub fn on_snapshot_built(&mut self, file: i32, arena: &mut NodeArena, lookup: &SnapshotLookup) {
        if let Some(queue) = self.pending.remove(&file) {
            for pointer in queue {
                self.resolve(pointer, arena, lookup);
            }
        }
    }

    /// Count everything still queued as unresolved and return the totals.
    pub fn finish(&mut self) -> ResolverStats {
        let left = self.pending();
        self.pending.clear();
        self.stats.unresolved += left;
        self.stats
    }

    fn resolve(&mut self, pointer: PendingPointer, arena: &mut NodeArena, lookup: &SnapshotLookup) {
        let key = HaloKey::new(pointer.target_file, pointer.target_index);
        let Some(target) = lookup.get(pointer.kind, key) else {
            self.stats.unresolved += 1;
            return;
        };
        let source = pointer.source;
        match pointer.class {
            PointerClass::Bridge => {
                arena[source].bridge_forematch = Some(target);
                self.stats.bridges += 1;
                if self.fix_bridges && arena[source].case.is_matched_to_bridge() {
                    redirect_descendant(arena, source, target);
                    self.stats.redirected += 1;
                }
            }
            PointerClass::BackMatch => {
                arena[source].bridge_backmatch = Some(target);
                let origin_file = arena[target].snapshot;
                arena[target].back_match = Some(BackMatch {
                    node: source,
                    origin_file,
                });
                self.stats.backmatches += 1;
            }
        }
    }
}

fn redirect_descendant(arena: &mut NodeArena, node: NodeId, to: NodeId) {
    if let Some(old) = arena[node].descendant {
        arena[old].progenitors.retain(|p| *p != node);
    }
    let (file, index) = (arena[to].snapshot, arena[to].index);
    let n = &mut arena[node];
    n.descendant = Some(to);
    n.descendant_file = file;
    n.descendant_index = index;
    arena[to].progenitors.push(node);
}
