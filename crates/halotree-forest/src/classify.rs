//! Lineage classification run when a snapshot's search window closes.
//!
//! Closing a snapshot finalizes main progenitors, confirms or drops
//! emerged back-matches, and classifies fragmented halos. Each pass only
//! touches nodes of the closing snapshot (and flags on their progenitors
//! or candidates), and all pointers that can reach those nodes have been
//! resolved by then.

use halotree_core::{FragmentOutcome, HaloKey, HaloKind, TreeCase};
use thiserror::Error;

use crate::arena::NodeArena;
use crate::node::{NodeId, TreeNode};

/// Fatal inconsistencies found while classifying.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ClassifyError {
    /// A back-match points at a candidate that is not after its origin.
    #[error(
        "invalid emerged {kind} snapshot offset {distance} (candidate {candidate}, origin {origin}); offsets must be positive"
    )]
    NonPositiveEmergedOffset {
        /// Halo population.
        kind: HaloKind,
        /// Address of the candidate.
        candidate: HaloKey,
        /// Address of the origin.
        origin: HaloKey,
        /// Candidate file minus origin file.
        distance: i32,
    },
    /// A node still carries a terminal state when it is classified.
    #[error("invalid {kind} match type {bits:#x} for snapshot {snapshot}, index {index}: unresolved state {unresolved:?}")]
    UnresolvedCase {
        /// Halo population.
        kind: HaloKind,
        /// Snapshot file index.
        snapshot: i32,
        /// Index within the snapshot.
        index: i32,
        /// All raw flag bits of the node.
        bits: u32,
        /// The terminal-state bits that are set.
        unresolved: TreeCase,
    },
}

/// Emerged back-matches kept and dropped while closing one snapshot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EmergedCounts {
    /// Back-matches whose candidate was confirmed.
    pub valid: usize,
    /// Back-matches cleared.
    pub invalid: usize,
}

/// Fragmentation outcomes for one snapshot and halo kind.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FragmentationCounts {
    /// Fragments that could not be matched.
    pub strayed: usize,
    /// Fragments that rejoined their own lineage.
    pub returned: usize,
    /// Fragments that joined another lineage.
    pub exchanged: usize,
}

impl FragmentationCounts {
    fn record(&mut self, outcome: FragmentOutcome) {
        match outcome {
            FragmentOutcome::Strayed => self.strayed += 1,
            FragmentOutcome::Returned => self.returned += 1,
            FragmentOutcome::Exchanged => self.exchanged += 1,
        }
    }

    /// Total classified fragments.
    pub fn total(&self) -> usize {
        self.strayed + self.returned + self.exchanged
    }
}

// ── Progenitors ─────────────────────────────────────────────────

/// Pick main progenitors for `nodes` and flag their progenitors.
pub fn finalize_progenitors(arena: &mut NodeArena, nodes: &[NodeId]) {
    for &id in nodes {
        let progenitors = arena[id].progenitors.clone();
        let main = progenitors.iter().copied().max_by(|&a, &b| {
            arena[a]
                .n_particles
                .cmp(&arena[b].n_particles)
                .then(b.cmp(&a))
        });
        let main_id = main.map_or(-1, |m| arena[m].halo_id);
        {
            let node = &mut arena[id];
            node.main_progenitor = main;
            node.main_progenitor_id = main_id;
            if progenitors.is_empty() {
                node.case.mark_no_progenitors();
            }
        }
        for p in progenitors {
            if Some(p) == main {
                arena[p].case.mark_main_progenitor();
            } else {
                arena[p].case.mark_merger();
            }
        }
    }
}

// ── Emerged halos ───────────────────────────────────────────────

/// Whether `candidate` is a valid emerged match for `origin`.
///
/// The candidate must still be flagged as emerged (or a candidate for it)
/// and lie at most `n_search` snapshots after the origin. A candidate at
/// or before its origin is a fatal inconsistency.
pub fn check_emerged_match(
    candidate: &TreeNode,
    origin: &TreeNode,
    n_search: i32,
) -> Result<bool, ClassifyError> {
    let flagged = candidate.case.is_emerged_or_candidate();
    let distance = candidate.snapshot - origin.snapshot;
    if distance <= 0 {
        return Err(ClassifyError::NonPositiveEmergedOffset {
            kind: origin.kind,
            candidate: candidate.key(),
            origin: origin.key(),
            distance,
        });
    }
    Ok(flagged && distance <= n_search)
}

/// Confirm or clear the back-matches carried by `nodes`.
pub fn validate_emerged(
    arena: &mut NodeArena,
    nodes: &[NodeId],
    n_search: i32,
) -> Result<EmergedCounts, ClassifyError> {
    let mut counts = EmergedCounts::default();
    for &id in nodes {
        let Some(back_match) = arena[id].back_match else {
            continue;
        };
        if check_emerged_match(&arena[back_match.node], &arena[id], n_search)? {
            arena[back_match.node].case.confirm_emerged();
            counts.valid += 1;
        } else {
            arena[id].back_match = None;
            counts.invalid += 1;
        }
    }
    Ok(counts)
}

// ── Fragmented halos ────────────────────────────────────────────

/// Outcome for a fragmented halo.
///
/// `backmatch_id` is the halo id of the node's bridge back-match, or -1
/// when it has none.
pub fn fragment_outcome(
    halo_id: i32,
    case: TreeCase,
    main_progenitor_id: i32,
    backmatch_id: i32,
) -> FragmentOutcome {
    if halo_id < 0 || case.is_strayed() {
        FragmentOutcome::Strayed
    } else if main_progenitor_id == backmatch_id {
        FragmentOutcome::Returned
    } else {
        FragmentOutcome::Exchanged
    }
}

/// Check terminal states and classify the fragmented halos of one kind.
///
/// `is_root` marks the first snapshot read, whose halos cannot be new
/// fragments.
pub fn classify_fragmented(
    arena: &mut NodeArena,
    nodes: &[NodeId],
    is_root: bool,
) -> Result<FragmentationCounts, ClassifyError> {
    let mut counts = FragmentationCounts::default();
    for &id in nodes {
        let node = &arena[id];
        if let Some(unresolved) = node.case.unresolved_state() {
            return Err(ClassifyError::UnresolvedCase {
                kind: node.kind,
                snapshot: node.snapshot,
                index: node.index,
                bits: node.case.bits(),
                unresolved,
            });
        }
        if is_root || !node.case.is_fragmented_new() {
            continue;
        }
        let backmatch_id = node.bridge_backmatch.map_or(-1, |b| arena[b].halo_id);
        let outcome = fragment_outcome(node.halo_id, node.case, node.main_progenitor_id, backmatch_id);
        arena[id].case.set_fragment_outcome(outcome);
        counts.record(outcome);
    }
    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn node(file: i32, index: i32, particles: i32, case: TreeCase) -> TreeNode {
        let mut n = TreeNode::new(HaloKind::Group, HaloKey::new(file, index), 0);
        n.n_particles = particles;
        n.halo_id = 100 * file + index;
        n.case = case;
        n
    }

    #[test]
    fn main_progenitor_is_largest() {
        let mut arena = NodeArena::new();
        let desc = arena.push(node(2, 0, 10, TreeCase::empty()));
        let small = arena.push(node(1, 0, 5, TreeCase::empty()));
        let big = arena.push(node(1, 1, 9, TreeCase::empty()));
        arena[desc].progenitors.extend([small, big]);
        finalize_progenitors(&mut arena, &[desc]);
        assert_eq!(arena[desc].main_progenitor, Some(big));
        assert_eq!(arena[desc].main_progenitor_id, 101);
        assert!(arena[big].case.contains(TreeCase::MAIN_PROGENITOR));
        assert!(arena[small].case.contains(TreeCase::MERGER));
    }

    #[test]
    fn main_progenitor_tie_goes_to_lowest_id() {
        let mut arena = NodeArena::new();
        let desc = arena.push(node(2, 0, 10, TreeCase::empty()));
        let first = arena.push(node(1, 0, 7, TreeCase::empty()));
        let second = arena.push(node(1, 1, 7, TreeCase::empty()));
        arena[desc].progenitors.extend([second, first]);
        finalize_progenitors(&mut arena, &[desc]);
        assert_eq!(arena[desc].main_progenitor, Some(first));
    }

    #[test]
    fn childless_node_is_flagged() {
        let mut arena = NodeArena::new();
        let lone = arena.push(node(0, 0, 10, TreeCase::empty()));
        finalize_progenitors(&mut arena, &[lone]);
        assert_eq!(arena[lone].main_progenitor_id, -1);
        assert!(arena[lone].case.contains(TreeCase::NO_PROGENITORS));
    }

    #[test]
    fn emerged_match_needs_flag_and_window() {
        let origin = node(0, 0, 1, TreeCase::empty());
        let cand = node(2, 0, 1, TreeCase::EMERGED_CANDIDATE);
        assert!(check_emerged_match(&cand, &origin, 2).unwrap());
        assert!(!check_emerged_match(&cand, &origin, 1).unwrap());
        let confirmed = node(2, 0, 1, TreeCase::EMERGED);
        assert!(check_emerged_match(&confirmed, &origin, 3).unwrap());
        let plain = node(1, 0, 1, TreeCase::empty());
        assert!(!check_emerged_match(&plain, &origin, 3).unwrap());
    }

    #[test]
    fn emerged_offset_must_be_positive() {
        let origin = node(3, 0, 1, TreeCase::empty());
        let cand = node(3, 1, 1, TreeCase::EMERGED_CANDIDATE);
        let err = check_emerged_match(&cand, &origin, 4).unwrap_err();
        assert!(matches!(
            err,
            ClassifyError::NonPositiveEmergedOffset { distance: 0, .. }
        ));
    }

    #[test]
    fn validate_confirms_and_clears() {
        let mut arena = NodeArena::new();
        let origin_a = arena.push(node(0, 0, 1, TreeCase::empty()));
        let origin_b = arena.push(node(0, 1, 1, TreeCase::empty()));
        let near = arena.push(node(1, 0, 1, TreeCase::EMERGED_CANDIDATE));
        let far = arena.push(node(3, 0, 1, TreeCase::EMERGED_CANDIDATE));
        arena[origin_a].back_match = Some(crate::node::BackMatch {
            node: near,
            origin_file: 0,
        });
        arena[origin_b].back_match = Some(crate::node::BackMatch {
            node: far,
            origin_file: 0,
        });
        let counts = validate_emerged(&mut arena, &[origin_a, origin_b], 2).unwrap();
        assert_eq!(counts, EmergedCounts { valid: 1, invalid: 1 });
        assert!(arena[near].case.contains(TreeCase::EMERGED));
        assert!(!arena[near].case.contains(TreeCase::EMERGED_CANDIDATE));
        assert!(arena[origin_b].back_match.is_none());
        assert!(arena[far].case.contains(TreeCase::EMERGED_CANDIDATE));
    }

    #[test]
    fn unresolved_state_is_fatal() {
        let mut arena = NodeArena::new();
        let bad = arena.push(node(1, 4, 1, TreeCase::BRIDGE_FINALIZE));
        let err = classify_fragmented(&mut arena, &[bad], true).unwrap_err();
        match err {
            ClassifyError::UnresolvedCase {
                snapshot,
                index,
                unresolved,
                ..
            } => {
                assert_eq!((snapshot, index), (1, 4));
                assert_eq!(unresolved, TreeCase::BRIDGE_FINALIZE);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn root_snapshot_is_not_classified() {
        let mut arena = NodeArena::new();
        let frag = arena.push(node(4, 0, 1, TreeCase::FRAGMENTED_NEW));
        let counts = classify_fragmented(&mut arena, &[frag], true).unwrap();
        assert_eq!(counts.total(), 0);
        assert_eq!(arena[frag].case.fragment_outcome(), None);
    }

    #[test]
    fn unmatched_fragment_strays() {
        let mut arena = NodeArena::new();
        let frag = arena.push(node(1, 0, 1, TreeCase::FRAGMENTED_NEW));
        arena[frag].halo_id = -1;
        let counts = classify_fragmented(&mut arena, &[frag], false).unwrap();
        assert_eq!(counts.strayed, 1);
        assert!(arena[frag].case.contains(TreeCase::FRAGMENTED_STRAYED));
    }

    fn arb_case() -> impl Strategy<Value = TreeCase> {
        any::<u32>().prop_map(|bits| {
            TreeCase::from_bits_retain(bits).difference(TreeCase::TERMINAL_STATES)
                | TreeCase::FRAGMENTED_NEW
        })
    }

    proptest! {
        #[test]
        fn exactly_one_outcome(
            case in arb_case(),
            halo_id in -3i32..5,
            main in -2i32..5,
            back in -2i32..5,
        ) {
            let mut arena = NodeArena::new();
            let mut n = node(1, 0, 1, case);
            n.halo_id = halo_id;
            n.main_progenitor_id = main;
            let frag = arena.push(n);
            if back >= 0 {
                let mut b = node(0, 0, 1, TreeCase::empty());
                b.halo_id = back;
                let b = arena.push(b);
                arena[frag].bridge_backmatch = Some(b);
            }
            let counts = classify_fragmented(&mut arena, &[frag], false).unwrap();
            prop_assert_eq!(counts.total(), 1);
            let outcome = arena[frag].case.fragment_outcome();
            prop_assert!(outcome.is_some());
            let expected = fragment_outcome(halo_id, case, main, if back >= 0 { back } else { -1 });
            prop_assert_eq!(outcome, Some(expected));
        }

        #[test]
        fn emerged_distance_rule(origin in 0i32..20, distance in -5i32..10, n_search in 1i32..6) {
            let o = node(origin, 0, 1, TreeCase::empty());
            let c = node(origin + distance, 0, 1, TreeCase::EMERGED_CANDIDATE);
            match check_emerged_match(&c, &o, n_search) {
                Ok(valid) => {
                    prop_assert!(distance > 0);
                    prop_assert_eq!(valid, distance <= n_search);
                }
                Err(_) => prop_assert!(distance <= 0),
            }
        }
    }
}
