//! Partitioned reads over an in-process cluster.

use std::thread;

use halotree_collective::{Collective, LocalCluster, OwnershipReport, SingleRank};
use halotree_core::{HaloKind, LogContext};
use halotree_forest::{CaseAssignment, ForestMapping, KindMapping, TreeBuilder, Trees};
use halotree_test_utils::fixtures::chain_dataset;
use halotree_test_utils::{Dataset, MemorySource};

const N_TREES: i32 = 5;

fn owning(lo: i32, count: i32) -> ForestMapping {
    let map: Vec<i32> = (0..N_TREES).collect();
    ForestMapping::new(
        KindMapping::new(map.clone(), lo, count),
        KindMapping::new(map, lo, count),
    )
}

/// Build on every rank of a two-rank cluster; returns trees and call counts.
fn run(ds: &Dataset, mappings: [ForestMapping; 2]) -> Vec<(Trees, u64)> {
    let source = MemorySource::new(ds).unwrap();
    let ranks = LocalCluster::new(2);
    thread::scope(|s| {
        let handles: Vec<_> = ranks
            .into_iter()
            .zip(mappings)
            .map(|(mut comm, mapping)| {
                let source = &source;
                s.spawn(move || {
                    let log = LogContext::silent();
                    let trees = TreeBuilder::new(ds.config().clone(), mapping, &log)
                        .build(source, &mut comm)
                        .unwrap();
                    (trees, comm.calls())
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    })
}

fn reports(trees: &Trees) -> Vec<OwnershipReport> {
    trees.summaries().iter().map(|s| s.ownership).collect()
}

fn sorted(mut cases: Vec<CaseAssignment>) -> Vec<CaseAssignment> {
    cases.sort_by_key(|c| (c.kind, c.key));
    cases
}

#[test]
fn disjoint_ranges_claim_every_group_once() {
    let ds = chain_dataset(3, N_TREES, 1);
    let out = run(&ds, [owning(0, 3), owning(3, 2)]);
    for (trees, calls) in &out {
        assert_eq!(*calls, 3);
        assert!(reports(trees).iter().all(|r| r.is_clean() && r.n_groups == 5));
    }
    assert_eq!(out[0].0.forests(HaloKind::Group).len(), 3);
    assert_eq!(out[1].0.forests(HaloKind::Group).len(), 2);
    let nodes: usize = out.iter().map(|(t, _)| t.arena().len()).sum();
    assert_eq!(nodes, 2 * 5 * 3);
}

#[test]
fn gap_in_ownership_is_reported_unused() {
    let ds = chain_dataset(3, N_TREES, 1);
    let out = run(&ds, [owning(0, 2), owning(3, 2)]);
    for (trees, _) in &out {
        for r in reports(trees) {
            assert_eq!(r.unused, 1);
            assert_eq!(r.multiply_claimed, 0);
        }
    }
}

#[test]
fn overlapping_ownership_is_reported() {
    let ds = chain_dataset(3, N_TREES, 1);
    let out = run(&ds, [owning(0, 3), owning(2, 3)]);
    for (trees, _) in &out {
        for r in reports(trees) {
            assert_eq!(r.multiply_claimed, 1);
            assert_eq!(r.unused, 0);
        }
    }
}

#[test]
fn partitions_together_match_a_single_rank_read() {
    let ds = chain_dataset(4, N_TREES, 2);
    let whole = ForestMapping::identity(ds.n_group_trees(), ds.n_subgroup_trees());
    let out = run(&ds, [whole.partitioned(0, 2), whole.partitioned(1, 2)]);
    let mut union: Vec<CaseAssignment> = Vec::new();
    for (trees, _) in &out {
        assert!(reports(trees).iter().all(OwnershipReport::is_clean));
        union.extend(trees.case_assignments());
    }

    let log = LogContext::silent();
    let source = MemorySource::new(&ds).unwrap();
    let single = TreeBuilder::new(ds.config().clone(), whole, &log)
        .build(&source, &mut SingleRank::new())
        .unwrap();
    assert_eq!(sorted(union), sorted(single.case_assignments()));
}

#[test]
fn single_rank_reduces_once_per_snapshot() {
    let ds = chain_dataset(4, 2, 1);
    let log = LogContext::silent();
    let source = MemorySource::new(&ds).unwrap();
    let mut comm = SingleRank::new();
    assert_eq!(comm.size(), 1);
    TreeBuilder::new(
        ds.config().clone(),
        ForestMapping::identity(2, 2),
        &log,
    )
    .build(&source, &mut comm)
    .unwrap();
    assert_eq!(comm.calls(), 4);
}
