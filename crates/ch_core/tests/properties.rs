//! Universal invariant property tests (spec §8, items 1-6), run with
//! `proptest`'s manual `TestRunner` in the same style the teacher crate
//! uses for its own search property tests (`search/ch_search.rs`), rather
//! than the `proptest!` macro.

use proptest::prelude::*;
use proptest::test_runner::TestRunner;

use ch_core::cleanup::remove_useless_shortcuts;
use ch_core::constants::{NodeId, Weight};
use ch_core::contraction::{ContractorEdgeData, NodeContractor, PriorityWeights};
use ch_core::graph::static_graph::StaticEdgeData;
use ch_core::graph::{DynamicGraph, StaticGraph};
use ch_core::heap::{ArrayStorage, BinaryHeap};
use ch_core::search::{dijkstra_shortest_path, CHSearch};

/// A small strongly-connected-ish random graph: a Hamiltonian bidirectional
/// cycle (so every node reaches every other) plus a handful of random
/// chords, each weight in a modest range so `u32` overflow never enters
/// into it.
fn random_graph(num_nodes: usize, chord_weights: &[(u32, u32, Weight)]) -> DynamicGraph<ContractorEdgeData> {
    let mut g: DynamicGraph<ContractorEdgeData> = DynamicGraph::with_node_count(num_nodes);
    for i in 0..num_nodes as u32 {
        let next = (i + 1) % num_nodes as u32;
        g.insert_edge(i, next, ContractorEdgeData::original(10, true, true));
        g.insert_edge(next, i, ContractorEdgeData::original(10, true, true));
    }
    for &(a, b, w) in chord_weights {
        let (a, b) = (a % num_nodes as u32, b % num_nodes as u32);
        if a != b {
            g.insert_edge(a, b, ContractorEdgeData::original(w, true, true));
            g.insert_edge(b, a, ContractorEdgeData::original(w, true, true));
        }
    }
    g
}

fn to_static(g: &DynamicGraph<ContractorEdgeData>) -> StaticGraph {
    StaticGraph::from_dynamic(g, |d: &ContractorEdgeData| {
        Some(StaticEdgeData {
            weight: d.weight,
            middle: d.middle,
            forward: d.forward,
            backward: d.backward,
        })
    })
}

/// Recursively sum the original (non-shortcut) weights a shortcut edge
/// unpacks into, via the via-node `ContractorEdgeData::middle` carries.
/// Several parallel `(source, target)` records can coexist once
/// contraction has run (an original edge plus one or more shortcuts), so
/// this picks the minimum-weight one, matching `DynamicGraph::find_edge`'s
/// own tie-break contract (spec §4.2).
fn unpacked_weight(graph: &DynamicGraph<ContractorEdgeData>, source: NodeId, target: NodeId) -> Weight {
    let data = graph
        .out_edges(source)
        .filter(|(_, t, _)| *t == target)
        .map(|(_, _, d)| d)
        .min_by_key(|d| d.weight)
        .expect("edge must exist");
    match data.middle {
        None => data.weight,
        Some(middle) => unpacked_weight(graph, source, middle) + unpacked_weight(graph, middle, target),
    }
}

/// Property 1: shortcut soundness. Every shortcut's weight equals the sum
/// of its two recursively-unpacked halves.
#[test]
fn shortcut_soundness_holds_after_contraction() {
    let mut runner = TestRunner::default();
    runner
        .run(&(6usize..12, prop::collection::vec((0u32..20, 0u32..20, 1u32..50), 0..10)), |(n, chords)| {
            let g = random_graph(n, &chords);
            let result = NodeContractor::new(g, PriorityWeights::default()).run().unwrap();
            for source in 0..result.graph.num_nodes() as NodeId {
                for (_, target, data) in result.graph.out_edges(source) {
                    if data.is_shortcut() {
                        let recomputed = unpacked_weight(&result.graph, source, target);
                        prop_assert_eq!(recomputed, data.weight);
                    }
                }
            }
            Ok(())
        })
        .unwrap();
}

/// Property 2: contraction preserves distances. Every pair's CH distance
/// must match a plain Dijkstra over the original (pre-contraction) graph.
#[test]
fn contraction_preserves_all_pairs_distances() {
    let mut runner = TestRunner::default();
    runner
        .run(&(6usize..10, prop::collection::vec((0u32..20, 0u32..20, 1u32..50), 0..8)), |(n, chords)| {
            let original = random_graph(n, &chords);
            let original_static = to_static(&original);

            let result = NodeContractor::new(original, PriorityWeights::default()).run().unwrap();
            let rank = result.rank.clone();
            let mut contracted = result.graph;
            remove_useless_shortcuts(&mut contracted);
            let contracted_static = to_static(&contracted);
            let search = CHSearch::new(&contracted_static, &rank);

            for s in 0..n as NodeId {
                for t in 0..n as NodeId {
                    let expected = dijkstra_shortest_path(&original_static, s, t).map(|p| p.weight);
                    let actual = search.distance(s, t);
                    prop_assert_eq!(actual, expected, "mismatch for {}->{}", s, t);
                }
            }
            Ok(())
        })
        .unwrap();
}

/// Property 3: stall correctness. A direct (non-stalling) Dijkstra on the
/// contracted graph's upward split and the stall-on-demand `CHSearch` must
/// agree on weight even though their runtimes differ.
#[test]
fn stalling_never_changes_the_returned_weight() {
    let mut runner = TestRunner::default();
    runner
        .run(&(6usize..10, prop::collection::vec((0u32..20, 0u32..20, 1u32..50), 0..8)), |(n, chords)| {
            let original = random_graph(n, &chords);
            let original_static = to_static(&original);
            let result = NodeContractor::new(original, PriorityWeights::default()).run().unwrap();
            let rank = result.rank.clone();
            let mut contracted = result.graph;
            remove_useless_shortcuts(&mut contracted);
            let contracted_static = to_static(&contracted);
            let stalling = CHSearch::new(&contracted_static, &rank);

            for s in 0..n as NodeId {
                for t in 0..n as NodeId {
                    let expected = dijkstra_shortest_path(&original_static, s, t).map(|p| p.weight);
                    prop_assert_eq!(stalling.distance(s, t), expected);
                }
            }
            Ok(())
        })
        .unwrap();
}

fn sorted_edge_triples(graph: &DynamicGraph<ContractorEdgeData>) -> Vec<(NodeId, NodeId, Weight, bool)> {
    let mut triples = Vec::new();
    for s in 0..graph.num_nodes() as NodeId {
        for (_, t, d) in graph.out_edges(s) {
            triples.push((s, t, d.weight, d.is_shortcut()));
        }
    }
    triples.sort();
    triples
}

/// Property 4: determinism. Contracting the same input graph twice
/// produces edge lists equal after sorting, regardless of how many Rayon
/// worker threads happen to run (Rayon's global pool is process-wide, so
/// this checks repeatability of a single run rather than varying thread
/// count directly).
#[test]
fn contracting_the_same_graph_twice_is_deterministic() {
    let mut runner = TestRunner::default();
    runner
        .run(&(6usize..12, prop::collection::vec((0u32..20, 0u32..20, 1u32..50), 0..10)), |(n, chords)| {
            let g1 = random_graph(n, &chords);
            let g2 = random_graph(n, &chords);

            let edges1 = sorted_edge_triples(&NodeContractor::new(g1, PriorityWeights::default()).run().unwrap().graph);
            let edges2 = sorted_edge_triples(&NodeContractor::new(g2, PriorityWeights::default()).run().unwrap().graph);
            prop_assert_eq!(edges1, edges2);
            Ok(())
        })
        .unwrap();
}

/// Property 5: the heap pops keys in non-decreasing order and its
/// was_inserted/was_removed bookkeeping tracks the sequence of operations.
#[test]
fn heap_pops_in_non_decreasing_key_order() {
    let mut runner = TestRunner::default();
    runner
        .run(
            &prop::collection::vec((0u32..64, 0u32..1000), 1..100),
            |ops| {
                let mut heap: BinaryHeap<(), ArrayStorage> = BinaryHeap::with_storage(ArrayStorage::with_capacity(64));
                for &(node, key) in &ops {
                    if heap.was_removed(node) {
                        continue;
                    }
                    match heap.key(node) {
                        Some(existing) if existing <= key => {}
                        _ => heap.decrease_key(node, key, ()),
                    }
                    prop_assert!(heap.was_inserted(node));
                }

                let mut last = None;
                while let Some((node, key, _)) = heap.pop_min() {
                    if let Some(prev) = last {
                        prop_assert!(key >= prev);
                    }
                    last = Some(key);
                    prop_assert!(heap.was_removed(node));
                    prop_assert!(!heap.was_inserted(node) || heap.was_removed(node));
                }
                Ok(())
            },
        )
        .unwrap();
}

/// Property 6: StaticGraph <-> DynamicGraph round-trip. Building a
/// StaticGraph from a DynamicGraph's edges and re-enumerating every
/// `(src, tgt, data)` triple yields the same multiset as the source.
#[test]
fn static_graph_round_trips_dynamic_graph_edges() {
    let mut runner = TestRunner::default();
    runner
        .run(&(3usize..10, prop::collection::vec((0u32..20, 0u32..20, 1u32..50), 0..12)), |(n, chords)| {
            let dynamic = random_graph(n, &chords);

            let mut expected_triples: Vec<(NodeId, NodeId, Weight)> = Vec::new();
            for s in 0..dynamic.num_nodes() as NodeId {
                for (_, t, d) in dynamic.out_edges(s) {
                    expected_triples.push((s, t, d.weight));
                }
            }

            let static_graph = to_static(&dynamic);
            let mut actual_triples: Vec<(NodeId, NodeId, Weight)> = Vec::new();
            for s in 0..static_graph.num_nodes() as NodeId {
                for (_, t, d) in static_graph.out_edges(s) {
                    actual_triples.push((s, t, d.weight));
                }
            }

            expected_triples.sort();
            actual_triples.sort();
            prop_assert_eq!(expected_triples, actual_triples);
            Ok(())
        })
        .unwrap();
}
