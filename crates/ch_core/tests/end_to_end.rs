//! Whole-pipeline scenario tests (spec §8's literal end-to-end table):
//! build a graph, contract it, clean up shortcuts, and check that
//! [`CHSearch`] returns the expected weight and (where the scenario names
//! one) unpacked path.
//!
//! These exercise the full chain node-based graph -> edge-based expansion
//! -> contraction -> cleanup -> `StaticGraph` -> bidirectional query, the
//! same pipeline `bin/preprocess.rs` drives, but without touching disk.

use ch_core::contraction::{ContractorEdgeData, NodeContractor, PriorityWeights};
use ch_core::graph::static_graph::StaticEdgeData;
use ch_core::graph::{DynamicGraph, Restriction, StaticGraph};
use ch_core::search::CHSearch;

fn static_graph_of(edges: &[(u32, u32, u32, bool, bool)]) -> StaticGraph {
    let max_node = edges.iter().flat_map(|&(s, t, ..)| [s, t]).max().unwrap_or(0);
    let mut working: DynamicGraph<ContractorEdgeData> = DynamicGraph::with_node_count(max_node as usize + 1);
    for &(s, t, w, fwd, bwd) in edges {
        working.insert_edge(s, t, ContractorEdgeData::original(w, fwd, bwd));
    }
    StaticGraph::from_dynamic(&working, |d: &ContractorEdgeData| {
        Some(StaticEdgeData {
            weight: d.weight,
            middle: d.middle,
            forward: d.forward,
            backward: d.backward,
        })
    })
}

/// Scenario (a): two nodes, one forward-only edge, queried in the direction
/// it's traversable.
#[test]
fn scenario_a_two_node_forward_edge() {
    let g = static_graph_of(&[(0, 1, 100, true, false)]);
    let search = CHSearch::new(&g, &[0, 1]);
    assert_eq!(search.distance(0, 1), Some(100));
}

/// Scenario (b): the same graph queried against the grain of the
/// forward-only edge has no route.
#[test]
fn scenario_b_two_node_forward_edge_reverse_query() {
    let g = static_graph_of(&[(0, 1, 100, true, false)]);
    let search = CHSearch::new(&g, &[0, 1]);
    assert_eq!(search.distance(1, 0), None);
}

/// Scenario (c): a bidirectional chain of 5 nodes, 10 per hop.
#[test]
fn scenario_c_linear_chain_bidirectional() {
    let g = static_graph_of(&[
        (0, 1, 10, true, true),
        (1, 2, 10, true, true),
        (2, 3, 10, true, true),
        (3, 4, 10, true, true),
    ]);
    let search = CHSearch::new(&g, &[0, 1, 2, 3, 4]);
    assert_eq!(search.distance(0, 4), Some(40));
}

/// Scenario (d): the same chain run through contraction + cleanup; the
/// query must still answer 40 and the unpacked path must recover every
/// intermediate node.
#[test]
fn scenario_d_linear_chain_after_contraction_unpacks_full_path() {
    let mut working: DynamicGraph<ContractorEdgeData> = DynamicGraph::with_node_count(5);
    for i in 0..4u32 {
        working.insert_edge(i, i + 1, ContractorEdgeData::original(10, true, true));
        working.insert_edge(i + 1, i, ContractorEdgeData::original(10, true, true));
    }

    let result = NodeContractor::new(working, PriorityWeights::default()).run().unwrap();
    let mut graph = result.graph;
    ch_core::cleanup::remove_useless_shortcuts(&mut graph);

    let static_graph = StaticGraph::from_dynamic(&graph, |d: &ContractorEdgeData| {
        Some(StaticEdgeData {
            weight: d.weight,
            middle: d.middle,
            forward: d.forward,
            backward: d.backward,
        })
    });
    let search = CHSearch::new(&static_graph, &result.rank);
    let path = search.route(0, 4).expect("chain must be traversable end to end");
    assert_eq!(path.weight, 40);
    assert_eq!(path.nodes, vec![0, 1, 2, 3, 4]);
}

/// Scenario (e): a Y-junction with a restriction banning 1->2->3; the
/// banned route has no path, and the unrestricted branch 1->4 still works.
#[test]
fn scenario_e_y_junction_restriction() {
    use ch_core::edge_expansion::EdgeBasedGraphFactory;
    use ch_core::graph::ImportEdge;

    let edges = vec![
        ImportEdge::new(0, 1, 10),
        ImportEdge::new(1, 2, 10),
        ImportEdge::new(1, 3, 10),
    ];
    let restrictions = vec![Restriction {
        from: 0,
        via: 1,
        to: 2,
        only: false,
    }];
    let factory = EdgeBasedGraphFactory::new(4, edges, restrictions);
    let (eb_nodes, eb_edges) = factory.build();

    let mut working: DynamicGraph<ContractorEdgeData> = DynamicGraph::with_node_count(eb_nodes.len());
    for e in &eb_edges {
        working.insert_edge(e.source, e.target, ContractorEdgeData::original(e.weight, true, true));
    }
    let static_graph = StaticGraph::from_dynamic(&working, |d: &ContractorEdgeData| {
        Some(StaticEdgeData {
            weight: d.weight,
            middle: d.middle,
            forward: d.forward,
            backward: d.backward,
        })
    });

    let zero_to_one = eb_nodes.iter().position(|n| n.source == 0 && n.target == 1).unwrap() as u32;
    let one_to_two = eb_nodes.iter().position(|n| n.source == 1 && n.target == 2).unwrap() as u32;
    let one_to_three = eb_nodes.iter().position(|n| n.source == 1 && n.target == 3).unwrap() as u32;

    let rank: Vec<u32> = (0..eb_nodes.len() as u32).collect();
    let search = CHSearch::new(&static_graph, &rank);
    assert_eq!(search.distance(zero_to_one, one_to_two), None);
    assert_eq!(search.distance(zero_to_one, one_to_three), Some(10));
}

/// Scenario (f): a triangle where contracting the middle node produces a
/// shortcut cheaper than the direct edge; the cleanup pass must not strip
/// that shortcut since the direct edge can't replace it.
#[test]
fn scenario_f_triangle_with_shortcut() {
    let mut working: DynamicGraph<ContractorEdgeData> = DynamicGraph::with_node_count(3);
    working.insert_edge(0, 1, ContractorEdgeData::original(5, true, true));
    working.insert_edge(1, 2, ContractorEdgeData::original(5, true, true));
    working.insert_edge(0, 2, ContractorEdgeData::original(100, true, true));

    let result = NodeContractor::new(working, PriorityWeights::default()).run().unwrap();
    let mut graph = result.graph;
    ch_core::cleanup::remove_useless_shortcuts(&mut graph);

    let static_graph = StaticGraph::from_dynamic(&graph, |d: &ContractorEdgeData| {
        Some(StaticEdgeData {
            weight: d.weight,
            middle: d.middle,
            forward: d.forward,
            backward: d.backward,
        })
    });
    let search = CHSearch::new(&static_graph, &result.rank);
    assert_eq!(search.distance(0, 2), Some(10));
}
