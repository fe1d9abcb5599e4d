//! Immutable, query-time CSR graph (spec Component C).
//!
//! Built once from a finalized edge list by sorting on `(source, target)`
//! and prefix-summing per-node degrees into a `first_edge` index array, per
//! `spec.md` §4.3. No dedicated original-source file covers this structure
//! directly — the original threads the equivalent access pattern through
//! `DataStructures/SearchEngine.h`'s `GraphT`/`DynamicGraph`-templated
//! search engine — so this module follows the spec text, adapting the CSR
//! layout style already used by `DynamicGraph`'s slab indexing.

use serde::{Deserialize, Serialize};

use crate::constants::{EdgeId, NodeId, Weight};
use crate::graph::dynamic_graph::DynamicGraph;

/// A single directed, already-contracted edge as stored in the CSR array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticEdgeData {
    pub weight: Weight,
    /// Node the shortcut skips through, or `None` for an original edge.
    /// Unpacking reads this directly off the edge rather than through a
    /// side table, matching `_UnpackPath` in `DataStructures/SearchEngine.h`.
    pub middle: Option<NodeId>,
    pub forward: bool,
    pub backward: bool,
}

impl StaticEdgeData {
    pub fn is_shortcut(&self) -> bool {
        self.middle.is_some()
    }
}

/// Immutable CSR adjacency: `first_edge[n]..first_edge[n+1]` indexes into
/// `targets`/`data` for node `n`'s outgoing edges, sorted by `(source,
/// target)` within each node's slice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaticGraph {
    first_edge: Vec<u32>,
    targets: Vec<NodeId>,
    data: Vec<StaticEdgeData>,
}

impl StaticGraph {
    pub fn num_nodes(&self) -> usize {
        self.first_edge.len().saturating_sub(1)
    }

    pub fn num_edges(&self) -> usize {
        self.targets.len()
    }

    /// The raw `first_edge` prefix-sum table (`num_nodes() + 1` entries),
    /// for callers that need to write it out verbatim (the `.hsgr` format,
    /// spec §6).
    pub fn first_edge_table(&self) -> &[u32] {
        &self.first_edge
    }

    pub fn out_edges(&self, node: NodeId) -> impl Iterator<Item = (EdgeId, NodeId, &StaticEdgeData)> {
        let start = self.first_edge[node as usize] as usize;
        let end = self.first_edge[node as usize + 1] as usize;
        (start..end).map(move |i| (i as EdgeId, self.targets[i], &self.data[i]))
    }

    pub fn edge_data(&self, edge: EdgeId) -> &StaticEdgeData {
        &self.data[edge as usize]
    }

    pub fn edge_target(&self, edge: EdgeId) -> NodeId {
        self.targets[edge as usize]
    }

    /// Lowest-weight edge `source -> target`, if any. Used by shortcut
    /// unpacking to recover a shortcut's two constituent edges from the
    /// via-node stored on it, the same lookup `_UnpackPath` performs in
    /// `DataStructures/SearchEngine.h`. Several parallel records can share
    /// a `(source, target)` pair (e.g. the split forward-only/backward-only
    /// halves `merge_outcome` produces), so spec §4.3 requires a full scan
    /// of the target's range rather than returning the first match.
    pub fn find_edge(&self, source: NodeId, target: NodeId) -> Option<EdgeId> {
        self.out_edges(source)
            .filter(|&(_, t, _)| t == target)
            .min_by_key(|&(_, _, d)| d.weight)
            .map(|(e, _, _)| e)
    }

    /// Build from an explicit `(source, target, data)` edge list. Sorts a
    /// copy, so callers may pass edges in any order.
    pub fn build(num_nodes: usize, mut edges: Vec<(NodeId, NodeId, StaticEdgeData)>) -> Self {
        edges.sort_by_key(|&(s, t, _)| (s, t));

        let mut first_edge = vec![0u32; num_nodes + 1];
        for &(s, _, _) in &edges {
            first_edge[s as usize + 1] += 1;
        }
        for i in 0..num_nodes {
            first_edge[i + 1] += first_edge[i];
        }

        let targets = edges.iter().map(|&(_, t, _)| t).collect();
        let data = edges.into_iter().map(|(_, _, d)| d).collect();

        Self {
            first_edge,
            targets,
            data,
        }
    }

    /// Build from a [`DynamicGraph`] of contraction edge data by projecting
    /// each live edge through `to_static`, dropping edges `to_static`
    /// returns `None` for (e.g. edges contraction marked dead).
    pub fn from_dynamic<D: Clone>(
        graph: &DynamicGraph<D>,
        to_static: impl Fn(&D) -> Option<StaticEdgeData>,
    ) -> Self {
        let num_nodes = graph.num_nodes();
        let mut edges = Vec::new();
        for source in 0..num_nodes as NodeId {
            for (_, target, data) in graph.out_edges(source) {
                if let Some(sd) = to_static(data) {
                    edges.push((source, target, sd));
                }
            }
        }
        Self::build(num_nodes, edges)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(w: Weight) -> StaticEdgeData {
        StaticEdgeData {
            weight: w,
            middle: None,
            forward: true,
            backward: false,
        }
    }

    #[test]
    fn build_produces_correct_csr_bounds() {
        let g = StaticGraph::build(
            3,
            vec![(0, 1, edge(5)), (0, 2, edge(9)), (1, 2, edge(3))],
        );
        assert_eq!(g.num_nodes(), 3);
        assert_eq!(g.num_edges(), 3);
        let out0: Vec<_> = g.out_edges(0).map(|(_, t, d)| (t, d.weight)).collect();
        assert_eq!(out0, vec![(1, 5), (2, 9)]);
        let out1: Vec<_> = g.out_edges(1).map(|(_, t, d)| (t, d.weight)).collect();
        assert_eq!(out1, vec![(2, 3)]);
        assert_eq!(g.out_edges(2).count(), 0);
    }

    #[test]
    fn find_edge_picks_the_lightest_of_several_parallel_records() {
        let g = StaticGraph::build(
            2,
            vec![
                (0, 1, edge(20)),
                (0, 1, edge(5)),
                (0, 1, edge(12)),
            ],
        );
        let e = g.find_edge(0, 1).expect("edge must exist");
        assert_eq!(g.edge_data(e).weight, 5);
    }

    #[test]
    fn round_trips_from_dynamic_graph() {
        let mut dg: DynamicGraph<Weight> = DynamicGraph::with_node_count(3);
        dg.insert_edge(0, 1, 5);
        dg.insert_edge(1, 2, 3);
        let sg = StaticGraph::from_dynamic(&dg, |&w| {
            Some(StaticEdgeData {
                weight: w,
                middle: None,
                forward: true,
                backward: false,
            })
        });
        assert_eq!(sg.num_edges(), 2);
        assert_eq!(sg.edge_data(sg.out_edges(0).next().unwrap().0).weight, 5);
    }
}
