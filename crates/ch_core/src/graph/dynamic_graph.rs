//! Mutable contraction-time graph (spec Component B).
//!
//! Grounded on `examples/original_source/Contractor/DynamicGraph.h`: nodes
//! own a power-of-two "slab" of edge slots (`first_edge`, `edge_count`,
//! `edge_capacity`); inserting past capacity doubles it and copies the
//! live edges to a freshly allocated slab at the tail of the shared edge
//! array, leaving the old slots as garbage (reclaimed only by a full
//! rebuild, never compacted in place — this matches the original, which
//! never frees mid-array holes either). Edge removal swaps with the slab's
//! last live edge rather than shifting, to stay O(1).

use crate::constants::{EdgeId, NodeId};

/// `log2`, rounded up to the next power of two, via the same de Bruijn
/// bit-trick the original uses (`DynamicGraph::log2Rounded32`).
fn log2_rounded32(mut v: u32) -> u32 {
    const DE_BRUIJN: [u32; 32] = [
        0, 9, 1, 10, 13, 21, 2, 29, 11, 14, 16, 18, 22, 25, 3, 30, 8, 12, 20, 28, 15, 17, 24, 7,
        19, 27, 23, 6, 26, 5, 4, 31,
    ];
    v = v.saturating_sub(1).max(1);
    v |= v >> 1;
    v |= v >> 2;
    v |= v >> 4;
    v |= v >> 8;
    v |= v >> 16;
    let log = DE_BRUIJN[((v.wrapping_mul(0x07C4_ACDD)) >> 27) as usize];
    log + 1
}

struct NodeEntry {
    first_edge: u32,
    edge_count: u32,
    edge_capacity: u32,
}

/// An edge slot. `live` distinguishes a used slot from slack capacity
/// within a node's slab (the original instead trusts `edge_count` and never
/// reads past it; we keep an explicit flag so `find_edge`/iteration can be
/// written without juggling raw slab arithmetic everywhere).
struct EdgeSlot<D> {
    target: NodeId,
    data: Option<D>,
}

impl<D> EdgeSlot<D> {
    fn empty() -> Self {
        Self {
            target: NodeId::MAX,
            data: None,
        }
    }
}

/// A mutable, node-slab-based adjacency structure. `D` is the per-edge
/// payload (contraction edge data: weight, shortcut bit, via-node, ...).
pub struct DynamicGraph<D> {
    nodes: Vec<NodeEntry>,
    edges: Vec<EdgeSlot<D>>,
}

impl<D: Clone> DynamicGraph<D> {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }

    pub fn with_node_count(n: usize) -> Self {
        let mut g = Self::new();
        for _ in 0..n {
            g.add_node();
        }
        g
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn add_node(&mut self) -> NodeId {
        let id = self.nodes.len() as NodeId;
        self.nodes.push(NodeEntry {
            first_edge: 0,
            edge_count: 0,
            edge_capacity: 0,
        });
        id
    }

    /// Append an edge to `source`'s slab, growing it (doubling, minimum 2)
    /// if full, exactly as `DynamicGraph::InsertEdge` does.
    pub fn insert_edge(&mut self, source: NodeId, target: NodeId, data: D) -> EdgeId {
        let node = &self.nodes[source as usize];
        if node.edge_count >= node.edge_capacity {
            self.grow_slab(source);
        }
        let node = &mut self.nodes[source as usize];
        let slot = (node.first_edge + node.edge_count) as usize;
        node.edge_count += 1;
        if slot == self.edges.len() {
            self.edges.push(EdgeSlot {
                target,
                data: Some(data),
            });
        } else {
            self.edges[slot] = EdgeSlot {
                target,
                data: Some(data),
            };
        }
        slot as EdgeId
    }

    fn grow_slab(&mut self, source: NodeId) {
        let node_idx = source as usize;
        let old_capacity = self.nodes[node_idx].edge_capacity;
        let new_capacity = if old_capacity == 0 {
            2
        } else {
            1u32 << log2_rounded32(old_capacity + 1)
        };
        let old_first = self.nodes[node_idx].first_edge as usize;
        let old_count = self.nodes[node_idx].edge_count as usize;
        let new_first = self.edges.len();
        for i in 0..old_count {
            let target = self.edges[old_first + i].target;
            let data = self.edges[old_first + i].data.clone();
            self.edges.push(EdgeSlot { target, data });
        }
        for _ in old_count..new_capacity as usize {
            self.edges.push(EdgeSlot::empty());
        }
        let node = &mut self.nodes[node_idx];
        node.first_edge = new_first as u32;
        node.edge_capacity = new_capacity;
    }

    pub fn out_edges(&self, source: NodeId) -> impl Iterator<Item = (EdgeId, NodeId, &D)> {
        let node = &self.nodes[source as usize];
        let first = node.first_edge as usize;
        let count = node.edge_count as usize;
        (first..first + count).filter_map(move |slot| {
            let e = &self.edges[slot];
            if e.target == NodeId::MAX {
                None
            } else {
                Some((slot as EdgeId, e.target, e.data.as_ref().unwrap()))
            }
        })
    }

    pub fn edge_data(&self, edge: EdgeId) -> &D {
        self.edges[edge as usize].data.as_ref().unwrap()
    }

    pub fn edge_data_mut(&mut self, edge: EdgeId) -> &mut D {
        self.edges[edge as usize].data.as_mut().unwrap()
    }

    pub fn edge_target(&self, edge: EdgeId) -> NodeId {
        self.edges[edge as usize].target
    }

    /// First edge from `source` to `target`, matching `FindEdge`'s
    /// "lowest-weight match wins" contract when several parallel edges
    /// exist between the same pair (used by the contractor's merge-on-exist
    /// shortcut rule), with the comparison delegated to `pick_better`.
    pub fn find_edge(
        &self,
        source: NodeId,
        target: NodeId,
        mut pick_better: impl FnMut(&D, &D) -> bool,
    ) -> Option<EdgeId> {
        let mut best: Option<EdgeId> = None;
        for (eid, t, data) in self.out_edges(source) {
            if t != target {
                continue;
            }
            match best {
                None => best = Some(eid),
                Some(cur) if pick_better(data, self.edge_data(cur)) => best = Some(eid),
                _ => {}
            }
        }
        best
    }

    /// Remove the edge `source -> target` for which `matches` returns true,
    /// swapping with the slab's last live edge (`DeleteEdge`).
    pub fn delete_edge_if(
        &mut self,
        source: NodeId,
        target: NodeId,
        mut matches: impl FnMut(&D) -> bool,
    ) -> bool {
        let node = &self.nodes[source as usize];
        let first = node.first_edge as usize;
        let count = node.edge_count as usize;
        let mut found_slot = None;
        for slot in first..first + count {
            if self.edges[slot].target == target
                && matches(self.edges[slot].data.as_ref().unwrap())
            {
                found_slot = Some(slot);
                break;
            }
        }
        let Some(slot) = found_slot else {
            return false;
        };
        let last_slot = first + count - 1;
        if slot != last_slot {
            self.edges.swap(slot, last_slot);
        }
        self.edges[last_slot].target = NodeId::MAX;
        self.nodes[source as usize].edge_count -= 1;
        true
    }

    /// Remove every edge `source -> target`, regardless of data
    /// (`DeleteEdgesTo`); used when a node is being contracted away and all
    /// of its incident edges must disappear.
    pub fn delete_edges_to(&mut self, source: NodeId, target: NodeId) {
        while self.delete_edge_if(source, target, |_| true) {}
    }

    pub fn out_degree(&self, source: NodeId) -> usize {
        self.nodes[source as usize].edge_count as usize
    }
}

impl<D: Clone> Default for DynamicGraph<D> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_iterate_edges() {
        let mut g: DynamicGraph<u32> = DynamicGraph::with_node_count(3);
        g.insert_edge(0, 1, 10);
        g.insert_edge(0, 2, 20);
        let out: Vec<_> = g.out_edges(0).map(|(_, t, d)| (t, *d)).collect();
        assert_eq!(out.len(), 2);
        assert!(out.contains(&(1, 10)));
        assert!(out.contains(&(2, 20)));
    }

    #[test]
    fn grows_slab_past_initial_capacity() {
        let mut g: DynamicGraph<u32> = DynamicGraph::with_node_count(1);
        for i in 0..10 {
            g.insert_edge(0, i + 1, i);
        }
        assert_eq!(g.out_degree(0), 10);
    }

    #[test]
    fn delete_edge_removes_single_match() {
        let mut g: DynamicGraph<u32> = DynamicGraph::with_node_count(2);
        g.insert_edge(0, 1, 5);
        g.insert_edge(0, 1, 7);
        assert!(g.delete_edge_if(0, 1, |&d| d == 5));
        assert_eq!(g.out_degree(0), 1);
        let remaining: Vec<_> = g.out_edges(0).map(|(_, _, d)| *d).collect();
        assert_eq!(remaining, vec![7]);
    }

    #[test]
    fn find_edge_picks_better_on_parallel_edges() {
        let mut g: DynamicGraph<u32> = DynamicGraph::with_node_count(2);
        g.insert_edge(0, 1, 10);
        g.insert_edge(0, 1, 3);
        let best = g.find_edge(0, 1, |a, b| a < b).unwrap();
        assert_eq!(*g.edge_data(best), 3);
    }
}
