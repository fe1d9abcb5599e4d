//! Geometry compression (spec Component G).
//!
//! Grounded on `examples/original_source/Contractor/GeometryCompressor.h`
//! and `.cpp`: contracting a degree-2 node away loses the geometric detail
//! of the path through it (the "shape" a shortcut replaces), so before the
//! via-node disappears its coordinate reference is appended to a side list
//! keyed by the surviving edge. Chains compress transitively — contracting
//! a whole line of degree-2 nodes builds up one list per surviving edge —
//! and slots are reused via an explicit free list
//! (`IncreaseFreeList`/`m_free_list`) rather than ever-growing the backing
//! `Vec` of lists.

use crate::constants::{EdgeId, NodeId};
use crate::error::{CoreError, Result};
use crate::graph::static_graph::StaticGraph;

/// Per-edge compressed geometry: the chain of via-nodes a shortcut passes
/// through, in traversal order.
#[derive(Debug, Default)]
pub struct GeometryCompressor {
    compressed_geometries: Vec<Vec<NodeId>>,
    free_list: Vec<usize>,
    edge_to_list_index: rustc_hash::FxHashMap<EdgeId, usize>,
}

impl GeometryCompressor {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_list(&mut self) -> usize {
        if let Some(idx) = self.free_list.pop() {
            self.compressed_geometries[idx].clear();
            idx
        } else {
            self.compressed_geometries.push(Vec::new());
            self.compressed_geometries.len() - 1
        }
    }

    /// Record that contracting `via_node` merged `removed_edge` into
    /// `surviving_edge`: `via_node` (and anything already compressed into
    /// `removed_edge`) is appended to `surviving_edge`'s geometry list.
    pub fn compress_edge(&mut self, surviving_edge: EdgeId, removed_edge: EdgeId, via_node: NodeId) {
        let idx = *self
            .edge_to_list_index
            .entry(surviving_edge)
            .or_insert_with(|| {
                let i = self.compressed_geometries.len();
                self.compressed_geometries.push(Vec::new());
                i
            });
        self.compressed_geometries[idx].push(via_node);

        if let Some(removed_idx) = self.edge_to_list_index.remove(&removed_edge) {
            let absorbed = std::mem::take(&mut self.compressed_geometries[removed_idx]);
            self.compressed_geometries[idx].extend(absorbed);
            self.free_list.push(removed_idx);
        }
    }

    pub fn has_geometry(&self, edge: EdgeId) -> bool {
        self.edge_to_list_index.contains_key(&edge)
    }

    pub fn geometry(&self, edge: EdgeId) -> &[NodeId] {
        match self.edge_to_list_index.get(&edge) {
            Some(&idx) => &self.compressed_geometries[idx],
            None => &[],
        }
    }

    pub fn surviving_edge_count(&self) -> usize {
        self.edge_to_list_index.len()
    }

    pub fn longest_chain(&self) -> usize {
        self.edge_to_list_index
            .values()
            .map(|&idx| self.compressed_geometries[idx].len())
            .max()
            .unwrap_or(0)
    }

    /// Build directly from a finalized contracted graph by recursively
    /// expanding every shortcut's via-node chain, for a caller (the
    /// `preprocess` binary) that only needs the final geometry file and
    /// never sees the incremental per-round merges [`Self::compress_edge`]
    /// is built for.
    pub fn from_static_graph(graph: &StaticGraph) -> Self {
        let mut gc = Self::new();
        for source in 0..graph.num_nodes() as NodeId {
            for (edge_id, target, data) in graph.out_edges(source) {
                if !data.is_shortcut() {
                    continue;
                }
                let mut via_nodes = Vec::new();
                collect_via_nodes(graph, source, target, edge_id, &mut via_nodes);
                if !via_nodes.is_empty() {
                    let idx = gc.compressed_geometries.len();
                    gc.compressed_geometries.push(via_nodes);
                    gc.edge_to_list_index.insert(edge_id, idx);
                }
            }
        }
        gc
    }

    pub fn log_statistics(&self) {
        log::info!(
            "geometry compressor: {} compressed edges, longest chain {} nodes",
            self.surviving_edge_count(),
            self.longest_chain()
        );
    }

    /// Serialize as the spec §4.7 geometry file: a `u32` count of
    /// compressed edges, followed by `count + 1` `u32` prefix-sum indices
    /// into the flat payload array, followed by the flat `u32` node-id
    /// payload. Edges are emitted in ascending [`EdgeId`] order so the
    /// index table lines up with the `.hsgr` edge array it accompanies.
    pub fn serialize(&self) -> Vec<u8> {
        let mut edges: Vec<EdgeId> = self.edge_to_list_index.keys().copied().collect();
        edges.sort_unstable();

        let mut out = Vec::new();
        out.extend_from_slice(&(edges.len() as u32).to_le_bytes());

        let mut offset = 0u32;
        let mut indices = Vec::with_capacity(edges.len() + 1);
        indices.push(offset);
        for &e in &edges {
            offset += self.geometry(e).len() as u32;
            indices.push(offset);
        }
        for i in &indices {
            out.extend_from_slice(&i.to_le_bytes());
        }
        for &e in &edges {
            for &node in self.geometry(e) {
                out.extend_from_slice(&node.to_le_bytes());
            }
        }
        out
    }

    /// Inverse of [`Self::serialize`]: rebuild indexed geometry lists keyed
    /// by position (the `i`-th compressed edge in serialization order),
    /// returning `(edge_index, geometry)` pairs rather than original
    /// `EdgeId`s, since those are only meaningful relative to the `.hsgr`
    /// file this accompanies.
    pub fn deserialize(bytes: &[u8]) -> Result<Vec<Vec<NodeId>>> {
        let read_u32 = |off: usize| -> Result<u32> {
            bytes
                .get(off..off + 4)
                .map(|b| u32::from_le_bytes(b.try_into().unwrap()))
                .ok_or_else(|| CoreError::invalid_input("truncated geometry file"))
        };
        let count = read_u32(0)? as usize;
        let mut indices = Vec::with_capacity(count + 1);
        for i in 0..=count {
            indices.push(read_u32(4 + i * 4)? as usize);
        }
        let payload_start = 4 + (count + 1) * 4;
        let mut out = Vec::with_capacity(count);
        for i in 0..count {
            let start = indices[i];
            let end = indices[i + 1];
            let mut list = Vec::with_capacity(end - start);
            for k in start..end {
                list.push(read_u32(payload_start + k * 4)?);
            }
            out.push(list);
        }
        Ok(out)
    }
}

/// Recursively expand a single (possibly shortcut) `source -> target` edge,
/// appending every via-node it passes through, in traversal order, to
/// `out`. Mirrors `search::ch_search::unpack_edge`'s recursion but collects
/// the via-nodes themselves rather than the endpoint sequence.
fn collect_via_nodes(graph: &StaticGraph, source: NodeId, target: NodeId, edge_id: EdgeId, out: &mut Vec<NodeId>) {
    let data = *graph.edge_data(edge_id);
    if let Some(middle) = data.middle {
        let first = graph
            .find_edge(source, middle)
            .expect("shortcut's first half must exist in the same graph");
        collect_via_nodes(graph, source, middle, first, out);
        out.push(middle);
        let second = graph
            .find_edge(middle, target)
            .expect("shortcut's second half must exist in the same graph");
        collect_via_nodes(graph, middle, target, second, out);
    }
}
