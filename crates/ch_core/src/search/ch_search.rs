//! Bidirectional, stall-on-demand CH query (spec Component H).
//!
//! Grounded on `examples/original_source/DataStructures/SearchEngine.h`'s
//! `_RoutingStep`/`_UnpackPath`: a forward search from the source and a
//! backward search from the target run simultaneously over the *upward*
//! graph (every edge points from a lower-rank node to a higher-rank one),
//! alternating by whichever heap currently has the smaller minimum key.
//! Settling a node in one direction can improve a running best total
//! distance the moment the same node has also been reached from the other
//! direction. Stall-on-demand prunes a direction's expansion at a node the
//! instant a cheaper path into it is already known via an edge in the
//! *other* direction, without waiting for that edge's source to be
//! formally settled — exactly the edge-scan check `_RoutingStep` performs,
//! not a plain heap-key comparison. Path unpacking walks back through
//! parent pointers on each side and recursively expands any shortcut edge
//! using the via-node stored directly on it (no side table), matching
//! `_UnpackPath`.
//!
//! The teacher crate's own `search/ch_search.rs` runs the same two-heap,
//! alternate-and-stall shape over its `OverlayGraph`/`f64` weights with
//! shortcuts resolved through a side `FxHashMap`; this version keeps that
//! control flow but runs over two [`StaticGraph`]s (forward-usable and
//! backward-usable edges, the latter stored reversed so both searches are
//! plain forward traversals) with `u32` weights and direct edge-data
//! unpacking.

use rustc_hash::FxHashMap;

use crate::constants::{EdgeId, NodeId, Weight, INVALID_WEIGHT};
use crate::graph::static_graph::{StaticEdgeData, StaticGraph};
use crate::heap::{BinaryHeap, HashedStorage};

/// A resolved route: total weight plus the fully unpacked (no shortcuts)
/// node sequence from source to target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    pub weight: Weight,
    pub nodes: Vec<NodeId>,
}

/// Per-heap-entry payload: how we got here, so both the meeting point and
/// the final path can be reconstructed.
#[derive(Debug, Clone, Copy)]
struct Step {
    parent: NodeId,
    via_edge: EdgeId,
}

const NO_EDGE: EdgeId = EdgeId::MAX;

/// Split a single contracted [`StaticGraph`] into its forward-usable and
/// backward-usable halves, the shared first step of every CH query
/// algorithm over an upward graph (bidirectional search here, bucket
/// propagation in [`super::many_to_many`]).
///
/// Each `(source, target)` record can carry a `forward` arc (`source ->
/// target`), a `backward` arc (`target -> source`), or both; each such arc
/// is classified independently by comparing `rank` at its own tail and
/// head, per spec §4.8 Correctness (ii): an arc whose tail has the lower
/// rank goes in the forward graph in its own orientation, and an arc whose
/// head has the lower rank goes in the backward graph, stored reversed (so
/// a forward Dijkstra over it walks predecessors). Every physically-allowed
/// arc lands in exactly one of the two graphs — ranks are a total order, so
/// exactly one of `rank[tail] < rank[head]` or `rank[head] < rank[tail]`
/// holds — so no arc is ever dropped, only re-homed to whichever direction
/// it climbs in.
pub(crate) fn split_directions(contracted: &StaticGraph, rank: &[u32]) -> (StaticGraph, StaticGraph) {
    let mut forward_edges = Vec::new();
    let mut backward_edges = Vec::new();
    for source in 0..contracted.num_nodes() as NodeId {
        for (_, target, data) in contracted.out_edges(source) {
            if data.forward {
                if rank[source as usize] < rank[target as usize] {
                    forward_edges.push((source, target, *data));
                } else {
                    backward_edges.push((target, source, *data));
                }
            }
            if data.backward {
                if rank[target as usize] < rank[source as usize] {
                    forward_edges.push((target, source, *data));
                } else {
                    backward_edges.push((source, target, *data));
                }
            }
        }
    }
    (
        StaticGraph::build(contracted.num_nodes(), forward_edges),
        StaticGraph::build(contracted.num_nodes(), backward_edges),
    )
}

/// Builds the forward/backward upward-graph pair from a single contracted
/// [`StaticGraph`] and answers point-to-point queries over them.
pub struct CHSearch {
    forward: StaticGraph,
    backward: StaticGraph,
    /// The unsplit `contracted` graph, kept only so shortcut unpacking can
    /// recover a shortcut's two constituent edges regardless of which
    /// direction-graph climbs which way — `forward`/`backward` are rank
    /// restricted and a shortcut's own halves need not climb the same way
    /// the shortcut itself does.
    full: StaticGraph,
}

impl CHSearch {
    /// Splits `contracted`'s edges into the two rank-restricted upward
    /// graphs the bidirectional search runs over (see [`split_directions`]).
    /// `rank` is the final contraction order, `ContractionResult::rank`.
    pub fn new(contracted: &StaticGraph, rank: &[u32]) -> Self {
        let (forward, backward) = split_directions(contracted, rank);
        Self {
            forward,
            backward,
            full: contracted.clone(),
        }
    }

    /// The forward-usable graph (edges whose `forward` bit is set, in their
    /// original orientation). Exposed so other query algorithms that share
    /// this same upward-graph split (e.g. [`super::many_to_many`]) don't
    /// have to re-derive it from a [`StaticGraph`].
    pub fn forward_graph(&self) -> &StaticGraph {
        &self.forward
    }

    /// The backward-usable graph (edges whose `backward` bit is set, stored
    /// reversed so a plain forward Dijkstra over it walks predecessors).
    pub fn backward_graph(&self) -> &StaticGraph {
        &self.backward
    }

    /// Total shortest-path weight from `source` to `target`, or `None` if
    /// unreachable.
    pub fn distance(&self, source: NodeId, target: NodeId) -> Option<Weight> {
        self.route(source, target).map(|p| p.weight)
    }

    /// Full shortest path (weight plus unpacked node sequence).
    pub fn route(&self, source: NodeId, target: NodeId) -> Option<Path> {
        if source == target {
            return Some(Path {
                weight: 0,
                nodes: vec![source],
            });
        }

        let capacity = self.full.num_nodes();
        let mut fwd: BinaryHeap<Step, HashedStorage> =
            BinaryHeap::with_storage(HashedStorage::with_capacity(capacity));
        let mut bwd: BinaryHeap<Step, HashedStorage> =
            BinaryHeap::with_storage(HashedStorage::with_capacity(capacity));
        fwd.insert(
            source,
            0,
            Step {
                parent: source,
                via_edge: NO_EDGE,
            },
        );
        bwd.insert(
            target,
            0,
            Step {
                parent: target,
                via_edge: NO_EDGE,
            },
        );

        let mut fwd_parents: FxHashMap<NodeId, Step> = FxHashMap::default();
        let mut bwd_parents: FxHashMap<NodeId, Step> = FxHashMap::default();

        let mut best = INVALID_WEIGHT;
        let mut meeting_node = None;

        loop {
            let fwd_top = fwd.peek_min().map(|(_, k)| k);
            let bwd_top = bwd.peek_min().map(|(_, k)| k);
            if fwd_top.is_none() && bwd_top.is_none() {
                break;
            }
            if fwd_top.map_or(u32::MAX, |k| k) >= best && bwd_top.map_or(u32::MAX, |k| k) >= best {
                break;
            }

            let go_forward = match (fwd_top, bwd_top) {
                (Some(f), Some(b)) => f <= b,
                (Some(_), None) => true,
                (None, Some(_)) => false,
                (None, None) => break,
            };

            if go_forward {
                let (node, dist, step) = fwd.pop_min().unwrap();
                fwd_parents.insert(node, step);
                if let Some(bd) = bwd.key(node) {
                    let total = dist.saturating_add(bd);
                    if total < best {
                        best = total;
                        meeting_node = Some(node);
                    }
                }
                if !is_stalled(&fwd, &self.backward, node, dist) {
                    relax(&mut fwd, &self.forward, node, dist);
                }
            } else {
                let (node, dist, step) = bwd.pop_min().unwrap();
                bwd_parents.insert(node, step);
                if let Some(fd) = fwd.key(node) {
                    let total = dist.saturating_add(fd);
                    if total < best {
                        best = total;
                        meeting_node = Some(node);
                    }
                }
                if !is_stalled(&bwd, &self.forward, node, dist) {
                    relax(&mut bwd, &self.backward, node, dist);
                }
            }
        }

        let meeting_node = meeting_node?;
        let fwd_nodes = unpack_side(&self.forward, &self.full, &fwd_parents, source, meeting_node);
        let mut bwd_nodes = unpack_side(&self.backward, &self.full, &bwd_parents, target, meeting_node);
        bwd_nodes.reverse();
        // `bwd_nodes` includes the meeting node again; drop the duplicate.
        let mut nodes = fwd_nodes;
        nodes.extend(bwd_nodes.into_iter().skip(1));

        Some(Path { weight: best, nodes })
    }
}

/// Scan `node`'s edges in the *opposite* search direction's graph (those are
/// the edges that climb toward `node` from a neighbor in this direction's
/// sense) and check them against this same direction's own heap: if some
/// neighbor already carries a smaller tentative distance in `own_heap` such
/// that neighbor_dist + edge_weight < dist, a cheaper path into `node`
/// already exists and this direction should not expand past it.
fn is_stalled(own_heap: &BinaryHeap<Step, HashedStorage>, opposite_graph: &StaticGraph, node: NodeId, dist: Weight) -> bool {
    opposite_graph.out_edges(node).any(|(_, neighbor, data)| {
        own_heap
            .key(neighbor)
            .is_some_and(|k| k.saturating_add(data.weight) < dist)
    })
}

fn relax(heap: &mut BinaryHeap<Step, HashedStorage>, graph: &StaticGraph, node: NodeId, dist: Weight) {
    for (edge_id, target, data) in graph.out_edges(node) {
        if heap.was_removed(target) {
            continue;
        }
        let next = dist.saturating_add(data.weight);
        let better = match heap.key(target) {
            Some(existing) => next < existing,
            None => true,
        };
        if better {
            heap.decrease_key(
                target,
                next,
                Step {
                    parent: node,
                    via_edge: edge_id,
                },
            );
        }
    }
}

/// Walk parent pointers from `meeting_node` back to `endpoint`, unpacking
/// every shortcut edge along the way, and return the node sequence ordered
/// `endpoint -> meeting_node` (forward side) or `endpoint -> meeting_node`
/// in the backward graph's reversed sense (caller reverses as needed).
/// `top_graph` is whichever of `forward`/`backward` the search actually
/// walked (`via_edge` ids are only valid there); `full` is the unsplit
/// graph recursive unpacking reads a shortcut's two halves from, since
/// those halves need not climb rank the same way the shortcut above them
/// does.
fn unpack_side(
    top_graph: &StaticGraph,
    full: &StaticGraph,
    parents: &FxHashMap<NodeId, Step>,
    endpoint: NodeId,
    meeting_node: NodeId,
) -> Vec<NodeId> {
    let mut edges = Vec::new();
    let mut cur = meeting_node;
    while cur != endpoint {
        let step = parents[&cur];
        edges.push(step.via_edge);
        cur = step.parent;
    }
    edges.reverse();

    let mut nodes = vec![endpoint];
    let mut at = endpoint;
    for edge_id in edges {
        let target = top_graph.edge_target(edge_id);
        let data = *top_graph.edge_data(edge_id);
        unpack_edge(full, at, target, data, &mut nodes);
        at = target;
    }
    nodes
}

/// Append the fully-unpacked node sequence for a single (possibly
/// shortcut) edge `source -> target` to `out`, not including `source`
/// itself (the caller already pushed it). Recurses over `full` (the
/// unsplit contracted graph) so a shortcut's constituent halves are found
/// regardless of which way they climb rank.
fn unpack_edge(full: &StaticGraph, source: NodeId, target: NodeId, data: StaticEdgeData, out: &mut Vec<NodeId>) {
    match data.middle {
        None => out.push(target),
        Some(middle) => {
            let first = full
                .find_edge(source, middle)
                .expect("shortcut's first half must exist in the unsplit graph");
            unpack_edge(full, source, middle, *full.edge_data(first), out);
            let second = full
                .find_edge(middle, target)
                .expect("shortcut's second half must exist in the unsplit graph");
            unpack_edge(full, middle, target, *full.edge_data(second), out);
        }
    }
}
