//! Bucket-based many-to-many shortest-path weights (spec Component I).
//!
//! Grounded on `examples/original_source/Contractor/GeometryCompressor.h`'s
//! sibling in the original stack, `RoutingAlgorithms/many_to_many_routing.hpp`
//! (`general_many_to_many.hpp` in the retrieval pack's naming): rather than
//! running a full bidirectional search per (source, target) pair, every
//! target first runs a one-sided backward upward-Dijkstra and drops an
//! entry in a per-node "bucket" for every node it settles; every source then
//! runs a one-sided forward upward-Dijkstra and, at each node it settles,
//! combines its own distance with every bucket entry recorded there. This
//! turns `|S| * |T|` full searches into `|S| + |T|` one-sided ones.
//!
//! Reuses [`super::ch_search::split_directions`] for the same rank-restricted
//! upward-graph split the bidirectional search uses, [`crate::heap::BinaryHeap`]
//! for the one-sided searches themselves, and the same stall-on-demand check
//! to prune expansion once a cheaper path into a node is already known.

use rustc_hash::FxHashMap;

use crate::constants::{NodeId, Weight};
use crate::graph::static_graph::StaticGraph;
use crate::heap::{BinaryHeap, HashedStorage};
use crate::search::ch_search::split_directions;

/// One bucket entry: "target `target_index` is reachable from this node at
/// total weight `weight`, with `hops` original (unpacked) edges along the
/// way". `hops` is an auxiliary accounting the original carries alongside
/// `time` in its bucket entries (spec §11 supplement); it never affects
/// which path wins, only what gets reported once it has.
#[derive(Debug, Clone, Copy)]
struct BucketEntry {
    target_index: usize,
    weight: Weight,
    hops: u32,
}

/// Result of a many-to-many query: `weights[i][j]` is the shortest weight
/// from `sources[i]` to `targets[j]`, or `None` if unreachable; `hops[i][j]`
/// is the corresponding unpacked-edge count (spec §11 supplement).
#[derive(Debug, Clone)]
pub struct ManyToManyResult {
    pub weights: Vec<Vec<Option<Weight>>>,
    pub hops: Vec<Vec<Option<u32>>>,
}

impl ManyToManyResult {
    fn new(num_sources: usize, num_targets: usize) -> Self {
        Self {
            weights: vec![vec![None; num_targets]; num_sources],
            hops: vec![vec![None; num_targets]; num_sources],
        }
    }
}

/// Scan `node`'s edges in the *opposite* direction's upward graph: if a
/// neighbor already carries a cheaper tentative distance in this same
/// one-sided heap such that `neighbor_dist + edge_weight < dist`, a cheaper
/// path into `node` already exists and this search should not spend further
/// work expanding past it. The same check [`super::ch_search::is_stalled`]
/// runs for the bidirectional search, adapted here to compare against the
/// one-sided search's own heap instead of a concurrently running opposite
/// search (there isn't one in a bucket sweep).
fn is_stalled(heap: &BinaryHeap<u32, HashedStorage>, opposite_graph: &StaticGraph, node: NodeId, dist: Weight) -> bool {
    opposite_graph.out_edges(node).any(|(_, neighbor, data)| {
        heap.key(neighbor)
            .is_some_and(|k| k.saturating_add(data.weight) < dist)
    })
}

/// Run a one-sided upward Dijkstra from `start` over `graph`, recording
/// `(node, weight, hop_count)` for every settled node via `on_settle`.
/// `hop_count` counts unpacked (non-shortcut) edges: a shortcut edge's hop
/// contribution is its `original_edges_count`-equivalent, approximated here
/// as 2 per shortcut hop traversed (one per constituent) since the bucket
/// search runs over the *contracted* graph and does not unpack paths.
/// `stall_graph` is the opposite direction's upward graph, consulted for
/// stall-on-demand before relaxing past a settled node.
fn one_sided_search(
    graph: &StaticGraph,
    stall_graph: &StaticGraph,
    start: NodeId,
    mut on_settle: impl FnMut(NodeId, Weight, u32),
) {
    let mut heap: BinaryHeap<u32, HashedStorage> =
        BinaryHeap::with_storage(HashedStorage::with_capacity(graph.num_nodes()));
    heap.insert(start, 0, 0);
    while let Some((node, dist, hops)) = heap.pop_min() {
        on_settle(node, dist, hops);
        if is_stalled(&heap, stall_graph, node, dist) {
            continue;
        }
        for (_, target, data) in graph.out_edges(node) {
            if heap.was_removed(target) {
                continue;
            }
            let next = dist.saturating_add(data.weight);
            let next_hops = hops + if data.is_shortcut() { 2 } else { 1 };
            match heap.key(target) {
                Some(existing) if existing <= next => {}
                _ => heap.decrease_key(target, next, next_hops),
            }
        }
    }
}

/// Answer all `sources.len() * targets.len()` shortest-path weights over
/// `contracted` (spec §4.9). `rank` is the final contraction order,
/// `ContractionResult::rank`.
pub fn many_to_many(contracted: &StaticGraph, rank: &[u32], sources: &[NodeId], targets: &[NodeId]) -> ManyToManyResult {
    let (forward, backward) = split_directions(contracted, rank);
    let mut buckets: FxHashMap<NodeId, Vec<BucketEntry>> = FxHashMap::default();

    // Pass 1: one backward search per target, dropping bucket entries at
    // every node it settles.
    for (target_index, &target) in targets.iter().enumerate() {
        one_sided_search(&backward, &forward, target, |node, weight, hops| {
            buckets.entry(node).or_default().push(BucketEntry {
                target_index,
                weight,
                hops,
            });
        });
    }

    let mut result = ManyToManyResult::new(sources.len(), targets.len());

    // Pass 2: one forward search per source, combining with every bucket
    // entry recorded at each settled node.
    for (source_index, &source) in sources.iter().enumerate() {
        one_sided_search(&forward, &backward, source, |node, weight, hops| {
            let Some(entries) = buckets.get(&node) else {
                return;
            };
            for entry in entries {
                let total = weight.saturating_add(entry.weight);
                let total_hops = hops + entry.hops;
                let slot = &mut result.weights[source_index][entry.target_index];
                let better = match slot {
                    Some(existing) => total < *existing,
                    None => true,
                };
                if better {
                    *slot = Some(total);
                    result.hops[source_index][entry.target_index] = Some(total_hops);
                }
            }
        });
    }

    // Self-pairs (a source that is also a target) are always reachable at
    // weight 0 with 0 hops; the bucket search above already yields this via
    // the node settling itself at distance 0, but make it explicit so
    // callers never see `None` for `(s, s)`.
    for (source_index, &source) in sources.iter().enumerate() {
        for (target_index, &target) in targets.iter().enumerate() {
            let already_zero = matches!(result.weights[source_index][target_index], Some(0));
            if source == target && !already_zero {
                result.weights[source_index][target_index] = Some(0);
                result.hops[source_index][target_index] = Some(0);
            }
        }
    }

    result
}
