//! Bounded forward witness search (spec §4.5.4).
//!
//! Before inserting a shortcut `u -> w` standing in for the path `u -> v ->
//! w` through a node `v` being contracted, the contractor asks: is there
//! already a path from `u` to `w`, avoiding `v`, that is at least as short?
//! If so that "witness path" makes the shortcut redundant. Grounded on
//! `examples/original_source/Contractor/Contractor.h`'s `_Dijkstra`: a
//! plain forward Dijkstra from `u`, skipping `v` entirely, bounded both by
//! a maximum path weight (the candidate shortcut's weight — no point
//! exploring further than that) and by a hard cap on settled nodes (1000
//! during the simulated/"dry-run" pass used for priority estimation, 2000
//! during the real contraction pass), after which the search gives up and
//! the shortcut is inserted regardless (a false shortcut is a performance
//! cost, never a correctness one).

use crate::constants::{NodeId, Weight};
use crate::contraction::ContractorEdgeData;
use crate::graph::DynamicGraph;
use crate::heap::{BinaryHeap, HashedStorage};

/// Settle-count cap used while simulating contraction to compute a node's
/// priority (spec §4.5.4) — cheaper and approximate is fine here since the
/// result only ranks candidates.
pub const SIMULATED_SETTLE_LIMIT: usize = 1000;
/// Settle-count cap used during the real contraction pass, where a wrong
/// "no witness" answer would insert an unnecessary shortcut into the
/// hierarchy rather than just mis-rank a candidate.
pub const REAL_SETTLE_LIMIT: usize = 2000;

pub struct WitnessSearch {
    max_settled: usize,
}

impl WitnessSearch {
    pub fn new(max_settled: usize) -> Self {
        Self { max_settled }
    }

    pub fn simulated() -> Self {
        Self::new(SIMULATED_SETTLE_LIMIT)
    }

    pub fn real() -> Self {
        Self::new(REAL_SETTLE_LIMIT)
    }

    /// Is there a path `from -> to` of weight `<= max_weight`, avoiding
    /// node `avoid`, in `graph`'s current contracted state? Runs a
    /// bounded forward Dijkstra and returns `true` the moment `to` is
    /// settled at a weight within budget, `false` if the search exhausts
    /// the frontier, hits `max_weight`, or hits the settle limit first.
    pub fn witness_exists(
        &self,
        graph: &DynamicGraph<ContractorEdgeData>,
        from: NodeId,
        to: NodeId,
        avoid: NodeId,
        max_weight: Weight,
    ) -> bool {
        if from == to {
            return true;
        }
        let mut heap: BinaryHeap<(), HashedStorage> =
            BinaryHeap::with_storage(HashedStorage::with_capacity(graph.num_nodes()));
        heap.insert(from, 0, ());
        let mut settled = 0usize;

        while let Some((node, dist, _)) = heap.pop_min() {
            if node == to {
                return dist <= max_weight;
            }
            settled += 1;
            if settled > self.max_settled {
                return false;
            }
            if dist > max_weight {
                // Everything left in the heap is at least this far; no
                // witness can exist within budget.
                return false;
            }
            for (_, target, data) in graph.out_edges(node) {
                if target == avoid || !data.forward {
                    continue;
                }
                let next = dist.saturating_add(data.weight);
                if next > max_weight {
                    continue;
                }
                if heap.was_removed(target) {
                    continue;
                }
                match heap.key(target) {
                    Some(existing) if existing <= next => {}
                    _ => heap.decrease_key(target, next, ()),
                }
            }
        }
        false
    }
}
