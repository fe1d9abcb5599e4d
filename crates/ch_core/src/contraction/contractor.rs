//! Parallel node contraction (spec §4.5.2-§4.5.6).
//!
//! Grounded on `examples/original_source/Contractor/Contractor.h`'s main
//! loop: repeatedly extract an independent set of low-priority nodes,
//! contract each (in parallel) against a private copy of its neighborhood,
//! merge the resulting shortcuts back into the shared graph serially (so
//! two workers never race on the same edge slab), then recompute the
//! priority of every node touched by this round before picking the next
//! independent set. The teacher crate's `node_contraction.rs` runs the same
//! priority-ordered loop single-threaded; this module keeps its
//! `ConstructionStats`/`PriorityWeights` naming but fans the per-round
//! contraction step out over `rayon`, matching the concurrency shape
//! described in spec §5.

use log::{debug, info};
use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::constants::{NodeId, Weight};
use crate::contraction::flush_store::FlushStore;
use crate::contraction::priority::{calc_priority, ContractionStats, PriorityWeights};
use crate::contraction::witness_search::WitnessSearch;
use crate::contraction::ContractorEdgeData;
use crate::error::Result;
use crate::graph::DynamicGraph;
use crate::tabulation_hash::XorFastHash;

/// One shortcut discovered while contracting a node, queued for the serial
/// merge step.
#[derive(Debug, Clone, Copy)]
struct PendingShortcut {
    source: NodeId,
    target: NodeId,
    weight: Weight,
    via: NodeId,
    original_edges_count: u32,
}

/// Outcome of contracting a single node: the shortcuts it produces plus the
/// bookkeeping needed to update statistics and neighbor priorities.
struct NodeContractionOutcome {
    node: NodeId,
    shortcuts: Vec<PendingShortcut>,
    edges_deleted: u32,
    original_edges_deleted: u32,
}

/// Final output of a full contraction run: the fully-shortcut-augmented
/// graph plus the order nodes were contracted in (`rank[node]` = position
/// in this order = the node's level in the hierarchy).
pub struct ContractionResult {
    pub graph: DynamicGraph<ContractorEdgeData>,
    pub rank: Vec<u32>,
    pub stats: RunStatistics,
}

#[derive(Debug, Default, Clone)]
pub struct RunStatistics {
    pub nodes_contracted: usize,
    pub shortcuts_added: usize,
    pub rounds: usize,
    pub flushes: usize,
}

pub struct NodeContractor {
    graph: DynamicGraph<ContractorEdgeData>,
    weights: PriorityWeights,
    hasher: XorFastHash,
    contracted: Vec<bool>,
    priority: Vec<f64>,
    rank: Vec<u32>,
    stats: RunStatistics,
    /// Edges retired from the working graph as their endpoints get
    /// contracted, kept so the final hierarchy still contains them (spec
    /// §4.5.6: "emits the complete edge list"). The working graph drops a
    /// node's incident edges the moment it is contracted so later rounds
    /// never see it as a candidate again; by the time every node has been
    /// contracted the live graph is empty, so this is the only place those
    /// edges survive until `run()` replays them back in.
    finalized: Vec<(NodeId, NodeId, ContractorEdgeData)>,
    /// Spill target for the flush pass's `finalized` snapshot.
    flush_store: FlushStore,
    /// The slot `finalized` was spilled to at flush time, read back and
    /// merged in once `run()`'s main loop finishes.
    flush_slot: Option<usize>,
    /// `new_id -> original_id`, set once the flush pass renumbers the live
    /// working graph. `None` before any flush has happened.
    id_map: Option<Vec<NodeId>>,
}

/// Percentage of nodes contracted at which a flush round fires (spec
/// §4.5.5 / §9): the original spills already-finalized shortcuts to disk
/// and densely renumbers the remaining working graph at this point to
/// shrink peak memory. [`NodeContractor::flush`] mirrors that: drop
/// contracted nodes, renumber survivors, and spill `finalized` through
/// [`FlushStore`] until `run()` translates everything back at the end.
const FLUSH_THRESHOLD_PERCENT: f64 = 65.0;

impl NodeContractor {
    pub fn new(graph: DynamicGraph<ContractorEdgeData>, weights: PriorityWeights) -> Self {
        let n = graph.num_nodes();
        Self {
            graph,
            weights,
            hasher: XorFastHash::new(),
            contracted: vec![false; n],
            priority: vec![0.0; n],
            rank: vec![0; n],
            stats: RunStatistics::default(),
            finalized: Vec::new(),
            flush_store: FlushStore::new(),
            flush_slot: None,
            id_map: None,
        }
    }

    fn num_nodes(&self) -> usize {
        self.graph.num_nodes()
    }

    /// Translate a node id in the *current* working-graph numbering back to
    /// the original input numbering, accounting for a flush's renumbering
    /// if one has happened.
    fn original_id(&self, node: NodeId) -> NodeId {
        match &self.id_map {
            Some(map) => map[node as usize],
            None => node,
        }
    }

    /// Remove every edge incident to `node` from the working graph. Only
    /// ever called once `node`'s shortcuts have already been merged in
    /// (spec §4.5.3: contraction commits deletions and insertions
    /// together). Every edge removed here is first copied into
    /// `self.finalized` so it still appears in the hierarchy `run()`
    /// eventually returns.
    fn remove_node_edges(&mut self, node: NodeId) {
        let neighbors: FxHashSet<NodeId> = self
            .graph
            .out_edges(node)
            .map(|(_, t, _)| t)
            .collect();
        for neighbor in neighbors {
            let incoming: Vec<ContractorEdgeData> = self
                .graph
                .out_edges(neighbor)
                .filter(|&(_, t, _)| t == node)
                .map(|(_, _, d)| d)
                .collect();
            for d in incoming {
                self.finalized.push((neighbor, node, d));
            }
            self.graph.delete_edges_to(neighbor, node);
        }
        let outgoing: Vec<(NodeId, ContractorEdgeData)> = self
            .graph
            .out_edges(node)
            .map(|(_, t, d)| (t, d))
            .collect();
        for (t, d) in &outgoing {
            self.finalized.push((node, *t, *d));
        }
        for (t, _) in outgoing {
            self.graph.delete_edges_to(node, t);
        }
    }

    fn priority_of(&self, node: NodeId) -> f64 {
        let outcome = self.simulate_only(node, WitnessSearch::simulated());
        let stats = ContractionStats {
            edges_deleted: outcome.edges_deleted,
            edges_added: outcome.shortcuts.len() as u32,
            original_edges_deleted: outcome.original_edges_deleted,
            original_edges_added: outcome.shortcuts.iter().map(|s| s.original_edges_count).sum(),
            depth: self.neighbor_contracted_count(node),
        };
        calc_priority(&stats, &self.weights)
    }

    fn neighbor_contracted_count(&self, node: NodeId) -> u32 {
        self.graph
            .out_edges(node)
            .filter(|(_, t, _)| self.contracted[*t as usize])
            .count() as u32
    }

    /// Is `node` independent of the current in-progress batch? Two nodes
    /// conflict if one is a direct (1-hop) neighbor of the other, or if
    /// they share a common neighbor that would see both contractions at
    /// once (2-hop check), matching spec §4.5.2.
    fn is_independent(&self, node: NodeId, batch: &FxHashSet<NodeId>) -> bool {
        let one_hop: FxHashSet<NodeId> = self.graph.out_edges(node).map(|(_, t, _)| t).collect();
        if one_hop.iter().any(|n| batch.contains(n)) {
            return false;
        }
        for &n1 in &one_hop {
            if self.graph.out_edges(n1).any(|(_, t, _)| batch.contains(&t)) {
                return false;
            }
        }
        true
    }

    /// Pick the next independent set: nodes whose priority is at or below
    /// the round's cutoff, filtered for pairwise independence, with ties
    /// broken by the tabulation hash so the result is deterministic but not
    /// biased toward lower node ids (spec §4.5.2, §4.10).
    fn select_independent_set(&self) -> Vec<NodeId> {
        let mut candidates: Vec<NodeId> = (0..self.num_nodes() as NodeId)
            .filter(|&n| !self.contracted[n as usize])
            .collect();
        if candidates.is_empty() {
            return Vec::new();
        }
        candidates.sort_by(|&a, &b| {
            self.priority[a as usize]
                .partial_cmp(&self.priority[b as usize])
                .unwrap()
                .then_with(|| self.hasher.hash(a).cmp(&self.hasher.hash(b)))
        });

        // Stable-partition style selection: walk candidates in priority
        // order, greedily accepting independent ones, up to a generous
        // batch size so rounds make real progress without the set
        // degenerating into a single node.
        let batch_limit = (candidates.len() / 4).max(1);
        let mut chosen = FxHashSet::default();
        let mut ordered = Vec::new();
        for &node in &candidates {
            if chosen.len() >= batch_limit {
                break;
            }
            if self.is_independent(node, &chosen) {
                chosen.insert(node);
                ordered.push(node);
            }
        }
        if ordered.is_empty() {
            // Degenerate graph (e.g. every remaining node mutually
            // adjacent): fall back to the single best candidate so the
            // loop still terminates.
            ordered.push(candidates[0]);
        }
        ordered
    }

    /// Merge one node's contraction outcome into the shared graph. A new
    /// shortcut is always forward-only (one direction per contracted
    /// node-pair), but the record it collides with at `(source, target)`
    /// can be an existing shortcut (same flags) or an original bidirectional
    /// road (forward and backward both set, one record covering both
    /// directions per spec §3's "equal-weight merge" invariant). Three
    /// outcomes per spec §4.5.3:
    /// - existing at least as cheap -> drop the new record (also Open
    ///   Question 1's resolution for the mixed-flag case).
    /// - existing is a same-flags (forward-only) record and the new one is
    ///   strictly cheaper -> replace it outright.
    /// - existing is bidirectional and the new one is strictly cheaper ->
    ///   split it: keep the existing record for the backward direction at
    ///   its old weight, and let the new shortcut cover the forward
    ///   direction, instead of destroying the backward direction's cost
    ///   entirely.
    fn merge_outcome(&mut self, outcome: NodeContractionOutcome) -> usize {
        let mut added = 0;
        for s in outcome.shortcuts {
            let existing = self
                .graph
                .find_edge(s.source, s.target, |a, b| a.weight < b.weight)
                .map(|e| *self.graph.edge_data(e));
            if let Some(existing) = existing {
                if existing.weight <= s.weight {
                    continue;
                }
                if existing.forward && existing.backward {
                    self.graph.delete_edge_if(s.source, s.target, |d| {
                        d.forward && d.backward && d.weight == existing.weight
                    });
                    self.graph.insert_edge(
                        s.source,
                        s.target,
                        ContractorEdgeData {
                            weight: existing.weight,
                            original_edges_count: existing.original_edges_count,
                            middle: existing.middle,
                            forward: false,
                            backward: true,
                            via_is_original: existing.via_is_original,
                        },
                    );
                } else {
                    self.graph
                        .delete_edge_if(s.source, s.target, |d| d.weight == existing.weight);
                }
            }
            // `s.via` is `outcome.node`, expressed in whatever numbering
            // `self.graph` currently uses: original ids before any flush,
            // the flush's dense ids afterward.
            self.graph.insert_edge(
                s.source,
                s.target,
                ContractorEdgeData {
                    weight: s.weight,
                    original_edges_count: s.original_edges_count,
                    middle: Some(s.via),
                    forward: true,
                    backward: false,
                    via_is_original: self.id_map.is_none(),
                },
            );
            added += 1;
        }
        self.contracted[outcome.node as usize] = true;
        added
    }

    /// Run contraction to completion, returning the augmented graph and
    /// node ranks.
    pub fn run(mut self) -> Result<ContractionResult> {
        let n = self.num_nodes();
        info!("contracting {n} nodes");

        for node in 0..n as NodeId {
            self.priority[node as usize] = self.priority_of(node);
        }

        let mut next_rank = 0u32;
        let mut flushed = false;

        loop {
            let batch = self.select_independent_set();
            if batch.is_empty() {
                break;
            }
            self.stats.rounds += 1;
            debug!("round {}: contracting {} nodes", self.stats.rounds, batch.len());

            // Each worker only reads `self.graph`/`self.contracted`; the
            // batch's pairwise independence (`select_independent_set`)
            // guarantees no two workers touch the same node's incident
            // edges, so this fan-out never races with itself. Merging and
            // deleting happens serially afterward.
            let outcomes: Vec<NodeContractionOutcome> = batch
                .par_iter()
                .map(|&node| self.simulate_only(node, WitnessSearch::real()))
                .collect();

            for outcome in outcomes {
                let node = outcome.node;
                self.stats.shortcuts_added += self.merge_outcome(outcome);
                self.remove_node_edges(node);
                self.rank[self.original_id(node) as usize] = next_rank;
                next_rank += 1;
                self.stats.nodes_contracted += 1;
            }

            let touched: FxHashSet<NodeId> = batch
                .iter()
                .flat_map(|&n| self.graph.out_edges(n).map(|(_, t, _)| t).collect::<Vec<_>>())
                .collect();
            for node in touched {
                if !self.contracted[node as usize] {
                    self.priority[node as usize] = self.priority_of(node);
                }
            }

            let percent_done = 100.0 * self.stats.nodes_contracted as f64 / n.max(1) as f64;
            if !flushed && percent_done >= FLUSH_THRESHOLD_PERCENT {
                info!(
                    "flush threshold reached at {:.1}% contracted ({} nodes)",
                    percent_done, self.stats.nodes_contracted
                );
                self.flush()?;
                self.stats.flushes += 1;
                flushed = true;
            }
        }

        info!(
            "contraction complete: {} nodes, {} shortcuts, {} rounds",
            self.stats.nodes_contracted, self.stats.shortcuts_added, self.stats.rounds
        );

        // A flush leaves `self.graph` numbered densely by survivor, not by
        // original id; translate it back (and restore the edges spilled at
        // flush time) before replaying anything, so every id downstream of
        // `run()` is in the caller's original numbering.
        if let Some(id_map) = self.id_map.take() {
            self.unflush(&id_map)?;
        }

        // The loop above has emptied the working graph (every node's edges
        // are dropped the moment it is contracted). Replay everything
        // retired along the way so the returned graph is the complete,
        // permanent edge set spec §4.5.6 describes, not an empty one.
        for (s, t, d) in self.finalized.drain(..) {
            self.graph.insert_edge(s, t, d);
        }

        Ok(ContractionResult {
            graph: self.graph,
            rank: self.rank,
            stats: self.stats,
        })
    }

    /// Spec §4.5.5's flush: drop already-contracted nodes from the working
    /// graph, densely renumber the survivors, and spill `self.finalized`
    /// (it will only grow from here, never needs renumbering again, and
    /// isn't touched again until `run()`'s final replay) to
    /// `self.flush_store` instead of keeping it resident.
    fn flush(&mut self) -> Result<()> {
        let live: Vec<NodeId> = (0..self.num_nodes() as NodeId)
            .filter(|&n| !self.contracted[n as usize])
            .collect();
        let k = live.len();
        let old_to_new: FxHashMap<NodeId, NodeId> = live
            .iter()
            .enumerate()
            .map(|(new_id, &old_id)| (old_id, new_id as NodeId))
            .collect();

        let slot = self.flush_store.allocate_slot()?;
        self.flush_store.write_value(slot, &self.finalized)?;
        self.finalized.clear();
        self.flush_slot = Some(slot);

        // Every edge still live in `self.graph` has both endpoints live:
        // `remove_node_edges` deletes every edge touching a node the
        // instant it is contracted, so no edge here can point at one.
        let mut rebuilt: DynamicGraph<ContractorEdgeData> = DynamicGraph::with_node_count(k);
        for &old_source in &live {
            let new_source = old_to_new[&old_source];
            for (_, old_target, data) in self.graph.out_edges(old_source) {
                let new_target = old_to_new[&old_target];
                rebuilt.insert_edge(new_source, new_target, *data);
            }
        }

        let mut new_priority = vec![0.0; k];
        for (new_id, &old_id) in live.iter().enumerate() {
            new_priority[new_id] = self.priority[old_id as usize];
        }

        self.graph = rebuilt;
        self.priority = new_priority;
        self.contracted = vec![false; k];
        self.id_map = Some(live);
        Ok(())
    }

    /// Undo a flush's renumbering: every edge's endpoints translate back
    /// through `id_map` unconditionally, and a shortcut's via-node does
    /// too, but only if it was created after the flush (`!via_is_original`)
    /// — a via created before the flush is already in original numbering
    /// and must be left alone, since it names a node that was contracted
    /// away and has no entry in `id_map`.
    ///
    /// `self.finalized` also needs this: `remove_node_edges` keeps
    /// accumulating into it in whatever numbering is current, so entries
    /// added after the flush are still in dense ids and must be translated
    /// alongside the working graph before they're merged with the
    /// already-original-numbered entries spilled at flush time.
    fn unflush(&mut self, id_map: &[NodeId]) -> Result<()> {
        let slot = self.flush_slot.take().expect("unflush only runs after a flush allocated a slot");
        // `write_value` left the slot's file position at the end of the
        // encoded bytes; rewind before reading them back.
        self.flush_store.seek(slot, 0)?;
        let restored: Vec<(NodeId, NodeId, ContractorEdgeData)> = self.flush_store.read_value(slot)?;
        self.flush_store.deallocate_slot(slot);

        let translate_data = |data: &ContractorEdgeData| -> ContractorEdgeData {
            let mut data = *data;
            if !data.via_is_original {
                if let Some(via) = data.middle {
                    data.middle = Some(id_map[via as usize]);
                }
                data.via_is_original = true;
            }
            data
        };

        // `self.rank` is sized to the original node count for the whole
        // run and never resized, so it is the one field that still carries
        // that count after a flush shrinks `self.graph`/`self.priority`.
        let n = self.rank.len();
        let mut translated: DynamicGraph<ContractorEdgeData> = DynamicGraph::with_node_count(n);
        for new_source in 0..self.graph.num_nodes() as NodeId {
            let old_source = id_map[new_source as usize];
            for (_, new_target, data) in self.graph.out_edges(new_source) {
                let old_target = id_map[new_target as usize];
                translated.insert_edge(old_source, old_target, translate_data(data));
            }
        }

        self.finalized = self
            .finalized
            .iter()
            .map(|&(s, t, d)| (id_map[s as usize], id_map[t as usize], translate_data(&d)))
            .collect();
        self.finalized.extend(restored);

        self.graph = translated;
        Ok(())
    }

    /// Simulate contracting `node` against the current graph, without
    /// mutating anything: for every pair of a live incoming and live
    /// outgoing neighbor (excluding `node` itself), run `search` to decide
    /// whether the path through `node` needs a shortcut. Shared `&self` is
    /// enough since nothing here writes to `self.graph`; used both for
    /// priority estimation (with [`WitnessSearch::simulated`]) and for the
    /// real parallel contraction fan-out (with [`WitnessSearch::real`]).
    fn simulate_only(&self, node: NodeId, search: WitnessSearch) -> NodeContractionOutcome {
        let incoming: Vec<(NodeId, Weight, u32)> = self
            .graph
            .out_edges(node)
            .filter(|(_, _, d)| d.backward)
            .map(|(_, t, d)| (t, d.weight, d.original_edges_count))
            .collect();
        let outgoing: Vec<(NodeId, Weight, u32)> = self
            .graph
            .out_edges(node)
            .filter(|(_, _, d)| d.forward)
            .map(|(_, t, d)| (t, d.weight, d.original_edges_count))
            .collect();
        let edges_deleted = self.graph.out_degree(node) as u32;
        let original_edges_deleted: u32 = self
            .graph
            .out_edges(node)
            .map(|(_, _, d)| d.original_edges_count)
            .sum();

        let mut shortcuts = Vec::new();
        for &(u, w_in, oc_in) in &incoming {
            if u == node || self.contracted[u as usize] {
                continue;
            }
            for &(w, w_out, oc_out) in &outgoing {
                if w == node || w == u || self.contracted[w as usize] {
                    continue;
                }
                let via_weight = w_in.saturating_add(w_out);
                if !search.witness_exists(&self.graph, u, w, node, via_weight) {
                    shortcuts.push(PendingShortcut {
                        source: u,
                        target: w,
                        weight: via_weight,
                        via: node,
                        original_edges_count: oc_in + oc_out,
                    });
                }
            }
        }

        NodeContractionOutcome {
            node,
            shortcuts,
            edges_deleted,
            original_edges_deleted,
        }
    }
}
