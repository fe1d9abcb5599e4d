//! Node contraction (spec Component E) — the centerpiece of preprocessing.
//!
//! Grounded throughout on `examples/original_source/Contractor/Contractor.h`:
//! nodes are contracted in priority order; contracting a node removes it
//! from the working graph and, for every pair of its remaining neighbors
//! where the path through the contracted node would be a strict
//! improvement, inserts a shortcut edge standing in for that path. A
//! bounded witness search (`witness_search.rs`) decides whether a shortcut
//! is actually necessary before it is added.

pub mod contractor;
pub mod flush_store;
pub mod priority;
pub mod witness_search;

pub use contractor::{ContractionResult, NodeContractor};
pub use priority::PriorityWeights;

use serde::{Deserialize, Serialize};

use crate::constants::{NodeId, Weight};

/// Per-edge payload while the graph is being contracted (spec §3's
/// Contractor edge data). `middle` is the shortcut's via-node directly on
/// the edge, not in a side table, matching `_UnpackPath`'s access pattern
/// in `DataStructures/SearchEngine.h`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractorEdgeData {
    pub weight: Weight,
    /// How many original (pre-contraction) edges this edge stands in for.
    /// 1 for an original edge; the sum of its two constituents' counts for
    /// a shortcut. Used by the priority function's "edge quotient" term.
    pub original_edges_count: u32,
    /// The contracted node this shortcut passes through, or `None` if this
    /// is an original (non-shortcut) edge.
    pub middle: Option<NodeId>,
    pub forward: bool,
    pub backward: bool,
    /// Whether `middle` is already expressed in the graph's original node
    /// numbering. A flush (spec §4.5.5) renumbers the live working graph
    /// densely partway through contraction; a shortcut created afterward
    /// stores its via-node in that temporary dense numbering until `run()`
    /// translates the whole hierarchy back at the end, so this is `false`
    /// for exactly that window. Every edge `run()` returns has it `true`.
    pub via_is_original: bool,
}

impl ContractorEdgeData {
    pub fn original(weight: Weight, forward: bool, backward: bool) -> Self {
        Self {
            weight,
            original_edges_count: 1,
            middle: None,
            forward,
            backward,
            via_is_original: true,
        }
    }

    pub fn is_shortcut(&self) -> bool {
        self.middle.is_some()
    }
}
