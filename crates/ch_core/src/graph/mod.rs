//! Graph data structures (spec Components B and C).
//!
//! [`dynamic_graph`] is the mutable structure contraction runs over;
//! [`static_graph`] is the immutable CSR structure the query engine runs
//! over. Both are built from the same [`Node`]/[`ImportEdge`] input types.

pub mod dynamic_graph;
pub mod import;
pub mod static_graph;

pub use dynamic_graph::DynamicGraph;
pub use static_graph::StaticGraph;

use serde::{Deserialize, Serialize};

use crate::constants::{NodeId, Weight};

/// A road-network node: an id plus coordinates (used for geometry/distance
/// bookkeeping, never for routing decisions themselves).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub lat: f64,
    pub lon: f64,
}

impl Node {
    pub fn new(id: NodeId, lat: f64, lon: f64) -> Self {
        Self { id, lat, lon }
    }
}

/// A single directed edge as read from the profile-weighted input (spec
/// §3's `ImportEdge`), before edge-based expansion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportEdge {
    pub source: NodeId,
    pub target: NodeId,
    pub weight: Weight,
    pub forward: bool,
    pub backward: bool,
}

impl ImportEdge {
    pub fn new(source: NodeId, target: NodeId, weight: Weight) -> Self {
        Self {
            source,
            target,
            weight,
            forward: true,
            backward: false,
        }
    }
}

/// A turn restriction referencing three consecutive nodes `(from, via, to)`.
/// `only` distinguishes "only this turn is allowed at `via` coming from
/// `from`" restrictions from the far more common "this turn is forbidden"
/// ones (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Restriction {
    pub from: NodeId,
    pub via: NodeId,
    pub to: NodeId,
    pub only: bool,
}
