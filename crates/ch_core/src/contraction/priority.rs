//! Node priority function (spec §4.5.1).
//!
//! Grounded on `examples/original_source/Contractor/Contractor.h`'s
//! `_Evaluate`/`_EdgeQuotient`/`_Hierarchy` scoring: contracting a node
//! costs more if it adds more edges than it removes, if those edges stand
//! in for many more original edges than they replace, and if the node sits
//! deep in the already-contracted hierarchy (nodes contracted later should
//! not depend on too many already-contracted ones). The teacher crate
//! (`daho94-bachelor-thesis`'s `node_contraction.rs`) keeps this same
//! three-term weighted sum under `PriorityParams`/`calc_priority`; we keep
//! its coefficient defaults and field names, adapted to integer weights.

/// Coefficients for the three priority terms, matching the teacher's
/// `PriorityParams` defaults (`501, 401, 7, 201` in the teacher's
/// normalization; expressed here as plain weights since we sum unnormalized
/// ratios instead).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriorityWeights {
    pub edge_quotient: f64,
    pub original_edge_quotient: f64,
    pub contracted_neighbors: f64,
}

impl Default for PriorityWeights {
    fn default() -> Self {
        Self {
            edge_quotient: 2.0,
            original_edge_quotient: 4.0,
            contracted_neighbors: 1.0,
        }
    }
}

/// Inputs to the priority function for a single candidate node, gathered by
/// simulating its contraction (spec §4.5.1: "simulate contraction without
/// committing, count edges/shortcuts added vs. removed").
#[derive(Debug, Clone, Copy, Default)]
pub struct ContractionStats {
    pub edges_deleted: u32,
    pub edges_added: u32,
    pub original_edges_deleted: u32,
    pub original_edges_added: u32,
    /// Number of this node's neighbors that have already been contracted.
    pub depth: u32,
}

/// Lower is contracted sooner. When a ratio's denominator is zero (no edges
/// removed, meaning contracting this node is free edge-wise), the spec
/// falls back to `depth` alone for that term rather than dividing by zero.
pub fn calc_priority(stats: &ContractionStats, weights: &PriorityWeights) -> f64 {
    let edge_quotient = if stats.edges_deleted == 0 {
        stats.edges_added as f64
    } else {
        stats.edges_added as f64 / stats.edges_deleted as f64
    };
    let original_edge_quotient = if stats.original_edges_deleted == 0 {
        stats.original_edges_added as f64
    } else {
        stats.original_edges_added as f64 / stats.original_edges_deleted as f64
    };
    weights.edge_quotient * edge_quotient
        + weights.original_edge_quotient * original_edge_quotient
        + weights.contracted_neighbors * stats.depth as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_edges_removed_falls_back_to_added_count() {
        let stats = ContractionStats {
            edges_deleted: 0,
            edges_added: 3,
            original_edges_deleted: 0,
            original_edges_added: 3,
            depth: 0,
        };
        let weights = PriorityWeights::default();
        let p = calc_priority(&stats, &weights);
        assert!((p - (weights.edge_quotient * 3.0 + weights.original_edge_quotient * 3.0)).abs() < 1e-9);
    }

    #[test]
    fn depth_breaks_ties_between_equal_edge_ratios() {
        let weights = PriorityWeights::default();
        let shallow = ContractionStats {
            edges_deleted: 2,
            edges_added: 2,
            original_edges_deleted: 2,
            original_edges_added: 2,
            depth: 0,
        };
        let deep = ContractionStats {
            depth: 5,
            ..shallow
        };
        assert!(calc_priority(&shallow, &weights) < calc_priority(&deep, &weights));
    }
}
