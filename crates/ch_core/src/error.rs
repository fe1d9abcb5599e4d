//! Error types for the preprocessing and query pipeline (`spec.md` §7).
//!
//! `NotFound` (no route between two otherwise-valid nodes) is deliberately
//! *not* part of this enum: a query that finds no path is a normal result,
//! not a failure, so search functions return `Option`/`Ok(None)` instead of
//! `Err(CoreError::NotFound)`.

use thiserror::Error;

use crate::constants::NodeId;

/// Errors produced while loading, preprocessing or querying a road network.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Malformed or out-of-range input data (bad edge weight, dangling node
    /// reference, truncated file, ...). Always a load-time rejection.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A resource limit was hit (out of memory, temp file allocation
    /// failure, witness-search settle limit exceeded in a context that
    /// requires termination rather than a bounded giveup).
    #[error("out of resources: {0}")]
    OutOfResources(String),

    /// An internal invariant was violated (`spec.md` §3/§4 invariants) —
    /// always a bug, never a consequence of untrusted input. Preprocessing
    /// aborts rather than continuing with inconsistent data.
    #[error("invariant violated: {0}")]
    Invariant(String),

    /// The Lua (or equivalent) weighting profile rejected or mis-described
    /// an input way/restriction.
    #[error("profile error: {0}")]
    Profile(String),
}

impl CoreError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::Invariant(msg.into())
    }

    pub fn out_of_resources(msg: impl Into<String>) -> Self {
        Self::OutOfResources(msg.into())
    }

    pub fn dangling_node(node: NodeId) -> Self {
        Self::InvalidInput(format!("edge references unknown node {node}"))
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
