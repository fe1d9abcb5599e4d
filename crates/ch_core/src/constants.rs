//! Core scalar types shared by every module.
//!
//! Node and edge identifiers are dense 32-bit indices (`spec.md` §3); weights
//! are integer deci-seconds rather than the teacher crate's `f64` seconds, so
//! that shortcut weight arithmetic is exact and `u32::MAX` can serve as the
//! heap's "infinite" sentinel.

/// 32-bit node identifier. `SPECIAL_NODE` denotes "none".
pub type NodeId = u32;
/// 32-bit edge identifier. `SPECIAL_EDGE` denotes "none".
pub type EdgeId = u32;
/// Edge weight in deci-seconds (tenths of a second).
pub type Weight = u32;

/// Sentinel node id meaning "none" (`2^32 - 1`).
pub const SPECIAL_NODE: NodeId = u32::MAX;
/// Sentinel edge id meaning "none" (`2^32 - 1`).
pub const SPECIAL_EDGE: EdgeId = u32::MAX;
/// Sentinel weight meaning "unreachable".
pub const INVALID_WEIGHT: Weight = u32::MAX;

/// Edges above this weight are rejected as likely-corrupt input (`spec.md` §3).
/// 24h expressed in deci-seconds. Unlike the original C++ source, which only
/// checked this in debug builds, this crate enforces it unconditionally
/// (`spec.md` §9 design notes, Open Question 3).
pub const MAX_EDGE_WEIGHT: Weight = 24 * 3600 * 10;

/// OpenStreetMap node id, kept only for traceability back to the input data.
pub type OsmId = u64;
