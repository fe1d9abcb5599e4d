//! Query-time routing (spec Components H and I).
//!
//! [`ch_search`] is the bidirectional, stall-on-demand Dijkstra that runs
//! over the contracted hierarchy; [`dijkstra`] is a plain single-direction
//! Dijkstra kept for cross-validation in tests (spec §8: CH answers must
//! agree with plain shortest paths) and for small/uncontracted graphs;
//! [`many_to_many`] is the bucket-based batch query (spec §4.9).

pub mod ch_search;
pub mod dijkstra;
pub mod many_to_many;

pub use ch_search::{CHSearch, Path};
pub use dijkstra::dijkstra_shortest_path;
pub use many_to_many::{many_to_many, ManyToManyResult};
